//! Declarative dashboard definitions.
//!
//! A definition lists panels, each bound to a named query result. Building a
//! dashboard turns whatever results are available into chart configs and
//! metric tiles; fetching and refreshing those results is the caller's job.

use crate::chart::{base_config, ChartConfig, ChartKind};
use crate::data::RowSet;
use crate::metric::{MetricTile, StatusTotals};
use crate::palette::ColorSource;
use crate::reshape::{stacked_data, unstacked_data};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDefinition {
    pub name: String,
    pub panels: Vec<PanelDefinition>,
    #[serde(default)]
    pub metrics: Option<MetricsDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDefinition {
    pub id: String,
    pub title: String,
    /// Name of the query whose rows feed this panel
    pub query: String,
    pub kind: ChartKind,
    #[serde(default)]
    pub stacked: bool,
    pub group: String,
    /// Pivot on this field; produces one dataset per distinct value
    #[serde(default)]
    pub sub_group: Option<String>,
    pub value: String,
    /// Series label for unstacked panels, defaults to the title
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDefinition {
    pub query: String,
    #[serde(default = "default_status_field")]
    pub status_field: String,
    #[serde(default = "default_count_field")]
    pub count_field: String,
}

fn default_status_field() -> String {
    "Status".to_string()
}

fn default_count_field() -> String {
    "CaseCount".to_string()
}

impl DashboardDefinition {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Invalid dashboard definition")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dashboard definition {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// The engineering cases dashboard: seven charts and four status tiles
    pub fn engineering_cases() -> Self {
        let panel = |id: &str, title: &str, query: &str, kind: ChartKind, stacked: bool,
                     group: &str, sub_group: Option<&str>, label: Option<&str>| PanelDefinition {
            id: id.to_string(),
            title: title.to_string(),
            query: query.to_string(),
            kind,
            stacked,
            group: group.to_string(),
            sub_group: sub_group.map(str::to_string),
            value: "CaseCount".to_string(),
            label: label.map(str::to_string),
        };

        Self {
            name: "engineeringCasesDashboard".to_string(),
            panels: vec![
                panel("openCasesByStatus", "Open Cases by Status", "getOpenCaseStatusCounts",
                      ChartKind::Doughnut, false, "Status", None, Some("Open Cases by Status")),
                panel("openCasesByOwner", "Open Cases by Owner", "getOpenCaseOwnerCounts",
                      ChartKind::HorizontalBar, true, "CaseOwner", Some("Status"), None),
                panel("openCasesByPriority", "Open Cases by Priority", "getOpenCasePriorityCounts",
                      ChartKind::HorizontalBar, true, "Priority", Some("Status"), None),
                panel("openCasesByFacility", "Open Cases by Facility", "getOpenCaseFacilityCounts",
                      ChartKind::Bar, false, "Facility", None, Some("Open Cases")),
                panel("openCasesByType", "Open Cases by Type", "getOpenCaseTypeCounts",
                      ChartKind::HorizontalBar, false, "Type", None, Some("Open Cases")),
                panel("submittedCasesLastThirty", "Cases Submitted (Last 30 Days)",
                      "getCasesSubmittedLastThirtyDays", ChartKind::Bar, false, "SubmittedDate",
                      None, Some("Submitted Cases")),
                panel("closedCasesLastThirty", "Cases Closed (Last 30 Days)",
                      "getClosedCasesLastThirtyDays", ChartKind::HorizontalBar, false, "CaseOwner",
                      None, Some("Closed Cases")),
            ],
            metrics: Some(MetricsDefinition {
                query: "getOpenCaseStatusCounts".to_string(),
                status_field: default_status_field(),
                count_field: default_count_field(),
            }),
        }
    }
}

impl PanelDefinition {
    /// Chart config for this panel from its query rows
    pub fn build<C: ColorSource>(&self, rows: &RowSet, colors: C) -> ChartConfig {
        let data = match &self.sub_group {
            Some(sub_group) => stacked_data(&rows.rows, &self.group, sub_group, &self.value, colors),
            None => {
                let label = self.label.as_deref().unwrap_or(&self.title);
                unstacked_data(&rows.rows, &self.group, &self.value, label, colors)
            }
        };
        base_config(self.kind.clone(), self.stacked).with_data(data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub name: String,
    pub panels: Vec<PanelView>,
    pub metrics: Vec<MetricTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub id: String,
    pub title: String,
    pub config: ChartConfig,
}

/// Build every panel that has results; panels without results are skipped
pub fn build_dashboard<C: ColorSource>(
    definition: &DashboardDefinition,
    results: &HashMap<String, RowSet>,
    mut colors: C,
) -> DashboardView {
    let mut panels = Vec::with_capacity(definition.panels.len());
    for panel in &definition.panels {
        let Some(rows) = results.get(&panel.query) else {
            warn!(panel = %panel.id, query = %panel.query, "no results for panel, skipping");
            continue;
        };
        debug!(panel = %panel.id, rows = rows.len(), "building panel");
        panels.push(PanelView {
            id: panel.id.clone(),
            title: panel.title.clone(),
            config: panel.build(rows, &mut colors),
        });
    }

    let metrics = match &definition.metrics {
        Some(m) => match results.get(&m.query) {
            Some(rows) => StatusTotals::from_rows(&rows.rows, &m.status_field, &m.count_field).tiles(),
            None => {
                warn!(query = %m.query, "no results for metrics");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    DashboardView {
        name: definition.name.clone(),
        panels,
        metrics,
    }
}

/// camelCase name of a component tag: `c-my-component` becomes `myComponent`
pub fn component_name(tag: &str) -> String {
    let mut parts = tag.split('-').skip(1);
    let mut name = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}
