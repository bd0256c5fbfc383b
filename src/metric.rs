use crate::data::Row;
use serde::Serialize;

const VALUE_CLASS: &str = "dash-metric-value";
const ERROR_CLASS: &str = "slds-text-color_error";
const SUCCESS_CLASS: &str = "slds-text-color_success";

/// A titled single number on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTile {
    pub title: String,
    pub value: f64,
    pub value_style: String,
}

impl MetricTile {
    pub fn new(title: impl Into<String>, value: f64) -> Self {
        Self {
            title: title.into(),
            value,
            value_style: value_style(value),
        }
    }
}

/// Any outstanding work is flagged in the error color
pub fn value_style(value: f64) -> String {
    let color = if value > 0.0 { ERROR_CLASS } else { SUCCESS_CLASS };
    format!("{} {}", VALUE_CLASS, color)
}

/// Open case totals derived from status counts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotals {
    pub total: f64,
    pub unassigned: f64,
    pub in_progress: f64,
    pub awaiting_reply: f64,
}

impl StatusTotals {
    /// Sum counts per status. Non-numeric counts add nothing.
    pub fn from_rows(rows: &[Row], status_field: &str, count_field: &str) -> Self {
        let mut totals = StatusTotals::default();

        for row in rows {
            let count = row.get(count_field).as_f64().unwrap_or(0.0);
            totals.total += count;
            match row.get(status_field).to_string().as_str() {
                "New" => totals.unassigned += count,
                "In Progress" => totals.in_progress += count,
                "Awaiting Reply" => totals.awaiting_reply += count,
                _ => {}
            }
        }

        totals
    }

    pub fn tiles(&self) -> Vec<MetricTile> {
        vec![
            MetricTile::new("Open Cases", self.total),
            MetricTile::new("Unassigned", self.unassigned),
            MetricTile::new("In Progress", self.in_progress),
            MetricTile::new("Awaiting Reply", self.awaiting_reply),
        ]
    }
}
