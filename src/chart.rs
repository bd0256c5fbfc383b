//! chart.js (v2) configuration objects.
//!
//! [`base_config`] produces the rendering options for a chart kind with no
//! data; the reshapers in [`crate::reshape`] fill in [`ChartData`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart kinds understood by the config builder.
/// Unknown names are carried through as `Other` and get the base shape only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Doughnut,
    Pie,
    Other(String),
}

impl ChartKind {
    /// The chart.js `type` string
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "horizontalBar",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Pie => "pie",
            ChartKind::Other(name) => name,
        }
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, ChartKind::Doughnut | ChartKind::Pie)
    }
}

impl FromStr for ChartKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bar" => ChartKind::Bar,
            "horizontalBar" | "horizontal_bar" | "horizontal-bar" => ChartKind::HorizontalBar,
            "doughnut" => ChartKind::Doughnut,
            "pie" => ChartKind::Pie,
            other => ChartKind::Other(other.to_string()),
        })
    }
}

impl From<String> for ChartKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete chart.js configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartConfig {
    pub fn with_data(mut self, data: ChartData) -> Self {
        self.data = data;
        self
    }

    /// True when either axis is configured to stack
    pub fn is_stacked(&self) -> bool {
        self.options
            .scales
            .as_ref()
            .map(|s| s.x_axes.iter().chain(&s.y_axes).any(|a| a.stacked))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub datasets: Vec<Dataset>,
    pub labels: Vec<String>,
}

/// One chart.js dataset (a series)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    /// `None` entries serialise as `null` and render as a gap
    pub data: Vec<Option<f64>>,
    pub background_color: BackgroundColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Either one color for the whole dataset or one per data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundColor {
    Single(String),
    PerPoint(Vec<String>),
}

impl BackgroundColor {
    /// Color of the point at `idx`, if one is set
    pub fn at(&self, idx: usize) -> Option<&str> {
        match self {
            BackgroundColor::Single(c) => Some(c),
            BackgroundColor::PerPoint(colors) => colors.get(idx).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutout_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scales: Option<Scales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugins {
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub animate_rotate: bool,
    pub animate_scale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scales {
    pub x_axes: Vec<Axis>,
    pub y_axes: Vec<Axis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub stacked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at_zero: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Ticks>,
}

impl Axis {
    fn category(stacked: bool) -> Self {
        Self { stacked, begin_at_zero: None, ticks: None }
    }

    /// Count axis: zero origin, one tick per whole case
    fn value(stacked: bool) -> Self {
        Self {
            stacked,
            begin_at_zero: Some(true),
            ticks: Some(Ticks { begin_at_zero: true, step_size: 1 }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticks {
    pub begin_at_zero: bool,
    pub step_size: u32,
}

/// Base configuration, without any datasets, for a given chart kind
pub fn base_config(kind: ChartKind, stacked: bool) -> ChartConfig {
    let mut options = ChartOptions {
        responsive: true,
        plugins: Plugins {
            legend: Legend { position: "right".to_string() },
        },
        animation: None,
        cutout_percentage: None,
        scales: None,
    };

    match kind {
        ChartKind::Doughnut | ChartKind::Pie => {
            options.animation = Some(Animation { animate_rotate: true, animate_scale: true });
            options.cutout_percentage = Some(if kind == ChartKind::Doughnut { 25 } else { 0 });
        }
        ChartKind::Bar => {
            options.scales = Some(Scales {
                x_axes: vec![Axis::category(stacked)],
                y_axes: vec![Axis::value(stacked)],
            });
        }
        ChartKind::HorizontalBar => {
            options.scales = Some(Scales {
                x_axes: vec![Axis::value(stacked)],
                y_axes: vec![Axis::category(stacked)],
            });
        }
        ChartKind::Other(_) => {}
    }

    ChartConfig {
        kind,
        data: ChartData::default(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stacking(config: &ChartConfig) -> (bool, bool) {
        let scales = config.options.scales.as_ref().unwrap();
        (scales.x_axes[0].stacked, scales.y_axes[0].stacked)
    }

    #[test]
    fn test_bar_stacked_flags() {
        assert_eq!(stacking(&base_config(ChartKind::Bar, true)), (true, true));
        assert_eq!(stacking(&base_config(ChartKind::Bar, false)), (false, false));
    }

    #[test]
    fn test_horizontal_bar_value_axis_is_x() {
        let config = base_config(ChartKind::HorizontalBar, true);
        let scales = config.options.scales.as_ref().unwrap();
        assert_eq!(scales.x_axes[0].ticks.as_ref().unwrap().step_size, 1);
        assert!(scales.y_axes[0].ticks.is_none());
        assert!(config.is_stacked());
    }

    #[test]
    fn test_doughnut_and_pie() {
        let doughnut = base_config(ChartKind::Doughnut, false);
        assert_eq!(doughnut.options.cutout_percentage, Some(25));
        assert!(doughnut.options.scales.is_none());
        assert!(doughnut.options.animation.is_some());

        let pie = base_config(ChartKind::Pie, true);
        assert_eq!(pie.options.cutout_percentage, Some(0));
        assert!(!pie.is_stacked());
    }

    #[test]
    fn test_unknown_kind_gets_base_shape() {
        let config = base_config(ChartKind::from("radar".to_string()), true);
        assert_eq!(config.kind, ChartKind::Other("radar".to_string()));
        assert!(config.options.scales.is_none());
        assert!(config.options.animation.is_none());
        assert!(config.options.cutout_percentage.is_none());
        assert!(config.data.labels.is_empty());
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!("horizontal_bar".parse::<ChartKind>().unwrap(), ChartKind::HorizontalBar);
        assert_eq!("horizontal-bar".parse::<ChartKind>().unwrap(), ChartKind::HorizontalBar);
        assert_eq!("horizontalBar".parse::<ChartKind>().unwrap(), ChartKind::HorizontalBar);
        assert_eq!(ChartKind::HorizontalBar.to_string(), "horizontalBar");
    }

    #[test]
    fn test_bar_json_shape() {
        let value = serde_json::to_value(base_config(ChartKind::Bar, false)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "bar",
                "data": {"datasets": [], "labels": []},
                "options": {
                    "responsive": true,
                    "plugins": {"legend": {"position": "right"}},
                    "scales": {
                        "xAxes": [{"stacked": false}],
                        "yAxes": [{
                            "stacked": false,
                            "beginAtZero": true,
                            "ticks": {"beginAtZero": true, "stepSize": 1}
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_doughnut_json_shape() {
        let value = serde_json::to_value(base_config(ChartKind::Doughnut, false)).unwrap();
        assert_eq!(value["options"]["animation"], json!({"animateRotate": true, "animateScale": true}));
        assert_eq!(value["options"]["cutoutPercentage"], json!(25));
        assert!(value["options"].get("scales").is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = base_config(ChartKind::HorizontalBar, true);
        let text = serde_json::to_string(&config).unwrap();
        let back: ChartConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
