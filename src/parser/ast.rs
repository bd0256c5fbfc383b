// Abstract syntax tree for chart requests

use crate::chart::ChartKind;

/// A parsed request: one chart plus optional labels
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub chart: ChartSpec,
    pub labels: Option<Labels>,
}

/// Which chart to draw and which fields feed it
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Field whose values become the category labels
    pub group: String,
    /// Numeric field plotted against each category
    pub value: String,
    /// Pivot field; one dataset per distinct value
    pub by: Option<String>,
    /// Dataset label for unstacked charts
    pub label: Option<String>,
    pub stacked: Option<bool>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, group: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            group: group.into(),
            value: value.into(),
            by: None,
            label: None,
            stacked: None,
        }
    }

    /// Axis stacking; follows `by` unless set explicitly
    pub fn is_stacked(&self) -> bool {
        self.stacked.unwrap_or(self.by.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    pub title: Option<String>,
}

impl RequestSpec {
    pub fn title(&self) -> Option<&str> {
        self.labels.as_ref().and_then(|l| l.title.as_deref())
    }
}
