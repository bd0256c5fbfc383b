// Runtime executor for chart requests

use crate::chart::{base_config, ChartConfig};
use crate::data::RowSet;
use crate::graph;
use crate::palette::ColorSource;
use crate::parser::RequestSpec;
use crate::reshape::{stacked_data, unstacked_data};
use crate::RenderOptions;
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Build the chart config a request describes.
///
/// Missing fields are not an error: they read as null, so a typo yields a
/// chart of "-" groups or gaps. A warning is logged when a field named by the
/// request appears in none of the rows.
pub fn build_chart<C: ColorSource>(spec: &RequestSpec, rows: &RowSet, colors: C) -> ChartConfig {
    let chart = &spec.chart;
    warn_missing_fields(spec, rows);

    let data = match &chart.by {
        Some(by) => {
            debug!(group = %chart.group, by = %by, "pivoting rows");
            stacked_data(&rows.rows, &chart.group, by, &chart.value, colors)
        }
        None => {
            let label = chart
                .label
                .as_deref()
                .or_else(|| spec.title())
                .unwrap_or(&chart.value);
            unstacked_data(&rows.rows, &chart.group, &chart.value, label, colors)
        }
    };

    base_config(chart.kind.clone(), chart.is_stacked()).with_data(data)
}

/// Build the config and rasterise it
pub fn render_request<C: ColorSource>(
    spec: &RequestSpec,
    rows: &RowSet,
    colors: C,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let config = build_chart(spec, rows, colors);
    graph::render_chart(&config, spec.title(), options).context("Failed to render chart")
}

fn warn_missing_fields(spec: &RequestSpec, rows: &RowSet) {
    if rows.is_empty() {
        return;
    }
    let chart = &spec.chart;
    let fields = [Some(&chart.group), Some(&chart.value), chart.by.as_ref()];
    for field in fields.into_iter().flatten() {
        if !rows.rows.iter().any(|row| row.contains(field)) {
            warn!(field = %field, "field not present in any row, reading as null");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BackgroundColor, ChartKind};
    use crate::data::{Row, Value};
    use crate::palette::FixedPalette;
    use crate::parser::parse_request;
    use crate::OutputFormat;

    fn request(dsl: &str) -> RequestSpec {
        parse_request(dsl).unwrap().1
    }

    fn status_rows() -> RowSet {
        RowSet::new(vec![
            [("Status", Value::from("New")), ("CaseCount", 4.into())].into_iter().collect::<Row>(),
            [("Status", Value::from("In Progress")), ("CaseCount", 2.into())].into_iter().collect(),
        ])
    }

    fn owner_row(owner: &str, status: &str, count: i32) -> Row {
        [("Owner", Value::from(owner)), ("Status", status.into()), ("CaseCount", count.into())]
            .into_iter()
            .collect()
    }

    fn owner_rows() -> RowSet {
        RowSet::new(vec![owner_row("Ana", "New", 1), owner_row("Bo", "Closed", 3)])
    }

    #[test]
    fn test_build_unstacked() {
        let spec = request("doughnut(group: Status, value: CaseCount)");
        let config = build_chart(&spec, &status_rows(), FixedPalette::status_defaults());

        assert_eq!(config.kind, ChartKind::Doughnut);
        assert_eq!(config.options.cutout_percentage, Some(25));
        assert_eq!(config.data.labels, vec!["New", "In Progress"]);
        let ds = &config.data.datasets[0];
        assert_eq!(ds.data, vec![Some(4.0), Some(2.0)]);
        assert_eq!(
            ds.background_color,
            BackgroundColor::PerPoint(vec!["rgb(255,99,132)".into(), "rgb(255,159,64)".into()])
        );
    }

    #[test]
    fn test_dataset_label_fallbacks() {
        let rows = status_rows();

        let explicit = request(r#"bar(group: Status, value: CaseCount, label: "Cases") | labs(title: "T")"#);
        assert_eq!(build_chart(&explicit, &rows, FixedPalette::category10()).data.datasets[0].label, "Cases");

        let titled = request(r#"bar(group: Status, value: CaseCount) | labs(title: "T")"#);
        assert_eq!(build_chart(&titled, &rows, FixedPalette::category10()).data.datasets[0].label, "T");

        let bare = request("bar(group: Status, value: CaseCount)");
        assert_eq!(build_chart(&bare, &rows, FixedPalette::category10()).data.datasets[0].label, "CaseCount");
    }

    #[test]
    fn test_build_stacked() {
        let spec = request("horizontal_bar(group: Owner, value: CaseCount, by: Status)");
        let config = build_chart(&spec, &owner_rows(), FixedPalette::category10());

        assert!(config.is_stacked());
        assert_eq!(config.data.labels, vec!["Ana", "Bo"]);
        let labels: Vec<&str> = config.data.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["New", "Closed"]);
        assert_eq!(config.data.datasets[0].data, vec![Some(1.0), Some(0.0)]);
        assert_eq!(config.data.datasets[1].stack.as_deref(), Some("Stack 0"));
    }

    #[test]
    fn test_pivot_without_stacked_axes() {
        let spec = request("bar(group: Owner, value: CaseCount, by: Status, stacked: false)");
        let config = build_chart(&spec, &owner_rows(), FixedPalette::category10());
        assert!(!config.is_stacked());
        assert_eq!(config.data.datasets.len(), 2);
    }

    #[test]
    fn test_missing_field_reads_null() {
        let spec = request("bar(group: Priority, value: CaseCount)");
        let config = build_chart(&spec, &status_rows(), FixedPalette::category10());
        assert_eq!(config.data.labels, vec!["-", "-"]);
    }

    #[test]
    fn test_render_request_svg() {
        let spec = request(r#"pie(group: Status, value: CaseCount) | labs(title: "Status")"#);
        let options = RenderOptions {
            width: 400,
            height: 300,
            format: OutputFormat::Svg,
        };
        let bytes = render_request(&spec, &status_rows(), FixedPalette::category10(), &options).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_render_request_empty_rows() {
        let spec = request("bar(group: Status, value: CaseCount)");
        let result = render_request(&spec, &RowSet::default(), FixedPalette::category10(), &RenderOptions::default());
        assert!(result.is_err());
    }
}
