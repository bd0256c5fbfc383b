//! Turns flat aggregate rows into chart.js labels and datasets.
//!
//! Both reshapers keep the first-seen order of the source values so charts
//! stay visually stable across refreshes. Neither validates its input:
//! missing fields come through as gaps (unstacked) or zeros (stacked).

use crate::chart::{BackgroundColor, ChartData, Dataset};
use crate::data::Row;
use crate::palette::ColorSource;
use std::collections::HashMap;
use tracing::debug;

/// Stack id shared by every pivoted dataset
pub const STACK_ID: &str = "Stack 0";

/// Single series: one label, one value and one color per row, in row order.
/// Duplicate group values are kept as separate entries.
pub fn unstacked_data<C: ColorSource>(
    rows: &[Row],
    group_field: &str,
    value_field: &str,
    label: &str,
    mut colors: C,
) -> ChartData {
    let mut labels = Vec::with_capacity(rows.len());
    let mut data = Vec::with_capacity(rows.len());
    let mut background = Vec::with_capacity(rows.len());

    for row in rows {
        data.push(row.get(value_field).as_f64());
        background.push(colors.next_color().to_string());
        labels.push(row.get(group_field).to_label());
    }

    debug!(rows = rows.len(), group_field, value_field, "reshaped unstacked series");

    ChartData {
        labels,
        datasets: vec![Dataset {
            label: label.to_string(),
            data,
            background_color: BackgroundColor::PerPoint(background),
            stack: None,
        }],
    }
}

/// Pivot rows into one dataset per distinct sub-group.
///
/// Labels are the distinct group values; each dataset holds one value per
/// label, 0 where the (group, sub-group) pair never occurs. When a pair
/// occurs twice the later row wins.
pub fn stacked_data<C: ColorSource>(
    rows: &[Row],
    group_field: &str,
    sub_group_field: &str,
    value_field: &str,
    mut colors: C,
) -> ChartData {
    let mut groups: Vec<String> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut sub_groups: Vec<String> = Vec::new();
    let mut sub_group_index: HashMap<String, usize> = HashMap::new();
    let mut counts: HashMap<(usize, usize), Option<f64>> = HashMap::new();

    for row in rows {
        let g = first_seen(&mut groups, &mut group_index, row.get(group_field).to_label());
        let s = first_seen(
            &mut sub_groups,
            &mut sub_group_index,
            row.get(sub_group_field).to_label(),
        );
        counts.insert((g, s), row.get(value_field).as_f64());
    }

    let datasets = sub_groups
        .iter()
        .enumerate()
        .map(|(s, sub_group)| Dataset {
            label: sub_group.clone(),
            data: (0..groups.len())
                .map(|g| Some(counts.get(&(g, s)).copied().flatten().unwrap_or(0.0)))
                .collect(),
            background_color: BackgroundColor::Single(colors.next_color().to_string()),
            stack: Some(STACK_ID.to_string()),
        })
        .collect();

    debug!(
        rows = rows.len(),
        groups = groups.len(),
        sub_groups = sub_groups.len(),
        "pivoted stacked series"
    );

    ChartData { labels: groups, datasets }
}

/// Index of `value` in `order`, appending it on first sight
fn first_seen(order: &mut Vec<String>, index: &mut HashMap<String, usize>, value: String) -> usize {
    if let Some(&idx) = index.get(&value) {
        return idx;
    }
    let idx = order.len();
    index.insert(value.clone(), idx);
    order.push(value);
    idx
}
