use crate::chart::{ChartConfig, ChartKind, Dataset};
use crate::palette::{FixedPalette, Rgb};
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use tracing::debug;

const FONT: &str = "sans-serif";
const BAR_WIDTH: f64 = 0.8;

/// Rasterise a chart config to PNG or SVG bytes
pub fn render_chart(config: &ChartConfig, title: Option<&str>, options: &RenderOptions) -> Result<Vec<u8>> {
    debug!(kind = %config.kind, width = options.width, height = options.height, "rendering chart");
    if options.width == 0 || options.height == 0 {
        bail!("Image size must be non-zero, got {}x{}", options.width, options.height);
    }
    match options.format {
        OutputFormat::Png => render_png(config, title, options.width, options.height),
        OutputFormat::Svg => render_svg(config, title, options.width, options.height),
    }
}

fn render_png(config: &ChartConfig, title: Option<&str>, width: u32, height: u32) -> Result<Vec<u8>> {
    let size = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| anyhow!("Image size {}x{} is too large", width, height))?;
    let mut buffer = vec![0u8; size];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, config, title)?;
    }

    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(&buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode PNG")?;
    Ok(png_bytes)
}

fn render_svg(config: &ChartConfig, title: Option<&str>, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, config, title)?;
    }
    Ok(svg.into_bytes())
}

/// plotters errors are generic over the backend; flatten them into anyhow
trait DrawResultExt<T> {
    fn draw_context(self, what: &str) -> Result<T>;
}

impl<T, E: std::fmt::Debug> DrawResultExt<T> for std::result::Result<T, E> {
    fn draw_context(self, what: &str) -> Result<T> {
        self.map_err(|e| anyhow!("Failed to {}: {:?}", what, e))
    }
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    config: &ChartConfig,
    title: Option<&str>,
) -> Result<()> {
    if config.data.labels.is_empty() {
        bail!("Cannot render chart with no data");
    }

    root.fill(&WHITE).draw_context("fill background")?;

    match &config.kind {
        ChartKind::Bar => draw_bars(root, config, title, false)?,
        ChartKind::HorizontalBar => draw_bars(root, config, title, true)?,
        ChartKind::Doughnut | ChartKind::Pie => draw_wedges(root, config, title)?,
        ChartKind::Other(name) => bail!("Cannot render chart type '{}'", name),
    }

    root.present().draw_context("present drawing")?;
    Ok(())
}

/// Bars grouped side by side, or stacked when the config stacks its axes.
/// Horizontal bars put categories on the y axis.
fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    config: &ChartConfig,
    title: Option<&str>,
    horizontal: bool,
) -> Result<()> {
    let labels = &config.data.labels;
    let n = labels.len();
    let stacked = config.is_stacked();
    let series: Vec<Vec<f64>> = config.data.datasets.iter().map(|d| values(d, n)).collect();
    let (lo, hi) = value_range(&series, n, stacked)?;

    // Categories sit on integer positions so the mesh ticks line up with bars
    let cat_range = -0.5..(n as f64 - 0.5);
    let (x_range, y_range) = if horizontal { (lo..hi, cat_range) } else { (cat_range, lo..hi) };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title.unwrap_or(""), (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(if horizontal { 120 } else { 50 })
        .build_cartesian_2d(x_range, y_range)
        .draw_context("build chart")?;

    let category_label = |v: &f64| -> String {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    };

    let mut mesh = chart.configure_mesh();
    if horizontal {
        mesh.y_labels(n).y_label_formatter(&category_label);
    } else {
        mesh.x_labels(n).x_label_formatter(&category_label);
    }
    mesh.draw().draw_context("draw mesh")?;

    let fallback = FixedPalette::category10();
    let place = |cat: f64, val: f64| if horizontal { (val, cat) } else { (cat, val) };
    let slot = BAR_WIDTH / series.len().max(1) as f64;
    let mut offsets = vec![0.0; n];

    for (s, (dataset, values)) in config.data.datasets.iter().zip(&series).enumerate() {
        let rects: Vec<Rectangle<(f64, f64)>> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let center = i as f64;
                let (c0, c1, v0, v1) = if stacked {
                    let base = offsets[i];
                    offsets[i] += v;
                    (center - BAR_WIDTH / 2.0, center + BAR_WIDTH / 2.0, base, base + v)
                } else {
                    let left = center - BAR_WIDTH / 2.0 + s as f64 * slot;
                    (left, left + slot, 0.0, v)
                };
                let color = point_color(dataset, i, fallback.get(s));
                Rectangle::new([place(c0, v0), place(c1, v1)], color.filled())
            })
            .collect();

        let legend_color = point_color(dataset, 0, fallback.get(s));
        chart
            .draw_series(rects)
            .draw_context("draw bars")?
            .label(dataset.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], legend_color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .draw_context("draw legend")?;

    Ok(())
}

/// Pie or doughnut from the first dataset, legend on the right
fn draw_wedges<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    config: &ChartConfig,
    title: Option<&str>,
) -> Result<()> {
    let dataset = config
        .data
        .datasets
        .first()
        .ok_or_else(|| anyhow!("Cannot render {} chart without a dataset", config.kind))?;
    let labels = &config.data.labels;
    let values: Vec<f64> = values(dataset, labels.len()).into_iter().map(|v| v.max(0.0)).collect();
    let total: f64 = values.iter().sum();
    if !total.is_finite() {
        bail!("Cannot render {} chart with non-finite values", config.kind);
    }
    if total <= 0.0 {
        bail!("Cannot render {} chart with a zero total", config.kind);
    }

    let area = match title {
        Some(t) => root.titled(t, (FONT, 20).into_font()).draw_context("draw caption")?,
        None => root.clone(),
    };
    let (w, _) = area.dim_in_pixel();
    let (pie_area, legend_area) = area.split_horizontally((w as i32) * 7 / 10);

    let (pw, ph) = pie_area.dim_in_pixel();
    let center = ((pw / 2) as i32, (ph / 2) as i32);
    let radius = pw.min(ph) as f64 * 0.4;
    let fallback = FixedPalette::category10();

    // chart.js starts at twelve o'clock and sweeps clockwise
    let mut angle = -PI / 2.0;
    for (i, &v) in values.iter().enumerate() {
        let sweep = v / total * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((sweep.to_degrees()).ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for k in 0..=steps {
            let a = angle + sweep * k as f64 / steps as f64;
            points.push((
                center.0 + (radius * a.cos()).round() as i32,
                center.1 + (radius * a.sin()).round() as i32,
            ));
        }
        let color = point_color(dataset, i, fallback.get(i));
        pie_area
            .draw(&Polygon::new(points, color.filled()))
            .draw_context("draw wedge")?;
        angle += sweep;
    }

    let cutout = config.options.cutout_percentage.unwrap_or(0);
    if cutout > 0 {
        let inner = (radius * cutout as f64 / 100.0).round() as i32;
        pie_area
            .draw(&Circle::new(center, inner, WHITE.filled()))
            .draw_context("draw cutout")?;
    }

    for (i, label) in labels.iter().enumerate() {
        let y = 20 + i as i32 * 20;
        let color = point_color(dataset, i, fallback.get(i));
        legend_area
            .draw(&Rectangle::new([(10, y), (24, y + 14)], color.filled()))
            .draw_context("draw legend")?;
        legend_area
            .draw(&Text::new(label.clone(), (30, y), (FONT, 14).into_font()))
            .draw_context("draw legend")?;
    }

    Ok(())
}

/// Dataset values padded or truncated to the label count; gaps become 0
fn values(dataset: &Dataset, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| dataset.data.get(i).copied().flatten().unwrap_or(0.0))
        .collect()
}

/// Value axis extent, always including 0, with 5% headroom.
/// Fails on infinite or NaN values, which have no drawable extent.
fn value_range(series: &[Vec<f64>], n: usize, stacked: bool) -> Result<(f64, f64)> {
    if series.iter().flatten().any(|v| !v.is_finite()) {
        bail!("Cannot render chart with non-finite values");
    }

    let mut min: f64 = 0.0;
    let mut max: f64 = 0.0;

    if stacked {
        for i in 0..n {
            let sum: f64 = series.iter().map(|s| s[i]).sum();
            max = max.max(sum);
            min = min.min(sum);
        }
    } else {
        for v in series.iter().flatten() {
            max = max.max(*v);
            min = min.min(*v);
        }
    }

    if !(min.is_finite() && max.is_finite()) {
        bail!("Cannot render chart: stacked values overflow");
    }
    if min == max {
        return Ok((0.0, 1.0));
    }
    let padding = (max - min) * 0.05;
    Ok((if min < 0.0 { min - padding } else { min }, max + padding))
}

fn point_color(dataset: &Dataset, idx: usize, fallback: Rgb) -> RGBColor {
    let rgb = dataset
        .background_color
        .at(idx)
        .and_then(|c| c.parse::<Rgb>().ok())
        .unwrap_or(fallback);
    RGBColor(rgb.r, rgb.g, rgb.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{base_config, BackgroundColor, ChartData};

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn dataset(label: &str, data: Vec<f64>, color: BackgroundColor) -> Dataset {
        Dataset {
            label: label.to_string(),
            data: data.into_iter().map(Some).collect(),
            background_color: color,
            stack: None,
        }
    }

    fn config(kind: ChartKind, stacked: bool, labels: &[&str], datasets: Vec<Dataset>) -> ChartConfig {
        base_config(kind, stacked).with_data(ChartData {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            datasets,
        })
    }

    fn small() -> RenderOptions {
        RenderOptions { width: 320, height: 240, format: OutputFormat::Png }
    }

    #[test]
    fn test_value_range_includes_zero() {
        assert_eq!(value_range(&[vec![2.0, 4.0]], 2, false).unwrap(), (0.0, 4.2));
        assert_eq!(value_range(&[vec![0.0]], 1, false).unwrap(), (0.0, 1.0));
        let (lo, hi) = value_range(&[vec![-2.0, 2.0]], 2, false).unwrap();
        assert!(lo < -2.0 && hi > 2.0);
    }

    #[test]
    fn test_value_range_stacked_sums() {
        let (_, hi) = value_range(&[vec![1.0, 2.0], vec![5.0, 0.0]], 2, true).unwrap();
        assert!((hi - 6.3).abs() < 1e-9);
    }

    #[test]
    fn test_value_range_rejects_non_finite() {
        assert!(value_range(&[vec![f64::INFINITY, 2.0]], 2, false).is_err());
        assert!(value_range(&[vec![f64::NAN]], 1, true).is_err());
        assert!(value_range(&[vec![f64::MAX], vec![f64::MAX]], 1, true).is_err());
    }

    #[test]
    fn test_render_infinite_bar_is_error() {
        let c = config(
            ChartKind::Bar,
            false,
            &["New", "Open"],
            vec![dataset("Cases", vec![f64::INFINITY, 2.0], BackgroundColor::PerPoint(vec![]))],
        );
        let err = render_chart(&c, None, &small()).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_render_csv_infinity_as_gap() {
        use crate::csv_reader::read_rows;
        use crate::palette::FixedPalette;
        use crate::reshape::unstacked_data;

        let rows = read_rows("Status,CaseCount\nNew,inf\nOpen,2\n".as_bytes()).unwrap();
        let data = unstacked_data(&rows.rows, "Status", "CaseCount", "Cases", FixedPalette::category10());
        assert_eq!(data.datasets[0].data, vec![None, Some(2.0)]);

        let png = render_chart(&base_config(ChartKind::Bar, false).with_data(data), None, &small()).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_zero_size_is_error() {
        let c = config(
            ChartKind::Bar,
            false,
            &["New"],
            vec![dataset("Cases", vec![1.0], BackgroundColor::PerPoint(vec![]))],
        );
        let options = RenderOptions { width: 0, height: 240, format: OutputFormat::Png };
        let err = render_chart(&c, None, &options).unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn test_render_oversized_png_is_error() {
        let c = config(
            ChartKind::Bar,
            false,
            &["New"],
            vec![dataset("Cases", vec![1.0], BackgroundColor::PerPoint(vec![]))],
        );
        let options = RenderOptions { width: u32::MAX, height: u32::MAX, format: OutputFormat::Png };
        let err = render_chart(&c, None, &options).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_values_fill_gaps() {
        let d = Dataset {
            label: "x".into(),
            data: vec![Some(1.0), None],
            background_color: BackgroundColor::Single("rgb(0,0,0)".into()),
            stack: None,
        };
        assert_eq!(values(&d, 3), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_point_color_fallback() {
        let d = dataset("x", vec![1.0], BackgroundColor::PerPoint(vec!["rgb(9,8,7)".into()]));
        assert_eq!(point_color(&d, 0, Rgb::new(0, 0, 0)), RGBColor(9, 8, 7));
        assert_eq!(point_color(&d, 1, Rgb::new(1, 2, 3)), RGBColor(1, 2, 3));
    }

    #[test]
    fn test_render_bar_png() {
        let c = config(
            ChartKind::Bar,
            false,
            &["New", "Open"],
            vec![dataset("Cases", vec![3.0, 5.0], BackgroundColor::Single("rgb(54,162,235)".into()))],
        );
        let png = render_chart(&c, Some("Open Cases"), &small()).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_stacked_horizontal_png() {
        let c = config(
            ChartKind::HorizontalBar,
            true,
            &["Ana", "Bo"],
            vec![
                dataset("New", vec![1.0, 2.0], BackgroundColor::Single("rgb(255,0,0)".into())),
                dataset("Open", vec![5.0, 0.0], BackgroundColor::Single("rgb(0,0,255)".into())),
            ],
        );
        let png = render_chart(&c, None, &small()).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_doughnut_svg() {
        let c = config(
            ChartKind::Doughnut,
            false,
            &["New", "Open", "Closed"],
            vec![dataset("Status", vec![1.0, 2.0, 3.0], BackgroundColor::PerPoint(vec![]))],
        );
        let options = RenderOptions { format: OutputFormat::Svg, ..small() };
        let svg = String::from_utf8(render_chart(&c, Some("By Status"), &options).unwrap()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_render_empty_is_error() {
        let c = config(ChartKind::Bar, false, &[], vec![]);
        let err = render_chart(&c, None, &small()).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn test_render_pie_zero_total_is_error() {
        let c = config(
            ChartKind::Pie,
            false,
            &["New"],
            vec![dataset("Status", vec![0.0], BackgroundColor::PerPoint(vec![]))],
        );
        let err = render_chart(&c, None, &small()).unwrap_err();
        assert!(err.to_string().contains("zero total"));
    }

    #[test]
    fn test_render_unknown_kind_is_error() {
        let c = config(
            ChartKind::Other("radar".into()),
            false,
            &["a"],
            vec![dataset("x", vec![1.0], BackgroundColor::PerPoint(vec![]))],
        );
        let err = render_chart(&c, None, &small()).unwrap_err();
        assert!(err.to_string().contains("radar"));
    }
}
