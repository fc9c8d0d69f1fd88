use crate::report::EquityPoint;
use rust_decimal::prelude::ToPrimitive;

/// Markup returned instead of a chart when there is nothing to plot.
pub const EMPTY_CHART_PLACEHOLDER: &str = r#"<div class="report-empty">No equity data yet</div>"#;

/// Renders an equity curve as a single-path SVG line chart.
///
/// Points are spread evenly across `width`. The Y range always includes 0 and 1,
/// so a flat or all-negative curve still has a visible reference.
pub fn build_equity_curve_svg(points: &[EquityPoint], width: u32, height: u32) -> String {
    if points.is_empty() {
        return EMPTY_CHART_PLACEHOLDER.to_string();
    }

    let values: Vec<f64> = points.iter().map(|p| p.value.to_f64().unwrap_or(0.0)).collect();
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(1.0_f64, f64::max);
    let range = if max - min == 0.0 { 1.0 } else { max - min };

    let width_f = f64::from(width);
    let height_f = f64::from(height);
    let step = width_f / (values.len().saturating_sub(1).max(1)) as f64;

    let path = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let x = index as f64 * step;
            let y = height_f - ((value - min) / range) * height_f;
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{command}{x},{y}")
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" class="report-chart"><path d="{path}" fill="none" stroke="currentColor" stroke-width="2" /></svg>"#
    )
}
