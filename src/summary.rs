use crate::context::{Layer, RenderContext};
use crate::stats::YearLookup;
use crate::ui::format_value;
use anyhow::{Context, Result};
use std::fmt::Write;

fn cell(lookup: YearLookup) -> String {
    match lookup {
        YearLookup::Single(v) => format_value(v),
        YearLookup::Missing => "-".to_string(),
        YearLookup::Conflicting(values) => format!("{} rows", values.len()),
    }
}

fn write_layer(out: &mut String, layer: &Layer, years: [i32; 2]) -> std::fmt::Result {
    writeln!(out, "{} ({} countries)", layer.element.label(), layer.index.len())?;
    if layer.index.is_empty() {
        writeln!(out, "  no rows for {} or {}", years[0], years[1])?;
    } else {
        writeln!(out, "  {:<32} {:>16} {:>16}  unit", "country", years[0], years[1])?;
    }
    for stat in layer.index.stats() {
        writeln!(
            out,
            "  {:<32} {:>16} {:>16}  {}",
            stat.name,
            cell(stat.value_for(years[0])),
            cell(stat.value_for(years[1])),
            stat.unit
        )?;
    }
    if !layer.report.stats_without_features.is_empty() {
        writeln!(out, "  without geometry: {}", layer.report.stats_without_features.join(", "))?;
    }
    if !layer.report.features_without_stats.is_empty() {
        writeln!(out, "  without data: {}", layer.report.features_without_stats.join(", "))?;
    }
    writeln!(out)
}

/// Plain-text table of the linked statistics, one section per indicator
pub fn report(ctx: &RenderContext) -> Result<String> {
    let mut out = String::new();
    for layer in [&ctx.area, &ctx.production, &ctx.yields] {
        write_layer(&mut out, layer, ctx.years)
            .with_context(|| format!("Failed to format {} table", layer.element.label()))?;
    }
    Ok(out)
}
