use crate::config::GlyphConfig;
use crate::data::GeoFeature;
use crate::link::{LinkReport, Lookup, StatIndex};
use crate::stats::{normalize, prepare, select, Element, Record, Scale, ScaleKind};
use std::collections::HashSet;

/// Linked statistics for one indicator
#[derive(Clone, Debug)]
pub struct Layer {
    pub element: Element,
    pub index: StatIndex,
    /// Glyph anchor (lon, lat) per stat, in index order
    pub anchors: Vec<Option<(f64, f64)>>,
    pub report: LinkReport,
}

impl Layer {
    /// Normalize one indicator and join it to the geometry.
    ///
    /// Only countries that have geometry are kept; the report still lists
    /// the ones that were dropped.
    fn build(records: &[Record], features: &[GeoFeature], element: Element, years: &[i32]) -> Self {
        let known: HashSet<String> = features.iter().map(|f| f.name.clone()).collect();
        let dropped: Vec<String> = normalize(&select(records, element, years, None))
            .into_iter()
            .map(|s| s.name)
            .filter(|name| !known.contains(name))
            .collect();

        let index = StatIndex::new(prepare(records, element, years, Some(&known)));
        let mut report = LinkReport::build(features, &index);
        report.stats_without_features = dropped;

        if !report.stats_without_features.is_empty() {
            tracing::warn!(
                element = element.label(),
                names = ?report.stats_without_features,
                "statistics without matching geometry"
            );
        }

        let anchors = report.anchors(features, &index);
        Self {
            element,
            index,
            anchors,
            report,
        }
    }
}

/// Everything derived from the loaded inputs, built once and shared by reference
#[derive(Clone, Debug)]
pub struct RenderContext {
    /// Years of interest, newest first
    pub years: [i32; 2],
    pub area: Layer,
    pub production: Layer,
    pub yields: Layer,
    pub circle_scale: Scale,
    pub bar_scale: Scale,
    /// Maps a yield to a pictogram glyph count
    pub yield_scale: Scale,
}

/// What the tooltip shows for one country
#[derive(Clone, Copy, Debug)]
pub struct Tooltip<'a> {
    pub name: &'a str,
    pub area: Lookup<'a>,
    pub production: Lookup<'a>,
    pub yields: Lookup<'a>,
}

impl Tooltip<'_> {
    /// No statistics of any kind for this country
    pub fn is_no_data(&self) -> bool {
        [self.area, self.production, self.yields]
            .iter()
            .all(|l| matches!(l, Lookup::NoData))
    }
}

impl RenderContext {
    pub fn build(records: &[Record], features: &[GeoFeature], years: [i32; 2], glyphs: &GlyphConfig) -> Self {
        let area = Layer::build(records, features, Element::AreaHarvested, &years);
        let production = Layer::build(records, features, Element::Production, &years);
        let yields = Layer::build(records, features, Element::Yield, &years);

        let circle_scale = Scale::fit(ScaleKind::Sqrt, area.index.stats(), glyphs.circle_range);
        let bar_scale = Scale::fit(ScaleKind::Linear, production.index.stats(), glyphs.bar_range);
        let max_yield = Scale::fit(ScaleKind::Linear, yields.index.stats(), (0.0, 0.0)).domain.1;
        // All-zero yields still need a non-degenerate domain so that 0 maps to no glyphs
        let yield_max = if max_yield > 0.0 { max_yield } else { 1.0 };
        let yield_scale = Scale::linear((0.0, yield_max), (0.0, glyphs.yield_steps as f64));

        tracing::info!(
            area = area.index.len(),
            production = production.index.len(),
            yields = yields.index.len(),
            "render context ready"
        );

        Self {
            years,
            area,
            production,
            yields,
            circle_scale,
            bar_scale,
            yield_scale,
        }
    }

    pub fn recent_year(&self) -> i32 {
        self.years[0]
    }

    pub fn earlier_year(&self) -> i32 {
        self.years[1]
    }

    pub fn tooltip_for<'a>(&'a self, name: &'a str) -> Tooltip<'a> {
        Tooltip {
            name,
            area: self.area.index.lookup(name),
            production: self.production.index.lookup(name),
            yields: self.yields.index.lookup(name),
        }
    }
}
