use crate::braille::BrailleCanvas;
use crate::context::{Layer, RenderContext};
use crate::data::{BBox, GeoFeature, Ring};
use crate::map::geometry::{draw_circle, draw_line, draw_rect, draw_ring, fill_rect};
use crate::map::projection::Viewport;
use crate::map::spatial::FeatureGrid;
use crate::stats::{CountryStat, Scale};

/// Grid cell size in degrees for hover hit-testing
const GRID_CELL_DEGREES: f64 = 5.0;

/// Display settings for map layers
#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_area: bool,
    pub show_production: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_area: true,
            show_production: true,
            show_labels: false,
        }
    }
}

/// Rendered canvases, back to front, plus text labels in character cells
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    pub highlight: BrailleCanvas,
    pub area_recent: BrailleCanvas,
    pub area_earlier: BrailleCanvas,
    pub prod_recent: BrailleCanvas,
    pub prod_earlier: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        let blank = BrailleCanvas::new(width, height);
        Self {
            outlines: blank.clone(),
            highlight: blank.clone(),
            area_recent: blank.clone(),
            area_earlier: blank.clone(),
            prod_recent: blank.clone(),
            prod_earlier: blank,
            labels: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
enum Glyph {
    Circle,
    Bar { width: i32 },
}

/// Filled or outline-only
#[derive(Clone, Copy, Debug, PartialEq)]
enum Fill {
    Solid,
    Hollow,
}

/// Scaled lengths for the two years of one country
#[derive(Clone, Copy, Debug, PartialEq)]
struct GlyphPair {
    recent: Option<f64>,
    earlier: Option<(f64, Fill)>,
}

impl GlyphPair {
    /// The earlier glyph is drawn over the recent one, hollow when it is larger
    fn for_stat(stat: &CountryStat, years: [i32; 2], scale: &Scale) -> Self {
        let recent_value = stat.value_for(years[0]).single();
        let earlier_value = stat.value_for(years[1]).single();

        let fill = match (recent_value, earlier_value) {
            (Some(r), Some(e)) if e > r => Fill::Hollow,
            _ => Fill::Solid,
        };

        Self {
            recent: recent_value.and_then(|v| scale.map(v)),
            earlier: earlier_value.and_then(|v| scale.map(v)).map(|len| (len, fill)),
        }
    }
}

/// Map renderer holding the country outlines
pub struct MapRenderer {
    pub features: Vec<GeoFeature>,
    grid: FeatureGrid,
    pub settings: DisplaySettings,
    pub bar_width: i32,
}

impl MapRenderer {
    pub fn new(features: Vec<GeoFeature>, bar_width: i32) -> Self {
        let grid = FeatureGrid::build(&features, GRID_CELL_DEGREES);
        Self {
            features,
            grid,
            settings: DisplaySettings::default(),
            bar_width: bar_width.max(1),
        }
    }

    /// Check if any geometry is loaded
    pub fn has_data(&self) -> bool {
        !self.features.is_empty()
    }

    /// Toggle area harvested circles
    pub fn toggle_area(&mut self) {
        self.settings.show_area = !self.settings.show_area;
    }

    /// Toggle production bars
    pub fn toggle_production(&mut self) {
        self.settings.show_production = !self.settings.show_production;
    }

    /// Toggle country outlines
    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }

    /// Toggle country name labels
    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Union of all feature bounding boxes
    pub fn bounds(&self) -> BBox {
        self.features.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |acc, f| {
                (
                    acc.0.min(f.bbox.0),
                    acc.1.min(f.bbox.1),
                    acc.2.max(f.bbox.2),
                    acc.3.max(f.bbox.3),
                )
            },
        )
    }

    /// Index of the country under a geographic point
    pub fn feature_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.grid
            .candidates(lon, lat)
            .iter()
            .copied()
            .find(|&idx| self.features[idx].contains(lon, lat))
    }

    /// Render outlines and glyphs. `progress` in [0, 1] scales glyph size for the grow-in animation.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        ctx: &RenderContext,
        hovered: Option<usize>,
        progress: f64,
    ) -> MapLayers {
        let mut layers = MapLayers::new(width, height);
        let progress = progress.clamp(0.0, 1.0);

        if self.settings.show_outlines {
            for ring in self.features.iter().flat_map(GeoFeature::rings) {
                draw_ring_path(&mut layers.outlines, ring, viewport);
            }
        }

        if let Some(feature) = hovered.and_then(|idx| self.features.get(idx)) {
            for ring in feature.rings() {
                draw_ring_path(&mut layers.highlight, ring, viewport);
            }
        }

        if self.settings.show_area {
            draw_glyphs(
                (&mut layers.area_recent, &mut layers.area_earlier),
                &ctx.area,
                ctx,
                &ctx.circle_scale,
                Glyph::Circle,
                viewport,
                progress,
            );
        }

        if self.settings.show_production {
            draw_glyphs(
                (&mut layers.prod_recent, &mut layers.prod_earlier),
                &ctx.production,
                ctx,
                &ctx.bar_scale,
                Glyph::Bar { width: self.bar_width },
                viewport,
                progress,
            );
        }

        if self.settings.show_labels {
            for feature in &self.features {
                let (px, py) = viewport.project(feature.centroid.0, feature.centroid.1);
                if viewport.is_visible(px, py) && px >= 0 && py >= 0 {
                    // Character cell to the right of the glyphs
                    let char_x = (px / 2) as u16;
                    let char_y = (py / 4) as u16;
                    if let Some(label_x) = char_x.checked_add(2) {
                        layers.labels.push((label_x, char_y, feature.name.clone()));
                    }
                }
            }
        }

        layers
    }
}

/// Draw a closed ring with viewport culling
fn draw_ring_path(canvas: &mut BrailleCanvas, ring: &Ring, viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in ring {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

fn draw_glyphs(
    (recent_canvas, earlier_canvas): (&mut BrailleCanvas, &mut BrailleCanvas),
    layer: &Layer,
    ctx: &RenderContext,
    scale: &Scale,
    glyph: Glyph,
    viewport: &Viewport,
    progress: f64,
) {
    for (stat, anchor) in layer.index.stats().iter().zip(&layer.anchors) {
        let Some((lon, lat)) = *anchor else { continue };
        let (px, py) = viewport.project(lon, lat);
        if !viewport.is_visible(px, py) {
            continue;
        }

        let pair = GlyphPair::for_stat(stat, ctx.years, scale);
        if let Some(len) = pair.recent {
            draw_glyph(recent_canvas, glyph, px, py, len * progress, Fill::Solid);
        }
        if let Some((len, fill)) = pair.earlier {
            draw_glyph(earlier_canvas, glyph, px, py, len * progress, fill);
        }
    }
}

fn draw_glyph(canvas: &mut BrailleCanvas, glyph: Glyph, px: i32, py: i32, len: f64, fill: Fill) {
    let len = len.round() as i32;
    if len <= 0 {
        return;
    }
    match (glyph, fill) {
        (Glyph::Circle, Fill::Solid) => draw_circle(canvas, px, py, len),
        (Glyph::Circle, Fill::Hollow) => draw_ring(canvas, px, py, len),
        // Bars grow upward from the anchor
        (Glyph::Bar { width }, Fill::Solid) => fill_rect(canvas, px - width / 2, py - len, width, len),
        (Glyph::Bar { width }, Fill::Hollow) => draw_rect(canvas, px - width / 2, py - len, width, len),
    }
}
