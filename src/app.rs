use crate::config::{AppConfig, Palette};
use crate::context::{RenderContext, Tooltip};
use crate::data::Inputs;
use crate::map::{MapRenderer, Viewport};
use anyhow::Result;

/// Braille pixels per terminal cell
const CELL_PX_X: i32 = 2;
const CELL_PX_Y: i32 = 4;

/// Convert terminal coordinates to braille pixels inside the map border
#[inline(always)]
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    // Account for border (1 cell offset); the border itself lands outside the map
    let px = (col as i32 - 1) * CELL_PX_X;
    let py = (row as i32 - 1) * CELL_PX_Y;
    (px, py)
}

/// Pixel size of the map area for a terminal size
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    // 2 for border + 1 for status bar
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * CELL_PX_X as usize, inner_height * CELL_PX_Y as usize)
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub context: RenderContext,
    pub palette: Palette,
    /// Pictogram steps for the tooltip yield row
    pub yield_steps: u32,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker and tooltip
    pub mouse_pos: Option<(u16, u16)>,
    /// Feature under the pointer
    pub hovered: Option<usize>,
    /// Frames since start, drives the grow-in animation
    pub frame: u64,
    animation_frames: u32,
}

impl App {
    pub fn new(inputs: Inputs, config: &AppConfig, width: usize, height: usize) -> Result<Self> {
        let Inputs { records, features } = inputs;
        let context = RenderContext::build(&records, &features, config.years.both(), &config.glyphs);
        let map_renderer = MapRenderer::new(features, config.glyphs.bar_width);

        let (pixel_width, pixel_height) = map_pixels(width, height);
        let viewport = initial_viewport(&map_renderer, pixel_width, pixel_height);

        Ok(Self {
            viewport,
            map_renderer,
            context,
            palette: config.palette.resolve()?,
            yield_steps: config.glyphs.yield_steps,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            hovered: None,
            frame: 0,
            animation_frames: config.glyphs.animation_frames,
        })
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Frame the loaded geometry again and restart the animation
    pub fn reset_view(&mut self) {
        self.viewport = initial_viewport(&self.map_renderer, self.viewport.width, self.viewport.height);
        self.frame = 0;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.refresh_hover();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.refresh_hover();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.refresh_hover();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
        self.refresh_hover();
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
        self.refresh_hover();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Pan by the drag distance since the last mouse event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * CELL_PX_X;
            let dy = (last_y as i32 - y as i32) * CELL_PX_Y;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Track the pointer and update which country it is over
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.refresh_hover();
    }

    /// Pointer left the terminal or map
    pub fn clear_mouse(&mut self) {
        self.mouse_pos = None;
        self.set_hovered(None);
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| cell_to_pixel(col, row))
    }

    fn refresh_hover(&mut self) {
        let hovered = self.mouse_pixel_pos().and_then(|(px, py)| {
            if px < 0 || py < 0 || px >= self.viewport.width as i32 || py >= self.viewport.height as i32 {
                return None;
            }
            let (lon, lat) = self.viewport.unproject(px, py);
            self.map_renderer.feature_at(lon, lat)
        });
        self.set_hovered(hovered);
    }

    /// Pointer-enter / pointer-leave transitions
    fn set_hovered(&mut self, hovered: Option<usize>) {
        if hovered == self.hovered {
            return;
        }
        if let Some(name) = self.hovered_name() {
            tracing::trace!(country = name, "pointer leave");
        }
        self.hovered = hovered;
        if let Some(name) = self.hovered_name() {
            tracing::trace!(country = name, "pointer enter");
        }
    }

    pub fn hovered_name(&self) -> Option<&str> {
        self.hovered
            .and_then(|idx| self.map_renderer.features.get(idx))
            .map(|f| f.name.as_str())
    }

    /// Tooltip for the country under the pointer
    pub fn tooltip(&self) -> Option<Tooltip<'_>> {
        self.hovered_name().map(|name| self.context.tooltip_for(name))
    }

    /// Glyph growth in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.animation_frames == 0 {
            return 1.0;
        }
        let t = (self.frame as f64 / self.animation_frames as f64).min(1.0);
        // Ease out
        1.0 - (1.0 - t) * (1.0 - t)
    }

    /// Advance animation state
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}

fn initial_viewport(renderer: &MapRenderer, width: usize, height: usize) -> Viewport {
    if renderer.has_data() {
        Viewport::fit_bounds(renderer.bounds(), width, height)
    } else {
        Viewport::africa(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeoFeature, Polygon};
    use crate::link::Lookup;
    use crate::stats::{Element, Record};

    fn app() -> App {
        let exterior = vec![(10.0, -10.0), (30.0, -10.0), (30.0, 10.0), (10.0, 10.0), (10.0, -10.0)];
        let inputs = Inputs {
            records: vec![
                Record::new("Congo", Element::AreaHarvested, 2016, 100.0, "ha"),
                Record::new("Congo", Element::AreaHarvested, 1980, 50.0, "ha"),
            ],
            features: vec![GeoFeature::new("Congo".to_string(), vec![Polygon { exterior, holes: vec![] }])],
        };
        App::new(inputs, &AppConfig::default(), 82, 33).unwrap()
    }

    /// Terminal cell over a geographic point
    fn cell_at(app: &App, lon: f64, lat: f64) -> (u16, u16) {
        let (px, py) = app.viewport.project(lon, lat);
        ((px / CELL_PX_X + 1) as u16, (py / CELL_PX_Y + 1) as u16)
    }

    #[test]
    fn test_viewport_sized_to_map_area() {
        let app = app();
        assert_eq!((app.viewport.width, app.viewport.height), (160, 120));
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let mut app = app();
        let (col, row) = cell_at(&app, 20.0, 0.0);
        app.set_mouse_pos(col, row);
        assert_eq!(app.hovered_name(), Some("Congo"));

        let tooltip = app.tooltip().unwrap();
        assert!(matches!(tooltip.area, Lookup::Found(_)));
        assert_eq!(tooltip.production, Lookup::NoData);

        // Border cell
        app.set_mouse_pos(0, row);
        assert_eq!(app.hovered, None);
        assert!(app.tooltip().is_none());
    }

    #[test]
    fn test_clear_mouse() {
        let mut app = app();
        let (col, row) = cell_at(&app, 20.0, 0.0);
        app.set_mouse_pos(col, row);
        app.clear_mouse();
        assert_eq!(app.hovered, None);
        assert_eq!(app.mouse_pos, None);
    }

    #[test]
    fn test_progress_eases_to_full() {
        let mut app = app();
        assert_eq!(app.progress(), 0.0);
        for _ in 0..15 {
            app.tick();
        }
        assert!(app.progress() > 0.5 && app.progress() < 1.0);
        for _ in 0..100 {
            app.tick();
        }
        assert_eq!(app.progress(), 1.0);

        app.reset_view();
        assert_eq!(app.progress(), 0.0);
    }

    #[test]
    fn test_drag_pans() {
        let mut app = app();
        let before = app.viewport.center_lon;
        app.last_mouse = Some((40, 10));
        app.handle_drag(30, 10);
        assert!(app.viewport.center_lon > before);
        app.end_drag();
        assert_eq!(app.last_mouse, None);
    }
}
