use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::config::Palette;
use crate::context::{RenderContext, Tooltip};
use crate::link::Lookup;
use crate::map::MapLayers;
use crate::stats::{Element, YearLookup};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const AREA_SYMBOL: &str = "●";
const PROD_SYMBOL: &str = "▮";
const YIELD_SYMBOL: &str = "◆";

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let inner = render_map(frame, app, chunks[0]);
    render_tooltip(frame, app, inner);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let title = format!(
        " Cereals in Africa, {} vs {} ",
        app.context.earlier_year(),
        app.context.recent_year()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.context,
        app.hovered,
        app.progress(),
    );

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(
        MapWidget {
            layers,
            palette: app.palette,
            cursor_pos,
        },
        inner,
    );
    inner
}

/// Custom widget that renders braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    palette: Palette,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                if let Some(ch) = canvas.cell(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        // Back to front: outlines, hovered country, recent glyphs, earlier glyphs on top
        Self::render_layer(&self.layers.outlines, p.outline, area, buf);
        Self::render_layer(&self.layers.highlight, p.highlight, area, buf);
        Self::render_layer(&self.layers.area_recent, p.area_recent, area, buf);
        Self::render_layer(&self.layers.area_earlier, p.area_earlier, area, buf);
        Self::render_layer(&self.layers.prod_recent, p.prod_recent, area, buf);
        Self::render_layer(&self.layers.prod_earlier, p.prod_earlier, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)].set_char(ch).set_style(label_style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

/// Format like a locale-aware number: thousands separators, up to 3 decimals
pub fn format_value(value: f64) -> String {
    // Past u64 the integer part cannot be grouped
    if !value.is_finite() || value.abs() >= u64::MAX as f64 {
        return format!("{}", value);
    }
    let rounded = (value * 1000.0).round() / 1000.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs = rounded.abs();
    let int_part = abs.trunc() as u64;
    let frac = format!("{:.3}", abs.fract());
    let frac = frac.trim_start_matches('0').trim_end_matches('0').trim_end_matches('.');

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac)
}

/// One `YEAR: VALUE UNIT` entry per year of interest
fn year_lines(
    lookup: Lookup<'_>,
    element: Element,
    symbol: &'static str,
    colors: [Color; 2],
    ctx: &RenderContext,
    pictogram: Option<u32>,
) -> Vec<Line<'static>> {
    let label = Span::styled(element.label().to_string(), Style::default().add_modifier(Modifier::BOLD));
    let Some(stat) = lookup.stat() else {
        return vec![Line::from(vec![label, Span::raw(": no data")])];
    };

    let mut lines = vec![Line::from(label)];
    for (year, color) in ctx.years.into_iter().zip(colors) {
        let mut spans = vec![
            Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
            Span::raw(format!("{}: ", year)),
        ];
        match stat.value_for(year) {
            YearLookup::Single(v) => {
                spans.push(Span::raw(format!("{} {}", format_value(v), stat.unit)));
                if let Some(steps) = pictogram {
                    let count = ctx.yield_scale.map(v).map_or(0, |n| n.round() as u32).min(steps);
                    if count > 0 {
                        spans.push(Span::styled(
                            format!(" {}", YIELD_SYMBOL.repeat(count as usize)),
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                }
            }
            YearLookup::Missing => spans.push(Span::styled("missing", Style::default().fg(Color::DarkGray))),
            YearLookup::Conflicting(values) => {
                let shown: Vec<String> = values.iter().map(|v| format_value(*v)).collect();
                spans.push(Span::styled(
                    format!("conflicting ({}) {}", shown.join(" / "), stat.unit),
                    Style::default().fg(Color::Red),
                ));
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Tooltip contents for a hovered country
pub fn tooltip_lines(tooltip: &Tooltip<'_>, ctx: &RenderContext, palette: &Palette, yield_steps: u32) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        tooltip.name.to_string(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];

    if tooltip.is_no_data() {
        lines.push(Line::from(Span::styled("No data", Style::default().fg(Color::DarkGray))));
        return lines;
    }

    lines.extend(year_lines(
        tooltip.area,
        Element::AreaHarvested,
        AREA_SYMBOL,
        [palette.area_recent, palette.area_earlier],
        ctx,
        None,
    ));
    lines.extend(year_lines(
        tooltip.production,
        Element::Production,
        PROD_SYMBOL,
        [palette.prod_recent, palette.prod_earlier],
        ctx,
        None,
    ));
    lines.extend(year_lines(
        tooltip.yields,
        Element::Yield,
        YIELD_SYMBOL,
        [Color::Yellow, Color::Yellow],
        ctx,
        Some(yield_steps),
    ));
    lines
}

fn render_tooltip(frame: &mut Frame, app: &App, map_area: Rect) {
    let (Some(tooltip), Some((col, row))) = (app.tooltip(), app.mouse_pos) else {
        return;
    };

    let lines = tooltip_lines(&tooltip, &app.context, &app.palette, app.yield_steps);
    let width = (lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 2).min(map_area.width);
    let height = (lines.len() as u16 + 2).min(map_area.height);

    // Right of and below the pointer, flipped when it would leave the map
    let right = map_area.x + map_area.width;
    let bottom = map_area.y + map_area.height;
    let x = if col + 2 + width <= right { col + 2 } else { col.saturating_sub(width + 1).max(map_area.x) };
    let y = if row + 1 + height <= bottom { row + 1 } else { bottom.saturating_sub(height).max(map_area.y) };
    let rect = Rect::new(x, y, width, height);

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.palette.highlight)),
        ),
        rect,
    );
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let p = &app.palette;
    let (recent, earlier) = (app.context.recent_year(), app.context.earlier_year());
    let dim = Style::default().fg(Color::DarkGray);

    let status = Line::from(vec![
        Span::styled(format!(" {} ", AREA_SYMBOL), Style::default().fg(p.area_earlier)),
        Span::styled(format!("{} ", earlier), dim),
        Span::styled(format!("{} ", AREA_SYMBOL), Style::default().fg(p.area_recent)),
        Span::styled(format!("{} area ", recent), dim),
        Span::styled(format!("{} ", PROD_SYMBOL), Style::default().fg(p.prod_earlier)),
        Span::styled(format!("{} ", earlier), dim),
        Span::styled(format!("{} ", PROD_SYMBOL), Style::default().fg(p.prod_recent)),
        Span::styled(format!("{} production ", recent), dim),
        Span::styled("| Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", dim),
        toggle_span(settings.show_area, "[A]rea ", "[a]rea "),
        toggle_span(settings.show_production, "[P]rod ", "[p]rod "),
        toggle_span(settings.show_outlines, "[O]utline ", "[o]utline "),
        toggle_span(settings.show_labels, "[L]abels ", "[L]abels "),
        Span::styled("| hjkl:pan +/-:zoom r:reset q:quit", dim),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
