use anyhow::{Context, Result};
use cereal_map::app::App;
use cereal_map::config::{AppConfig, LoggingConfig};
use cereal_map::context::RenderContext;
use cereal_map::{data, summary, ui};
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Statistics table (CSV), overrides the config
    #[arg(long, value_name = "FILE", global = true)]
    table: Option<PathBuf>,

    /// Country geometry (GeoJSON or TopoJSON), overrides the config
    #[arg(long, value_name = "FILE", global = true)]
    geometry: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive map (default)
    View,
    /// Print the linked statistics as a table
    Summary,
}

fn init_logging(logging: &LoggingConfig, to_file: bool) -> Result<()> {
    let level: tracing::Level = logging
        .level
        .parse()
        .with_context(|| format!("Invalid log level: {:?}", logging.level))?;
    let builder = tracing_subscriber::fmt().with_max_level(level);

    if to_file {
        // The terminal belongs to the UI
        let file = File::create(&logging.file)
            .with_context(|| format!("Failed to create log file: {:?}", logging.file))?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(table) = cli.table {
        config.input.table = table;
    }
    if let Some(geometry) = cli.geometry {
        config.input.geometry = geometry;
    }

    let command = cli.command.unwrap_or(Commands::View);
    init_logging(&config.logging, matches!(command, Commands::View))?;

    // Nothing is drawn unless both inputs load
    let inputs = data::load_inputs(&config.input)?;

    match command {
        Commands::Summary => {
            let ctx = RenderContext::build(&inputs.records, &inputs.features, config.years.both(), &config.glyphs);
            print!("{}", summary::report(&ctx)?);
            Ok(())
        }
        Commands::View => view(inputs, &config),
    }
}

fn view(inputs: data::Inputs, config: &AppConfig) -> Result<()> {
    let mut terminal = ratatui::init();
    terminal.clear()?;

    execute!(std::io::stdout(), EnableMouseCapture, EnableFocusChange)?;

    let result = terminal
        .size()
        .map_err(anyhow::Error::from)
        .and_then(|size| App::new(inputs, config, size.width as usize, size.height as usize))
        .and_then(|mut app| run(&mut terminal, &mut app));

    // Restore the terminal even when the run loop failed
    let _ = execute!(std::io::stdout(), DisableFocusChange, DisableMouseCapture);
    ratatui::restore();

    if let Err(ref e) = result {
        tracing::error!(error = %e, "view exited with an error");
    }
    result
}

/// Handle mouse events for hover, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.set_mouse_pos(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
            app.set_mouse_pos(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Layer toggles
                    KeyCode::Char('a') | KeyCode::Char('A') => {
                        app.map_renderer.toggle_area();
                    }
                    KeyCode::Char('p') | KeyCode::Char('P') => {
                        app.map_renderer.toggle_production();
                    }
                    KeyCode::Char('o') | KeyCode::Char('O') => {
                        app.map_renderer.toggle_outlines();
                    }
                    KeyCode::Char('L') => {
                        app.map_renderer.toggle_labels();
                    }

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::FocusLost => app.clear_mouse(),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
