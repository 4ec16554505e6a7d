//! beacon-tui: Terminal dashboard for a beacon relay
//!
//! Shows the latest state of every device as pushed over the relay's
//! live channel:
//! - Device list with online markers
//! - Detail pane for the highlighted device
//! - j/k navigation, q to quit

mod app;
mod input;
mod live;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{App, AppResult};
use crate::input::handle_key;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to file (not stdout, would interfere with TUI)
    let log_dir = dirs::cache_dir()
        .map(|d| d.join("beacon"))
        .unwrap_or_else(|| std::env::temp_dir().join("beacon"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "tui.log");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "beacon_tui=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(file_appender))
        .init();

    // Load config
    let config = beacon_core::Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        beacon_core::Config::default()
    });

    // Start live channel
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let live_handle = tokio::spawn(live::run(config.client.clone(), event_tx));

    let mut app = App::new(config, event_rx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    live_handle.abort();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Main application loop
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        // Pick up snapshots from the live channel
        app.tick();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with timeout (allows the live task to progress)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && matches!(handle_key(app, key), AppResult::Quit) {
                    return Ok(());
                }
            }
        }
    }
}
