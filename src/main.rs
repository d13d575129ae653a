use anyhow::Result;

mod app;
mod backend;
mod config;
mod handler;
mod theme;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::{EventHandler, Tui};

/// Route tracing output to a log file; the terminal belongs to the TUI.
/// Only active when RUST_LOG is set.
fn init_tracing() {
    let Ok(filter) = tracing_subscriber::EnvFilter::try_from_default_env() else {
        return;
    };

    let Some(log_dir) = dirs::config_dir().map(|p| p.join("repochat")) else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }

    if let Ok(log_file) = std::fs::File::create(log_dir.join("repochat.log")) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Arc::new(log_file))
            .with_ansi(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
