use anyhow::Result;
use arsyad_core::Config;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), log = %log_path.display(), "starting arsyad");

    let config = load_config()?;
    let backend = arsyad_core::backend_from_config(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, backend, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;
    exit_status(result, tui::restore())
}

/// Combine the event loop outcome with terminal teardown. Both failures are
/// logged; the loop error wins when both happen.
fn exit_status(result: Result<()>, restored: Result<()>) -> Result<()> {
    if let Err(e) = &result {
        tracing::error!("exiting with error: {e:#}");
    }
    if let Err(e) = &restored {
        tracing::error!("failed to restore terminal: {e:#}");
    }
    result.and(restored)
}

/// Load config, writing an empty template on first run so the user has a
/// file to fill in.
fn load_config() -> Result<Config> {
    let path = Config::get_config_path()?;
    if !path.exists() {
        match Config::default().save() {
            Ok(()) => tracing::info!(path = %path.display(), "wrote config template"),
            Err(e) => tracing::warn!("could not write config template: {e}"),
        }
    }
    Config::load()
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
