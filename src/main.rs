use anyhow::Result;
use std::sync::Arc;

mod app;
mod config;
mod conversation;
mod error;
mod handler;
mod logging;
mod ollama;
mod thinking;
mod tui;
mod ui;
mod worker;

use app::App;
use config::Config;
use ollama::OllamaClient;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is best effort; the chat works without a writable cache dir
    match logging::init() {
        Ok(path) => tracing::info!(log = %path.display(), "deskchat starting"),
        Err(e) => eprintln!("logging disabled: {}", e),
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config file, using defaults");
        Config::default()
    });
    tracing::info!(url = %config.ollama_url, model = %config.model, "using Ollama endpoint");

    let client = OllamaClient::new(&config.ollama_url, &config.model);
    spawn_model_probe(client.clone());

    tui::install_panic_hook();
    let mut terminal = tui::init(&config.window_title)?;
    let mut events = EventHandler::new();
    let mut app = App::new(config, Arc::new(client), events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!(turns = app.conversation.len(), "window closed");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

/// Warn in the log if the server is down or the model has not been pulled
fn spawn_model_probe(client: OllamaClient) {
    tokio::spawn(async move {
        let model = ollama::ChatModel::model(&client).to_string();
        match client.has_model(&model).await {
            Ok(true) => tracing::debug!(model = %model, "model available"),
            Ok(false) => tracing::warn!(model = %model, "model not found on server, try: ollama pull {}", model),
            Err(e) => tracing::warn!(error = %e, "Ollama not reachable, make sure it is running: ollama serve"),
        }
    });
}
