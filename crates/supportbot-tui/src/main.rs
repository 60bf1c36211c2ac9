mod app;
mod handler;
mod markdown;
mod tui;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use supportbot_core::Config;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "supportbot", version)]
#[command(about = "Terminal chat with the Headstarter support bot")]
struct Cli {
    /// Config file (defaults to <config dir>/supportbot/config.json)
    #[arg(long, env = "SUPPORTBOT_CONFIG")]
    config: Option<PathBuf>,
    /// Base URL of the relay, e.g. http://127.0.0.1:3000
    #[arg(short, long, env = "SUPPORTBOT_SERVER_URL")]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal belongs to the UI, so logs go to a file
    let log_dir = Config::config_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "supportbot-tui.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,supportbot_core=debug".into()),
        )
        .with_ansi(false)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let server_url = cli.server_url.unwrap_or(config.server_url);
    tracing::info!(server_url = %server_url, "starting chat client");

    // Install panic hook to restore terminal on panic
    tui::install_panic_hook();

    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&server_url, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
    }
    Ok(())
}
