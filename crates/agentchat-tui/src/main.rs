use anyhow::Result;
use agentchat_core::Config;

mod app;
mod clipboard;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let log_path = logging::init(config.log_filter.as_deref())?;
    log::info!(
        "Starting agentchat v{} in {} mode (log: {})",
        env!("CARGO_PKG_VERSION"),
        config.mode().as_str(),
        log_path.display()
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, config).await;

    tui::restore()?;
    if let Err(e) = &result {
        log::error!("Exiting with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut tui::Tui, config: Config) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(config, events.sender());

    terminal.draw(|frame| ui::render(&mut app, frame))?;
    app.check_auth().await;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    Ok(())
}
