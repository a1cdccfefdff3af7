use anyhow::{Context, Result};
use lesson2video::core::config::Config;
use lesson2video::core::io::{NativeStorage, Storage};
use lesson2video::services::backend::HttpBackend;
use lesson2video::services::workflow::WorkflowController;
use lesson2video::services::{session, setup};
use lesson2video::ui::terminal::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config (an explicit path may be given as the only argument)
    let loaded = match std::env::args().nth(1) {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists and points at the generator backend.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Interactive Setup (enhancement level, script location)
    setup::run_setup(&mut config)?;

    // 3. Read the teaching script
    let storage = NativeStorage::new();
    let script = storage
        .read_text(&config.script_file)
        .await
        .with_context(|| format!("Failed to read script {}", config.script_file))?;

    // 4. Connect to the backend and run the workflow
    let backend = HttpBackend::new(&config.backend)?;
    let mut controller =
        WorkflowController::new(Box::new(backend), Box::new(TerminalRenderer::new()));
    controller.load_status().await;

    session::run_session(&mut controller, &config, &script, &storage).await?;

    Ok(())
}
