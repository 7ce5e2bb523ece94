//! Pomodorod - A work/rest interval timer controlled by signals
//!
//! This is the main entry point for the pomodorod daemon.

use std::sync::Arc;
use tracing::{info, warn};

use pomodorod::{
    config::Config,
    services::{check_prompt_available, NoopNotifier, Notifier, PromptNotifier},
    state::Controller,
    tasks::{spawn_listeners, trigger_channels},
    utils::{forward_signals, shutdown_signal, trigger_signals},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let sessions = config.session_config().map_err(anyhow::Error::msg)?;

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodorod={}", config.log_level()))
        .init();

    info!("Starting pomodorod v1.0.0");
    info!("Configuration: work={:?}, rest={:?}, prompt={}",
          config.work_time, config.rest_time,
          if config.no_prompt { "disabled" } else { config.prompt_command.as_str() });

    // The prompt is best effort, a missing program only costs the popups
    let notifier: Arc<dyn Notifier> = if config.no_prompt {
        Arc::new(NoopNotifier)
    } else {
        if let Err(e) = check_prompt_available(&config.prompt_command).await {
            warn!("{}", e);
        }
        Arc::new(PromptNotifier::new(config.prompt_command.clone()))
    };

    let controller = Controller::new(sessions, notifier);

    // Register control signals before telling anyone where to send them
    let signals = trigger_signals()?;
    let (handle, receivers) = trigger_channels();
    spawn_listeners(Arc::clone(&controller), receivers);
    tokio::spawn(forward_signals(signals, handle));

    let pid = std::process::id();
    info!("pomodorod started with pid {}. Sleeping...", pid);
    info!("Controls:");
    info!("  kill -USR1 {}  - stop the running session / start a work session", pid);
    info!("  kill -USR2 {}  - pause/resume the running session", pid);

    shutdown_signal().await?;
    info!("Shutdown signal received");

    if let Err(e) = controller.stop() {
        warn!("Failed to stop running session: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
