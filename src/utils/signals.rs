//! OS signal handling: shutdown and control triggers

use std::io;

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook_tokio::Signals;
use tracing::{error, info};

use crate::{state::Trigger, tasks::TriggerHandle};

/// Map a control signal to the trigger it stands for
pub fn trigger_for_signal(signal: i32) -> Option<Trigger> {
    match signal {
        SIGUSR1 => Some(Trigger::StopStart),
        SIGUSR2 => Some(Trigger::PauseResume),
        _ => None,
    }
}

/// Register SIGUSR1/SIGUSR2 handlers.
///
/// Registration replaces the default action (terminate), so do this before
/// advertising the pid.
pub fn trigger_signals() -> io::Result<Signals> {
    Signals::new([SIGUSR1, SIGUSR2])
}

/// Forward control signals to the trigger channels until the listeners go away
pub async fn forward_signals(mut signals: Signals, handle: TriggerHandle) {
    while let Some(signal) = signals.next().await {
        let Some(trigger) = trigger_for_signal(signal) else {
            continue;
        };
        info!("Received signal {} ({})", signal, trigger);
        if let Err(e) = handle.fire(trigger) {
            error!("Failed to forward {}: {}", trigger, e);
            break;
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() -> io::Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
    Ok(())
}
