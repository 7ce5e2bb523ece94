//! Trigger channels and the listener tasks that feed them to the controller

use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::state::{Controller, Trigger};

/// Pending triggers beyond this are coalesced, like repeated OS signals
const TRIGGER_BUFFER: usize = 8;

/// Sending side of the two trigger channels. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    stop_start_tx: mpsc::Sender<()>,
    pause_resume_tx: mpsc::Sender<()>,
}

/// Receiving side of the two trigger channels
#[derive(Debug)]
pub struct TriggerReceivers {
    pub stop_start: mpsc::Receiver<()>,
    pub pause_resume: mpsc::Receiver<()>,
}

/// Create a pair of trigger channels
pub fn trigger_channels() -> (TriggerHandle, TriggerReceivers) {
    let (stop_start_tx, stop_start) = mpsc::channel(TRIGGER_BUFFER);
    let (pause_resume_tx, pause_resume) = mpsc::channel(TRIGGER_BUFFER);
    (
        TriggerHandle {
            stop_start_tx,
            pause_resume_tx,
        },
        TriggerReceivers {
            stop_start,
            pause_resume,
        },
    )
}

impl TriggerHandle {
    /// Fire a trigger without waiting
    pub fn fire(&self, trigger: Trigger) -> Result<(), String> {
        let tx = match trigger {
            Trigger::StopStart => &self.stop_start_tx,
            Trigger::PauseResume => &self.pause_resume_tx,
        };
        match tx.try_send(()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(())) => {
                warn!("Too many pending {} triggers, dropping one", trigger);
                Ok(())
            }
            Err(TrySendError::Closed(())) => Err(format!("{} listener is gone", trigger)),
        }
    }

    pub fn fire_stop_start(&self) -> Result<(), String> {
        self.fire(Trigger::StopStart)
    }

    pub fn fire_pause_resume(&self) -> Result<(), String> {
        self.fire(Trigger::PauseResume)
    }
}

/// Stop a running session or start a work session for every stop/start trigger
pub async fn stop_start_listener(controller: Arc<Controller>, mut rx: mpsc::Receiver<()>) {
    info!("Starting stop/start listener");

    while rx.recv().await.is_some() {
        match controller.handle_stop_start() {
            Ok(mode) => debug!("stop/start handled, now {}", mode),
            Err(e) => error!("Failed to handle stop/start: {}", e),
        }
    }

    info!("Stop/start trigger channel closed");
}

/// Forward every pause/resume trigger to the running session
pub async fn pause_resume_listener(controller: Arc<Controller>, mut rx: mpsc::Receiver<()>) {
    info!("Starting pause/resume listener");

    while rx.recv().await.is_some() {
        match controller.handle_pause_resume() {
            Ok(mode) => debug!("pause/resume handled, now {}", mode),
            Err(e) => error!("Failed to handle pause/resume: {}", e),
        }
    }

    info!("Pause/resume trigger channel closed");
}

/// Spawn both listener tasks
pub fn spawn_listeners(
    controller: Arc<Controller>,
    receivers: TriggerReceivers,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let stop_start = tokio::spawn(stop_start_listener(Arc::clone(&controller), receivers.stop_start));
    let pause_resume = tokio::spawn(pause_resume_listener(controller, receivers.pause_resume));
    (stop_start, pause_resume)
}
