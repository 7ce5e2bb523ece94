//! Countdown engine for a single work or rest session

use std::{sync::Arc, time::Duration};

use chrono::Local;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::state::{SessionKind, TimerState};

/// How a countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The countdown reached zero on its own
    Completed,
    /// The countdown was cut short by a stop signal
    Stopped,
}

/// Per-session control inputs, created fresh for every session
#[derive(Debug)]
pub struct SessionControls {
    /// Fired (or dropped) to end the session early
    pub stop: oneshot::Receiver<()>,
    /// Each message toggles the paused flag
    pub pause: mpsc::UnboundedReceiver<()>,
}

/// A single session's countdown.
///
/// `remaining` and `paused` live here and nowhere else; the controller only
/// talks to a running countdown through its [`SessionControls`].
#[derive(Debug)]
pub struct Countdown {
    id: u64,
    kind: SessionKind,
    remaining: u64,
    paused: bool,
    tick: Duration,
    timer_tx: Arc<watch::Sender<TimerState>>,
}

impl Countdown {
    pub fn new(
        id: u64,
        kind: SessionKind,
        ticks: u64,
        tick: Duration,
        timer_tx: Arc<watch::Sender<TimerState>>,
    ) -> Self {
        Self {
            id,
            kind,
            remaining: ticks,
            paused: false,
            tick,
            timer_tx,
        }
    }

    /// Run the countdown until it completes or is stopped.
    ///
    /// Each iteration first checks for completion, then waits for the first of
    /// stop, pause/resume or tick, in that priority order.
    pub async fn run(mut self, mut controls: SessionControls) -> SessionOutcome {
        info!(
            "Starting new {} session ({} ticks, ends around {})",
            self.kind,
            self.remaining,
            self.estimated_end()
        );

        let mut interval = interval_at(Instant::now() + self.tick, self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.remaining == 0 {
                info!("{} session done", self.kind);
                self.publish(TimerState::inactive());
                return SessionOutcome::Completed;
            }

            tokio::select! {
                biased;

                _ = &mut controls.stop => {
                    info!("{} session stopped with {} ticks left", self.kind, self.remaining);
                    return SessionOutcome::Stopped;
                }

                toggle = controls.pause.recv() => {
                    if toggle.is_none() {
                        info!("{} session lost its controller, stopping", self.kind);
                        return SessionOutcome::Stopped;
                    }
                    self.paused = !self.paused;
                    if self.paused {
                        info!("{} session paused ({} ticks left)", self.kind, self.remaining);
                    } else {
                        info!("{} session resumed, ends around {}", self.kind, self.estimated_end());
                    }
                    self.publish_progress();
                }

                _ = interval.tick() => {
                    if !self.paused {
                        debug!("{} session tick ({})", self.kind, self.remaining);
                        self.remaining -= 1;
                        self.publish_progress();
                    }
                }
            }
        }
    }

    fn publish_progress(&self) {
        self.publish(TimerState::active(self.id, self.kind, self.remaining, self.paused));
    }

    /// Only overwrite the snapshot while it still belongs to this session
    fn publish(&self, state: TimerState) {
        let id = self.id;
        self.timer_tx.send_if_modified(|current| {
            if current.session_id != Some(id) {
                return false;
            }
            *current = state;
            true
        });
    }

    fn estimated_end(&self) -> String {
        let left = self.tick.saturating_mul(u32::try_from(self.remaining).unwrap_or(u32::MAX));
        match chrono::Duration::from_std(left) {
            Ok(left) => (Local::now() + left).format("%H:%M:%S").to_string(),
            Err(_) => "never".to_string(),
        }
    }
}
