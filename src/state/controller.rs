//! Session controller: owns the mode and drives the countdown across sessions

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::{Mode, SessionKind, TimerState, Trigger};
use crate::{
    config::SessionConfig,
    services::Notifier,
    tasks::{Countdown, SessionControls, SessionOutcome},
};

/// Something observable the controller did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ModeChanged { from: Mode, to: Mode },
    Notified { from: SessionKind, to: SessionKind },
    Ignored(Trigger),
}

/// The running session's side of the control channels
#[derive(Debug)]
struct ActiveSession {
    id: u64,
    stop_tx: oneshot::Sender<()>,
    pause_tx: mpsc::UnboundedSender<()>,
}

#[derive(Debug)]
struct ControllerState {
    mode: Mode,
    /// Only meaningful while idle; decides what a start resumes with
    previous_mode: Mode,
    active: Option<ActiveSession>,
    next_session_id: u64,
}

/// Owns `mode`/`previous_mode` behind a single lock.
///
/// Every external trigger and every session completion is handled while
/// holding that lock, so two triggers arriving together are applied one after
/// the other. The countdown itself runs as its own task and never takes it.
pub struct Controller {
    config: SessionConfig,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ControllerState>,
    /// Channel for mode transitions and ignored inputs
    pub event_tx: broadcast::Sender<ControllerEvent>,
    /// Channel for countdown updates
    timer_tx: Arc<watch::Sender<TimerState>>,
    /// Keep the receiver alive to prevent channel closure
    _timer_rx: watch::Receiver<TimerState>,
}

impl Controller {
    /// Create an idle controller
    pub fn new(config: SessionConfig, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(100);
        let (timer_tx, timer_rx) = watch::channel(TimerState::new());

        Arc::new(Self {
            config,
            notifier,
            state: Mutex::new(ControllerState {
                mode: Mode::Idle,
                previous_mode: Mode::Rest,
                active: None,
                next_session_id: 1,
            }),
            event_tx,
            timer_tx: Arc::new(timer_tx),
            _timer_rx: timer_rx,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ControllerState>, String> {
        self.state
            .lock()
            .map_err(|e| format!("Failed to lock controller state: {}", e))
    }

    fn publish(&self, event: ControllerEvent) {
        // No subscribers is the normal case outside tests
        let _ = self.event_tx.send(event);
    }

    /// Handle the stop/start trigger: stop a running session, or start a
    /// work session when idle.
    pub fn handle_stop_start(self: &Arc<Self>) -> Result<Mode, String> {
        let mut state = self.lock()?;
        match state.mode {
            Mode::Work | Mode::Rest => self.stop_locked(&mut state),
            Mode::Idle => self.start_locked(&mut state),
        }
        Ok(state.mode)
    }

    /// Handle the pause/resume trigger by forwarding it to the running session
    pub fn handle_pause_resume(&self) -> Result<Mode, String> {
        let state = self.lock()?;
        match (&state.active, state.mode) {
            (Some(active), Mode::Work | Mode::Rest) => {
                info!("Triggering pause/resume of {} session", state.mode);
                if active.pause_tx.send(()).is_err() {
                    warn!("{} session already finished, pause/resume dropped", state.mode);
                }
            }
            _ => {
                info!("Received pause/resume while idle, ignoring");
                self.publish(ControllerEvent::Ignored(Trigger::PauseResume));
            }
        }
        Ok(state.mode)
    }

    /// Start a work session; ignored unless idle
    pub fn start(self: &Arc<Self>) -> Result<Mode, String> {
        let mut state = self.lock()?;
        if state.mode.is_idle() {
            self.start_locked(&mut state);
        } else {
            info!("Received start while in {} session, ignoring", state.mode);
            self.publish(ControllerEvent::Ignored(Trigger::StopStart));
        }
        Ok(state.mode)
    }

    /// Stop the running session; ignored while idle
    pub fn stop(&self) -> Result<Mode, String> {
        let mut state = self.lock()?;
        if state.mode.is_idle() {
            info!("Received stop while idle, ignoring");
            self.publish(ControllerEvent::Ignored(Trigger::StopStart));
        } else {
            self.stop_locked(&mut state);
        }
        Ok(state.mode)
    }

    fn start_locked(self: &Arc<Self>, state: &mut ControllerState) {
        match state.previous_mode {
            Mode::Rest => self.launch(state, SessionKind::Work),
            other => invariant_violation(format!("unexpected previous mode {} while idle", other)),
        }
    }

    fn stop_locked(&self, state: &mut ControllerState) {
        let from = state.mode;
        info!("Stopping {} session", from);

        if let Some(active) = state.active.take() {
            // The countdown may have just finished on its own; nothing to stop then
            let _ = active.stop_tx.send(());
        }

        // After a stop the next start is always a work session
        state.previous_mode = Mode::Rest;
        state.mode = Mode::Idle;
        self.timer_tx.send_replace(TimerState::inactive());
        self.publish(ControllerEvent::ModeChanged { from, to: Mode::Idle });
    }

    /// Spawn a countdown for `kind` and make it the active session
    fn launch(self: &Arc<Self>, state: &mut ControllerState, kind: SessionKind) {
        let id = state.next_session_id;
        state.next_session_id += 1;

        let (stop_tx, stop) = oneshot::channel();
        let (pause_tx, pause) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        let ticks = self.config.ticks_for(self.duration_for(kind));
        let from = state.mode;
        state.mode = kind.into();
        state.active = Some(ActiveSession { id, stop_tx, pause_tx });
        self.timer_tx.send_replace(TimerState::active(id, kind, ticks, false));

        let countdown = Countdown::new(id, kind, ticks, self.config.tick, Arc::clone(&self.timer_tx));
        tokio::spawn(async move {
            let outcome = countdown.run(SessionControls { stop, pause }).await;
            let _ = done_tx.send(outcome);
        });

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            if let Ok(outcome) = done_rx.await {
                if let Err(e) = controller.session_finished(id, outcome) {
                    error!("Failed to handle end of session {}: {}", id, e);
                }
            }
        });

        info!("Mode {} -> {}", from, state.mode);
        self.publish(ControllerEvent::ModeChanged { from, to: state.mode });
    }

    /// React to a countdown ending. Completions of sessions that are no
    /// longer active are ignored.
    pub(crate) fn session_finished(self: &Arc<Self>, id: u64, outcome: SessionOutcome) -> Result<(), String> {
        if outcome == SessionOutcome::Stopped {
            debug!("Session {} ended by stop", id);
            return Ok(());
        }

        let mut state = self.lock()?;
        if state.active.as_ref().map(|active| active.id) != Some(id) {
            debug!("Ignoring stale completion of session {}", id);
            return Ok(());
        }

        let ending = match state.mode.session_kind() {
            Some(kind) => kind,
            None => invariant_violation(format!("session {} completed while idle", id)),
        };
        let next = ending.next();
        state.active = None;

        self.notifier.notify(ending, next);
        self.publish(ControllerEvent::Notified { from: ending, to: next });

        state.previous_mode = state.mode;
        self.launch(&mut state, next);
        Ok(())
    }

    fn duration_for(&self, kind: SessionKind) -> std::time::Duration {
        match kind {
            SessionKind::Work => self.config.work,
            SessionKind::Rest => self.config.rest,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Result<Mode, String> {
        self.lock().map(|state| state.mode)
    }

    /// Mode a start from idle resumes after
    pub fn previous_mode(&self) -> Result<Mode, String> {
        self.lock().map(|state| state.previous_mode)
    }

    /// Get current timer state
    pub fn timer_state(&self) -> TimerState {
        self.timer_tx.borrow().clone()
    }

    /// Watch countdown updates
    pub fn subscribe_timer(&self) -> watch::Receiver<TimerState> {
        self.timer_tx.subscribe()
    }

    /// Follow mode transitions, prompts and ignored inputs
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }
}

/// A state no external input can produce. Panics, which aborts the process
/// since both dev and release profiles set `panic = "abort"`.
fn invariant_violation(message: String) -> ! {
    error!("Controller invariant violated: {}", message);
    panic!("{}", message)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::services::RecordingNotifier;

    fn controller(work_secs: u64, rest_secs: u64) -> (Arc<Controller>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let config = SessionConfig::new(Duration::from_secs(work_secs), Duration::from_secs(rest_secs));
        (Controller::new(config, notifier.clone()), notifier)
    }

    fn drain(rx: &mut broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn completed_sessions_alternate_and_prompt() {
        let (controller, notifier) = controller(2, 1);
        let mut events = controller.subscribe();

        assert_eq!(controller.mode().unwrap(), Mode::Idle);
        assert_eq!(controller.handle_stop_start().unwrap(), Mode::Work);

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Rest);
        assert_eq!(notifier.calls(), vec![(SessionKind::Work, SessionKind::Rest)]);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Work);
        assert_eq!(
            notifier.calls(),
            vec![
                (SessionKind::Work, SessionKind::Rest),
                (SessionKind::Rest, SessionKind::Work),
            ]
        );

        assert_eq!(
            drain(&mut events),
            vec![
                ControllerEvent::ModeChanged { from: Mode::Idle, to: Mode::Work },
                ControllerEvent::Notified { from: SessionKind::Work, to: SessionKind::Rest },
                ControllerEvent::ModeChanged { from: Mode::Work, to: Mode::Rest },
                ControllerEvent::Notified { from: SessionKind::Rest, to: SessionKind::Work },
                ControllerEvent::ModeChanged { from: Mode::Rest, to: Mode::Work },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn many_cycles_never_repeat_a_kind() {
        let (controller, notifier) = controller(1, 1);
        controller.start().unwrap();

        sleep(Duration::from_millis(8500)).await;
        let calls = notifier.calls();
        assert_eq!(calls.len(), 8);
        for (from, to) in &calls {
            assert_eq!(from.next(), *to);
        }
        for pair in calls.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_remaining_and_next_start_is_work() {
        let (controller, notifier) = controller(10, 5);
        controller.handle_stop_start().unwrap();

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(controller.timer_state().remaining_ticks(), Some(7));
        assert_eq!(controller.handle_stop_start().unwrap(), Mode::Idle);
        assert_eq!(controller.previous_mode().unwrap(), Mode::Rest);
        assert!(!controller.timer_state().is_active());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Idle);
        assert!(notifier.calls().is_empty());

        assert_eq!(controller.handle_stop_start().unwrap(), Mode::Work);
        let timer = controller.timer_state();
        assert_eq!(timer.kind, Some(SessionKind::Work));
        assert_eq!(timer.remaining_ticks(), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_rest_restarts_with_work() {
        let (controller, _notifier) = controller(1, 10);
        controller.start().unwrap();

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Rest);
        assert_eq!(controller.previous_mode().unwrap(), Mode::Work);

        assert_eq!(controller.stop().unwrap(), Mode::Idle);
        assert_eq!(controller.previous_mode().unwrap(), Mode::Rest);
        assert_eq!(controller.start().unwrap(), Mode::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_while_idle_is_ignored() {
        let (controller, _notifier) = controller(2, 1);
        let mut events = controller.subscribe();

        assert_eq!(controller.handle_pause_resume().unwrap(), Mode::Idle);
        sleep(Duration::from_secs(5)).await;

        assert_eq!(controller.mode().unwrap(), Mode::Idle);
        assert!(!controller.timer_state().is_active());
        assert_eq!(drain(&mut events), vec![ControllerEvent::Ignored(Trigger::PauseResume)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_idle_and_start_while_running_are_ignored() {
        let (controller, _notifier) = controller(5, 1);
        let mut events = controller.subscribe();

        assert_eq!(controller.stop().unwrap(), Mode::Idle);
        assert_eq!(controller.start().unwrap(), Mode::Work);
        assert_eq!(controller.start().unwrap(), Mode::Work);

        assert_eq!(
            drain(&mut events),
            vec![
                ControllerEvent::Ignored(Trigger::StopStart),
                ControllerEvent::ModeChanged { from: Mode::Idle, to: Mode::Work },
                ControllerEvent::Ignored(Trigger::StopStart),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn paused_ticks_do_not_count() {
        let (controller, _notifier) = controller(5, 5);
        controller.start().unwrap();

        sleep(Duration::from_millis(2500)).await;
        controller.handle_pause_resume().unwrap();
        sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.timer_state(), TimerState::active(1, SessionKind::Work, 3, true));
        controller.handle_pause_resume().unwrap();

        sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Work);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Rest);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_completion_is_ignored() {
        let (controller, notifier) = controller(5, 5);
        controller.start().unwrap();

        controller.session_finished(999, SessionOutcome::Completed).unwrap();
        controller.session_finished(1, SessionOutcome::Stopped).unwrap();

        assert_eq!(controller.mode().unwrap(), Mode::Work);
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_after_stop_does_not_restart() {
        let (controller, notifier) = controller(5, 5);
        controller.start().unwrap();
        controller.stop().unwrap();

        controller.session_finished(1, SessionOutcome::Completed).unwrap();

        assert_eq!(controller.mode().unwrap(), Mode::Idle);
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_length_work_goes_straight_to_rest() {
        let (controller, notifier) = controller(0, 10);
        controller.start().unwrap();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.mode().unwrap(), Mode::Rest);
        assert_eq!(notifier.calls(), vec![(SessionKind::Work, SessionKind::Rest)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_on_the_final_tick_never_also_prompts() {
        let (controller, notifier) = controller(2, 5);
        let mut events = controller.subscribe();
        controller.start().unwrap();

        sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.stop().unwrap(), Mode::Idle);
        sleep(Duration::from_secs(10)).await;

        assert_eq!(controller.mode().unwrap(), Mode::Idle);
        let events = drain(&mut events);
        let work_to_idle = ControllerEvent::ModeChanged { from: Mode::Work, to: Mode::Idle };
        if notifier.calls().is_empty() {
            // Stop got there first: the work session ended stopped
            assert_eq!(
                events,
                vec![ControllerEvent::ModeChanged { from: Mode::Idle, to: Mode::Work }, work_to_idle]
            );
        } else {
            // Completion got there first: the stop hit the rest session instead
            assert_eq!(notifier.calls(), vec![(SessionKind::Work, SessionKind::Rest)]);
            assert!(!events.contains(&work_to_idle));
            assert_eq!(
                events.last(),
                Some(&ControllerEvent::ModeChanged { from: Mode::Rest, to: Mode::Idle })
            );
        }
    }

    #[test]
    #[should_panic(expected = "completed while idle")]
    fn completion_of_active_session_while_idle_panics() {
        let (controller, _notifier) = controller(5, 5);
        let (stop_tx, _stop_rx) = oneshot::channel();
        let (pause_tx, _pause_rx) = mpsc::unbounded_channel();
        controller.state.lock().unwrap().active = Some(ActiveSession { id: 7, stop_tx, pause_tx });

        let _ = controller.session_finished(7, SessionOutcome::Completed);
    }

    #[test]
    #[should_panic(expected = "unexpected previous mode")]
    fn start_with_corrupt_previous_mode_panics() {
        let (controller, _notifier) = controller(5, 5);
        controller.state.lock().unwrap().previous_mode = Mode::Work;
        let _ = controller.start();
    }
}
