//! Pomodorod - A work/rest interval timer driven by external triggers
//!
//! This library provides the session controller and the countdown engine,
//! plus the trigger channels and notifiers that connect them to the outside.

pub mod config;
pub mod state;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, SessionConfig};
pub use state::{Controller, ControllerEvent, Mode, SessionKind, TimerState, Trigger};
pub use services::{Notifier, NoopNotifier, PromptNotifier, RecordingNotifier};
pub use tasks::{spawn_listeners, trigger_channels, SessionOutcome, TriggerHandle};
pub use utils::signals::shutdown_signal;
