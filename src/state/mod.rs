//! State management module
//!
//! This module contains the controller, its modes and the countdown snapshot.

pub mod controller;
pub mod mode;
pub mod timer_state;

// Re-export main types
pub use controller::{Controller, ControllerEvent};
pub use mode::{Mode, SessionKind, Trigger};
pub use timer_state::TimerState;
