//! Background tasks module
//!
//! This module contains the countdown engine and the trigger listeners that
//! run alongside the controller.

pub mod countdown;
pub mod listeners;

// Re-export main types and functions
pub use countdown::{Countdown, SessionControls, SessionOutcome};
pub use listeners::{
    pause_resume_listener, spawn_listeners, stop_start_listener, trigger_channels, TriggerHandle,
    TriggerReceivers,
};
