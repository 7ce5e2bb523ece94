//! Utility functions module
//!
//! This module contains OS signal plumbing used by the binary.

pub mod signals;

// Re-export main functions
pub use signals::{forward_signals, shutdown_signal, trigger_signals};
