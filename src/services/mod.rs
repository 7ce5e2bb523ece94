//! External collaborators
//!
//! This module contains the notifiers invoked at session boundaries,
//! including the prompt popup program.

pub mod notifier;

// Re-export main types
pub use notifier::*;
