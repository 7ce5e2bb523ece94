//! Session boundary notifiers

use std::{
    process::Stdio,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, info, warn};

use crate::state::SessionKind;

/// Told when one session ends and the next begins.
///
/// Notifying is fire-and-forget: implementations must not block and their
/// failures never reach the controller.
pub trait Notifier: Send + Sync {
    fn notify(&self, from: SessionKind, to: SessionKind);
}

/// Message shown at a session boundary
pub fn prompt_message(from: SessionKind, to: SessionKind) -> String {
    format!("{} ended. {} time!", from.display_name(), to.display_name())
}

/// Pops up a dmenu-style prompt at each session boundary.
///
/// At most one prompt is open at a time; boundaries reached while one is
/// still showing are skipped.
#[derive(Debug, Clone)]
pub struct PromptNotifier {
    program: String,
    open: Arc<AtomicBool>,
}

/// Marks a prompt as open until dropped
#[derive(Debug)]
struct OpenPrompt(Arc<AtomicBool>);

impl Drop for OpenPrompt {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PromptNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    fn claim(&self) -> Option<OpenPrompt> {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| OpenPrompt(Arc::clone(&self.open)))
    }

    /// Whether a prompt is currently showing
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Arguments passed to the prompt program
    pub fn prompt_args(from: SessionKind, to: SessionKind) -> Vec<String> {
        [
            "-nb", "#151515",
            "-nf", "#999999",
            "-sb", "#f00060",
            "-sf", "#000000",
            "-i",
            "-p",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .chain(std::iter::once(prompt_message(from, to)))
        .collect()
    }
}

impl Notifier for PromptNotifier {
    fn notify(&self, from: SessionKind, to: SessionKind) {
        let Some(open) = self.claim() else {
            info!("Prompt already open, skipping: {}", prompt_message(from, to));
            return;
        };
        let program = self.program.clone();
        let args = Self::prompt_args(from, to);

        info!("Prompting user: {}", prompt_message(from, to));
        tokio::spawn(async move {
            let _open = open;
            if let Err(e) = run_prompt(&program, &args).await {
                warn!("Prompt failed: {}", e);
            }
        });
    }
}

/// Run the prompt program, feeding it a single "OK" choice
async fn run_prompt(program: &str, args: &[String]) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(b"OK")
            .await
            .map_err(|e| format!("Failed to write to {}: {}", program, e))?;
    }

    let status = child
        .wait()
        .await
        .map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
    debug!("{} exited with {}", program, status);
    Ok(())
}

/// Check if the prompt program can be started
pub async fn check_prompt_available(program: &str) -> Result<(), String> {
    Command::new(program)
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|_| format!("{} is not available, session prompts will fail", program))?;

    info!("{} is available", program);
    Ok(())
}

/// Notifier that does nothing, for running without prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, from: SessionKind, to: SessionKind) {
        debug!("Prompts disabled, skipping: {}", prompt_message(from, to));
    }
}

/// Notifier that remembers every call instead of showing anything
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(SessionKind, SessionKind)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(from, to)` pair seen so far, oldest first
    pub fn calls(&self) -> Vec<(SessionKind, SessionKind)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, from: SessionKind, to: SessionKind) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((from, to));
        }
    }
}
