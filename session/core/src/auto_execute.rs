//! Auto-Execute Engine
//!
//! Decides what happens to submitted input when preview mode is on:
//!
//! 1. **Immediate**: preview mode is off, or the input is the preview-toggle
//!    command itself.
//! 2. **Auto-execute**: high-confidence auto-execution is enabled and the
//!    classifier is at least [`AUTO_EXECUTE_CONFIDENCE`] sure. This constant
//!    is fixed; `confidence_threshold` only decides whether a preview is
//!    flagged as low confidence.
//! 3. **Preview**: otherwise the input waits behind a [`Countdown`]. When
//!    the countdown expires it executes; a keystroke can confirm, cancel,
//!    edit, or just stop the countdown (see [`classify_key`]).
//!
//! The engine itself holds no state. [`crate::state::SessionState`] stores
//! the pending preview and countdown, and the controller drives them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intent::Intent;

/// Confidence at or above which input runs without a preview
pub const AUTO_EXECUTE_CONFIDENCE: f64 = 0.95;

/// Prefix of the command that toggles preview mode
pub const PREVIEW_TOGGLE_PREFIX: &str = "/preview";

/// Countdown tick period
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

const COUNTDOWN_TICK_MS: i64 = 100;

/// Message appended when Escape cancels a preview
pub const PREVIEW_CANCELLED: &str = "Preview cancelled.";

/// Message appended when `e` sends the preview back for editing
pub const RETURNING_TO_EDIT: &str = "Returning to edit mode...";

/// Message appended when a keystroke stops the countdown
pub const AUTO_EXECUTE_CANCELLED: &str = "Auto-execute cancelled.";

/// Preview behaviour
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Below this a preview is flagged as low confidence
    pub confidence_threshold: f64,
    /// Whether very confident input skips the preview
    pub auto_execute_high_confidence: bool,
    /// Countdown length; zero or negative fires on the next tick
    pub timeout_ms: i64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            auto_execute_high_confidence: true,
            timeout_ms: 5000,
        }
    }
}

/// What to do with submitted input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Run it now, no message
    Immediate,
    /// Run it now and say why
    AutoExecute,
    /// Hold it behind a countdown
    Preview,
}

/// Whether the input is the preview-toggle command
#[must_use]
pub fn is_preview_toggle(input: &str) -> bool {
    input.starts_with(PREVIEW_TOGGLE_PREFIX)
}

/// Whether the confidence clears the auto-execute bar
///
/// The comparison is literal: NaN fails, values above 1.0 pass.
#[must_use]
pub fn meets_auto_execute(confidence: f64) -> bool {
    confidence >= AUTO_EXECUTE_CONFIDENCE
}

/// Decide how to handle submitted input
#[must_use]
pub fn decide(input: &str, intent: &Intent, config: &PreviewConfig, preview_mode: bool) -> Decision {
    if !preview_mode || is_preview_toggle(input) {
        return Decision::Immediate;
    }
    if config.auto_execute_high_confidence && meets_auto_execute(intent.confidence) {
        return Decision::AutoExecute;
    }
    Decision::Preview
}

/// System message for an auto-executed input
#[must_use]
pub fn auto_execute_message(confidence: f64) -> String {
    let pct = (confidence * 100.0).round();
    format!("Auto-executing (confidence: {pct}% ≥ 95%)")
}

/// System message for a countdown that ran out
#[must_use]
pub fn timeout_message(timeout_ms: i64) -> String {
    format!("Auto-executing after {}s timeout", ceil_seconds(timeout_ms.max(0)))
}

fn ceil_seconds(ms: i64) -> i64 {
    let ms = ms.max(0);
    ms / 1000 + i64::from(ms % 1000 != 0)
}

/// Input waiting for confirmation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingPreview {
    /// The raw input
    pub input: String,
    /// Its classified intent
    pub intent: Intent,
    /// When it was submitted
    pub timestamp: DateTime<Utc>,
}

impl PendingPreview {
    /// Preview submitted now
    pub fn new(input: impl Into<String>, intent: Intent) -> Self {
        Self {
            input: input.into(),
            intent,
            timestamp: Utc::now(),
        }
    }
}

/// Colour band for the countdown label
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownUrgency {
    /// More than 5 seconds left
    Calm,
    /// 3 to 5 seconds left
    Warning,
    /// 2 seconds or less
    Urgent,
}

impl CountdownUrgency {
    /// Band for whole seconds remaining
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds > 5 {
            Self::Calm
        } else if seconds >= 3 {
            Self::Warning
        } else {
            Self::Urgent
        }
    }
}

/// Remaining time before a pending preview executes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    timeout_ms: i64,
    remaining_ms: i64,
}

impl Countdown {
    /// Start a countdown; negative timeouts start at zero
    #[must_use]
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            timeout_ms,
            remaining_ms: timeout_ms.max(0),
        }
    }

    /// Timeout the countdown was armed with
    #[must_use]
    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// Milliseconds left (never negative)
    #[must_use]
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    /// Whole seconds left, rounded up
    #[must_use]
    pub fn seconds(&self) -> i64 {
        ceil_seconds(self.remaining_ms)
    }

    /// Colour band
    #[must_use]
    pub fn urgency(&self) -> CountdownUrgency {
        CountdownUrgency::from_seconds(self.seconds())
    }

    /// Advance one tick; returns `true` once the countdown has run out
    pub fn tick(&mut self) -> bool {
        self.remaining_ms = (self.remaining_ms - COUNTDOWN_TICK_MS).max(0);
        self.remaining_ms == 0
    }
}

/// A key, as far as previews care
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Return / Enter
    Enter,
    /// Escape
    Escape,
    /// A printable character
    Char(char),
    /// Anything else, by name (may be empty)
    Other(String),
}

/// A keystroke with modifiers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    /// The key
    pub key: Key,
    /// Control held
    #[serde(default)]
    pub ctrl: bool,
    /// Alt held
    #[serde(default)]
    pub alt: bool,
    /// Meta / super held
    #[serde(default)]
    pub meta: bool,
}

impl KeyInput {
    /// Unmodified key
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    /// Enter
    #[must_use]
    pub fn enter() -> Self {
        Self::new(Key::Enter)
    }

    /// Escape
    #[must_use]
    pub fn escape() -> Self {
        Self::new(Key::Escape)
    }

    /// Printable character
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    /// Named non-printable key
    #[must_use]
    pub fn other(name: impl Into<String>) -> Self {
        Self::new(Key::Other(name.into()))
    }

    /// With control held
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// With alt held
    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Whether any of ctrl/alt/meta is held
    #[must_use]
    pub fn has_modifiers(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// What a keystroke does to a pending preview
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Execute now
    Confirm,
    /// Drop the preview
    Cancel,
    /// Move the input back to the edit buffer
    Edit,
    /// Stop the countdown, keep the preview
    CancelCountdown,
}

/// Classify a keystroke received while a preview is pending
#[must_use]
pub fn classify_key(input: &KeyInput) -> KeyAction {
    match &input.key {
        Key::Enter => KeyAction::Confirm,
        Key::Escape => KeyAction::Cancel,
        Key::Char('e' | 'E') if !input.has_modifiers() => KeyAction::Edit,
        _ => KeyAction::CancelCountdown,
    }
}

/// Resolved execution target for an input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Execution {
    /// Goes to the command handler
    Command {
        /// Command name
        command: String,
        /// Arguments
        args: Vec<String>,
    },
    /// Goes to the task handler with the raw input
    Task {
        /// Raw input
        input: String,
    },
}

impl Execution {
    /// Route an input by intent type
    #[must_use]
    pub fn for_input(input: &str, intent: &Intent) -> Self {
        if intent.kind.is_command() {
            let (command, args) = intent.command_parts(input);
            Self::Command { command, args }
        } else {
            Self::Task {
                input: input.to_string(),
            }
        }
    }

    /// Hand the execution to a sink
    pub fn dispatch(&self, sink: &dyn ExecutionSink) -> Result<(), ExecutionError> {
        match self {
            Self::Command { command, args } => sink.on_command(command, args),
            Self::Task { input } => sink.on_task(input),
        }
    }
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { command, .. } => write!(f, "command /{command}"),
            Self::Task { .. } => write!(f, "task"),
        }
    }
}

/// Errors reported by an execution sink
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The handler refused the input
    #[error("rejected: {0}")]
    Rejected(String),

    /// The handler failed
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Receiver of executed input
///
/// Called exactly once per executed input (auto-executed, timed out, or
/// confirmed), never for cancelled or edited previews. Session state has
/// already been updated when these run, so an error cannot leave a preview
/// half-cleared.
pub trait ExecutionSink: Send + Sync {
    /// Run a slash command
    fn on_command(&self, command: &str, args: &[String]) -> Result<(), ExecutionError>;

    /// Run a task
    fn on_task(&self, input: &str) -> Result<(), ExecutionError>;
}

impl<T: ExecutionSink + ?Sized> ExecutionSink for Arc<T> {
    fn on_command(&self, command: &str, args: &[String]) -> Result<(), ExecutionError> {
        (**self).on_command(command, args)
    }

    fn on_task(&self, input: &str) -> Result<(), ExecutionError> {
        (**self).on_task(input)
    }
}

/// Sink that accepts everything and does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ExecutionSink for NullSink {
    fn on_command(&self, command: &str, _args: &[String]) -> Result<(), ExecutionError> {
        tracing::trace!(command, "Dropping command (no sink)");
        Ok(())
    }

    fn on_task(&self, _input: &str) -> Result<(), ExecutionError> {
        tracing::trace!("Dropping task (no sink)");
        Ok(())
    }
}
