//! Classified User Intent
//!
//! Classification happens elsewhere; the controller only consumes the
//! `(type, confidence)` pair plus an optional pre-parsed command. Confidence
//! is an unchecked `f64` and may be NaN or infinite.

use serde::{Deserialize, Serialize};

/// What the user meant by their input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// Slash command (`/preview`, `/status`, ...)
    Command,
    /// Work for the agent pipeline
    Task,
    /// A question to answer
    Question,
    /// Follow-up clarifying earlier input
    Clarification,
}

impl IntentType {
    /// Whether execution goes to the command handler
    #[must_use]
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command)
    }
}

/// Classified intent with confidence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Intent type
    #[serde(rename = "type")]
    pub kind: IntentType,
    /// Classifier confidence (not clamped)
    pub confidence: f64,
    /// Parsed command name, without the leading slash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Parsed command arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl Intent {
    /// Create an intent without command details
    #[must_use]
    pub fn new(kind: IntentType, confidence: f64) -> Self {
        Self {
            kind,
            confidence,
            command: None,
            args: None,
        }
    }

    /// Task intent
    #[must_use]
    pub fn task(confidence: f64) -> Self {
        Self::new(IntentType::Task, confidence)
    }

    /// Command intent with explicit command and args
    pub fn command(command: impl Into<String>, args: Vec<String>, confidence: f64) -> Self {
        Self {
            command: Some(command.into()),
            args: Some(args),
            ..Self::new(IntentType::Command, confidence)
        }
    }

    /// Resolve `(command, args)` for execution
    ///
    /// Explicit fields win. Otherwise the input is split on whitespace and
    /// the first word (minus a leading `/`) is the command.
    #[must_use]
    pub fn command_parts(&self, input: &str) -> (String, Vec<String>) {
        let mut words = input.split_whitespace();
        let derived_command = words
            .next()
            .map(|w| w.trim_start_matches('/').to_string())
            .unwrap_or_default();
        let derived_args: Vec<String> = words.map(str::to_string).collect();

        let command = self.command.clone().unwrap_or(derived_command);
        let args = self.args.clone().unwrap_or(derived_args);
        (command, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parts_derived_from_input() {
        let intent = Intent::new(IntentType::Command, 0.9);
        let (command, args) = intent.command_parts("/deploy staging --dry-run");
        assert_eq!(command, "deploy");
        assert_eq!(args, vec!["staging", "--dry-run"]);
    }

    #[test]
    fn test_command_parts_explicit_wins() {
        let intent = Intent::command("status", vec![], 1.0);
        let (command, args) = intent.command_parts("/something else");
        assert_eq!(command, "status");
        assert!(args.is_empty());
    }

    #[test]
    fn test_command_parts_empty_input() {
        let intent = Intent::new(IntentType::Command, 0.5);
        assert_eq!(intent.command_parts("   "), (String::new(), Vec::new()));
    }

    #[test]
    fn test_intent_wire_format() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"question","confidence":0.4}"#).unwrap();
        assert_eq!(intent.kind, IntentType::Question);
        assert!(!intent.kind.is_command());
        assert!(intent.command.is_none());
    }
}
