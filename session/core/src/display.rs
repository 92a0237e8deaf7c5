//! Display Modes and Message Filtering
//!
//! Messages are stored in insertion order on the session. What a surface
//! actually shows depends on the display mode:
//!
//! - **Verbose**: everything, including debug-tagged system chatter
//! - **Normal**: every message type, debug-tagged messages hidden
//! - **Compact**: only user, assistant and error messages
//!
//! Filtering is always applied after truncating to the most recent
//! [`MAX_VISIBLE_MESSAGES`], so a compact view can show fewer than twenty
//! messages but never reaches back for older ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of trailing messages considered for display
pub const MAX_VISIBLE_MESSAGES: usize = 20;

/// Display density
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Default density
    #[default]
    Normal,
    /// Conversation only
    Compact,
    /// Everything, including debug output
    Verbose,
}

impl DisplayMode {
    /// Parse a mode name, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "compact" => Some(Self::Compact),
            "verbose" => Some(Self::Verbose),
            _ => None,
        }
    }

    /// The mode after this one in the normal → compact → verbose cycle
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Normal => Self::Compact,
            Self::Compact => Self::Verbose,
            Self::Verbose => Self::Normal,
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Compact => "compact",
            Self::Verbose => "verbose",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of message in the session log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// User input
    User,
    /// Agent response
    Assistant,
    /// Controller notices (cancellation, timeout, ...)
    System,
    /// Tool invocation output
    Tool,
    /// Failure report
    Error,
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// A message in the session log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// What kind of message this is
    pub kind: MessageKind,
    /// The message text
    pub content: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
    /// Internal/debug output, shown only in verbose mode
    #[serde(default)]
    pub debug: bool,
}

impl Message {
    /// Create a new message
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            debug: false,
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    /// System notice
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    /// Error report
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, content)
    }

    /// Mark as debug output
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

/// Whether a message is shown in the given mode
#[must_use]
pub fn visible(message: &Message, mode: DisplayMode) -> bool {
    match mode {
        DisplayMode::Verbose => true,
        DisplayMode::Normal => !message.debug,
        DisplayMode::Compact => {
            !message.debug
                && matches!(
                    message.kind,
                    MessageKind::User | MessageKind::Assistant | MessageKind::Error
                )
        }
    }
}

/// Truncate to the trailing window, then filter by mode
#[must_use]
pub fn visible_messages(messages: &[Message], mode: DisplayMode) -> Vec<Message> {
    let start = messages.len().saturating_sub(MAX_VISIBLE_MESSAGES);
    messages[start..]
        .iter()
        .filter(|m| visible(m, mode))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_of_each() -> Vec<Message> {
        vec![
            Message::new(MessageKind::User, "hi"),
            Message::new(MessageKind::Assistant, "hello"),
            Message::new(MessageKind::System, "notice"),
            Message::new(MessageKind::Tool, "ls output"),
            Message::new(MessageKind::Error, "boom"),
        ]
    }

    fn kinds(messages: &[Message]) -> Vec<MessageKind> {
        messages.iter().map(|m| m.kind).collect()
    }

    #[test]
    fn test_compact_hides_system_and_tool() {
        let visible = visible_messages(&one_of_each(), DisplayMode::Compact);
        assert_eq!(
            kinds(&visible),
            vec![MessageKind::User, MessageKind::Assistant, MessageKind::Error]
        );
    }

    #[test]
    fn test_verbose_and_normal_show_all_kinds() {
        assert_eq!(visible_messages(&one_of_each(), DisplayMode::Verbose).len(), 5);
        assert_eq!(visible_messages(&one_of_each(), DisplayMode::Normal).len(), 5);
    }

    #[test]
    fn test_debug_messages_only_in_verbose() {
        let msg = Message::system("tick").debug();
        assert!(visible(&msg, DisplayMode::Verbose));
        assert!(!visible(&msg, DisplayMode::Normal));
        assert!(!visible(&msg, DisplayMode::Compact));
    }

    #[test]
    fn test_truncation_happens_before_filtering() {
        // 5 old user messages followed by 20 system messages
        let mut messages: Vec<Message> = (0..5).map(|i| Message::user(format!("old {i}"))).collect();
        messages.extend((0..20).map(|i| Message::system(format!("sys {i}"))));

        assert!(visible_messages(&messages, DisplayMode::Compact).is_empty());
        assert_eq!(visible_messages(&messages, DisplayMode::Normal).len(), 20);
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let messages: Vec<Message> = (0..30).map(|i| Message::user(format!("m{i}"))).collect();
        let visible = visible_messages(&messages, DisplayMode::Normal);
        assert_eq!(visible.len(), MAX_VISIBLE_MESSAGES);
        assert_eq!(visible[0].content, "m10");
        assert_eq!(visible[19].content, "m29");
    }

    #[test]
    fn test_mode_parse_and_cycle() {
        assert_eq!(DisplayMode::parse(" Compact "), Some(DisplayMode::Compact));
        assert_eq!(DisplayMode::parse("loud"), None);
        assert_eq!(DisplayMode::Normal.next(), DisplayMode::Compact);
        assert_eq!(DisplayMode::Verbose.next(), DisplayMode::Normal);
    }

    #[test]
    fn test_message_id_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }
}
