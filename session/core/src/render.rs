//! Render State
//!
//! Immutable projection of the session handed to surfaces after every
//! change. It carries everything a surface needs to paint without reaching
//! back into the controller: the filtered message window, agent panel data,
//! preview and countdown labels, and the handoff animation snapshot.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agents::{AgentInfo, SubtaskProgress};
use crate::auto_execute::{Countdown, CountdownUrgency};
use crate::breakpoint::BreakpointInfo;
use crate::display::{visible_messages, DisplayMode, Message};
use crate::events::TokenUsage;
use crate::handoff::HandoffAnimationState;
use crate::intent::Intent;
use crate::state::SessionState;

/// Pending preview as shown to the user
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PreviewView {
    /// The held input
    pub input: String,
    /// Its intent
    pub intent: Intent,
    /// When it was submitted
    pub timestamp: DateTime<Utc>,
    /// Confidence is below the configured threshold (or not a number)
    pub low_confidence: bool,
}

/// Countdown as shown to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CountdownView {
    /// Milliseconds left
    pub remaining_ms: i64,
    /// Whole seconds left, rounded up
    pub seconds: i64,
    /// Colour band
    pub urgency: CountdownUrgency,
    /// Ready-made label
    pub label: String,
}

impl From<Countdown> for CountdownView {
    fn from(countdown: Countdown) -> Self {
        let seconds = countdown.seconds();
        Self {
            remaining_ms: countdown.remaining_ms(),
            seconds,
            urgency: countdown.urgency(),
            label: format!("Executing in {seconds}s"),
        }
    }
}

/// Everything a surface needs to draw one frame
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderState {
    /// Increases with every state change
    pub revision: u64,
    /// Display density
    pub display_mode: DisplayMode,
    /// Layout breakpoint for the current width
    pub breakpoint: BreakpointInfo,
    /// Last twenty messages, filtered by display mode
    pub visible_messages: Vec<Message>,
    /// Agent currently working
    pub active_agent: Option<String>,
    /// Agent that handed off
    pub previous_agent: Option<String>,
    /// Parallel agents (empty unless the panel is shown)
    pub parallel_agents: Vec<AgentInfo>,
    /// Whether to show the parallel panel
    pub show_parallel_panel: bool,
    /// Subtask counters
    pub subtask_progress: Option<SubtaskProgress>,
    /// Pending preview
    pub preview: Option<PreviewView>,
    /// Running countdown
    pub countdown: Option<CountdownView>,
    /// Handoff animation
    pub handoff: HandoffAnimationState,
    /// Whether agent thoughts are shown
    pub show_thoughts: bool,
    /// Whether a task is running
    pub is_processing: bool,
    /// Whether input goes through preview
    pub preview_mode: bool,
    /// Input sent back for editing, not yet taken
    pub edit_input: Option<String>,
    /// Usage across all tasks
    pub usage_total: TokenUsage,
}

impl RenderState {
    /// Project session state into a snapshot
    #[must_use]
    pub fn project(
        state: &SessionState,
        breakpoint: BreakpointInfo,
        handoff: HandoffAnimationState,
        revision: u64,
    ) -> Self {
        let threshold = state.preview_config().confidence_threshold;
        let recent = state.recent_messages(crate::display::MAX_VISIBLE_MESSAGES);

        Self {
            revision,
            display_mode: state.display_mode(),
            breakpoint,
            visible_messages: visible_messages(&recent, state.display_mode()),
            active_agent: state.active_agent().map(str::to_string),
            previous_agent: state.previous_agent().map(str::to_string),
            parallel_agents: state.parallel_agents().to_vec(),
            show_parallel_panel: state.show_parallel_panel(),
            subtask_progress: state.subtask_progress(),
            preview: state.pending_preview().map(|p| PreviewView {
                input: p.input.clone(),
                intent: p.intent.clone(),
                timestamp: p.timestamp,
                low_confidence: is_low_confidence(p.intent.confidence, threshold),
            }),
            countdown: state.countdown().map(CountdownView::from),
            handoff,
            show_thoughts: state.show_thoughts(),
            is_processing: state.is_processing(),
            preview_mode: state.preview_mode(),
            edit_input: state.edit_input().map(str::to_string),
            usage_total: state.usage_total(),
        }
    }

    /// Whether the handoff animation is showing
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.handoff.is_animating
    }
}

// NaN counts as low
fn is_low_confidence(confidence: f64, threshold: f64) -> bool {
    !matches!(
        confidence.partial_cmp(&threshold),
        Some(Ordering::Greater | Ordering::Equal)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_execute::PendingPreview;
    use crate::display::MessageKind;

    fn project(state: &SessionState) -> RenderState {
        RenderState::project(state, BreakpointInfo::default(), HandoffAnimationState::default(), 1)
    }

    #[test]
    fn test_low_confidence_flag() {
        let mut state = SessionState::default();
        state.set_pending_preview(PendingPreview::new("x", Intent::task(0.5)));
        assert!(project(&state).preview.unwrap().low_confidence);

        state.set_pending_preview(PendingPreview::new("x", Intent::task(0.8)));
        assert!(!project(&state).preview.unwrap().low_confidence);

        state.set_pending_preview(PendingPreview::new("x", Intent::task(f64::NAN)));
        assert!(project(&state).preview.unwrap().low_confidence);
    }

    #[test]
    fn test_countdown_view() {
        let view = CountdownView::from(Countdown::new(2100));
        assert_eq!(view.seconds, 3);
        assert_eq!(view.urgency, CountdownUrgency::Warning);
        assert_eq!(view.label, "Executing in 3s");
    }

    #[test]
    fn test_messages_filtered_by_mode() {
        let mut state = SessionState::default();
        state.push_message(Message::user("hi"));
        state.push_message(Message::system("notice"));
        state.set_display_mode(DisplayMode::Compact);

        let render = project(&state);
        assert_eq!(render.visible_messages.len(), 1);
        assert_eq!(render.visible_messages[0].kind, MessageKind::User);
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_value(project(&SessionState::default())).unwrap();
        assert_eq!(json["display_mode"], "normal");
        assert_eq!(json["breakpoint"]["breakpoint"], "narrow");
    }
}
