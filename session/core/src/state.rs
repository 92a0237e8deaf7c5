//! Session State
//!
//! The single mutable aggregate behind a session. Only the controller holds
//! one; everyone else sees a [`crate::render::RenderState`] projection.
//!
//! Fields are private so the paired invariants can only change together:
//!
//! - a countdown exists only while a preview is pending
//! - `active_agent` and `previous_agent` never name the same agent
//! - parallel agents are visible only while the parallel panel is shown, and
//!   the panel needs at least two of them
//! - subtask `completed` never exceeds `total`
//! - finishing or failing a task clears previous agent, parallel agents,
//!   the panel and subtask progress in one step

use std::collections::{HashMap, VecDeque};

use crate::agents::{AgentInfo, SubtaskProgress};
use crate::auto_execute::{Countdown, PendingPreview, PreviewConfig};
use crate::display::{DisplayMode, Message};
use crate::events::TokenUsage;

/// Default cap on stored messages
pub const DEFAULT_MAX_HISTORY: usize = 500;

/// Minimum number of parallel agents for the parallel panel
pub const PARALLEL_PANEL_MIN_AGENTS: usize = 2;

/// An agent identity change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentTransition {
    /// Agent that was active (`None` on first assignment)
    pub from: Option<String>,
    /// Agent now active
    pub to: String,
}

/// Mutable session aggregate
#[derive(Clone, Debug)]
pub struct SessionState {
    display_mode: DisplayMode,
    messages: VecDeque<Message>,
    max_history: usize,
    active_agent: Option<String>,
    previous_agent: Option<String>,
    parallel_agents: Vec<AgentInfo>,
    show_parallel_panel: bool,
    subtask_progress: Option<SubtaskProgress>,
    pending_preview: Option<PendingPreview>,
    countdown: Option<Countdown>,
    preview_config: PreviewConfig,
    preview_mode: bool,
    edit_input: Option<String>,
    show_thoughts: bool,
    is_processing: bool,
    usage: HashMap<String, TokenUsage>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(PreviewConfig::default(), DEFAULT_MAX_HISTORY)
    }
}

impl SessionState {
    /// Fresh state
    #[must_use]
    pub fn new(preview_config: PreviewConfig, max_history: usize) -> Self {
        Self {
            display_mode: DisplayMode::Normal,
            messages: VecDeque::new(),
            max_history: max_history.max(1),
            active_agent: None,
            previous_agent: None,
            parallel_agents: Vec::new(),
            show_parallel_panel: false,
            subtask_progress: None,
            pending_preview: None,
            countdown: None,
            preview_config,
            preview_mode: true,
            edit_input: None,
            show_thoughts: false,
            is_processing: false,
            usage: HashMap::new(),
        }
    }

    // ============================================
    // Display
    // ============================================

    /// Current display mode
    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Set the display mode
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    /// Whether agent thoughts are shown
    #[must_use]
    pub fn show_thoughts(&self) -> bool {
        self.show_thoughts
    }

    /// Show or hide agent thoughts
    pub fn set_show_thoughts(&mut self, show: bool) {
        self.show_thoughts = show;
    }

    // ============================================
    // Messages
    // ============================================

    /// Messages in insertion order
    pub fn messages(&self) -> impl ExactSizeIterator<Item = &Message> + DoubleEndedIterator {
        self.messages.iter()
    }

    /// Last `n` messages, oldest first
    #[must_use]
    pub fn recent_messages(&self, n: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(start).cloned().collect()
    }

    /// Append a message, dropping the oldest past the history cap
    pub fn push_message(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_history {
            self.messages.pop_front();
        }
    }

    // ============================================
    // Agents
    // ============================================

    /// Agent currently working
    #[must_use]
    pub fn active_agent(&self) -> Option<&str> {
        self.active_agent.as_deref()
    }

    /// Agent that handed off to the active one
    #[must_use]
    pub fn previous_agent(&self) -> Option<&str> {
        self.previous_agent.as_deref()
    }

    /// Make `agent` the active agent
    ///
    /// Returns the transition, or `None` when `agent` is already active (in
    /// which case `previous_agent` is left alone).
    pub fn set_active_agent(&mut self, agent: impl Into<String>) -> Option<AgentTransition> {
        let agent = agent.into();
        if self.active_agent.as_deref() == Some(agent.as_str()) {
            return None;
        }
        let from = self.active_agent.replace(agent.clone());
        self.previous_agent = from.clone();
        Some(AgentTransition { from, to: agent })
    }

    /// Forget the previous agent
    pub fn clear_previous_agent(&mut self) {
        self.previous_agent = None;
    }

    /// Parallel agents, empty unless the panel is shown
    #[must_use]
    pub fn parallel_agents(&self) -> &[AgentInfo] {
        if self.show_parallel_panel {
            &self.parallel_agents
        } else {
            &[]
        }
    }

    /// Whether the parallel panel is shown
    #[must_use]
    pub fn show_parallel_panel(&self) -> bool {
        self.show_parallel_panel
    }

    /// Replace the parallel agent group
    pub fn set_parallel_agents(&mut self, agents: Vec<AgentInfo>) {
        self.show_parallel_panel = agents.len() >= PARALLEL_PANEL_MIN_AGENTS;
        self.parallel_agents = agents;
    }

    /// Drop the parallel agent group
    pub fn clear_parallel_agents(&mut self) {
        self.parallel_agents.clear();
        self.show_parallel_panel = false;
    }

    // ============================================
    // Task tracking
    // ============================================

    /// Subtask counters for the current task
    #[must_use]
    pub fn subtask_progress(&self) -> Option<SubtaskProgress> {
        self.subtask_progress
    }

    /// Begin tracking a new task
    pub fn start_task(&mut self) {
        self.subtask_progress = Some(SubtaskProgress::default());
        self.previous_agent = None;
        self.is_processing = true;
    }

    /// Record a created subtask
    pub fn add_subtask(&mut self) {
        self.subtask_progress
            .get_or_insert_with(SubtaskProgress::default)
            .add_subtask();
    }

    /// Record a completed subtask
    pub fn complete_subtask(&mut self) {
        self.subtask_progress
            .get_or_insert_with(SubtaskProgress::default)
            .complete_subtask();
    }

    /// Clear everything tied to the finished task
    pub fn finish_task(&mut self) {
        self.subtask_progress = None;
        self.previous_agent = None;
        self.clear_parallel_agents();
        self.is_processing = false;
    }

    /// Whether a task is running
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Record cumulative usage for a task
    pub fn record_usage(&mut self, task_id: impl Into<String>, usage: TokenUsage) {
        self.usage.insert(task_id.into(), usage);
    }

    /// Usage for one task
    #[must_use]
    pub fn usage_for(&self, task_id: &str) -> Option<TokenUsage> {
        self.usage.get(task_id).copied()
    }

    /// Usage summed over every task this session
    #[must_use]
    pub fn usage_total(&self) -> TokenUsage {
        self.usage.values().fold(TokenUsage::default(), |mut acc, u| {
            acc += *u;
            acc
        })
    }

    // ============================================
    // Preview
    // ============================================

    /// Input awaiting confirmation
    #[must_use]
    pub fn pending_preview(&self) -> Option<&PendingPreview> {
        self.pending_preview.as_ref()
    }

    /// Countdown for the pending preview
    #[must_use]
    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    /// Milliseconds left on the countdown
    #[must_use]
    pub fn remaining_ms(&self) -> Option<i64> {
        self.countdown.map(|c| c.remaining_ms())
    }

    /// Hold input behind a fresh countdown, replacing any pending preview
    pub fn set_pending_preview(&mut self, preview: PendingPreview) {
        self.countdown = Some(Countdown::new(self.preview_config.timeout_ms));
        self.pending_preview = Some(preview);
    }

    /// Remove the pending preview and its countdown
    pub fn take_pending_preview(&mut self) -> Option<PendingPreview> {
        self.countdown = None;
        self.pending_preview.take()
    }

    /// Stop the countdown but keep the preview
    ///
    /// Returns `false` when there was no countdown to stop.
    pub fn cancel_countdown(&mut self) -> bool {
        self.countdown.take().is_some()
    }

    /// Advance the countdown one tick; `true` when it has run out
    pub fn tick_countdown(&mut self) -> bool {
        match self.countdown.as_mut() {
            Some(countdown) => countdown.tick(),
            None => false,
        }
    }

    /// Current preview configuration
    #[must_use]
    pub fn preview_config(&self) -> PreviewConfig {
        self.preview_config
    }

    /// Replace the preview configuration (applies to the next countdown)
    pub fn set_preview_config(&mut self, config: PreviewConfig) {
        self.preview_config = config;
    }

    /// Whether input goes through preview
    #[must_use]
    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    /// Turn preview on or off
    pub fn set_preview_mode(&mut self, enabled: bool) {
        self.preview_mode = enabled;
    }

    /// Input sent back for editing
    #[must_use]
    pub fn edit_input(&self) -> Option<&str> {
        self.edit_input.as_deref()
    }

    /// Fill the edit buffer
    pub fn set_edit_input(&mut self, input: String) {
        self.edit_input = Some(input);
    }

    /// Drain the edit buffer
    pub fn take_edit_input(&mut self) -> Option<String> {
        self.edit_input.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    #[test]
    fn test_defaults() {
        let state = SessionState::default();
        assert_eq!(state.display_mode(), DisplayMode::Normal);
        assert!(state.active_agent().is_none());
        assert!(state.pending_preview().is_none());
        assert!(state.remaining_ms().is_none());
        assert!(state.preview_mode());
        assert!(!state.is_processing());
    }

    #[test]
    fn test_same_agent_is_not_a_transition() {
        let mut state = SessionState::default();
        assert_eq!(
            state.set_active_agent("planner"),
            Some(AgentTransition {
                from: None,
                to: "planner".to_string()
            })
        );
        state.set_active_agent("architect");
        assert_eq!(state.previous_agent(), Some("planner"));

        assert!(state.set_active_agent("architect").is_none());
        assert_eq!(state.previous_agent(), Some("planner"));
        assert_eq!(state.active_agent(), Some("architect"));
    }

    #[test]
    fn test_preview_and_countdown_move_together() {
        let mut state = SessionState::default();
        state.set_pending_preview(PendingPreview::new("x", Intent::task(0.5)));
        assert_eq!(state.remaining_ms(), Some(5000));

        state.cancel_countdown();
        assert!(state.pending_preview().is_some());
        assert!(state.remaining_ms().is_none());

        assert!(state.take_pending_preview().is_some());
        assert!(state.pending_preview().is_none());
    }

    #[test]
    fn test_superseding_preview_resets_countdown() {
        let mut state = SessionState::default();
        state.set_pending_preview(PendingPreview::new("first", Intent::task(0.5)));
        for _ in 0..5 {
            state.tick_countdown();
        }
        assert_eq!(state.remaining_ms(), Some(4500));

        state.set_pending_preview(PendingPreview::new("second", Intent::task(0.5)));
        assert_eq!(state.remaining_ms(), Some(5000));
    }

    #[test]
    fn test_single_parallel_agent_hidden() {
        let mut state = SessionState::default();
        state.set_parallel_agents(vec![AgentInfo::parallel("tester", None)]);
        assert!(!state.show_parallel_panel());
        assert!(state.parallel_agents().is_empty());
    }

    #[test]
    fn test_finish_task_clears_tracking() {
        let mut state = SessionState::default();
        state.start_task();
        state.add_subtask();
        state.set_active_agent("planner");
        state.set_active_agent("architect");
        state.set_parallel_agents(vec![
            AgentInfo::parallel("tester", None),
            AgentInfo::parallel("reviewer", None),
        ]);

        state.finish_task();
        assert!(state.subtask_progress().is_none());
        assert!(state.previous_agent().is_none());
        assert!(state.parallel_agents().is_empty());
        assert!(!state.show_parallel_panel());
        assert!(!state.is_processing());
        // the active agent stays so the panel still shows who finished
        assert_eq!(state.active_agent(), Some("architect"));
    }

    #[test]
    fn test_history_cap() {
        let mut state = SessionState::new(PreviewConfig::default(), 3);
        for i in 0..5 {
            state.push_message(Message::user(format!("m{i}")));
        }
        let contents: Vec<_> = state.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_usage_total() {
        let mut state = SessionState::default();
        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            estimated_cost: 0.25,
        };
        state.record_usage("t1", usage);
        state.record_usage("t1", usage);
        state.record_usage("t2", usage);
        assert_eq!(state.usage_total().total_tokens(), 30);
        assert_eq!(state.usage_for("t1"), Some(usage));
    }
}
