//! Agent Types
//!
//! Agents are the workflow's specialists (planner, architect, developer,
//! tester, reviewer, devops). The controller never runs them; it only tracks
//! which one is active, which one handed off, and which are running in
//! parallel, as reported by the orchestrator.

use serde::{Deserialize, Serialize};

/// Status of an agent as shown in the agent panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Finished its stage
    Completed,
    /// Currently working
    Active,
    /// Queued behind another stage
    Waiting,
    /// Not involved yet
    #[default]
    Idle,
    /// Running as part of a parallel stage group
    Parallel,
}

impl AgentStatus {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Active => "Active",
            Self::Waiting => "Waiting",
            Self::Idle => "Idle",
            Self::Parallel => "Parallel",
        }
    }

    /// Whether the agent is currently doing work
    #[must_use]
    pub fn is_working(&self) -> bool {
        matches!(self, Self::Active | Self::Parallel)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Debug details surfaced when thoughts are shown
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Latest reasoning excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Tokens consumed so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

/// An agent entry in the agent panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Agent name (may be empty for malformed payloads)
    pub name: String,
    /// Current status
    pub status: AgentStatus,
    /// Workflow stage this agent is handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Progress percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Debug details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl AgentInfo {
    /// Create an agent entry
    pub fn new(name: impl Into<String>, status: AgentStatus) -> Self {
        Self {
            name: name.into(),
            status,
            stage: None,
            progress: None,
            debug_info: None,
        }
    }

    /// Agent running in a parallel stage group
    pub fn parallel(name: impl Into<String>, stage: Option<String>) -> Self {
        Self {
            stage,
            ..Self::new(name, AgentStatus::Parallel)
        }
    }

    /// Set progress, clamped to 100
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    /// Name for display
    #[must_use]
    pub fn display_name(&self) -> String {
        agent_display_name(&self.name)
    }
}

/// Subtask counters for the current task
///
/// `completed <= total` always holds; increments past the total are clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskProgress {
    /// Subtasks finished
    pub completed: u32,
    /// Subtasks created
    pub total: u32,
}

impl SubtaskProgress {
    /// Record a newly created subtask
    pub fn add_subtask(&mut self) {
        self.total = self.total.saturating_add(1);
    }

    /// Record a completed subtask, never exceeding the total
    pub fn complete_subtask(&mut self) {
        self.completed = self.completed.saturating_add(1).min(self.total);
    }

    /// Completion as a percentage (0 when there are no subtasks)
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = u64::from(self.completed) * 100 / u64::from(self.total);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

/// Map an agent ID to a display name
///
/// Known workflow agents get their role title; anything else is capitalised
/// as-is. Empty names stay empty so malformed payloads still render.
#[must_use]
pub fn agent_display_name(agent_id: &str) -> String {
    match agent_id {
        "planner" => "Planner".to_string(),
        "architect" => "Architect".to_string(),
        "developer" => "Developer".to_string(),
        "tester" => "Tester".to_string(),
        "reviewer" => "Reviewer".to_string(),
        "devops" => "DevOps".to_string(),
        _ => {
            // Capitalize first letter
            let mut chars = agent_id.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => agent_id.to_string(),
            }
        }
    }
}
