//! Orchestrator Events
//!
//! Notifications emitted by the external workflow orchestrator. The
//! orchestrator may run on other threads or in another process; whatever
//! transport carries these, they are marshalled into the session's single
//! mutation point before being applied.
//!
//! The set is closed: adding a new event kind is a compile error in every
//! exhaustive `match` over [`OrchestratorEvent`], which is how the
//! synchronizer finds out it has something new to handle.

use serde::{Deserialize, Serialize};

/// Reference to an orchestrator task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    /// Task ID
    pub id: String,
    /// Name of the workflow the task runs under
    #[serde(default)]
    pub workflow: String,
}

impl TaskRef {
    /// Create a task reference
    pub fn new(id: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            workflow: workflow.into(),
        }
    }
}

/// Reference to a subtask
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRef {
    /// Subtask ID
    pub id: String,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SubtaskRef {
    /// Create a subtask reference
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
        }
    }
}

/// Token usage report
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub output_tokens: u64,
    /// Estimated cost in dollars
    #[serde(default)]
    pub estimated_cost: f64,
}

impl TokenUsage {
    /// Total tokens
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
        self.estimated_cost += rhs.estimated_cost;
    }
}

/// Events from the workflow orchestrator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum OrchestratorEvent {
    /// A task began
    #[serde(rename = "task:started")]
    TaskStarted {
        /// The task
        task: TaskRef,
    },

    /// A task moved to another workflow stage
    #[serde(rename = "task:stage-changed")]
    StageChanged {
        /// The task
        task: TaskRef,
        /// Stage name, resolved to an agent via the workflow lookup
        stage_name: String,
    },

    /// A task finished
    #[serde(rename = "task:completed")]
    TaskCompleted {
        /// The task
        task: TaskRef,
    },

    /// A task failed
    #[serde(rename = "task:failed")]
    TaskFailed {
        /// The task
        task: TaskRef,
        /// Failure description
        #[serde(default)]
        error: String,
    },

    /// A group of stages started running concurrently
    #[serde(rename = "stage:parallel-started")]
    ParallelStarted {
        /// Owning task
        task_id: String,
        /// Stage names, index-aligned with `agent_names`
        #[serde(default)]
        stage_names: Vec<String>,
        /// Agents running the stages
        #[serde(default)]
        agent_names: Vec<String>,
    },

    /// The concurrent stage group finished
    #[serde(rename = "stage:parallel-completed")]
    ParallelCompleted {
        /// Owning task
        task_id: String,
    },

    /// A subtask was created
    #[serde(rename = "subtask:created")]
    SubtaskCreated {
        /// The subtask
        subtask: SubtaskRef,
        /// Parent task
        parent_task_id: String,
    },

    /// A subtask finished
    #[serde(rename = "subtask:completed")]
    SubtaskCompleted {
        /// The subtask
        subtask: SubtaskRef,
        /// Parent task
        parent_task_id: String,
    },

    /// Token usage for a task changed
    #[serde(rename = "usage:updated")]
    UsageUpdated {
        /// Task the usage belongs to
        task_id: String,
        /// Cumulative usage for the task
        usage: TokenUsage,
    },
}

impl OrchestratorEvent {
    /// Wire name of the event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskStarted { .. } => "task:started",
            Self::StageChanged { .. } => "task:stage-changed",
            Self::TaskCompleted { .. } => "task:completed",
            Self::TaskFailed { .. } => "task:failed",
            Self::ParallelStarted { .. } => "stage:parallel-started",
            Self::ParallelCompleted { .. } => "stage:parallel-completed",
            Self::SubtaskCreated { .. } => "subtask:created",
            Self::SubtaskCompleted { .. } => "subtask:completed",
            Self::UsageUpdated { .. } => "usage:updated",
        }
    }

    /// Task the event concerns
    #[must_use]
    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskStarted { task }
            | Self::StageChanged { task, .. }
            | Self::TaskCompleted { task }
            | Self::TaskFailed { task, .. } => &task.id,
            Self::ParallelStarted { task_id, .. }
            | Self::ParallelCompleted { task_id }
            | Self::UsageUpdated { task_id, .. } => task_id,
            Self::SubtaskCreated { parent_task_id, .. }
            | Self::SubtaskCompleted { parent_task_id, .. } => parent_task_id,
        }
    }

    /// Parse an event from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_changed() {
        let event = OrchestratorEvent::from_json(
            r#"{"type":"task:stage-changed","task":{"id":"t1","workflow":"default"},"stageName":"planning"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            OrchestratorEvent::StageChanged {
                task: TaskRef::new("t1", "default"),
                stage_name: "planning".to_string(),
            }
        );
        assert_eq!(event.name(), "task:stage-changed");
        assert_eq!(event.task_id(), "t1");
    }

    #[test]
    fn test_parse_parallel_started_with_missing_lists() {
        let event =
            OrchestratorEvent::from_json(r#"{"type":"stage:parallel-started","taskId":"t1"}"#)
                .unwrap();
        match event {
            OrchestratorEvent::ParallelStarted {
                stage_names,
                agent_names,
                ..
            } => {
                assert!(stage_names.is_empty());
                assert!(agent_names.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_parse_usage() {
        let event = OrchestratorEvent::from_json(
            r#"{"type":"usage:updated","taskId":"t1","usage":{"inputTokens":10,"outputTokens":5,"estimatedCost":0.01}}"#,
        )
        .unwrap();
        match event {
            OrchestratorEvent::UsageUpdated { usage, .. } => {
                assert_eq!(usage.total_tokens(), 15);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(OrchestratorEvent::from_json(r#"{"type":"task:paused","task":{"id":"t"}}"#).is_err());
    }

    #[test]
    fn test_usage_arithmetic() {
        let mut total = TokenUsage::default();
        total += TokenUsage {
            input_tokens: 3,
            output_tokens: 4,
            estimated_cost: 0.5,
        };
        total += TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 0,
            estimated_cost: 0.25,
        };
        assert_eq!(total.input_tokens, u64::MAX);
        assert_eq!(total.total_tokens(), u64::MAX);
        assert_eq!(total.estimated_cost, 0.75);
    }
}
