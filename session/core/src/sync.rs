//! Orchestrator Event Synchronizer
//!
//! Translates [`OrchestratorEvent`]s into [`SessionState`] changes. Agent
//! state is derived purely from events; nothing here polls.
//!
//! Stage changes need a workflow lookup to find the responsible agent. The
//! lookup runs under a timeout and its result is cached per workflow name
//! for the rest of the session; failures are logged and never cached, so
//! the next stage change retries. A failed lookup leaves agent state as it
//! was.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::AgentInfo;
use crate::display::Message;
use crate::events::OrchestratorEvent;
use crate::state::{AgentTransition, SessionState};
use crate::workflow::{LookupError, Workflow, WorkflowLookup};

/// Default bound on one workflow lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// What an applied event changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Whether session state changed at all
    pub changed: bool,
    /// Set when the active agent changed identity
    pub agent_changed: Option<AgentTransition>,
}

impl SyncOutcome {
    fn changed() -> Self {
        Self {
            changed: true,
            agent_changed: None,
        }
    }

    fn unchanged() -> Self {
        Self::default()
    }
}

/// Applies orchestrator events to session state
pub struct EventSynchronizer {
    lookup: Arc<dyn WorkflowLookup>,
    lookup_timeout: Duration,
    cache: HashMap<String, Workflow>,
}

impl std::fmt::Debug for EventSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSynchronizer")
            .field("lookup_timeout", &self.lookup_timeout)
            .field("cached_workflows", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl EventSynchronizer {
    /// Create a synchronizer
    pub fn new(lookup: Arc<dyn WorkflowLookup>, lookup_timeout: Duration) -> Self {
        Self {
            lookup,
            lookup_timeout,
            cache: HashMap::new(),
        }
    }

    /// Drop cached workflow definitions
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Apply one event
    pub async fn apply(&mut self, state: &mut SessionState, event: OrchestratorEvent) -> SyncOutcome {
        tracing::trace!(event = event.name(), task_id = event.task_id(), "Applying orchestrator event");

        match event {
            OrchestratorEvent::TaskStarted { task } => {
                tracing::debug!(task_id = %task.id, workflow = %task.workflow, "Task started");
                state.start_task();
                SyncOutcome::changed()
            }

            OrchestratorEvent::StageChanged { task, stage_name } => {
                match self.resolve_agent(&task.workflow, &stage_name).await {
                    Ok(agent) => Self::apply_resolved_agent(state, agent),
                    Err(e) => {
                        tracing::warn!(
                            task_id = %task.id,
                            workflow = %task.workflow,
                            stage = %stage_name,
                            error = %e,
                            "Could not resolve stage to an agent, keeping current agent"
                        );
                        SyncOutcome::unchanged()
                    }
                }
            }

            OrchestratorEvent::TaskCompleted { task } => {
                tracing::debug!(task_id = %task.id, "Task completed");
                state.finish_task();
                SyncOutcome::changed()
            }

            OrchestratorEvent::TaskFailed { task, error } => {
                tracing::debug!(task_id = %task.id, error = %error, "Task failed");
                state.finish_task();
                state.push_message(Message::error(format!("Task {} failed: {}", task.id, error)));
                SyncOutcome::changed()
            }

            OrchestratorEvent::ParallelStarted {
                task_id,
                stage_names,
                agent_names,
            } => {
                let agents: Vec<AgentInfo> = agent_names
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| AgentInfo::parallel(name, stage_names.get(i).cloned()))
                    .collect();
                tracing::debug!(task_id = %task_id, agents = agents.len(), "Parallel stages started");
                state.set_parallel_agents(agents);
                SyncOutcome::changed()
            }

            OrchestratorEvent::ParallelCompleted { task_id } => {
                tracing::debug!(task_id = %task_id, "Parallel stages completed");
                state.clear_parallel_agents();
                SyncOutcome::changed()
            }

            OrchestratorEvent::SubtaskCreated { .. } => {
                state.add_subtask();
                SyncOutcome::changed()
            }

            OrchestratorEvent::SubtaskCompleted { .. } => {
                state.complete_subtask();
                SyncOutcome::changed()
            }

            OrchestratorEvent::UsageUpdated { task_id, usage } => {
                state.record_usage(task_id, usage);
                SyncOutcome::changed()
            }
        }
    }

    /// Make a resolved agent active
    ///
    /// A resolution to the agent that is already active is not a transition.
    pub fn apply_resolved_agent(state: &mut SessionState, agent: String) -> SyncOutcome {
        match state.set_active_agent(agent) {
            Some(transition) => {
                tracing::debug!(
                    from = ?transition.from,
                    to = %transition.to,
                    "Active agent changed"
                );
                SyncOutcome {
                    changed: true,
                    agent_changed: Some(transition),
                }
            }
            None => SyncOutcome::unchanged(),
        }
    }

    /// Resolve a stage name to its agent
    pub async fn resolve_agent(&mut self, workflow: &str, stage: &str) -> Result<String, LookupError> {
        let definition = self.workflow(workflow).await?;
        definition
            .agent_for(stage)
            .map(str::to_string)
            .ok_or_else(|| LookupError::StageNotFound {
                workflow: workflow.to_string(),
                stage: stage.to_string(),
            })
    }

    async fn workflow(&mut self, name: &str) -> Result<&Workflow, LookupError> {
        if !self.cache.contains_key(name) {
            let fetched = tokio::time::timeout(self.lookup_timeout, self.lookup.lookup_workflow(name))
                .await
                .map_err(|_| LookupError::Timeout {
                    workflow: name.to_string(),
                    timeout_ms: u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                })??;
            tracing::debug!(workflow = %name, stages = fetched.stages.len(), "Cached workflow definition");
            self.cache.insert(name.to_string(), fetched);
        }

        self.cache
            .get(name)
            .ok_or_else(|| LookupError::WorkflowNotFound(name.to_string()))
    }
}
