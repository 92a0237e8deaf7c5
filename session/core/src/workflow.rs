//! Workflow Lookup
//!
//! A workflow is an ordered list of stages, each statically owned by one
//! agent. The orchestrator only reports stage names; the session resolves
//! them to agents through a [`WorkflowLookup`] supplied at construction.
//! Lookups may be remote and may fail; every failure is a [`LookupError`]
//! that the synchronizer logs and recovers from.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the built-in pipeline workflow
pub const DEFAULT_WORKFLOW: &str = "default";

/// One stage of a workflow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStage {
    /// Stage name as reported by the orchestrator
    pub name: String,
    /// Agent responsible for the stage
    pub agent: String,
}

impl WorkflowStage {
    /// Create a stage
    pub fn new(name: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: agent.into(),
        }
    }
}

/// A workflow definition
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Stages in execution order
    pub stages: Vec<WorkflowStage>,
}

impl Workflow {
    /// Build a workflow from `(stage, agent)` pairs
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            stages: pairs
                .iter()
                .map(|(stage, agent)| WorkflowStage::new(*stage, *agent))
                .collect(),
        }
    }

    /// Agent owning the named stage
    #[must_use]
    pub fn agent_for(&self, stage: &str) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.name == stage)
            .map(|s| s.agent.as_str())
    }
}

/// Errors resolving a stage to an agent
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// No workflow with this name
    #[error("workflow '{0}' not found")]
    WorkflowNotFound(String),

    /// The workflow has no such stage
    #[error("stage '{stage}' not found in workflow '{workflow}'")]
    StageNotFound {
        /// Workflow searched
        workflow: String,
        /// Stage requested
        stage: String,
    },

    /// The lookup backend failed
    #[error("workflow lookup failed: {0}")]
    Backend(String),

    /// The lookup did not answer in time
    #[error("workflow lookup for '{workflow}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Workflow requested
        workflow: String,
        /// Configured timeout
        timeout_ms: u64,
    },
}

/// Source of workflow definitions
#[async_trait]
pub trait WorkflowLookup: Send + Sync {
    /// Fetch a workflow definition by name
    async fn lookup_workflow(&self, name: &str) -> Result<Workflow, LookupError>;
}

/// In-memory workflow table
#[derive(Clone, Debug, Default)]
pub struct StaticWorkflows {
    workflows: HashMap<String, Workflow>,
}

impl StaticWorkflows {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a workflow
    #[must_use]
    pub fn with_workflow(mut self, name: impl Into<String>, workflow: Workflow) -> Self {
        self.workflows.insert(name.into(), workflow);
        self
    }

    /// The six-stage agent pipeline, registered as [`DEFAULT_WORKFLOW`]
    #[must_use]
    pub fn default_pipeline() -> Self {
        Self::new().with_workflow(
            DEFAULT_WORKFLOW,
            Workflow::from_pairs(&[
                ("planning", "planner"),
                ("architecture", "architect"),
                ("development", "developer"),
                ("testing", "tester"),
                ("review", "reviewer"),
                ("deployment", "devops"),
            ]),
        )
    }
}

#[async_trait]
impl WorkflowLookup for StaticWorkflows {
    async fn lookup_workflow(&self, name: &str) -> Result<Workflow, LookupError> {
        self.workflows
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::WorkflowNotFound(name.to_string()))
    }
}
