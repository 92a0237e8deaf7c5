//! Session Core - Headless Session Controller for agentdeck
//!
//! agentdeck is a terminal dashboard that supervises a multi-stage,
//! multi-agent workflow (planner → architect → developer → tester →
//! reviewer → devops). This crate is the part that decides things: it
//! reconciles user keystrokes, a countdown timer, and orchestrator events
//! into one consistent state, and hands surfaces a render-ready snapshot.
//!
//! # Architecture
//!
//! ```text
//!   keystrokes / resize          orchestrator events
//!          │                             │
//!          ▼                             ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                   SessionRuntime                      │
//! │   one queue, one task, commands before timer ticks   │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │              SessionController                 │  │
//! │  │  ┌──────────────┐ ┌──────────┐ ┌────────────┐  │  │
//! │  │  │ Auto-Execute │ │  Event   │ │  Handoff   │  │  │
//! │  │  │   Engine     │ │  Sync    │ │  Animator  │  │  │
//! │  │  └──────────────┘ └──────────┘ └────────────┘  │  │
//! │  │        SessionState (single owner)             │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ watch<Arc<RenderState>>
//!                            ▼
//!                  surfaces (TUI, headless, tests)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use session_core::{
//!     load_config, Intent, NullSink, SessionController, SessionRuntime, StaticWorkflows,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let controller = SessionController::new(
//!         &config,
//!         Arc::new(StaticWorkflows::default_pipeline()),
//!         Arc::new(NullSink),
//!     );
//!     let session = SessionRuntime::spawn(controller, &config);
//!
//!     session.submit("add a health check endpoint", Intent::task(0.72)).await?;
//!     let mut updates = session.subscribe();
//!     updates.changed().await?;
//!     println!("{:?}", updates.borrow().countdown);
//!
//!     session.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`breakpoint`]: terminal width to layout breakpoint
//! - [`display`]: display modes, messages, and the visibility filter
//! - [`agents`]: agent status, agent panel entries, subtask counters
//! - [`intent`]: classified user intent
//! - [`events`]: orchestrator event contract
//! - [`workflow`]: stage-to-agent lookup
//! - [`sync`]: orchestrator events to session state
//! - [`handoff`]: handoff animation state machine
//! - [`auto_execute`]: preview, countdown, and cancel decisions
//! - [`state`]: the session aggregate
//! - [`render`]: render snapshot for surfaces
//! - [`controller`]: the single mutation point
//! - [`scheduler`]: cancellable periodic timers
//! - [`runtime`]: async event loop and handles
//! - [`config`]: TOML and environment configuration
//!
//! # No TUI Dependencies
//!
//! This crate has no dependency on ratatui, crossterm, or any other UI
//! framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agents;
pub mod auto_execute;
pub mod breakpoint;
pub mod config;
pub mod controller;
pub mod display;
pub mod events;
pub mod handoff;
pub mod intent;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod workflow;

// Re-exports for convenience
pub use agents::{agent_display_name, AgentInfo, AgentStatus, DebugInfo, SubtaskProgress};
pub use auto_execute::{
    classify_key, decide, CountdownUrgency, Decision, Execution, ExecutionError, ExecutionSink,
    Key, KeyAction, KeyInput, NullSink, PendingPreview, PreviewConfig, AUTO_EXECUTE_CONFIDENCE,
};
pub use breakpoint::{resolve, resolve_width, Breakpoint, BreakpointInfo};
pub use controller::{CountdownTick, SessionController};
pub use display::{visible, visible_messages, DisplayMode, Message, MessageId, MessageKind};
pub use events::{OrchestratorEvent, SubtaskRef, TaskRef, TokenUsage};
pub use handoff::{HandoffAnimationState, HandoffAnimator, HandoffConfig, HandoffPhase};
pub use intent::{Intent, IntentType};
pub use render::{CountdownView, PreviewView, RenderState};
pub use runtime::{SessionCommand, SessionError, SessionHandle, SessionRuntime};
pub use scheduler::{Scheduler, TimerFired, TimerHandle, TimerKind};
pub use state::{AgentTransition, SessionState};
pub use sync::{EventSynchronizer, SyncOutcome};
pub use workflow::{LookupError, StaticWorkflows, Workflow, WorkflowLookup, WorkflowStage};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource,
    SessionConfig, SessionToml,
};
