//! Session Controller
//!
//! Owns the [`SessionState`] and is the single place it changes. Keystrokes,
//! resizes, timer ticks and orchestrator events all come through here, one
//! at a time, and every change bumps the revision so observers can tell a
//! fresh [`RenderState`] from a stale one.
//!
//! The controller has no clock of its own. The countdown advances when
//! [`SessionController::tick_countdown`] is called and the handoff animation
//! when [`SessionController::advance_animation`] is. In production the
//! [`crate::runtime::SessionRuntime`] drives both from scheduled timers;
//! tests call them directly.

use std::sync::Arc;
use std::time::Duration;

use crate::auto_execute::{
    auto_execute_message, classify_key, decide, is_preview_toggle, timeout_message, Decision,
    Execution, ExecutionSink, KeyAction, KeyInput, PendingPreview, PreviewConfig,
    AUTO_EXECUTE_CANCELLED, PREVIEW_CANCELLED, PREVIEW_TOGGLE_PREFIX, RETURNING_TO_EDIT,
};
use crate::breakpoint::{self, BreakpointInfo};
use crate::config::SessionConfig;
use crate::display::{DisplayMode, Message};
use crate::events::OrchestratorEvent;
use crate::handoff::HandoffAnimator;
use crate::intent::Intent;
use crate::render::RenderState;
use crate::state::SessionState;
use crate::sync::{EventSynchronizer, SyncOutcome};
use crate::workflow::WorkflowLookup;

/// Result of one countdown tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownTick {
    /// No countdown running
    Idle,
    /// Still counting; milliseconds left
    Running(i64),
    /// Ran out and the preview executed
    Fired,
}

/// The session's single mutation point
pub struct SessionController {
    state: SessionState,
    initial: SessionState,
    animator: HandoffAnimator,
    synchronizer: EventSynchronizer,
    sink: Arc<dyn ExecutionSink>,
    width: Option<i32>,
    breakpoint: BreakpointInfo,
    revision: u64,
    countdown_epoch: u64,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("revision", &self.revision)
            .field("width", &self.width)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller
    pub fn new(
        config: &SessionConfig,
        lookup: Arc<dyn WorkflowLookup>,
        sink: Arc<dyn ExecutionSink>,
    ) -> Self {
        let mut state = SessionState::new(config.preview, config.max_history);
        state.set_preview_mode(config.preview_mode);
        state.set_display_mode(config.display_mode);
        state.set_show_thoughts(config.show_thoughts);

        Self {
            initial: state.clone(),
            state,
            animator: HandoffAnimator::new(config.handoff),
            synchronizer: EventSynchronizer::new(lookup, config.lookup_timeout),
            sink,
            width: None,
            breakpoint: breakpoint::resolve(None),
            revision: 0,
            countdown_epoch: 0,
        }
    }

    /// Read-only view of the state
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Increases with every state change
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Changes whenever a new countdown starts
    ///
    /// A driver re-arms its tick timer when this moves, so a superseding
    /// preview gets a full first tick.
    #[must_use]
    pub fn countdown_epoch(&self) -> u64 {
        self.countdown_epoch
    }

    /// Whether a countdown is running
    #[must_use]
    pub fn is_countdown_active(&self) -> bool {
        self.state.countdown().is_some()
    }

    /// Whether a handoff animation is running
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Animation frame interval for drivers
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.animator.config().frame_interval
    }

    /// Current render snapshot
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        RenderState::project(
            &self.state,
            self.breakpoint,
            self.animator.snapshot(),
            self.revision,
        )
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ============================================
    // Input
    // ============================================

    /// Submit classified input
    pub fn submit(&mut self, input: impl Into<String>, intent: Intent) -> Decision {
        let input = input.into();
        self.state.push_message(Message::user(input.clone()));

        let decision = decide(
            &input,
            &intent,
            &self.state.preview_config(),
            self.state.preview_mode(),
        );
        tracing::debug!(?decision, confidence = intent.confidence, "Input submitted");

        match decision {
            Decision::Immediate | Decision::AutoExecute => {
                if self.state.take_pending_preview().is_some() {
                    tracing::debug!("Pending preview superseded by new input");
                }
                if is_preview_toggle(&input) {
                    self.toggle_preview_mode(&input);
                }
                if decision == Decision::AutoExecute {
                    self.state
                        .push_message(Message::system(auto_execute_message(intent.confidence)));
                }
                self.execute(&Execution::for_input(&input, &intent));
            }
            Decision::Preview => {
                self.state.set_pending_preview(PendingPreview::new(input, intent));
                self.countdown_epoch = self.countdown_epoch.wrapping_add(1);
                tracing::debug!(
                    timeout_ms = self.state.preview_config().timeout_ms,
                    "Countdown armed"
                );
            }
        }

        self.bump();
        decision
    }

    fn toggle_preview_mode(&mut self, input: &str) {
        let arg = input[PREVIEW_TOGGLE_PREFIX.len()..].trim().to_lowercase();
        let enabled = match arg.as_str() {
            "on" => true,
            "off" => false,
            _ => !self.state.preview_mode(),
        };
        self.state.set_preview_mode(enabled);
        let notice = if enabled {
            "Preview mode enabled."
        } else {
            "Preview mode disabled."
        };
        self.state.push_message(Message::system(notice));
    }

    /// Handle a keystroke
    ///
    /// Returns `None` when no preview is pending; the key is not for us.
    pub fn handle_key(&mut self, key: &KeyInput) -> Option<KeyAction> {
        self.state.pending_preview()?;

        let action = classify_key(key);
        match action {
            KeyAction::Confirm => {
                if let Some(preview) = self.state.take_pending_preview() {
                    tracing::debug!("Preview confirmed");
                    self.execute(&Execution::for_input(&preview.input, &preview.intent));
                }
            }
            KeyAction::Cancel => {
                self.state.take_pending_preview();
                self.state.push_message(Message::system(PREVIEW_CANCELLED));
                tracing::debug!("Preview cancelled");
            }
            KeyAction::Edit => {
                if let Some(preview) = self.state.take_pending_preview() {
                    self.state.set_edit_input(preview.input);
                    self.state.push_message(Message::system(RETURNING_TO_EDIT));
                }
            }
            KeyAction::CancelCountdown => {
                if !self.state.cancel_countdown() {
                    return Some(action);
                }
                self.state.push_message(Message::system(AUTO_EXECUTE_CANCELLED));
                tracing::debug!(key = ?key.key, "Countdown cancelled");
            }
        }

        self.bump();
        Some(action)
    }

    /// Advance the countdown by one 100ms tick
    pub fn tick_countdown(&mut self) -> CountdownTick {
        if !self.state.tick_countdown() {
            return match self.state.remaining_ms() {
                Some(remaining) => {
                    tracing::trace!(remaining_ms = remaining, "Countdown tick");
                    self.bump();
                    CountdownTick::Running(remaining)
                }
                None => CountdownTick::Idle,
            };
        }

        let timeout_ms = self
            .state
            .countdown()
            .map_or(self.state.preview_config().timeout_ms, |c| c.timeout_ms());
        let Some(preview) = self.state.take_pending_preview() else {
            return CountdownTick::Idle;
        };
        self.state.push_message(Message::system(timeout_message(timeout_ms)));
        tracing::debug!(timeout_ms, "Countdown expired, executing preview");
        self.execute(&Execution::for_input(&preview.input, &preview.intent));
        self.bump();
        CountdownTick::Fired
    }

    /// Advance the handoff animation; returns `true` when its phase changed
    ///
    /// Every frame of a running animation is a new snapshot (elapsed time
    /// and fade state move), so the revision moves on each call that
    /// had a transition to advance.
    pub fn advance_animation(&mut self, delta: Duration) -> bool {
        let was_animating = self.animator.is_animating();
        let changed = self.animator.update(delta);
        if was_animating {
            self.bump();
        }
        changed
    }

    /// Terminal resized; `None` or non-positive widths mean narrow
    pub fn resize(&mut self, width: Option<i32>) {
        self.width = width;
        let resolved = breakpoint::resolve(width);
        if resolved != self.breakpoint {
            tracing::debug!(breakpoint = %resolved.breakpoint, ?width, "Breakpoint changed");
            self.breakpoint = resolved;
            self.bump();
        }
    }

    /// Apply an orchestrator event
    pub async fn apply_event(&mut self, event: OrchestratorEvent) -> SyncOutcome {
        let outcome = self.synchronizer.apply(&mut self.state, event).await;
        if let Some(transition) = &outcome.agent_changed {
            if let Some(from) = &transition.from {
                self.animator.start(from.clone(), transition.to.clone());
            }
        }
        if outcome.changed {
            self.bump();
        }
        outcome
    }

    // ============================================
    // Settings
    // ============================================

    /// Set the display mode
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.state.display_mode() != mode {
            self.state.set_display_mode(mode);
            self.bump();
        }
    }

    /// Step to the next display mode
    pub fn cycle_display_mode(&mut self) -> DisplayMode {
        let next = self.state.display_mode().next();
        self.set_display_mode(next);
        next
    }

    /// Flip agent-thought visibility
    pub fn toggle_thoughts(&mut self) -> bool {
        let show = !self.state.show_thoughts();
        self.state.set_show_thoughts(show);
        self.bump();
        show
    }

    /// Replace preview settings; a running countdown keeps its time
    pub fn set_preview_config(&mut self, config: PreviewConfig) {
        self.state.set_preview_config(config);
        self.bump();
    }

    /// Turn preview on or off without a message
    pub fn set_preview_mode(&mut self, enabled: bool) {
        if self.state.preview_mode() != enabled {
            self.state.set_preview_mode(enabled);
            self.bump();
        }
    }

    /// Append a message from outside (agent output, tool logs, ...)
    pub fn push_message(&mut self, message: Message) {
        self.state.push_message(message);
        self.bump();
    }

    /// Drain the edit buffer filled by the `e` key
    pub fn take_edit_input(&mut self) -> Option<String> {
        let taken = self.state.take_edit_input();
        if taken.is_some() {
            self.bump();
        }
        taken
    }

    /// Replace the session state with a fresh one
    ///
    /// Settings from construction are restored and cached workflows are
    /// dropped. The revision keeps counting so observers see the reset.
    pub fn restart(&mut self) {
        tracing::info!("Restarting session");
        self.state = self.initial.clone();
        self.animator.reset();
        self.synchronizer.clear_cache();
        self.bump();
    }

    fn execute(&mut self, execution: &Execution) {
        if let Err(e) = execution.dispatch(self.sink.as_ref()) {
            tracing::warn!(error = %e, target = %execution, "Execution failed");
            self.state
                .push_message(Message::error(format!("Execution failed: {e}")));
        }
    }
}
