//! Handoff Animator
//!
//! Tracks one agent-to-agent transition at a time so surfaces can show the
//! outgoing agent handing over to the incoming one.
//!
//! ```text
//! Idle ──start──▶ Active ──elapsed ≥ fade_start──▶ Fading ──elapsed ≥ duration──▶ Idle
//!                   ▲                                  │
//!                   └──────────── start (replaces) ────┘
//! ```
//!
//! The animator owns no clock. It is advanced with [`HandoffAnimator::update`]
//! by whatever drives it (the runtime's frame timer, or a test), which keeps
//! it deterministic. The agent names are snapshotted when a transition
//! starts, so later session changes never rewrite a handoff in flight.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default animation length
pub const DEFAULT_HANDOFF_DURATION: Duration = Duration::from_millis(2000);

/// Default frame interval for the driving timer
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Fraction of the duration after which the animation fades
const FADE_START_FRACTION: f64 = 0.75;

/// Animator timing configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandoffConfig {
    /// Total animation length
    pub duration: Duration,
    /// How often the driver should call `update`
    pub frame_interval: Duration,
}

impl HandoffConfig {
    /// Point at which fading begins (75% of the duration)
    #[must_use]
    pub fn fade_start(&self) -> Duration {
        self.duration.mul_f64(FADE_START_FRACTION)
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_HANDOFF_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Animator phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffPhase {
    /// No transition in progress
    #[default]
    Idle,
    /// Transition showing at full strength
    Active,
    /// Transition fading out
    Fading,
}

/// Snapshot exposed to surfaces
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffAnimationState {
    /// Whether a transition is showing
    pub is_animating: bool,
    /// Agent handing off
    pub previous_agent: Option<String>,
    /// Agent taking over
    pub current_agent: Option<String>,
    /// Time since the transition started, in milliseconds
    pub elapsed_ms: u64,
    /// Whether the fade-out has begun
    pub is_fading: bool,
}

#[derive(Clone, Debug)]
struct Transition {
    previous_agent: String,
    current_agent: String,
    elapsed: Duration,
}

/// Single-slot handoff state machine
#[derive(Clone, Debug, Default)]
pub struct HandoffAnimator {
    config: HandoffConfig,
    transition: Option<Transition>,
}

impl HandoffAnimator {
    /// Create an idle animator
    #[must_use]
    pub fn new(config: HandoffConfig) -> Self {
        Self {
            config,
            transition: None,
        }
    }

    /// Timing configuration
    #[must_use]
    pub fn config(&self) -> HandoffConfig {
        self.config
    }

    /// Start a transition, replacing any in flight
    pub fn start(&mut self, previous_agent: impl Into<String>, current_agent: impl Into<String>) {
        let previous_agent = previous_agent.into();
        let current_agent = current_agent.into();
        tracing::debug!(
            from = %previous_agent,
            to = %current_agent,
            replaced = self.transition.is_some(),
            "Handoff animation started"
        );
        self.transition = Some(Transition {
            previous_agent,
            current_agent,
            elapsed: Duration::ZERO,
        });
    }

    /// Advance by `delta`
    ///
    /// Returns `true` when the phase changed, which is when the snapshot
    /// surfaces care about changes.
    pub fn update(&mut self, delta: Duration) -> bool {
        let before = self.phase();
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };

        transition.elapsed = transition.elapsed.saturating_add(delta);
        if transition.elapsed >= self.config.duration {
            tracing::debug!(to = %transition.current_agent, "Handoff animation finished");
            self.transition = None;
        }

        self.phase() != before
    }

    /// Drop any transition in flight
    pub fn reset(&mut self) {
        self.transition = None;
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> HandoffPhase {
        match &self.transition {
            None => HandoffPhase::Idle,
            Some(t) if t.elapsed >= self.config.fade_start() => HandoffPhase::Fading,
            Some(_) => HandoffPhase::Active,
        }
    }

    /// Whether a transition is showing
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Snapshot for rendering
    #[must_use]
    pub fn snapshot(&self) -> HandoffAnimationState {
        match &self.transition {
            None => HandoffAnimationState::default(),
            Some(t) => HandoffAnimationState {
                is_animating: true,
                previous_agent: Some(t.previous_agent.clone()),
                current_agent: Some(t.current_agent.clone()),
                elapsed_ms: u64::try_from(t.elapsed.as_millis()).unwrap_or(u64::MAX),
                is_fading: self.phase() == HandoffPhase::Fading,
            },
        }
    }
}
