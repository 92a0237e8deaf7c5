//! Session Runtime
//!
//! Runs a [`SessionController`] on its own tokio task and serializes every
//! input into it: commands from [`SessionHandle`]s and ticks from the
//! [`Scheduler`]'s timers share one loop, so no two mutations interleave.
//!
//! # Architecture
//!
//! ```text
//!  SessionHandle ──mpsc──┐
//!  (clone per caller)    ▼
//!                   ┌──────────┐   watch<Arc<RenderState>>
//!                   │ runtime  │──────────────────────────▶ subscribers
//!                   │   loop   │
//!                   └──────────┘
//!  Scheduler ──mpsc──────┘ (countdown 100ms, animation frames)
//! ```
//!
//! Commands win over timer ticks when both are ready, so a key that cancels
//! a countdown is always applied before a tick that was queued behind it.
//! Timers run only while they have work (a countdown armed, an animation
//! in flight) and are dropped, which aborts them, when the runtime stops.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;

use crate::auto_execute::{KeyInput, PreviewConfig, COUNTDOWN_TICK};
use crate::config::SessionConfig;
use crate::controller::SessionController;
use crate::display::{DisplayMode, Message};
use crate::events::OrchestratorEvent;
use crate::intent::Intent;
use crate::render::RenderState;
use crate::scheduler::{Scheduler, TimerFired, TimerHandle, TimerKind};

/// Buffer for timer ticks; timers block rather than drop when it fills
const TIMER_BUFFER: usize = 16;

/// Errors talking to a session runtime
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The runtime has shut down
    #[error("session runtime has stopped")]
    Stopped,

    /// The command queue is full (non-blocking sends only)
    #[error("session command queue is full")]
    QueueFull,
}

/// Inputs to the session runtime
#[derive(Debug)]
pub enum SessionCommand {
    /// Classified user input
    Submit {
        /// Raw input
        input: String,
        /// Its classified intent
        intent: Intent,
    },
    /// A keystroke
    Key(KeyInput),
    /// Terminal width changed
    Resize(Option<i32>),
    /// Orchestrator notification
    Orchestrator(OrchestratorEvent),
    /// Set the display mode
    SetDisplayMode(DisplayMode),
    /// Step to the next display mode
    CycleDisplayMode,
    /// Flip agent-thought visibility
    ToggleThoughts,
    /// Turn preview on or off
    SetPreviewMode(bool),
    /// Replace preview settings
    SetPreviewConfig(PreviewConfig),
    /// Append an external message
    PushMessage(Message),
    /// Drain the edit buffer
    TakeEditInput(oneshot::Sender<Option<String>>),
    /// Reset the session
    Restart,
    /// Stop the runtime; acknowledged once timers are torn down
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    updates: watch::Receiver<Arc<RenderState>>,
}

impl SessionHandle {
    /// Queue a command, waiting for space
    ///
    /// # Errors
    ///
    /// [`SessionError::Stopped`] if the runtime is gone.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Queue a command without waiting (for callers outside async code)
    ///
    /// # Errors
    ///
    /// [`SessionError::QueueFull`] or [`SessionError::Stopped`].
    pub fn try_send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SessionError::Stopped,
        })
    }

    /// Submit classified input
    pub async fn submit(&self, input: impl Into<String>, intent: Intent) -> Result<(), SessionError> {
        self.send(SessionCommand::Submit {
            input: input.into(),
            intent,
        })
        .await
    }

    /// Forward a keystroke
    pub async fn key(&self, key: KeyInput) -> Result<(), SessionError> {
        self.send(SessionCommand::Key(key)).await
    }

    /// Report a new terminal width
    pub async fn resize(&self, width: Option<i32>) -> Result<(), SessionError> {
        self.send(SessionCommand::Resize(width)).await
    }

    /// Forward an orchestrator event
    pub async fn orchestrator(&self, event: OrchestratorEvent) -> Result<(), SessionError> {
        self.send(SessionCommand::Orchestrator(event)).await
    }

    /// Forward an orchestrator event without waiting
    pub fn try_orchestrator(&self, event: OrchestratorEvent) -> Result<(), SessionError> {
        self.try_send(SessionCommand::Orchestrator(event))
    }

    /// Set the display mode
    pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<(), SessionError> {
        self.send(SessionCommand::SetDisplayMode(mode)).await
    }

    /// Step to the next display mode
    pub async fn cycle_display_mode(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::CycleDisplayMode).await
    }

    /// Flip agent-thought visibility
    pub async fn toggle_thoughts(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ToggleThoughts).await
    }

    /// Turn preview on or off
    pub async fn set_preview_mode(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetPreviewMode(enabled)).await
    }

    /// Replace preview settings
    pub async fn set_preview_config(&self, config: PreviewConfig) -> Result<(), SessionError> {
        self.send(SessionCommand::SetPreviewConfig(config)).await
    }

    /// Append an external message
    pub async fn push_message(&self, message: Message) -> Result<(), SessionError> {
        self.send(SessionCommand::PushMessage(message)).await
    }

    /// Drain the edit buffer filled by the `e` key
    pub async fn take_edit_input(&self) -> Result<Option<String>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::TakeEditInput(tx)).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Reset the session
    pub async fn restart(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Restart).await
    }

    /// Stop the runtime and wait until its timers are gone
    ///
    /// # Errors
    ///
    /// [`SessionError::Stopped`] if it had already stopped.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown(tx)).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Latest render snapshot
    #[must_use]
    pub fn current(&self) -> Arc<RenderState> {
        self.updates.borrow().clone()
    }

    /// Receiver notified on every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<RenderState>> {
        self.updates.clone()
    }

    /// Stream of render snapshots, starting with the current one
    #[must_use]
    pub fn updates(&self) -> WatchStream<Arc<RenderState>> {
        WatchStream::new(self.updates.clone())
    }

    /// Whether the runtime is still accepting commands
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Event loop that owns a session controller
pub struct SessionRuntime {
    controller: SessionController,
    commands: mpsc::Receiver<SessionCommand>,
    timers: mpsc::Receiver<TimerFired>,
    scheduler: Scheduler,
    countdown_timer: Option<TimerHandle>,
    countdown_epoch: u64,
    animation_timer: Option<TimerHandle>,
    last_frame: Instant,
    published: u64,
    updates: watch::Sender<Arc<RenderState>>,
}

impl SessionRuntime {
    /// Spawn the runtime on the current tokio runtime
    #[must_use]
    pub fn spawn(controller: SessionController, config: &SessionConfig) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (scheduler, timers) = Scheduler::new(TIMER_BUFFER);
        let initial = controller.render_state();
        let published = initial.revision;
        let (updates_tx, updates_rx) = watch::channel(Arc::new(initial));

        let runtime = Self {
            controller,
            commands: command_rx,
            timers,
            scheduler,
            countdown_timer: None,
            countdown_epoch: 0,
            animation_timer: None,
            last_frame: Instant::now(),
            published,
            updates: updates_tx,
        };
        tokio::spawn(runtime.run());

        SessionHandle {
            commands: command_tx,
            updates: updates_rx,
        }
    }

    async fn run(mut self) {
        tracing::debug!("Session runtime started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown(ack)) => {
                        self.stop();
                        let _ = ack.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.stop();
                        break;
                    }
                },

                Some(tick) = self.timers.recv() => self.handle_timer(tick),
            }

            self.sync_timers();
            self.publish();
        }

        tracing::debug!("Session runtime stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Submit { input, intent } => {
                self.controller.submit(input, intent);
            }
            SessionCommand::Key(key) => {
                self.controller.handle_key(&key);
            }
            SessionCommand::Resize(width) => self.controller.resize(width),
            SessionCommand::Orchestrator(event) => {
                self.controller.apply_event(event).await;
            }
            SessionCommand::SetDisplayMode(mode) => self.controller.set_display_mode(mode),
            SessionCommand::CycleDisplayMode => {
                self.controller.cycle_display_mode();
            }
            SessionCommand::ToggleThoughts => {
                self.controller.toggle_thoughts();
            }
            SessionCommand::SetPreviewMode(enabled) => self.controller.set_preview_mode(enabled),
            SessionCommand::SetPreviewConfig(config) => self.controller.set_preview_config(config),
            SessionCommand::PushMessage(message) => self.controller.push_message(message),
            SessionCommand::TakeEditInput(reply) => {
                let _ = reply.send(self.controller.take_edit_input());
            }
            SessionCommand::Restart => self.controller.restart(),
            // handled by the loop
            SessionCommand::Shutdown(_) => {}
        }
    }

    fn handle_timer(&mut self, tick: TimerFired) {
        match tick.kind {
            TimerKind::Countdown => {
                if self.countdown_timer.as_ref().is_some_and(|t| t.owns(&tick)) {
                    self.controller.tick_countdown();
                } else {
                    tracing::trace!(generation = tick.generation, "Ignoring stale countdown tick");
                }
            }
            TimerKind::Animation => {
                if self.animation_timer.as_ref().is_some_and(|t| t.owns(&tick)) {
                    let now = Instant::now();
                    let delta = now.duration_since(self.last_frame);
                    self.last_frame = now;
                    self.controller.advance_animation(delta);
                } else {
                    tracing::trace!(generation = tick.generation, "Ignoring stale animation tick");
                }
            }
        }
    }

    /// Arm or drop timers to match what the controller needs
    fn sync_timers(&mut self) {
        if self.controller.is_countdown_active() {
            let epoch = self.controller.countdown_epoch();
            if self.countdown_timer.is_none() || self.countdown_epoch != epoch {
                self.countdown_timer = Some(self.scheduler.arm(TimerKind::Countdown, COUNTDOWN_TICK));
                self.countdown_epoch = epoch;
            }
        } else if self.countdown_timer.take().is_some() {
            tracing::trace!("Countdown timer stopped");
        }

        if self.controller.is_animating() {
            if self.animation_timer.is_none() {
                let period = self.controller.frame_interval();
                self.animation_timer = Some(self.scheduler.arm(TimerKind::Animation, period));
                self.last_frame = Instant::now();
            }
        } else if self.animation_timer.take().is_some() {
            tracing::trace!("Animation timer stopped");
        }
    }

    fn publish(&mut self) {
        let revision = self.controller.revision();
        if revision != self.published {
            self.published = revision;
            self.updates.send_replace(Arc::new(self.controller.render_state()));
        }
    }

    fn stop(&mut self) {
        self.countdown_timer = None;
        self.animation_timer = None;
        self.commands.close();
    }
}
