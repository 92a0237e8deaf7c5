//! agentdeck TUI - Terminal surface for the session controller
//!
//! The session controller in `session-core` owns every decision; this crate
//! only translates between it and the terminal.
//!
//! # Architecture
//!
//! - **Input**: crossterm events become [`session_core::KeyInput`]s and
//!   resize notifications on a [`session_core::SessionHandle`]
//! - **Theme**: render-state urgency, agent status, and message kinds map
//!   to ratatui styles
//! - **Logging**: tracing subscriber writing to stderr

pub mod input;
pub mod theme;

pub use input::{forward_terminal_events, key_from_event};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "AGENTDECK_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Install the global tracing subscriber
///
/// Logs go to stderr so they never paint over the alternate screen.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
