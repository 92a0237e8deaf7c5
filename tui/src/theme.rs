//! Theme and Colors
//!
//! Maps session render state onto terminal styles. Painting itself belongs
//! to whichever surface draws the frame; this module only picks colours.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use session_core::{AgentStatus, CountdownUrgency, CountdownView, MessageKind};

// ============================================================================
// Palette
// ============================================================================

/// Countdown with time to spare
pub const CALM_GREEN: Color = Color::Rgb(120, 230, 120);

/// Countdown getting close
pub const WARNING_YELLOW: Color = Color::Rgb(255, 223, 128);

/// Countdown about to fire, and errors
pub const URGENT_RED: Color = Color::Rgb(255, 80, 80);

/// Active agent accent
pub const ACTIVE_CYAN: Color = Color::Rgb(100, 180, 255);

/// Agent responses and parallel groups
pub const AGENT_MAGENTA: Color = Color::Magenta;

/// User input
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// System notices and idle agents
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Tool output
pub const TOOL_BLUE: Color = Color::Rgb(150, 180, 255);

// ============================================================================
// Styles
// ============================================================================

/// Style for the countdown label
#[must_use]
pub fn countdown_style(urgency: CountdownUrgency) -> Style {
    match urgency {
        CountdownUrgency::Calm => Style::default().fg(CALM_GREEN),
        CountdownUrgency::Warning => Style::default().fg(WARNING_YELLOW),
        CountdownUrgency::Urgent => Style::default()
            .fg(URGENT_RED)
            .add_modifier(Modifier::BOLD),
    }
}

/// Countdown label ready to drop into a line
#[must_use]
pub fn countdown_span(countdown: &CountdownView) -> Span<'static> {
    Span::styled(countdown.label.clone(), countdown_style(countdown.urgency))
}

/// Style for an agent panel entry
#[must_use]
pub fn agent_status_style(status: AgentStatus) -> Style {
    match status {
        AgentStatus::Completed => Style::default().fg(CALM_GREEN),
        AgentStatus::Active => Style::default()
            .fg(ACTIVE_CYAN)
            .add_modifier(Modifier::BOLD),
        AgentStatus::Waiting => Style::default().fg(WARNING_YELLOW),
        AgentStatus::Idle => Style::default().fg(DIM_GRAY),
        AgentStatus::Parallel => Style::default().fg(AGENT_MAGENTA),
    }
}

/// Style for a conversation message
#[must_use]
pub fn message_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::User => Style::default().fg(USER_GREEN),
        MessageKind::Assistant => Style::default().fg(AGENT_MAGENTA),
        MessageKind::System => Style::default()
            .fg(DIM_GRAY)
            .add_modifier(Modifier::ITALIC),
        MessageKind::Tool => Style::default().fg(TOOL_BLUE),
        MessageKind::Error => Style::default().fg(URGENT_RED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_colours_follow_urgency() {
        assert_eq!(countdown_style(CountdownUrgency::Calm).fg, Some(CALM_GREEN));
        assert_eq!(
            countdown_style(CountdownUrgency::Warning).fg,
            Some(WARNING_YELLOW)
        );
        let urgent = countdown_style(CountdownUrgency::Urgent);
        assert_eq!(urgent.fg, Some(URGENT_RED));
        assert!(urgent.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_countdown_span_uses_label() {
        let view = CountdownView {
            remaining_ms: 2500,
            seconds: 3,
            urgency: CountdownUrgency::Warning,
            label: "Executing in 3s".to_string(),
        };
        let span = countdown_span(&view);
        assert_eq!(span.content, "Executing in 3s");
        assert_eq!(span.style.fg, Some(WARNING_YELLOW));
    }

    #[test]
    fn test_error_messages_stand_out() {
        assert_eq!(message_style(MessageKind::Error).fg, Some(URGENT_RED));
        assert_ne!(
            message_style(MessageKind::User),
            message_style(MessageKind::System)
        );
    }

    #[test]
    fn test_active_agent_is_bold() {
        let style = agent_status_style(AgentStatus::Active);
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(agent_status_style(AgentStatus::Idle).fg, Some(DIM_GRAY));
    }
}
