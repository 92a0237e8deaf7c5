//! Terminal Input
//!
//! Converts crossterm events into session inputs and pumps them into a
//! running session.

use std::io;

use anyhow::Context;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{Stream, StreamExt};

use session_core::{Key, KeyInput, SessionHandle};

/// Convert a key event, ignoring release and repeat events
#[must_use]
pub fn key_from_event(event: KeyEvent) -> Option<KeyInput> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    let key = match event.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Char(c) => Key::Char(c),
        other => Key::Other(key_name(other)),
    };

    Some(KeyInput {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        meta: event
            .modifiers
            .intersects(KeyModifiers::META | KeyModifiers::SUPER),
    })
}

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Forward key and resize events until the stream ends or the session stops
///
/// # Errors
///
/// Returns an error if the terminal event stream fails.
pub async fn forward_terminal_events<S>(mut events: S, session: SessionHandle) -> anyhow::Result<()>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    while let Some(event) = events.next().await {
        let event = event.context("failed to read terminal event")?;

        let sent = match event {
            Event::Key(key) => match key_from_event(key) {
                Some(input) => session.key(input).await,
                None => continue,
            },
            Event::Resize(width, _) => session.resize(Some(i32::from(width))).await,
            _ => continue,
        };

        if let Err(e) = sent {
            tracing::debug!(error = %e, "Session gone, no longer forwarding terminal events");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_events_only() {
        let mut release = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(key_from_event(release), None);

        let press = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(key_from_event(press), Some(KeyInput::enter()));
    }

    #[test]
    fn test_named_keys() {
        let esc = key_from_event(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(esc, Some(KeyInput::escape()));

        let up = key_from_event(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE));
        assert_eq!(up, Some(KeyInput::other("up")));

        let f5 = key_from_event(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE));
        assert_eq!(f5, Some(KeyInput::other("f5")));
    }

    #[test]
    fn test_modifiers_carried() {
        let ctrl_e = key_from_event(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(ctrl_e, KeyInput::char('e').with_ctrl());
        assert!(ctrl_e.has_modifiers());

        let super_x =
            key_from_event(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::SUPER)).unwrap();
        assert!(super_x.meta);
    }
}
