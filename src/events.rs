use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent};
use std::time::Duration;

/// Terminal events forwarded into the app loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// Key press event
    Key(KeyEvent),

    /// Bracketed paste
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Nothing arrived before the tick elapsed
    Tick,
}

impl From<Event> for TuiEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key) => TuiEvent::Key(key),
            Event::Paste(text) => TuiEvent::Paste(text),
            Event::Resize(width, height) => TuiEvent::Resize(width, height),
            _ => TuiEvent::Tick,
        }
    }
}

/// Wait up to `tick` for the next terminal event
pub fn next_event(tick: Duration) -> Result<TuiEvent> {
    if event::poll(tick).context("Failed to poll terminal events")? {
        let event = event::read().context("Failed to read terminal event")?;
        Ok(event.into())
    } else {
        Ok(TuiEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_event_conversion() {
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(TuiEvent::from(Event::Key(key)), TuiEvent::Key(key));
        assert_eq!(TuiEvent::from(Event::Resize(80, 24)), TuiEvent::Resize(80, 24));
        assert_eq!(TuiEvent::from(Event::FocusGained), TuiEvent::Tick);
    }
}
