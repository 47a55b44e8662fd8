use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Text box holding the dropdown query.
#[derive(Default)]
pub struct QueryInput {
    input: Input,
}

impl QueryInput {
    pub fn reset(&mut self) {
        self.input.reset();
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    /// Feed a key to the input. Returns true when the text changed.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input
            .handle_event(&Event::Key(key))
            .map(|change| change.value)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_changes_value() {
        let mut input = QueryInput::default();
        assert!(input.handle_key_event(key(KeyCode::Char('f'))));
        assert!(input.handle_key_event(key(KeyCode::Char('a'))));
        assert_eq!(input.value(), "fa");
        assert!(input.handle_key_event(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "f");

        input.reset();
        assert_eq!(input.value(), "");
    }
}
