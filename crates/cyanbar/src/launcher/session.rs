use super::keys::{self, Edge, Key, KeyEvent};

/// Known commands for tab completion, as `(prefix target, expansion)`. The first match wins.
pub const COMPLETIONS: &[(&str, &str)] = &[("firefox", "firefox"), ("urxvt", "urxvt"), ("lilyterm", "urxvt"), ("emacs", "emacs")];

/// What the launcher should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Submit,
    Cancel,
}

/// The text entry state of one launcher activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherSession {
    pub buffer: String,
    pub shift_active: bool,
}

impl LauncherSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: KeyEvent) -> Outcome {
        let KeyEvent { key, edge } = event;
        match (key, edge) {
            // models a held shift, not a sticky toggle: press and release both flip, repeats are ignored
            (Key::Shift, Edge::Press | Edge::Release) => self.shift_active = !self.shift_active,
            (Key::Char(base), Edge::Press | Edge::Repeat) => {
                if let Some(c) = keys::char_for(base, self.shift_active) {
                    self.buffer.push(c);
                }
            }
            (Key::Backspace, Edge::Press | Edge::Repeat) => {
                self.buffer.pop();
            }
            (Key::Tab, Edge::Press) => self.autocomplete(),
            (Key::Enter, Edge::Press) => return Outcome::Submit,
            (Key::Escape, Edge::Press) => return Outcome::Cancel,
            _ => {}
        }
        Outcome::Continue
    }

    /// Replace the buffer with the expansion of the first known command it is a prefix of.
    /// An empty buffer is left alone.
    pub fn autocomplete(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Some((_, expansion)) = COMPLETIONS.iter().find(|(target, _)| target.starts_with(self.buffer.as_str())) {
            self.buffer = expansion.to_string();
        }
    }
}
