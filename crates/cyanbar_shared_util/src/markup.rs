//! Helpers for writing lemonbar-style markup.
//!
//! Formatting blocks look like `%{X}` or `%{X:argument:}`. A literal `%` has to be written as `%%`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Left => write!(f, "%{{l}}"),
            Alignment::Center => write!(f, "%{{c}}"),
            Alignment::Right => write!(f, "%{{r}}"),
        }
    }
}

/// Mouse buttons as numbered by the bar when reporting clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left = 1,
    Middle = 2,
    Right = 3,
    ScrollUp = 4,
    ScrollDown = 5,
}

/// Swap foreground and background colors for `content`.
pub fn reversed(content: &str) -> String {
    format!("%{{R}}{}%{{R}}", content)
}

/// Make `content` clickable. When clicked with `button`, the bar prints `command` on its stdout.
///
/// `:` terminates the command inside the block, so it is escaped.
pub fn clickable(button: MouseButton, command: &str, content: &str) -> String {
    format!("%{{A{}:{}:}}{}%{{A}}", button as u8, command.replace(':', "\\:"), content)
}

/// Escape text so that the bar shows it literally.
pub fn escape(text: &str) -> String {
    text.replace('%', "%%")
}
