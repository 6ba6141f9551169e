/// A key, as far as the launcher cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, identified by the character it produces without shift.
    Char(char),
    Shift,
    Backspace,
    Tab,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Press,
    /// The key is held down and the keyboard repeats it.
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub edge: Edge,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        KeyEvent { key, edge: Edge::Press }
    }

    pub fn release(key: Key) -> Self {
        KeyEvent { key, edge: Edge::Release }
    }

    pub fn repeat(key: Key) -> Self {
        KeyEvent { key, edge: Edge::Repeat }
    }
}

const DIGIT_SHIFT: [(char, char); 10] = [
    ('1', '!'),
    ('2', '@'),
    ('3', '#'),
    ('4', '$'),
    ('5', '%'),
    ('6', '^'),
    ('7', '&'),
    ('8', '*'),
    ('9', '('),
    ('0', ')'),
];

const PUNCTUATION_SHIFT: [(char, char); 12] = [
    ('-', '_'),
    ('=', '+'),
    ('[', '{'),
    (']', '}'),
    (';', ':'),
    ('\'', '"'),
    ('`', '~'),
    ('\\', '|'),
    (',', '<'),
    ('.', '>'),
    ('/', '?'),
    (' ', ' '),
];

/// The character a printable key produces, given the shift state.
/// Returns `None` for characters that are not in the key tables.
pub fn char_for(base: char, shift: bool) -> Option<char> {
    if base.is_ascii_lowercase() {
        return Some(if shift { base.to_ascii_uppercase() } else { base });
    }
    DIGIT_SHIFT
        .iter()
        .chain(PUNCTUATION_SHIFT.iter())
        .find(|(plain, _)| *plain == base)
        .map(|(plain, shifted)| if shift { *shifted } else { *plain })
}

/// Map an X11 keycode of a US keyboard layout to a key.
pub fn from_x11_keycode(code: u32) -> Option<Key> {
    const ROWS: [(u32, &str); 4] = [(10, "1234567890-="), (24, "qwertyuiop[]"), (38, "asdfghjkl;'`"), (52, "zxcvbnm,./")];
    let key = match code {
        9 => Key::Escape,
        22 => Key::Backspace,
        23 => Key::Tab,
        36 | 104 => Key::Enter,
        50 | 62 => Key::Shift,
        51 => Key::Char('\\'),
        65 => Key::Char(' '),
        _ => {
            let (start, chars) = ROWS.iter().find(|(start, chars)| (*start..*start + chars.len() as u32).contains(&code))?;
            Key::Char(chars.chars().nth((code - start) as usize)?)
        }
    };
    Some(key)
}
