//! Live keyboard input.

/// A key press as reported by the host, decoded from `KeyboardEvent.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    ArrowUp,
    ArrowDown,
    Shift,
    /// Any other named key (`"Tab"`, `"F5"`, `"Alt"` …).
    Other(String),
}

impl Key {
    pub fn from_name(name: &str) -> Key {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Key::Char(ch);
        }
        match name {
            "Enter" | "Return" => Key::Enter,
            "Backspace" => Key::Backspace,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Shift" => Key::Shift,
            _ => Key::Other(name.to_string()),
        }
    }
}
