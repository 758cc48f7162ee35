use crate::error::SequenceError;

/// A recorded keystroke, decoded once when a sequence is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyToken {
    // Text
    Literal(char),
    /// A run of whitespace, replayed as this many spaces.
    WhitespaceRun(usize),

    // Control
    Enter,
    Backspace,
    /// Carries timing from the human recording; never mutates anything.
    Shift,
}

impl KeyToken {
    /// Decode a recorded key name.
    ///
    /// Returned errors carry index 0; callers that know the entry position
    /// rewrite it with [`SequenceError::at`].
    pub fn decode(raw: &str) -> Result<KeyToken, SequenceError> {
        if raw.is_empty() {
            return Err(SequenceError::EmptyToken { index: 0 });
        }
        if raw.chars().all(char::is_whitespace) {
            return Ok(KeyToken::WhitespaceRun(raw.chars().count()));
        }
        let mut chars = raw.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(KeyToken::Literal(ch));
        }
        match raw {
            "Enter" | "Return" => Ok(KeyToken::Enter),
            "Backspace" => Ok(KeyToken::Backspace),
            "Shift" => Ok(KeyToken::Shift),
            _ => Err(SequenceError::UnknownToken {
                name: raw.to_string(),
                index: 0,
            }),
        }
    }

    /// True for tokens that add visible text.
    pub fn is_printable(&self) -> bool {
        matches!(self, KeyToken::Literal(_) | KeyToken::WhitespaceRun(_))
    }
}

/// Convert a token back to its recorded key name.
pub fn token_to_string(token: &KeyToken) -> String {
    match token {
        KeyToken::Literal(ch) => ch.to_string(),
        KeyToken::WhitespaceRun(n) => " ".repeat(*n),
        KeyToken::Enter => "Enter".into(),
        KeyToken::Backspace => "Backspace".into(),
        KeyToken::Shift => "Shift".into(),
    }
}
