//! Recorded keystroke sequences.
//!
//! A sequence is an ordered list of `[token, delayMs]` pairs. The delay of
//! entry *i* is the wait between entry *i − 1* firing and entry *i* firing;
//! for the first entry it is measured from the end of the playback lead-in.

use serde::{Deserialize, Serialize};

use crate::error::SequenceError;
use crate::token::{KeyToken, token_to_string};

/// One `(token, delay)` pair of a recorded script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceEvent {
    pub token: KeyToken,
    /// Milliseconds to wait after the previous event before this one fires.
    pub delay_ms: f64,
}

impl SequenceEvent {
    pub fn new(token: KeyToken, delay_ms: f64) -> Self {
        SequenceEvent { token, delay_ms }
    }
}

/// The on-disk / on-wire shape of a single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RawEntry(String, f64);

/// An immutable, validated keystroke script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    events: Vec<SequenceEvent>,
}

impl Sequence {
    /// Build a sequence from already-decoded events, validating every delay.
    pub fn new(events: Vec<SequenceEvent>) -> Result<Self, SequenceError> {
        for (index, event) in events.iter().enumerate() {
            check_delay(event.delay_ms, index)?;
        }
        Ok(Sequence { events })
    }

    /// Decode `(key name, delay)` pairs.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, f64)]) -> Result<Self, SequenceError> {
        let mut events = Vec::with_capacity(pairs.len());
        for (index, (name, delay_ms)) in pairs.iter().enumerate() {
            let token = KeyToken::decode(name.as_ref()).map_err(|e| e.at(index))?;
            check_delay(*delay_ms, index)?;
            events.push(SequenceEvent::new(token, *delay_ms));
        }
        Ok(Sequence { events })
    }

    /// Parse a JSON array of `[token, delayMs]` pairs.
    pub fn from_json(source: &str) -> Result<Self, SequenceError> {
        let raw: Vec<RawEntry> = serde_json::from_str(source)?;
        let pairs: Vec<(String, f64)> = raw.into_iter().map(|RawEntry(k, d)| (k, d)).collect();
        Self::from_pairs(&pairs)
    }

    /// Serialize back to the JSON `[token, delayMs]` form.
    pub fn to_json(&self) -> String {
        let raw: Vec<RawEntry> = self
            .events
            .iter()
            .map(|e| RawEntry(token_to_string(&e.token), e.delay_ms))
            .collect();
        // Serializing strings and finite floats cannot fail.
        serde_json::to_string(&raw).unwrap_or_default()
    }

    /// The demo script typed out when guided mode starts.
    pub fn builtin() -> Self {
        let events = [
            ('T', 0.0),
            ('e', 500.0),
            ('s', 250.0),
            ('t', 250.0),
            ('i', 500.0),
            ('n', 1000.0),
            ('g', 500.0),
        ]
        .into_iter()
        .map(|(ch, delay_ms)| SequenceEvent::new(KeyToken::Literal(ch), delay_ms))
        .collect();
        Sequence { events }
    }

    pub fn events(&self) -> &[SequenceEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&SequenceEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all delays, i.e. playback length excluding lead-in and hold.
    pub fn total_duration_ms(&self) -> f64 {
        self.events.iter().map(|e| e.delay_ms).sum()
    }
}

fn check_delay(delay_ms: f64, index: usize) -> Result<(), SequenceError> {
    if delay_ms.is_finite() && delay_ms >= 0.0 {
        Ok(())
    } else {
        Err(SequenceError::InvalidDelay { delay_ms, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_pairs() {
        let seq = Sequence::from_json(r#"[["H", 0.0], ["i", 1.74], ["Enter", 2.13]]"#).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.events()[0], SequenceEvent::new(KeyToken::Literal('H'), 0.0));
        assert_eq!(seq.events()[2].token, KeyToken::Enter);
        assert!((seq.total_duration_ms() - 3.87).abs() < 1e-9);
    }

    #[test]
    fn rejects_negative_delay_with_index() {
        let err = Sequence::from_json(r#"[["a", 0], ["b", -5]]"#).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidDelay { index: 1, .. }));
    }

    #[test]
    fn rejects_unknown_key_with_index() {
        let err = Sequence::from_json(r#"[["a", 0], ["b", 1], ["Control", 2]]"#).unwrap_err();
        match err {
            SequenceError::UnknownToken { name, index } => {
                assert_eq!(name, "Control");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Sequence::from_json(r#"[["a"]]"#),
            Err(SequenceError::Json(_))
        ));
    }

    #[test]
    fn json_output_reloads() {
        let seq = Sequence::from_pairs(&[("  ", 10.0), ("x", 20.5), ("Shift", 0.0)]).unwrap();
        let json = seq.to_json();
        assert_eq!(json, r#"[["  ",10.0],["x",20.5],["Shift",0.0]]"#);
        assert_eq!(Sequence::from_json(&json).unwrap(), seq);
    }

    #[test]
    fn new_validates_delays() {
        let bad = vec![SequenceEvent::new(KeyToken::Enter, f64::NAN)];
        assert!(Sequence::new(bad).is_err());
    }

    #[test]
    fn builtin_types_testing() {
        let seq = Sequence::builtin();
        let text: String = seq
            .events()
            .iter()
            .map(|e| token_to_string(&e.token))
            .collect();
        assert_eq!(text, "Testing");
        assert_eq!(seq.events()[0].delay_ms, 0.0);
    }
}
