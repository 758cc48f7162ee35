//! Note Dispatcher: maps typed characters to notes.

use super::pitch::{A4_HZ, midi_to_frequency, note_to_midi};
use super::synth::{NoteOn, Synth};

/// Transposition limit in semitones (8 octaves either way).
pub const MAX_TRANSPOSE: i32 = 96;

pub const NOTE_VELOCITY: f64 = 0.5;
pub const NOTE_DURATION: f64 = 0.5;

/// Keyboard → note table. Lowercase letters walk the naturals from F3 to C7
/// in QWERTY order; the shifted letter plays the sharp of the same note
/// (B and E have none and repeat the natural).
#[rustfmt::skip]
pub const NOTE_MAP: [(char, &str); 52] = [
    ('q', "F3"), ('w', "G3"), ('e', "A3"), ('r', "B3"), ('t', "C4"), ('y', "D4"), ('u', "E4"),
    ('i', "F4"), ('o', "G4"), ('p', "A4"), ('a', "B4"), ('s', "C5"), ('d', "D5"), ('f', "E5"),
    ('g', "F5"), ('h', "G5"), ('j', "A5"), ('k', "B5"), ('l', "C6"), ('z', "D6"), ('x', "E6"),
    ('c', "F6"), ('v', "G6"), ('b', "A6"), ('n', "B6"), ('m', "C7"),
    ('Q', "F#3"), ('W', "G#3"), ('E', "A#3"), ('R', "B3"), ('T', "C#4"), ('Y', "D#4"), ('U', "E4"),
    ('I', "F#4"), ('O', "G#4"), ('P', "A#4"), ('A', "B4"), ('S', "C#5"), ('D', "D#5"), ('F', "E5"),
    ('G', "F#5"), ('H', "G#5"), ('J', "A#5"), ('K', "B5"), ('L', "C#6"), ('Z', "D#6"), ('X', "E6"),
    ('C', "F#6"), ('V', "G#6"), ('B', "A#6"), ('N', "B6"), ('M', "C#7"),
];

/// Note name for a character, if it has one. Case-sensitive.
pub fn note_for(ch: char) -> Option<&'static str> {
    NOTE_MAP.iter().find(|(key, _)| *key == ch).map(|(_, note)| *note)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDispatcher {
    /// Semitones added to every note, within ±[`MAX_TRANSPOSE`].
    transpose: i32,
    last_note: Option<&'static str>,
}

impl NoteDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The note `ch` would play at the current transposition.
    pub fn resolve(&self, ch: char) -> Option<NoteOn> {
        note_for(ch).and_then(|name| self.note_on(name))
    }

    /// Play the note mapped to `ch`. Unmapped characters are silent.
    pub fn dispatch(&mut self, ch: char, synth: &mut dyn Synth) -> Option<NoteOn> {
        let name = note_for(ch)?;
        let note = self.note_on(name)?;
        synth.play(&note);
        self.last_note = Some(name);
        Some(note)
    }

    /// Play the most recently dispatched note again.
    pub fn repeat_last(&mut self, synth: &mut dyn Synth) -> Option<NoteOn> {
        let note = self.note_on(self.last_note?)?;
        synth.play(&note);
        Some(note)
    }

    fn note_on(&self, name: &str) -> Option<NoteOn> {
        let midi = note_to_midi(name)? + self.transpose;
        Some(NoteOn {
            midi,
            frequency_hz: midi_to_frequency(midi, A4_HZ),
            velocity: NOTE_VELOCITY,
            start_offset: 0.0,
            duration: NOTE_DURATION,
        })
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    pub fn set_transpose(&mut self, semitones: i32) {
        self.transpose = semitones.clamp(-MAX_TRANSPOSE, MAX_TRANSPOSE);
    }

    /// Shift by one octave up or down.
    pub fn shift_octave(&mut self, up: bool) {
        let delta = if up { 12 } else { -12 };
        self.set_transpose(self.transpose.saturating_add(delta));
    }

    pub fn last_note(&self) -> Option<&'static str> {
        self.last_note
    }

    /// Forget the remembered note so `repeat_last` is silent until the next dispatch.
    pub fn clear_last_note(&mut self) {
        self.last_note = None;
    }
}
