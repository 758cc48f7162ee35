//! Note names, MIDI numbers and frequencies.

/// Standard concert pitch for A4.
pub const A4_HZ: f64 = 440.0;

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let mut chars = note.chars();
    let base_semitone = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (semitone, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (base_semitone + 1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (base_semitone - 1, r)
    } else {
        (base_semitone, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;

    // MIDI note number: C4 = 60
    Some((octave + 1) * 12 + semitone)
}

/// Convert a MIDI note number to frequency.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}
