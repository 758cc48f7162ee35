//! Synthesis collaborator interface.

use serde::{Deserialize, Serialize};

/// A request to sound one note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOn {
    /// MIDI note number after transposition.
    pub midi: i32,
    pub frequency_hz: f64,
    /// Velocity [0, 1].
    pub velocity: f64,
    /// Seconds from now until the note starts.
    pub start_offset: f64,
    /// Gate length in seconds.
    pub duration: f64,
}

/// ADSR envelope configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 0.5,
            release: 0.5,
        }
    }
}

/// Configuration for the delay effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayConfig {
    /// Delay time in seconds.
    pub time: f64,
    /// Feedback amount (0.0 to 1.0).
    pub feedback: f64,
    /// Upper bound on the delay line length, in samples.
    pub max_delay_samples: u32,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            time: 0.2,
            feedback: 0.5,
            max_delay_samples: 2300,
        }
    }
}

/// Everything the synthesizer needs to shape a note.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    pub envelope: EnvelopeConfig,
    pub delay: DelayConfig,
    /// Distortion amount (0.0 to 1.0).
    pub distortion: f64,
}

impl SynthSettings {
    /// Clamp every field into the range the synthesizer accepts.
    pub fn clamped(self) -> Self {
        SynthSettings {
            envelope: EnvelopeConfig {
                attack: self.envelope.attack.max(0.0),
                decay: self.envelope.decay.max(0.0),
                sustain: self.envelope.sustain.clamp(0.0, 1.0),
                release: self.envelope.release.max(0.0),
            },
            delay: DelayConfig {
                time: self.delay.time.max(0.0),
                feedback: self.delay.feedback.clamp(0.0, 0.99),
                max_delay_samples: self.delay.max_delay_samples,
            },
            distortion: self.distortion.clamp(0.0, 1.0),
        }
    }
}

/// The external sound source.
pub trait Synth {
    fn play(&mut self, note: &NoteOn);

    /// Apply new envelope/effect settings to subsequent notes.
    fn configure(&mut self, _settings: &SynthSettings) {}
}

/// A synth that only records what it was asked to play.
///
/// The browser build drains it each frame and forwards the notes to WebAudio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteLog {
    notes: Vec<NoteOn>,
    settings: SynthSettings,
}

impl NoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[NoteOn] {
        &self.notes
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    pub fn drain(&mut self) -> Vec<NoteOn> {
        std::mem::take(&mut self.notes)
    }
}

impl Synth for NoteLog {
    fn play(&mut self, note: &NoteOn) {
        self.notes.push(*note);
    }

    fn configure(&mut self, settings: &SynthSettings) {
        self.settings = *settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sketch() {
        let s = SynthSettings::default();
        assert_eq!(s.envelope.attack, 0.1);
        assert_eq!(s.envelope.sustain, 0.5);
        assert_eq!(s.delay.time, 0.2);
        assert_eq!(s.delay.max_delay_samples, 2300);
        assert_eq!(s.distortion, 0.0);
    }

    #[test]
    fn clamped_limits_ranges() {
        let s = SynthSettings {
            envelope: EnvelopeConfig {
                attack: -1.0,
                sustain: 3.0,
                ..EnvelopeConfig::default()
            },
            delay: DelayConfig {
                feedback: 1.5,
                ..DelayConfig::default()
            },
            distortion: 2.0,
        }
        .clamped();
        assert_eq!(s.envelope.attack, 0.0);
        assert_eq!(s.envelope.sustain, 1.0);
        assert_eq!(s.delay.feedback, 0.99);
        assert_eq!(s.distortion, 1.0);
    }

    #[test]
    fn note_log_drains() {
        let mut log = NoteLog::new();
        let note = NoteOn {
            midi: 60,
            frequency_hz: 261.6,
            velocity: 0.5,
            start_offset: 0.0,
            duration: 0.5,
        };
        log.play(&note);
        log.play(&note);
        assert_eq!(log.drain().len(), 2);
        assert!(log.notes().is_empty());
    }

    #[test]
    fn settings_deserialize_partially() {
        let s: SynthSettings = serde_json::from_str(r#"{"delay": {"time": 0.4}}"#).unwrap();
        assert_eq!(s.delay.time, 0.4);
        assert_eq!(s.delay.feedback, 0.5);
        assert_eq!(s.envelope, EnvelopeConfig::default());
    }
}
