//! Instrument configuration.
//!
//! Every section falls back to its defaults, so hosts only spell out what
//! they change (a plain JS object in the browser, JSON natively).

use serde::{Deserialize, Serialize};

use crate::audio::synth::SynthSettings;
use crate::error::TypeSynthError;
use crate::playback::PlaybackConfig;
use crate::text::LayoutConfig;

/// How guided mode hands over to freeplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandOff {
    /// Switch as soon as the post-completion hold expires.
    #[default]
    Automatic,
    /// Switch on the first key press after the sequence completes.
    AwaitKeypress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentConfig {
    pub layout: LayoutConfig,
    pub playback: PlaybackConfig,
    pub synth: SynthSettings,
    pub hand_off: HandOff,
    /// Go straight from the intro to freeplay.
    pub skip_guided: bool,
    /// Digit keys 1–4 jump between modes instead of typing.
    pub debug_hotkeys: bool,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        InstrumentConfig {
            layout: LayoutConfig::default(),
            playback: PlaybackConfig::default(),
            synth: SynthSettings::default(),
            hand_off: HandOff::Automatic,
            skip_guided: false,
            debug_hotkeys: true,
        }
    }
}

impl InstrumentConfig {
    pub fn from_json(source: &str) -> Result<Self, TypeSynthError> {
        Ok(serde_json::from_str(source)?)
    }
}
