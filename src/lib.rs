pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod lexer;
pub mod playback;
pub mod recording;
pub mod scheduler;
pub mod sequence;
pub mod session;
pub mod text;
pub mod token;

use std::sync::Arc;

use crate::audio::synth::{NoteLog, SynthSettings};
use crate::config::InstrumentConfig;
use crate::error::TypeSynthError;
use crate::input::Key;
use crate::sequence::Sequence;
use crate::session::{ModeKind, Session};
use crate::text::{MonospaceMetrics, TextMetrics};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the typesynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` output and panics to the browser console.
/// Safe to call more than once.
#[wasm_bindgen]
pub fn init_logging() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("logger already initialized");
    }
}

/// Convert a keystroke timing log into sequence JSON.
///
/// Skipped lines are logged, not fatal.
pub fn convert_timing_log_to_json(source: &str) -> Result<String, TypeSynthError> {
    let conversion = recording::convert_log(source)?;
    if !conversion.skipped.is_empty() {
        let report = recording::render_report("timing.log", source, &conversion.skipped);
        log::warn!("{report}");
    }
    log::info!(
        "converted {} entries ({} coalesced, {} skipped)",
        conversion.sequence.len(),
        conversion.coalesced,
        conversion.skipped.len()
    );
    Ok(conversion.sequence.to_json())
}

/// WASM-exposed: convert a keystroke timing log into sequence JSON.
#[wasm_bindgen]
pub fn convert_timing_log(source: &str) -> Result<String, JsValue> {
    convert_timing_log_to_json(source).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// Text metrics backed by a JS `measureWidth(text) -> number` callback,
/// falling back to a fixed advance when none is given or the call fails.
pub struct JsTextMetrics {
    measure: Option<js_sys::Function>,
    fallback: MonospaceMetrics,
}

impl JsTextMetrics {
    pub fn new(measure: Option<js_sys::Function>) -> Self {
        JsTextMetrics {
            measure,
            fallback: MonospaceMetrics::default(),
        }
    }
}

impl TextMetrics for JsTextMetrics {
    fn measure_width(&self, text: &str) -> f32 {
        let measured = self
            .measure
            .as_ref()
            .and_then(|f| f.call1(&JsValue::NULL, &JsValue::from_str(text)).ok())
            .and_then(|v| v.as_f64());
        match measured {
            Some(width) if width.is_finite() => width as f32,
            _ => self.fallback.measure_width(text),
        }
    }
}

/// WASM-exposed instrument. The host calls `advance` from its frame callback
/// and `keyDown` from its keyboard handler, then drains queued notes into
/// WebAudio and redraws from `buffer`/`glyphs`/`caret`.
#[wasm_bindgen]
pub struct TypingInstrument {
    session: Session<NoteLog, JsTextMetrics>,
}

#[wasm_bindgen]
impl TypingInstrument {
    /// `config` may be `undefined` for defaults. `sequence_json` replaces the
    /// built-in demo script. Pass `audio_available = false` when WebAudio
    /// could not be set up; the instrument then runs silently.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        sequence_json: Option<String>,
        measure_width: Option<js_sys::Function>,
        audio_available: bool,
    ) -> Result<TypingInstrument, JsValue> {
        let config: InstrumentConfig = if config.is_undefined() || config.is_null() {
            InstrumentConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let sequence = match sequence_json {
            Some(json) => Sequence::from_json(&json).map_err(|e| JsValue::from_str(&format!("{e}")))?,
            None => Sequence::builtin(),
        };
        let synth = audio_available.then(NoteLog::new);
        Ok(TypingInstrument {
            session: Session::new(config, Arc::new(sequence), JsTextMetrics::new(measure_width), synth),
        })
    }

    /// `key` is `KeyboardEvent.key`.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) {
        self.session.key_down(Key::from_name(key));
    }

    pub fn advance(&mut self, delta_ms: f64) {
        self.session.advance(delta_ms);
    }

    /// `"intro"`, `"guided"` or `"freeplay"`.
    pub fn mode(&self) -> String {
        self.session.mode().as_str().to_string()
    }

    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&mut self, mode: &str) -> Result<(), JsValue> {
        let target = match mode {
            "intro" => ModeKind::Intro,
            "guided" => ModeKind::Guided,
            "freeplay" => ModeKind::Freeplay,
            other => return Err(JsValue::from_str(&format!("unknown mode '{other}'"))),
        };
        self.session.jump_to(target);
        Ok(())
    }

    pub fn buffer(&self) -> String {
        self.session.text().map(|t| t.buffer().to_string()).unwrap_or_default()
    }

    pub fn line(&self) -> usize {
        self.session.text().map_or(0, |t| t.line())
    }

    pub fn caret(&self) -> Result<JsValue, JsValue> {
        let caret = self.session.text().map(|t| t.caret());
        Ok(serde_wasm_bindgen::to_value(&caret)?)
    }

    pub fn glyphs(&self) -> Result<JsValue, JsValue> {
        let glyphs = self.session.text().map(|t| t.glyphs()).unwrap_or_default();
        Ok(serde_wasm_bindgen::to_value(&glyphs)?)
    }

    /// Notes played since the last call, as `NoteOn` objects.
    #[wasm_bindgen(js_name = drainNotes)]
    pub fn drain_notes(&mut self) -> Result<JsValue, JsValue> {
        let notes = self.session.synth_mut().map(|s| s.drain()).unwrap_or_default();
        Ok(serde_wasm_bindgen::to_value(&notes)?)
    }

    #[wasm_bindgen(js_name = statusMessage)]
    pub fn status_message(&self) -> Option<String> {
        self.session.status_message().map(str::to_string)
    }

    /// A blocking message to show once, e.g. when audio is unavailable.
    #[wasm_bindgen(js_name = takeNotice)]
    pub fn take_notice(&mut self) -> Option<String> {
        self.session.take_notice().map(|n| n.to_string())
    }

    /// Freeplay keystrokes as `key: <k>, timing: <ms>` lines; empty outside freeplay.
    #[wasm_bindgen(js_name = timingLog)]
    pub fn timing_log(&self) -> String {
        self.session.timing_log().map(|l| l.to_log_text()).unwrap_or_default()
    }

    /// Freeplay keystrokes converted to sequence JSON, ready to pass back
    /// to the constructor.
    #[wasm_bindgen(js_name = recordedSequence)]
    pub fn recorded_sequence(&self) -> Result<String, JsValue> {
        convert_timing_log(&self.timing_log())
    }

    pub fn transpose(&self) -> i32 {
        self.session.dispatcher().transpose()
    }

    #[wasm_bindgen(js_name = setTranspose)]
    pub fn set_transpose(&mut self, semitones: i32) {
        self.session.set_transpose(semitones);
    }

    #[wasm_bindgen(js_name = synthSettings)]
    pub fn synth_settings(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.session.synth_settings())?)
    }

    #[wasm_bindgen(js_name = setSynthSettings)]
    pub fn set_synth_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: SynthSettings = serde_wasm_bindgen::from_value(settings)?;
        self.session.set_synth_settings(settings);
        Ok(())
    }
}
