//! Session: the instrument's mode state machine.
//!
//! `Intro → Guided → Freeplay` (or `Intro → Freeplay` with `skip_guided`).
//! All mutable state lives here and is only touched from the host's frame
//! callback (`advance`) and key callback (`key_down`). Per-mode state lives
//! inside the [`Mode`] value, so replacing the mode discards in-flight
//! playback and the previous buffer in one step.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::dispatch::NoteDispatcher;
use crate::audio::synth::{NoteOn, Synth, SynthSettings};
use crate::config::{HandOff, InstrumentConfig};
use crate::input::Key;
use crate::playback::{CatchUp, PlaybackClock, Tick};
use crate::recording::TimingLog;
use crate::scheduler::Scheduler;
use crate::sequence::Sequence;
use crate::text::{GlyphSource, TextMetrics, TextModel};
use crate::token::KeyToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Intro,
    Guided,
    Freeplay,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Intro => "intro",
            ModeKind::Guided => "guided",
            ModeKind::Freeplay => "freeplay",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot messages the host should show in a blocking dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AudioUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AudioUnavailable => f.write_str(
                "Audio components failed to load. Please refresh the page or check console for errors.",
            ),
        }
    }
}

#[derive(Debug)]
enum Mode {
    Intro,
    Guided { clock: PlaybackClock, text: TextModel },
    Freeplay { text: TextModel, recorder: TimingLog },
}

impl Mode {
    fn kind(&self) -> ModeKind {
        match self {
            Mode::Intro => ModeKind::Intro,
            Mode::Guided { .. } => ModeKind::Guided,
            Mode::Freeplay { .. } => ModeKind::Freeplay,
        }
    }
}

/// Note dispatcher plus the (possibly missing) synthesizer it feeds.
#[derive(Debug)]
struct Audio<S> {
    dispatcher: NoteDispatcher,
    synth: Option<S>,
}

impl<S: Synth> Audio<S> {
    fn play_char(&mut self, ch: char) -> Option<NoteOn> {
        let synth = self.synth.as_mut()?;
        self.dispatcher.dispatch(ch, synth)
    }

    fn repeat_last(&mut self) -> Option<NoteOn> {
        let synth = self.synth.as_mut()?;
        self.dispatcher.repeat_last(synth)
    }
}

const DEBUG_HOTKEYS: [char; 4] = ['1', '2', '3', '4'];

fn hotkey_target(ch: char) -> Option<ModeKind> {
    match ch {
        '1' => Some(ModeKind::Intro),
        '2' => Some(ModeKind::Guided),
        '3' => Some(ModeKind::Freeplay),
        _ => None,
    }
}

pub struct Session<S, M> {
    config: InstrumentConfig,
    sequence: Arc<Sequence>,
    scheduler: Scheduler,
    mode: Mode,
    audio: Audio<S>,
    metrics: M,
    notice: Option<Notice>,
}

impl<S: Synth, M: TextMetrics> Session<S, M> {
    /// Create a session in intro mode. `synth` is `None` when the host has no
    /// audio capability; that is reported once through [`Session::take_notice`].
    pub fn new(config: InstrumentConfig, sequence: Arc<Sequence>, metrics: M, synth: Option<S>) -> Self {
        let mut synth = synth;
        let notice = match synth.as_mut() {
            Some(s) => {
                s.configure(&config.synth);
                None
            }
            None => {
                log::error!("synth is unavailable; notes will not play");
                Some(Notice::AudioUnavailable)
            }
        };
        Session {
            config,
            sequence,
            scheduler: Scheduler::new(),
            mode: Mode::Intro,
            audio: Audio {
                dispatcher: NoteDispatcher::new(),
                synth,
            },
            metrics,
            notice,
        }
    }

    /// Handle one key press.
    pub fn key_down(&mut self, key: Key) {
        if self.config.debug_hotkeys {
            if let Key::Char(ch) = key {
                if DEBUG_HOTKEYS.contains(&ch) {
                    if let Some(target) = hotkey_target(ch) {
                        self.jump_to(target);
                    }
                    return;
                }
            }
        }

        match &mut self.mode {
            Mode::Intro => {
                let next = if self.config.skip_guided {
                    ModeKind::Freeplay
                } else {
                    ModeKind::Guided
                };
                self.enter(next);
            }
            Mode::Guided { clock, .. } => {
                if self.config.hand_off == HandOff::AwaitKeypress && clock.is_complete() {
                    self.enter(ModeKind::Freeplay);
                }
            }
            Mode::Freeplay { text, recorder } => match key {
                Key::Char(ch) => {
                    recorder.record(KeyToken::Literal(ch), self.scheduler.now());
                    text.apply_character(ch, &self.metrics);
                    if ch == ',' || ch == '.' {
                        self.audio.repeat_last();
                    } else {
                        self.audio.play_char(ch);
                    }
                }
                Key::Enter => {
                    recorder.record(KeyToken::Enter, self.scheduler.now());
                    text.apply_enter();
                }
                Key::Backspace => {
                    recorder.record(KeyToken::Backspace, self.scheduler.now());
                    text.apply_backspace(&self.metrics);
                }
                Key::ArrowUp => self.audio.dispatcher.shift_octave(true),
                Key::ArrowDown => self.audio.dispatcher.shift_octave(false),
                Key::Shift | Key::Other(_) => {}
            },
        }
    }

    /// Advance time by `delta_ms` and run any playback that became due.
    ///
    /// Text mutations from playback are complete when this returns, so a
    /// render reading [`Session::text`] afterwards sees them.
    pub fn advance(&mut self, delta_ms: f64) {
        let now = self.scheduler.advance(delta_ms);

        let mut hand_off = false;
        if let Mode::Guided { clock, text } = &mut self.mode {
            loop {
                match clock.tick(now) {
                    Tick::Fired(event) => {
                        text.apply_token(event.token, &self.metrics);
                        if let KeyToken::Literal(ch) = event.token {
                            self.audio.play_char(ch);
                        }
                        if self.config.playback.catch_up == CatchUp::OnePerTick {
                            break;
                        }
                    }
                    Tick::HandOff => {
                        hand_off = self.config.hand_off == HandOff::Automatic;
                        break;
                    }
                    Tick::Pending | Tick::Holding => break,
                }
            }
        }

        if hand_off {
            self.enter(ModeKind::Freeplay);
        }
    }

    /// Force a mode, resetting its state. Used by the debug hotkeys.
    pub fn jump_to(&mut self, target: ModeKind) {
        log::info!("debug jump to {target}");
        self.enter(target);
    }

    fn enter(&mut self, target: ModeKind) {
        let from = self.mode.kind();
        let layout = self.config.layout;
        self.mode = match target {
            ModeKind::Intro => Mode::Intro,
            ModeKind::Guided => Mode::Guided {
                clock: PlaybackClock::start(self.sequence.clone(), self.scheduler.now(), &self.config.playback),
                text: TextModel::new(layout, GlyphSource::Guided),
            },
            ModeKind::Freeplay => {
                // Only notes played live can be repeated.
                self.audio.dispatcher.clear_last_note();
                Mode::Freeplay {
                    text: TextModel::new(layout, GlyphSource::Live),
                    recorder: TimingLog::new(),
                }
            }
        };
        log::info!("mode {from} -> {target} at {:.1}ms", self.scheduler.now());
    }

    pub fn mode(&self) -> ModeKind {
        self.mode.kind()
    }

    /// The active text model (guided or freeplay).
    pub fn text(&self) -> Option<&TextModel> {
        match &self.mode {
            Mode::Intro => None,
            Mode::Guided { text, .. } | Mode::Freeplay { text, .. } => Some(text),
        }
    }

    /// Keys typed in freeplay so far, with their timing.
    pub fn timing_log(&self) -> Option<&TimingLog> {
        match &self.mode {
            Mode::Freeplay { recorder, .. } => Some(recorder),
            _ => None,
        }
    }

    pub fn playback(&self) -> Option<&PlaybackClock> {
        match &self.mode {
            Mode::Guided { clock, .. } => Some(clock),
            _ => None,
        }
    }

    /// Prompt the renderer should overlay, if any.
    pub fn status_message(&self) -> Option<&'static str> {
        match &self.mode {
            Mode::Intro => Some("press any key"),
            Mode::Guided { clock, .. } if clock.is_complete() => Some(match self.config.hand_off {
                HandOff::Automatic => "Sequence complete! Moving to freeplay mode...",
                HandOff::AwaitKeypress => "Sequence complete! Press any key to continue.",
            }),
            _ => None,
        }
    }

    /// Pending blocking notice; returned once.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn dispatcher(&self) -> &NoteDispatcher {
        &self.audio.dispatcher
    }

    pub fn set_transpose(&mut self, semitones: i32) {
        self.audio.dispatcher.set_transpose(semitones);
    }

    pub fn synth(&self) -> Option<&S> {
        self.audio.synth.as_ref()
    }

    pub fn synth_mut(&mut self) -> Option<&mut S> {
        self.audio.synth.as_mut()
    }

    pub fn synth_settings(&self) -> &SynthSettings {
        &self.config.synth
    }

    /// Replace envelope/effect settings and push them to the synth.
    pub fn set_synth_settings(&mut self, settings: SynthSettings) {
        self.config.synth = settings.clamped();
        if let Some(synth) = self.audio.synth.as_mut() {
            synth.configure(&self.config.synth);
        }
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::NoteLog;
    use crate::playback::PlaybackConfig;
    use crate::text::{LayoutConfig, MonospaceMetrics};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn config() -> InstrumentConfig {
        InstrumentConfig {
            layout: LayoutConfig {
                left_margin: 0.0,
                top_margin: 0.0,
                line_height: 20.0,
                max_line_width: 1000.0,
                ceiling: 0.0,
            },
            playback: PlaybackConfig {
                lead_in_ms: 0.0,
                hold_ms: 3000.0,
                catch_up: CatchUp::OnePerTick,
            },
            ..InstrumentConfig::default()
        }
    }

    fn session_with(cfg: InstrumentConfig, pairs: &[(&str, f64)]) -> Session<NoteLog, MonospaceMetrics> {
        let seq = Arc::new(Sequence::from_pairs(pairs).unwrap());
        Session::new(cfg, seq, MonospaceMetrics::new(10.0), Some(NoteLog::new()))
    }

    fn session(pairs: &[(&str, f64)]) -> Session<NoteLog, MonospaceMetrics> {
        session_with(config(), pairs)
    }

    fn run_until_complete(s: &mut Session<NoteLog, MonospaceMetrics>, step_ms: f64) {
        for _ in 0..100_000 {
            if s.playback().is_some_and(|c| c.is_complete()) {
                return;
            }
            s.advance(step_ms);
        }
        panic!("playback never completed");
    }

    fn notes(s: &Session<NoteLog, MonospaceMetrics>) -> usize {
        s.synth().map_or(0, |n| n.notes().len())
    }

    #[test]
    fn test_intro_key_starts_guided() {
        let mut s = session(&[("a", 0.0)]);
        assert_eq!(s.mode(), ModeKind::Intro);
        assert_eq!(s.status_message(), Some("press any key"));
        s.key_down(Key::Char('x'));
        assert_eq!(s.mode(), ModeKind::Guided);
        // The starting key is not typed.
        assert_eq!(s.text().unwrap().buffer(), "");
    }

    #[test]
    fn test_scenario_hi_enter() {
        let mut s = session(&[("H", 0.0), ("i", 1.74), ("Enter", 2.13)]);
        s.key_down(Key::Char(' '));
        run_until_complete(&mut s, FRAME_MS);
        let text = s.text().unwrap();
        assert_eq!(text.buffer(), "Hi\n");
        assert_eq!(text.line(), 1);
        // 'H' → G#5, 'i' → F4.
        assert_eq!(notes(&s), 2);
    }

    #[test]
    fn test_unmapped_chars_dispatch_nothing() {
        let mut s = session(&[("1", 0.0), ("!", 5.0)]);
        s.key_down(Key::Char('x'));
        run_until_complete(&mut s, FRAME_MS);
        assert_eq!(s.text().unwrap().buffer(), "1!");
        assert_eq!(notes(&s), 0);
    }

    const SCRIPT: [(&str, f64); 11] = [
        ("T", 0.0),
        ("y", 120.0),
        ("p", 80.0),
        ("o", 95.0),
        ("Backspace", 300.0),
        ("e", 60.0),
        ("   ", 10.0),
        ("Shift", 400.0),
        ("D", 30.0),
        ("Enter", 250.0),
        ("x", 0.0),
    ];

    fn play_script_with_steps(cfg: &InstrumentConfig) -> Vec<TextModel> {
        [1.0, FRAME_MS, 250.0, 10_000.0]
            .into_iter()
            .map(|step| {
                let mut s = session_with(cfg.clone(), &SCRIPT);
                s.key_down(Key::Char('x'));
                run_until_complete(&mut s, step);
                s.text().unwrap().clone()
            })
            .collect()
    }

    #[test]
    fn test_final_buffer_independent_of_step_size() {
        let results = play_script_with_steps(&config());
        assert_eq!(results[0].buffer(), "Type   D\nx");
        assert!(results.iter().all(|t| *t == results[0]));
    }

    #[test]
    fn test_step_size_independence_with_wrapping() {
        let mut cfg = config();
        cfg.layout.max_line_width = 35.0;
        let results = play_script_with_steps(&cfg);
        // "o" wraps, Backspace takes back the implicit break, "e" and "D" wrap.
        assert_eq!(results[0].buffer(), "Typoe\n   D\n\nx");
        assert_eq!(results[0].line(), 3);
        assert!(results.iter().all(|t| *t == results[0]));
    }

    #[test]
    fn test_drain_overdue_fires_everything_at_once() {
        let mut cfg = config();
        cfg.playback.catch_up = CatchUp::DrainOverdue;
        let mut s = session_with(cfg, &[("a", 0.0), ("b", 10.0), ("c", 10.0)]);
        s.key_down(Key::Char('x'));
        s.advance(1000.0);
        assert_eq!(s.text().unwrap().buffer(), "abc");
        assert!(s.playback().unwrap().is_complete());
    }

    #[test]
    fn test_one_per_tick_catches_up_gradually() {
        let mut s = session(&[("a", 0.0), ("b", 10.0), ("c", 10.0)]);
        s.key_down(Key::Char('x'));
        s.advance(1000.0);
        assert_eq!(s.text().unwrap().buffer(), "a");
        s.advance(0.0);
        assert_eq!(s.text().unwrap().buffer(), "ab");
        s.advance(0.0);
        assert_eq!(s.text().unwrap().buffer(), "abc");
    }

    #[test]
    fn test_backspace_after_enter_in_playback() {
        let mut s = session(&[("o", 0.0), ("k", 10.0), ("Enter", 10.0), ("Backspace", 10.0)]);
        s.key_down(Key::Char('x'));
        run_until_complete(&mut s, 5.0);
        let text = s.text().unwrap();
        assert_eq!(text.buffer(), "ok");
        assert_eq!(text.line(), 0);
    }

    #[test]
    fn test_shift_waits_but_does_nothing() {
        let mut s = session(&[("a", 0.0), ("Shift", 500.0), ("b", 0.0)]);
        s.key_down(Key::Char('x'));
        s.advance(0.0);
        assert_eq!(s.text().unwrap().buffer(), "a");
        assert_eq!(notes(&s), 1);
        s.advance(499.0);
        assert_eq!(s.playback().unwrap().index(), 1);
        s.advance(1.0);
        // Shift fired: index moved, nothing typed or played.
        assert_eq!(s.playback().unwrap().index(), 2);
        assert_eq!(s.text().unwrap().buffer(), "a");
        assert_eq!(notes(&s), 1);
        s.advance(0.0);
        assert_eq!(s.text().unwrap().buffer(), "ab");
        assert_eq!(notes(&s), 2);
    }

    #[test]
    fn test_automatic_hand_off_after_hold() {
        let mut s = session(&[("a", 0.0)]);
        s.key_down(Key::Char('x'));
        s.advance(0.0);
        assert!(s.playback().unwrap().is_complete());
        assert_eq!(s.status_message(), Some("Sequence complete! Moving to freeplay mode..."));
        s.advance(2999.0);
        assert_eq!(s.mode(), ModeKind::Guided);
        s.advance(1.0);
        assert_eq!(s.mode(), ModeKind::Freeplay);
        assert_eq!(s.text().unwrap().buffer(), "");
    }

    #[test]
    fn test_await_keypress_hand_off() {
        let mut cfg = config();
        cfg.hand_off = HandOff::AwaitKeypress;
        let mut s = session_with(cfg, &[("a", 100.0)]);
        s.key_down(Key::Char('x'));
        // Keys before completion are ignored.
        s.key_down(Key::Char('y'));
        assert_eq!(s.mode(), ModeKind::Guided);
        s.advance(100.0);
        s.advance(10_000.0);
        assert_eq!(s.mode(), ModeKind::Guided);
        s.key_down(Key::Char('y'));
        assert_eq!(s.mode(), ModeKind::Freeplay);
        assert_eq!(s.text().unwrap().buffer(), "");
    }

    #[test]
    fn test_skip_guided_variant() {
        let mut cfg = config();
        cfg.skip_guided = true;
        let mut s = session_with(cfg, &[("a", 0.0)]);
        s.key_down(Key::Enter);
        assert_eq!(s.mode(), ModeKind::Freeplay);
    }

    #[test]
    fn test_freeplay_typing_and_notes() {
        let mut s = session(&[]);
        s.jump_to(ModeKind::Freeplay);
        for name in ["t", "y", "Enter", "p", "Backspace", "Shift", "Tab"] {
            s.key_down(Key::from_name(name));
        }
        let text = s.text().unwrap();
        assert_eq!(text.buffer(), "ty\n");
        assert_eq!(text.line(), 1);
        assert_eq!(notes(&s), 3);
    }

    #[test]
    fn test_freeplay_repeat_last_note() {
        let mut s = session(&[]);
        s.jump_to(ModeKind::Freeplay);
        s.key_down(Key::Char(','));
        assert_eq!(notes(&s), 0);
        s.key_down(Key::Char('p'));
        s.key_down(Key::Char('.'));
        s.key_down(Key::Char(','));
        assert_eq!(s.text().unwrap().buffer(), ",p.,");
        let played = s.synth().unwrap().notes();
        assert_eq!(played.len(), 3);
        assert!(played.iter().all(|n| n.midi == 69));
    }

    #[test]
    fn test_arrow_keys_transpose() {
        let mut s = session(&[]);
        s.jump_to(ModeKind::Freeplay);
        s.key_down(Key::ArrowUp);
        s.key_down(Key::Char('p'));
        assert_eq!(s.synth().unwrap().notes()[0].midi, 81);
        for _ in 0..20 {
            s.key_down(Key::ArrowDown);
        }
        assert_eq!(s.dispatcher().transpose(), -96);
    }

    #[test]
    fn test_debug_hotkeys_discard_playback() {
        let mut s = session(&[("a", 0.0), ("b", 100.0)]);
        s.key_down(Key::Char('x'));
        s.advance(0.0);
        assert_eq!(s.text().unwrap().buffer(), "a");
        s.key_down(Key::Char('3'));
        assert_eq!(s.mode(), ModeKind::Freeplay);
        assert!(s.playback().is_none());
        s.advance(1000.0);
        assert_eq!(s.text().unwrap().buffer(), "");
        // Hotkeys are never typed, reserved ones included.
        s.key_down(Key::Char('4'));
        assert_eq!(s.text().unwrap().buffer(), "");
        s.key_down(Key::Char('2'));
        assert_eq!(s.mode(), ModeKind::Guided);
        assert_eq!(s.playback().unwrap().index(), 0);
        s.key_down(Key::Char('1'));
        assert_eq!(s.mode(), ModeKind::Intro);
        assert!(s.text().is_none());
    }

    #[test]
    fn test_digits_type_without_hotkeys() {
        let mut cfg = config();
        cfg.debug_hotkeys = false;
        let mut s = session_with(cfg, &[]);
        s.jump_to(ModeKind::Freeplay);
        s.key_down(Key::Char('2'));
        assert_eq!(s.text().unwrap().buffer(), "2");
    }

    #[test]
    fn test_missing_synth_noticed_once() {
        let seq = Arc::new(Sequence::builtin());
        let mut s: Session<NoteLog, _> = Session::new(config(), seq, MonospaceMetrics::new(10.0), None);
        assert_eq!(s.take_notice(), Some(Notice::AudioUnavailable));
        assert_eq!(s.take_notice(), None);
        s.jump_to(ModeKind::Freeplay);
        s.key_down(Key::Char('p'));
        assert_eq!(s.text().unwrap().buffer(), "p");
        // Nothing remembered either: no note was actually played.
        assert_eq!(s.dispatcher().last_note(), None);
    }

    #[test]
    fn test_empty_sequence_hands_off() {
        let mut s = session(&[]);
        s.key_down(Key::Char('x'));
        s.advance(0.0);
        assert!(s.playback().unwrap().is_complete());
        s.advance(3000.0);
        assert_eq!(s.mode(), ModeKind::Freeplay);
    }

    #[test]
    fn test_synth_settings_are_clamped_and_forwarded() {
        let mut s = session(&[]);
        let mut settings = SynthSettings::default();
        settings.envelope.attack = 0.7;
        settings.delay.feedback = 4.0;
        s.set_synth_settings(settings);
        let applied = s.synth().unwrap().settings();
        assert_eq!(applied.envelope.attack, 0.7);
        assert_eq!(applied.delay.feedback, 0.99);
        assert_eq!(s.synth_settings(), applied);
    }

    #[test]
    fn test_guided_notes_are_not_repeated_in_freeplay() {
        let mut s = session(&[("p", 0.0)]);
        s.key_down(Key::Char('x'));
        s.advance(0.0);
        assert_eq!(notes(&s), 1);
        s.advance(3000.0);
        assert_eq!(s.mode(), ModeKind::Freeplay);
        s.key_down(Key::Char(','));
        assert_eq!(notes(&s), 1);
        assert_eq!(s.dispatcher().last_note(), None);
        assert_eq!(s.text().unwrap().buffer(), ",");
    }

    #[test]
    fn test_freeplay_typing_replays_from_timing_log() {
        let mut s = session(&[]);
        s.advance(500.0);
        s.jump_to(ModeKind::Freeplay);
        assert!(s.timing_log().unwrap().is_empty());
        for name in ["H", "i", " ", "Enter", "o", "k", "Backspace", "!", "Tab"] {
            s.advance(150.0);
            s.key_down(Key::from_name(name));
        }
        let typed = s.text().unwrap().buffer().to_string();
        assert_eq!(typed, "Hi \no!");

        let log = s.timing_log().unwrap().to_log_text();
        assert!(log.starts_with("key: H, timing: 0\nkey: i, timing: 150\n"));
        let conversion = crate::recording::convert_log(&log).unwrap();
        assert!(conversion.skipped.is_empty());
        assert_eq!(conversion.sequence.len(), 8);

        let mut replay = Session::new(
            config(),
            Arc::new(conversion.sequence),
            MonospaceMetrics::new(10.0),
            Some(NoteLog::new()),
        );
        replay.key_down(Key::Char('x'));
        run_until_complete(&mut replay, FRAME_MS);
        assert_eq!(replay.text().unwrap().buffer(), typed);
    }
}
