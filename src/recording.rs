//! Offline conversion of keystroke timing logs into playable sequences.

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

use crate::error::SequenceError;
use crate::lexer::{LexedLine, LogEntry, LogLexer, SkipReason, SkippedLine};
use crate::sequence::{Sequence, SequenceEvent};
use crate::token::{KeyToken, token_to_string};

/// Repeated space/comma events at or below this gap are keyboard noise.
pub const NOISE_THRESHOLD_MS: f64 = 100.0;

/// Result of converting a timing log.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub sequence: Sequence,
    /// Lines that were dropped because they could not be parsed.
    pub skipped: Vec<SkippedLine>,
    /// Number of entries removed as duplicate noise.
    pub coalesced: usize,
}

/// Convert a timing log into a sequence.
///
/// Unparseable lines and lines naming keys that sequences cannot represent
/// are dropped and listed in [`Conversion::skipped`], in source order.
pub fn convert_log(source: &str) -> Result<Conversion, SequenceError> {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    for lexed in LogLexer::new(source).tokenize() {
        match lexed {
            LexedLine::Entry(entry) => entries.push(entry),
            LexedLine::Skipped(skip) => {
                log::warn!("skipping log line {}: {:?}", skip.line, skip.reason);
                skipped.push(skip);
            }
        }
    }

    let total = entries.len();
    let kept = coalesce(entries);
    let coalesced = total - kept.len();

    let mut events = Vec::with_capacity(kept.len());
    for entry in kept {
        match KeyToken::decode(&entry.key) {
            Ok(token) => events.push(SequenceEvent::new(token, round_to_hundredths(entry.timing))),
            Err(err) => {
                log::warn!("skipping log line {}: {err}", entry.line);
                let text = source.get(entry.span.start..entry.span.end).unwrap_or(&entry.key);
                skipped.push(SkippedLine {
                    line: entry.line,
                    reason: SkipReason::UnknownKey,
                    span: entry.span,
                    text: text.to_string(),
                });
            }
        }
    }
    skipped.sort_by_key(|s| s.line);
    let sequence = Sequence::new(events)?;

    Ok(Conversion {
        sequence,
        skipped,
        coalesced,
    })
}

/// Keystroke timing log written while the player types freely.
///
/// Lines read `key: <k>, timing: <gap>`, the gap being the milliseconds since
/// the previous recorded key (0 for the first), which is the form
/// [`convert_log`] reads back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingLog {
    last_ms: Option<f64>,
    entries: Vec<(KeyToken, f64)>,
}

impl TimingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, token: KeyToken, now_ms: f64) {
        let gap = self.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_ms = Some(now_ms);
        log::debug!("key: {}, timing: {gap}", token_to_string(&token));
        self.entries.push((token, gap));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_log_text(&self) -> String {
        self.entries
            .iter()
            .map(|(token, gap)| format!("key: {}, timing: {gap}\n", token_to_string(token)))
            .collect()
    }
}

/// Drop consecutive repeats of a space or comma that arrive within the noise
/// threshold of the previously kept entry.
pub fn coalesce(entries: Vec<LogEntry>) -> Vec<LogEntry> {
    let mut kept: Vec<LogEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        let repeat = kept.last().is_some_and(|last| last.key == entry.key);
        let noisy = matches!(entry.key.as_str(), " " | ",") && entry.timing <= NOISE_THRESHOLD_MS;
        if !(repeat && noisy) {
            kept.push(entry);
        }
    }
    kept
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render skipped lines as a plain-text diagnostic report.
///
/// Returns an empty string when nothing was skipped.
pub fn render_report(name: &str, source: &str, skipped: &[SkippedLine]) -> String {
    let mut out = Vec::new();
    for skip in skipped {
        let message = match skip.reason {
            SkipReason::MissingTiming => "line has no `, timing:` column",
            SkipReason::InvalidTiming => "timing is not a non-negative number",
            SkipReason::UnknownKey => "key name cannot be replayed",
        };
        let range = skip.span.start..skip.span.end;
        let report = Report::build(ReportKind::Warning, range.clone())
            .with_config(Config::default().with_color(false).with_index_type(IndexType::Byte))
            .with_message(format!("{name}:{}: dropped log line", skip.line))
            .with_label(Label::new(range).with_message(message))
            .finish();
        if report.write(Source::from(source), &mut out).is_err() {
            break;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
