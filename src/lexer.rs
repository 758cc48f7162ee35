//! Line lexer for human-readable keystroke timing logs.
//!
//! Each meaningful line has the shape `<key>, timing: <milliseconds>`,
//! optionally prefixed with `key: ` as printed by the freeplay timing log.
//! A space key shows up as `, timing: …` once the line is trimmed and a
//! comma key as `,, timing: …`.

const TIMING_MARKER: &str = ", timing:";
const KEY_PREFIX: &str = "key:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A successfully lexed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub key: String,
    pub timing: f64,
    /// 1-based line number in the source.
    pub line: usize,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingTiming,
    InvalidTiming,
    /// Well-formed line whose key name sequences cannot represent.
    UnknownKey,
}

/// A non-blank line that could not be lexed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: SkipReason,
    /// Byte range of the offending text.
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexedLine {
    Entry(LogEntry),
    Skipped(SkippedLine),
}

pub struct LogLexer<'a> {
    source: &'a str,
    /// Byte offset of the next unread line.
    pos: usize,
    line: usize,
}

impl<'a> LogLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        LogLexer {
            source,
            pos: 0,
            line: 0,
        }
    }

    /// Lex every line. Blank lines are dropped silently.
    pub fn tokenize(&mut self) -> Vec<LexedLine> {
        let mut out = Vec::new();
        while let Some((start, raw)) = self.next_raw_line() {
            if let Some(lexed) = self.lex_line(start, raw) {
                out.push(lexed);
            }
        }
        out
    }

    fn next_raw_line(&mut self) -> Option<(usize, &'a str)> {
        if self.pos >= self.source.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.source[start..];
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        self.pos += len;
        self.line += 1;
        Some((start, &rest[..len]))
    }

    fn lex_line(&self, line_start: usize, raw: &str) -> Option<LexedLine> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let trimmed_start = line_start + (raw.len() - raw.trim_start().len());
        let line_span = Span {
            start: trimmed_start,
            end: trimmed_start + trimmed.len(),
        };

        let (body, body_start, prefixed) = match trimmed.strip_prefix(KEY_PREFIX) {
            Some(rest) => (rest, trimmed_start + KEY_PREFIX.len(), true),
            None => (trimmed, trimmed_start, false),
        };

        let Some(marker) = body.rfind(TIMING_MARKER) else {
            return Some(self.skipped(SkipReason::MissingTiming, line_span, trimmed));
        };

        let mut key = &body[..marker];
        if prefixed {
            key = key.strip_prefix(' ').unwrap_or(key);
        }
        // The trimmed line loses a bare space key entirely.
        let key = if key.trim().is_empty() {
            if key.is_empty() { " ".to_string() } else { key.to_string() }
        } else {
            key.to_string()
        };

        let timing_raw = &body[marker + TIMING_MARKER.len()..];
        let timing_text = timing_raw.trim();
        let timing_start = body_start + marker + TIMING_MARKER.len() + (timing_raw.len() - timing_raw.trim_start().len());
        let timing_span = Span {
            start: timing_start,
            end: timing_start + timing_text.len(),
        };

        match timing_text.parse::<f64>() {
            Ok(timing) if timing.is_finite() && timing >= 0.0 => Some(LexedLine::Entry(LogEntry {
                key,
                timing,
                line: self.line,
                span: line_span,
            })),
            _ => Some(self.skipped(SkipReason::InvalidTiming, timing_span, trimmed)),
        }
    }

    fn skipped(&self, reason: SkipReason, span: Span, text: &str) -> LexedLine {
        LexedLine::Skipped(SkippedLine {
            line: self.line,
            reason,
            span,
            text: text.to_string(),
        })
    }
}
