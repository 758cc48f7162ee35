//! Text model: accumulated text, line counter, caret and glyphs.

use serde::{Deserialize, Serialize};

use super::layout::{Caret, LayoutConfig, TextMetrics};
use crate::token::KeyToken;

/// Who produced a glyph. Renderers may style the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlyphSource {
    Guided,
    Live,
}

/// A displayed character and where it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypedGlyph {
    pub ch: char,
    pub position: Caret,
    pub source: GlyphSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextModel {
    layout: LayoutConfig,
    source: GlyphSource,
    buffer: String,
    /// Number of line breaks (explicit and implicit) in `buffer`.
    line: usize,
    caret: Caret,
    /// One glyph per non-newline char of `buffer`, in order.
    glyphs: Vec<TypedGlyph>,
}

impl TextModel {
    pub fn new(layout: LayoutConfig, source: GlyphSource) -> Self {
        TextModel {
            layout,
            source,
            buffer: String::new(),
            line: 0,
            caret: layout.line_start(0),
            glyphs: Vec::new(),
        }
    }

    /// Append a character. Returns `true` if it triggered an implicit wrap.
    pub fn apply_character(&mut self, ch: char, metrics: &dyn TextMetrics) -> bool {
        self.buffer.push(ch);
        self.glyphs.push(TypedGlyph {
            ch,
            position: self.caret,
            source: self.source,
        });
        self.caret.x += metrics.char_width(ch);
        if self.caret.x > self.layout.max_line_width {
            self.break_line();
            return true;
        }
        false
    }

    pub fn apply_enter(&mut self) {
        self.break_line();
    }

    /// Remove the last character, if any.
    pub fn apply_backspace(&mut self, metrics: &dyn TextMetrics) -> Option<char> {
        let removed = self.buffer.pop()?;
        if removed == '\n' {
            self.line = self.line.saturating_sub(1);
            let width = metrics.measure_width(self.current_line());
            self.caret = Caret {
                x: self.layout.left_margin + width,
                y: self.layout.line_y(self.line),
            };
        } else if let Some(glyph) = self.glyphs.pop() {
            self.caret = glyph.position;
        }
        Some(removed)
    }

    pub fn apply_shift(&mut self) {}

    /// Apply one decoded token. Returns `true` if the buffer changed.
    pub fn apply_token(&mut self, token: KeyToken, metrics: &dyn TextMetrics) -> bool {
        match token {
            KeyToken::Literal(ch) => {
                self.apply_character(ch, metrics);
                true
            }
            KeyToken::WhitespaceRun(n) => {
                for _ in 0..n {
                    self.apply_character(' ', metrics);
                }
                n > 0
            }
            KeyToken::Enter => {
                self.apply_enter();
                true
            }
            KeyToken::Backspace => self.apply_backspace(metrics).is_some(),
            KeyToken::Shift => {
                self.apply_shift();
                false
            }
        }
    }

    fn break_line(&mut self) {
        self.buffer.push('\n');
        self.line += 1;
        self.caret = self.layout.line_start(self.line);
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Text after the last line break.
    pub fn current_line(&self) -> &str {
        match self.buffer.rfind('\n') {
            Some(i) => &self.buffer[i + 1..],
            None => &self.buffer,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn caret(&self) -> Caret {
        self.caret
    }

    pub fn glyphs(&self) -> &[TypedGlyph] {
        &self.glyphs
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
