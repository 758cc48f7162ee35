//! Caret geometry and the text-metrics seam.

use serde::{Deserialize, Serialize};

/// Width measurement supplied by the rendering collaborator.
pub trait TextMetrics {
    /// Rendered width of `text` in pixels at the current font settings.
    fn measure_width(&self, text: &str) -> f32;

    fn char_width(&self, ch: char) -> f32 {
        let mut buf = [0u8; 4];
        self.measure_width(ch.encode_utf8(&mut buf))
    }
}

/// Fixed advance per character. Used natively and in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
}

impl MonospaceMetrics {
    pub fn new(advance: f32) -> Self {
        MonospaceMetrics { advance }
    }
}

impl Default for MonospaceMetrics {
    /// Consolas at 32px advances roughly 0.55em.
    fn default() -> Self {
        MonospaceMetrics { advance: 17.6 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn measure_width(&self, text: &str) -> f32 {
        self.advance * text.chars().count() as f32
    }
}

/// Caret position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Caret {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub left_margin: f32,
    pub top_margin: f32,
    pub line_height: f32,
    /// Caret x beyond which an implicit line break is inserted.
    pub max_line_width: f32,
    /// Caret y is never placed above this.
    pub ceiling: f32,
}

impl LayoutConfig {
    pub const TEXT_SIZE: f32 = 32.0;
    pub const MARGIN: f32 = 100.0;
    pub const MAX_TEXT_WIDTH_FRACTION: f32 = 0.8;

    /// Layout for a drawing surface of the given width.
    pub fn for_surface_width(width: f32) -> Self {
        let inset = Self::MARGIN / 2.0 + 60.0;
        LayoutConfig {
            left_margin: inset,
            top_margin: inset,
            line_height: Self::TEXT_SIZE * 1.2,
            max_line_width: width * Self::MAX_TEXT_WIDTH_FRACTION,
            ceiling: inset,
        }
    }

    /// Caret y for a given line index, clamped to the ceiling.
    pub fn line_y(&self, line: usize) -> f32 {
        (self.top_margin + line as f32 * self.line_height).max(self.ceiling)
    }

    pub fn line_start(&self, line: usize) -> Caret {
        Caret {
            x: self.left_margin,
            y: self.line_y(line),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::for_surface_width(1280.0)
    }
}
