//! Text buffer and caret model.
//!
//! The logical text (`buffer`, `line`) is what playback and live typing
//! mutate; the caret and glyph positions are derived display state computed
//! through a [`TextMetrics`] collaborator supplied by the renderer.
//!
//! ## Modules
//!
//! - `layout`: margins, line height, wrap width, metrics trait
//! - `buffer`: the `TextModel` and its apply operations

pub mod buffer;
pub mod layout;

pub use buffer::{GlyphSource, TextModel, TypedGlyph};
pub use layout::{Caret, LayoutConfig, MonospaceMetrics, TextMetrics};
