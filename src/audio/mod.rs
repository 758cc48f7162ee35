//! Audio side of the instrument.
//!
//! Sound is produced by an external synthesis collaborator; this module only
//! decides *which* note a keystroke plays and hands it over through the
//! [`synth::Synth`] trait. The same dispatch code drives the browser build
//! (notes queued for WebAudio) and native tests (notes recorded).

pub mod dispatch;
pub mod pitch;
pub mod synth;
