//! Target driver interface.
//!
//! [`GlApi`] is the complete set of immediate-mode entry points the translation core calls;
//! [`RecordingGl`] is an in-process implementation that logs every call and emulates buffer and
//! texture storage, used for headless runs and tests.

pub mod api;
pub mod consts;
pub mod recording;

pub use api::{
    GlApi, GlBuffer, GlFramebuffer, GlProgram, GlSync, GlTexture, GlVertexArray, PixelDest,
    PixelSource, Rect,
};
pub use recording::{GlCall, RecordedAttachment, RecordedSource, RecordingGl};
