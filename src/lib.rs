//! Explicit-API command recording replayed on an immediate-mode graphics context.
//!
//! This crate re-exports the workspace pieces under one roof:
//! - [`format`]: the pixel format table and per-format transfer parameters.
//! - [`gl`]: the target driver interface and a recording implementation of it.
//! - [`cmd`]: the flat instruction encoding that recorded command buffers lower to.
//! - Everything from `vkgl-runtime` at the top level: the device, memory binding model,
//!   command encoder and queue.

pub use vkgl_cmd as cmd;
pub use vkgl_format as format;
pub use vkgl_gl as gl;

pub use vkgl_runtime::*;
