//! `vkgl-runtime` translates explicit-API command recording onto an immediate-mode target.
//!
//! Currently this crate provides:
//! - Object lifetimes, memory allocation and the host-visible memory model, where several
//!   buffers and images can be bound into one allocation (see [`Device`]).
//! - A pure command encoder that lowers every recorded operation into a flat instruction list
//!   at record time (see [`CommandBuffer`]).
//! - Submission and replay of those lists against the single live target context, with
//!   redundant state changes elided and target framebuffers cached by attachment set (see
//!   [`Queue`]).

mod config;
mod context;
mod device;
mod encode;
mod error;
mod execute;
mod framebuffer;
mod image_layout;
mod memory;
mod memory_type;
mod pipeline;
mod queue;
mod resource;
mod state;
mod upload;

pub mod barrier;
pub mod stats;

pub use barrier::{AccessFlags, MemoryBarrier, PipelineStageFlags};
pub use config::{DeviceConfig, Limits, CHECK_ERRORS_ENV, DISABLE_COPY_IMAGE_ENV};
pub use context::ContextLock;
pub use device::Device;
pub use encode::{
    BufferCopy, BufferImageCopy, ClearAttachment, ClearColorValue, ClearRect, ClearValue,
    CommandBuffer, Filter, ImageBlit, ImageCopy, ImageSubresourceLayers, RecordingState,
};
pub use error::{
    DriverError, Error, OutOfMemoryError, ReplayError, Result, UnsupportedError, ValidationError,
};
pub use execute::{ReplayEvent, ReplayReport};
pub use memory_type::{MemoryHeap, MemoryProperties, MemoryPropertyFlags, MemoryType};
pub use pipeline::{
    AttachmentDescription, FramebufferDesc, IndexType, LoadOp, PipelineBindPoint, PipelineDesc,
    PrimitiveTopology, RenderPassDesc, StoreOp, SubpassDescription,
};
pub use queue::{Queue, SubmitReport};
pub use resource::{
    Allocation, AllocationDesc, Buffer, BufferDesc, BufferUsage, DimensionClass, Fence,
    FenceDesc, Framebuffer, Image, ImageDesc, ImageSubresourceRange, ImageType, ImageUsage,
    ImageView, ImageViewDesc, MemoryRequirements, Pipeline, RenderPass, REMAINING, WHOLE_SIZE,
};
pub use stats::{ContextStats, ContextStatsSnapshot};

pub use vkgl_cmd::packets::{Rect2d, Viewport};
pub use vkgl_format::{Extent3d, Format, ImageAspects};
