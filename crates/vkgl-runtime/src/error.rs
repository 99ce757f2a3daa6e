use vkgl_cmd::{DecodeError, Opcode};
use vkgl_format::{Format, FormatError};
use vkgl_gl::consts::GLenum;

use crate::memory_type::MemoryPropertyFlags;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    OutOfMemory(#[from] OutOfMemoryError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::UnknownFormat(v) => ValidationError::UnknownFormat(v).into(),
            FormatError::Unsupported(format) => UnsupportedError::Format(format).into(),
        }
    }
}

/// Caller-contract violations. Always reported before any target call is made.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} {id} does not exist or was destroyed")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("unknown format value {0}")]
    UnknownFormat(u32),
    #[error("{0} must not be zero")]
    Zero(&'static str),
    #[error("memory type index {0} is out of range")]
    InvalidMemoryType(u32),
    #[error("{kind} {id} is already bound to memory")]
    AlreadyBound { kind: &'static str, id: u32 },
    #[error("{kind} {id} is not bound to memory")]
    NotBound { kind: &'static str, id: u32 },
    #[error("memory type {type_index} is not allowed by type bits {type_bits:#x}")]
    IncompatibleMemoryType { type_index: u32, type_bits: u32 },
    #[error("offset {offset} is not a multiple of {alignment}")]
    Misaligned { offset: u64, alignment: u64 },
    #[error("range [{offset}, {offset}+{size}) exceeds {limit} bytes")]
    OutOfRange { offset: u64, size: u64, limit: u64 },
    #[error("memory type flags {0:?} are not host visible")]
    NotHostVisible(MemoryPropertyFlags),
    #[error("allocation {0} is already mapped")]
    AlreadyMapped(u32),
    #[error("allocation {0} is not mapped")]
    NotMapped(u32),
    #[error("range [{offset}, {offset}+{size}) lies outside the mapped range")]
    OutsideMappedRange { offset: u64, size: u64 },
    #[error("command buffer is not recording")]
    NotRecording,
    #[error("command buffer is already recording")]
    AlreadyRecording,
    #[error("command buffer is not executable")]
    NotExecutable,
    #[error("no {0} pipeline is bound")]
    NoPipelineBound(&'static str),
    #[error("no index buffer is bound")]
    NoIndexBuffer,
    #[error("no render pass is active")]
    NoRenderPass,
    #[error("a render pass is already active")]
    RenderPassActive,
    #[error("{what}: {count} exceeds the limit of {limit}")]
    TooMany {
        what: &'static str,
        count: u64,
        limit: u64,
    },
    #[error("region at {offset:?} of {extent:?} exceeds level {level} extent {limit:?}")]
    RegionOutOfBounds {
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        limit: [u32; 3],
    },
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("framebuffer {0} refers to destroyed attachments")]
    StaleFramebuffer(u32),
    #[error("fence {0} already has a pending signal")]
    FenceInUse(u32),
}

/// Resource exhaustion, kept distinct from contract violations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum OutOfMemoryError {
    #[error("no memory type in bits {type_bits:#x} has flags {required:?}")]
    NoCompatibleMemoryType {
        type_bits: u32,
        required: MemoryPropertyFlags,
    },
    #[error("heap {heap} cannot fit {requested} bytes ({available} available)")]
    HeapExhausted {
        heap: u32,
        requested: u64,
        available: u64,
    },
}

/// An error raised by the target driver.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("target error {code:#06x}{}", context_suffix(.opcode, .at))]
pub struct DriverError {
    pub code: GLenum,
    /// Instruction that raised the error, when it was raised during replay.
    pub opcode: Option<Opcode>,
    pub at: Option<usize>,
}

fn context_suffix(opcode: &Option<Opcode>, at: &Option<usize>) -> String {
    match (opcode, at) {
        (Some(op), Some(at)) => format!(" at instruction {at} ({op:?})"),
        _ => String::new(),
    }
}

/// Combinations the target cannot express. These fail closed.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum UnsupportedError {
    #[error("format {0:?} has no target representation")]
    Format(Format),
    #[error("render passes with {0} subpasses")]
    MultipleSubpasses(usize),
    #[error("attaching {count} layers from layer {base} of {total}")]
    PartialLayerRange { base: u32, count: u32, total: u32 },
    #[error("framebuffer incomplete (status {0:#06x})")]
    IncompleteFramebuffer(GLenum),
    #[error("blitting block-compressed format {0:?}")]
    CompressedBlit(Format),
    #[error("host transfers of multisample images")]
    MultisampleTransfer,
}

/// Instruction-level problems found while replaying. Reported as events; replay continues.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{kind} {id} is not available")]
    Missing { kind: &'static str, id: u32 },
    #[error("framebuffer {0} has no live attachment set")]
    StaleFramebuffer(u32),
    #[error("no {0} is bound")]
    NotBound(&'static str),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),
}
