//! Instruction payload layouts.
//!
//! Every payload is `repr(C, packed)` plain data so it can be copied in and out of the list
//! bytes verbatim. Object references are raw handle ids; target enumerants are resolved at
//! encode time wherever the encoder already knows them.

use bytemuck::{Pod, Zeroable};

use crate::Opcode;

/// Capacity of inline arrays (viewports, scissors, vertex buffer slots).
pub const INLINE_CAPACITY: usize = 16;
/// Bytes of push-constant data carried per instruction.
pub const PUSH_CONSTANT_CAPACITY: usize = 128;
/// Upper bound on `UpdateBuffer` tail bytes.
pub const UPDATE_BUFFER_MAX_BYTES: usize = 65536;
/// Upper bound on debug label tail bytes.
pub const DEBUG_LABEL_MAX_BYTES: usize = 256;

/// A payload type bound to its opcode.
pub trait Instruction: Pod {
    const OPCODE: Opcode;
}

macro_rules! instruction {
    ($($ty:ident => $op:ident,)+) => {
        $(impl Instruction for $ty {
            const OPCODE: Opcode = Opcode::$op;
        })+
    };
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Rect2d {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexBufferSlot {
    pub buffer: u32,
    pub stride: u32,
    pub offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Nop {
    pub reserved: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BindPipeline {
    pub pipeline: u32,
    /// 0 = graphics, 1 = compute.
    pub bind_point: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BindVertexBuffers {
    pub first: u32,
    pub count: u32,
    pub slots: [VertexBufferSlot; INLINE_CAPACITY],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BindIndexBuffer {
    pub buffer: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PushConstants {
    pub offset: u32,
    pub size: u32,
    pub data: [u8; PUSH_CONSTANT_CAPACITY],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetViewports {
    pub first: u32,
    pub count: u32,
    pub viewports: [Viewport; INLINE_CAPACITY],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetScissors {
    pub first: u32,
    pub count: u32,
    pub rects: [Rect2d; INLINE_CAPACITY],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetLineWidth {
    pub width: f32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetDepthBias {
    pub constant: f32,
    pub clamp: f32,
    pub slope: f32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetBlendConstants {
    pub constants: [f32; 4],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Draw {
    pub mode: u32,
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawIndexed {
    pub mode: u32,
    pub index_type: u32,
    pub index_count: u32,
    pub instance_count: u32,
    pub first_instance: u32,
    pub vertex_offset: i32,
    /// Absolute byte offset of the first index in the bound index buffer.
    pub index_offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawIndirect {
    pub mode: u32,
    pub buffer: u32,
    pub draw_count: u32,
    pub stride: u32,
    pub offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawIndexedIndirect {
    pub mode: u32,
    pub index_type: u32,
    pub buffer: u32,
    pub draw_count: u32,
    pub stride: u32,
    pub offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Dispatch {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DispatchIndirect {
    pub buffer: u32,
    pub offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CopyBuffer {
    pub src: u32,
    pub dst: u32,
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

/// Followed by `size` bytes of data, padded to 4.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct UpdateBuffer {
    pub buffer: u32,
    pub size: u32,
    pub offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FillBuffer {
    pub buffer: u32,
    pub data: u32,
    pub offset: u64,
    pub size: u64,
}

/// One layer (or one 3D slab) of a buffer/image copy.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BufferImageRegion {
    pub buffer: u32,
    pub image: u32,
    pub level: u32,
    /// Array layer (or cube face); ignored for 3D images.
    pub layer: u32,
    /// Texels per row in the buffer; 0 means tightly packed.
    pub row_length: u32,
    /// Rows per slice in the buffer; 0 means tightly packed.
    pub image_height: u32,
    pub offset: [u32; 3],
    pub extent: [u32; 3],
    pub buffer_offset: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CopyBufferToImage {
    pub region: BufferImageRegion,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CopyImageToBuffer {
    pub region: BufferImageRegion,
}

/// Direct image copy, only emitted when the target supports it.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CopyImage {
    pub src: u32,
    pub dst: u32,
    pub src_level: u32,
    pub dst_level: u32,
    pub src_offset: [u32; 3],
    pub dst_offset: [u32; 3],
    pub extent: [u32; 3],
}

pub const TRANSFER_SLOT_READ: u32 = 0;
pub const TRANSFER_SLOT_DRAW: u32 = 1;

/// Attaches one level/layer of an image to the read or draw transfer framebuffer.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct AttachTransferTarget {
    pub slot: u32,
    pub image: u32,
    pub level: u32,
    pub layer: u32,
    /// `ImageAspects` bits.
    pub aspects: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BlitFramebuffer {
    pub src: [i32; 4],
    pub dst: [i32; 4],
    pub mask: u32,
    pub filter: u32,
}

pub const CLEAR_KIND_FLOAT: u32 = 0;
pub const CLEAR_KIND_SINT: u32 = 1;
pub const CLEAR_KIND_UINT: u32 = 2;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ClearColor {
    pub draw_buffer: u32,
    pub kind: u32,
    /// Raw bit patterns; interpretation follows `kind`.
    pub value: [u32; 4],
    /// Non-zero restricts the clear to `rect` via the scissor.
    pub has_rect: u32,
    pub rect: Rect2d,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ClearDepthStencil {
    pub aspects: u32,
    pub depth: f32,
    pub stencil: u32,
    pub has_rect: u32,
    pub rect: Rect2d,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BeginRenderPass {
    pub framebuffer: u32,
    pub area: Rect2d,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct EndRenderPass {
    pub framebuffer: u32,
    /// Bit `i` < 8: colour attachment `i`; bit 8: depth; bit 9: stencil.
    pub discard_mask: u32,
}

pub const DISCARD_DEPTH_BIT: u32 = 1 << 8;
pub const DISCARD_STENCIL_BIT: u32 = 1 << 9;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PipelineBarrier {
    pub src_stages: u32,
    pub dst_stages: u32,
    /// Target barrier bits; zero means nothing to issue.
    pub barrier_bits: u32,
}

/// Followed by `len` bytes of UTF-8, padded to 4.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BeginDebugLabel {
    pub len: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct EndDebugLabel {
    pub reserved: u32,
}

instruction! {
    Nop => Nop,
    BindPipeline => BindPipeline,
    BindVertexBuffers => BindVertexBuffers,
    BindIndexBuffer => BindIndexBuffer,
    PushConstants => PushConstants,
    SetViewports => SetViewports,
    SetScissors => SetScissors,
    SetLineWidth => SetLineWidth,
    SetDepthBias => SetDepthBias,
    SetBlendConstants => SetBlendConstants,
    Draw => Draw,
    DrawIndexed => DrawIndexed,
    DrawIndirect => DrawIndirect,
    DrawIndexedIndirect => DrawIndexedIndirect,
    Dispatch => Dispatch,
    DispatchIndirect => DispatchIndirect,
    CopyBuffer => CopyBuffer,
    UpdateBuffer => UpdateBuffer,
    FillBuffer => FillBuffer,
    CopyBufferToImage => CopyBufferToImage,
    CopyImageToBuffer => CopyImageToBuffer,
    CopyImage => CopyImage,
    AttachTransferTarget => AttachTransferTarget,
    BlitFramebuffer => BlitFramebuffer,
    ClearColor => ClearColor,
    ClearDepthStencil => ClearDepthStencil,
    BeginRenderPass => BeginRenderPass,
    EndRenderPass => EndRenderPass,
    PipelineBarrier => PipelineBarrier,
    BeginDebugLabel => BeginDebugLabel,
    EndDebugLabel => EndDebugLabel,
}

/// Splits `items` into inline-array chunks of at most `N`, zero-filling the unused tail.
pub fn inline_chunks<T: Copy + Zeroable, const N: usize>(
    items: &[T],
) -> impl Iterator<Item = (u32, [T; N])> + '_ {
    items.chunks(N).map(|chunk| {
        let mut out = [T::zeroed(); N];
        out[..chunk.len()].copy_from_slice(chunk);
        (chunk.len() as u32, out)
    })
}
