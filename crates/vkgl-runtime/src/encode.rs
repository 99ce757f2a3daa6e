//! Command recording.
//!
//! A [`CommandBuffer`] lowers every recorded operation into instructions at record time and
//! never touches the target. Everything the executor needs is resolved here: primitive modes,
//! absolute index offsets, vertex strides, per-layer copy regions, buffer offsets and barrier
//! bits. Operations the target has no single entry point for are expanded into sequences of
//! transfer attaches, blits and clears.

use std::collections::BTreeSet;

use bytemuck::Zeroable;
use vkgl_cmd::packets::{self, inline_chunks, Rect2d, VertexBufferSlot, Viewport};
use vkgl_cmd::{CommandList, Instruction};
use vkgl_format::{get_size, ClearKind, Extent3d, Format, ImageAspects};
use vkgl_gl::consts::*;

use crate::barrier::{MemoryBarrier, PipelineStageFlags};
use crate::config::Limits;
use crate::error::{Result, UnsupportedError, ValidationError};
use crate::memory::checked_range;
use crate::pipeline::{IndexType, LoadOp, PipelineBindPoint, StoreOp};
use crate::resource::{
    Buffer, DimensionClass, Framebuffer, Image, ImageDesc, ImageSubresourceRange, ImageType,
    Pipeline, RenderPass, WHOLE_SIZE,
};

/// Handles a recorded list depends on; checked for liveness at submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ResourceRef {
    Buffer(u32),
    Image(u32),
    Pipeline(u32),
    Framebuffer(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingState {
    Initial,
    Recording,
    Executable,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSubresourceLayers {
    pub aspects: ImageAspects,
    pub level: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl ImageSubresourceLayers {
    pub fn new(aspects: ImageAspects, level: u32) -> Self {
        Self {
            aspects,
            level,
            base_layer: 0,
            layer_count: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    /// Texels per buffer row; 0 means tightly packed.
    pub row_length: u32,
    /// Rows per buffer slice; 0 means tightly packed.
    pub image_height: u32,
    pub subresource: ImageSubresourceLayers,
    pub offset: [u32; 3],
    pub extent: Extent3d,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageCopy {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offset: [u32; 3],
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offset: [u32; 3],
    pub extent: Extent3d,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBlit {
    pub src_subresource: ImageSubresourceLayers,
    /// Opposite corners of the source box.
    pub src_offsets: [[i32; 3]; 2],
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offsets: [[i32; 3]; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

impl Filter {
    fn gl_filter(self) -> GLenum {
        match self {
            Filter::Nearest => NEAREST,
            Filter::Linear => LINEAR,
        }
    }
}

/// Colour clear value; the image format decides how the bits are interpreted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearColorValue {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}

impl ClearColorValue {
    fn bits(self) -> [u32; 4] {
        match self {
            ClearColorValue::Float(v) => v.map(f32::to_bits),
            ClearColorValue::Int(v) => v.map(|c| c as u32),
            ClearColorValue::Uint(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearValue {
    Color(ClearColorValue),
    DepthStencil { depth: f32, stencil: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearAttachment {
    pub aspects: ImageAspects,
    /// Index into the subpass colour references; ignored for depth/stencil.
    pub color_attachment: u32,
    pub value: ClearValue,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearRect {
    pub rect: Rect2d,
    pub base_layer: u32,
    pub layer_count: u32,
}

/// A validated clear waiting to be emitted.
enum Clear {
    Color(packets::ClearColor),
    DepthStencil(packets::ClearDepthStencil),
}

#[derive(Clone, Debug)]
struct ActivePass {
    render_pass: RenderPass,
    framebuffer: Framebuffer,
    area: Rect2d,
}

fn clear_kind_raw(format: Format) -> u32 {
    match format.clear_kind() {
        ClearKind::Float => packets::CLEAR_KIND_FLOAT,
        ClearKind::Sint => packets::CLEAR_KIND_SINT,
        ClearKind::Uint => packets::CLEAR_KIND_UINT,
    }
}

fn blit_mask(aspects: ImageAspects) -> u32 {
    let mut mask = 0;
    if aspects.contains(ImageAspects::COLOR) {
        mask |= COLOR_BUFFER_BIT;
    }
    if aspects.contains(ImageAspects::DEPTH) {
        mask |= DEPTH_BUFFER_BIT;
    }
    if aspects.contains(ImageAspects::STENCIL) {
        mask |= STENCIL_BUFFER_BIT;
    }
    mask
}

fn check_level(desc: &ImageDesc, level: u32) -> Result<(), ValidationError> {
    if level >= desc.mip_levels {
        return Err(ValidationError::TooMany {
            what: "mip level",
            count: u64::from(level) + 1,
            limit: u64::from(desc.mip_levels),
        });
    }
    Ok(())
}

fn check_layers(desc: &ImageDesc, base: u32, count: u32) -> Result<(), ValidationError> {
    let total = match desc.ty {
        ImageType::D3 => 1,
        _ => desc.array_layers,
    };
    if count == 0 {
        return Err(ValidationError::Zero("layer count"));
    }
    match base.checked_add(count) {
        Some(end) if end <= total => Ok(()),
        _ => Err(ValidationError::TooMany {
            what: "array layer",
            count: u64::from(base) + u64::from(count),
            limit: u64::from(total),
        }),
    }
}

/// Checks that `[offset, offset + extent)` lies inside mip `level`.
fn check_region(
    desc: &ImageDesc,
    level: u32,
    offset: [u32; 3],
    extent: Extent3d,
) -> Result<(), ValidationError> {
    let limit = desc.level_extent(level);
    let limit = [limit.width, limit.height, limit.depth];
    let extent = [extent.width, extent.height, extent.depth];
    let inside = (0..3).all(|axis| {
        offset[axis]
            .checked_add(extent[axis])
            .is_some_and(|end| end <= limit[axis])
    });
    if !inside {
        return Err(ValidationError::RegionOutOfBounds {
            level,
            offset,
            extent,
            limit,
        });
    }
    Ok(())
}

/// Low corner and extent of a blit box given as two opposite corners.
fn blit_box(corners: [[i32; 3]; 2]) -> Result<([u32; 3], Extent3d), ValidationError> {
    let [a, b] = corners;
    let mut low = [0; 3];
    let mut size = [0; 3];
    for axis in 0..3 {
        low[axis] = u32::try_from(a[axis].min(b[axis]))
            .map_err(|_| ValidationError::Invalid("negative blit offset"))?;
        size[axis] = a[axis].abs_diff(b[axis]);
    }
    Ok((low, Extent3d::new(size[0], size[1], size[2])))
}

/// Layers (or, for volumes, depth slices) a per-layer lowering visits.
fn transfer_layers(
    desc: &ImageDesc,
    base_layer: u32,
    layer_count: u32,
    z: u32,
    depth: u32,
) -> Vec<u32> {
    match desc.ty {
        ImageType::D3 => (z..z + depth).collect(),
        _ => (base_layer..base_layer + layer_count).collect(),
    }
}

/// Offset and extent for the copy-image entry point, with layers mapped onto its axes.
fn copy_coords(
    desc: &ImageDesc,
    sub: &ImageSubresourceLayers,
    offset: [u32; 3],
    extent: Extent3d,
) -> ([u32; 3], [u32; 3]) {
    let class = desc.dimension_class();
    match class {
        DimensionClass::D1 => ([offset[0], 0, 0], [extent.width, 1, 1]),
        DimensionClass::D1Array => (
            [offset[0], sub.base_layer, 0],
            [extent.width, sub.layer_count, 1],
        ),
        DimensionClass::D3 => (offset, [extent.width, extent.height, extent.depth]),
        c if c.layers_in_z() => (
            [offset[0], offset[1], sub.base_layer],
            [extent.width, extent.height, sub.layer_count],
        ),
        _ => ([offset[0], offset[1], 0], [extent.width, extent.height, 1]),
    }
}

/// A recorded instruction list plus the handles it references.
pub struct CommandBuffer {
    id: u32,
    state: RecordingState,
    list: CommandList,
    referenced: BTreeSet<ResourceRef>,
    limits: Limits,
    native_copy_image: bool,

    graphics: Option<Pipeline>,
    compute: Option<Pipeline>,
    vertex_buffers: [Option<(u32, u64)>; packets::INLINE_CAPACITY],
    index_buffer: Option<(u64, IndexType)>,
    pass: Option<ActivePass>,
    label_depth: u32,
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("bytes", &self.list.len())
            .finish_non_exhaustive()
    }
}

impl CommandBuffer {
    pub(crate) fn new(id: u32, limits: Limits, native_copy_image: bool) -> Self {
        Self {
            id,
            state: RecordingState::Initial,
            list: CommandList::new(),
            referenced: BTreeSet::new(),
            limits,
            native_copy_image,
            graphics: None,
            compute: None,
            vertex_buffers: [None; packets::INLINE_CAPACITY],
            index_buffer: None,
            pass: None,
            label_depth: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn commands(&self) -> &CommandList {
        &self.list
    }

    pub(crate) fn referenced(&self) -> &BTreeSet<ResourceRef> {
        &self.referenced
    }

    fn reset_recording(&mut self) {
        self.list.clear();
        self.referenced.clear();
        self.graphics = None;
        self.compute = None;
        self.vertex_buffers = [None; packets::INLINE_CAPACITY];
        self.index_buffer = None;
        self.pass = None;
        self.label_depth = 0;
    }

    /// Starts recording. Beginning an executable buffer discards its previous contents.
    pub fn begin(&mut self) -> Result<()> {
        if self.state == RecordingState::Recording {
            return Err(ValidationError::AlreadyRecording.into());
        }
        self.reset_recording();
        self.state = RecordingState::Recording;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        self.recording()?;
        if self.pass.is_some() {
            return Err(ValidationError::RenderPassActive.into());
        }
        if self.label_depth != 0 {
            return Err(ValidationError::Invalid("unterminated debug label").into());
        }
        self.state = RecordingState::Executable;
        tracing::debug!(
            command_buffer = self.id,
            bytes = self.list.len(),
            "recorded command buffer"
        );
        Ok(())
    }

    pub fn reset(&mut self) {
        self.reset_recording();
        self.state = RecordingState::Initial;
    }

    fn recording(&self) -> Result<(), ValidationError> {
        match self.state {
            RecordingState::Recording => Ok(()),
            _ => Err(ValidationError::NotRecording),
        }
    }

    fn outside_pass(&self) -> Result<(), ValidationError> {
        self.recording()?;
        match self.pass {
            Some(_) => Err(ValidationError::RenderPassActive),
            None => Ok(()),
        }
    }

    fn inside_pass(&self) -> Result<&ActivePass, ValidationError> {
        self.recording()?;
        self.pass.as_ref().ok_or(ValidationError::NoRenderPass)
    }

    fn push<I: Instruction>(&mut self, payload: I) {
        self.list.push(&payload);
    }

    fn graphics_mode(&self) -> Result<u32, ValidationError> {
        self.graphics
            .as_ref()
            .map(|p| p.desc().topology.gl_mode())
            .ok_or(ValidationError::NoPipelineBound("graphics"))
    }

    fn reference_buffer(&mut self, buffer: &Buffer) {
        self.referenced.insert(ResourceRef::Buffer(buffer.id()));
    }

    fn reference_image(&mut self, image: &Image) {
        self.referenced.insert(ResourceRef::Image(image.id()));
    }

    // Pipeline and vertex input state.

    pub fn bind_pipeline(&mut self, pipeline: &Pipeline) -> Result<()> {
        self.recording()?;
        let bind_point = pipeline.desc().bind_point;
        self.referenced.insert(ResourceRef::Pipeline(pipeline.id()));
        self.push(packets::BindPipeline {
            pipeline: pipeline.id(),
            bind_point: bind_point.raw(),
        });
        match bind_point {
            PipelineBindPoint::Graphics => {
                self.graphics = Some(pipeline.clone());
                // Strides come from the pipeline, so live bindings are re-emitted.
                self.emit_vertex_buffers(0, packets::INLINE_CAPACITY as u32);
            }
            PipelineBindPoint::Compute => self.compute = Some(pipeline.clone()),
        }
        Ok(())
    }

    fn emit_vertex_buffers(&mut self, first: u32, count: u32) {
        let stride = |binding: u32| {
            self.graphics
                .as_ref()
                .map_or(0, |p| p.desc().stride(binding))
        };
        let bound: Vec<(u32, VertexBufferSlot)> = (first..first + count)
            .filter_map(|binding| {
                self.vertex_buffers[binding as usize].map(|(buffer, offset)| {
                    let slot = VertexBufferSlot {
                        buffer,
                        stride: stride(binding),
                        offset,
                    };
                    (binding, slot)
                })
            })
            .collect();

        let mut start = 0;
        while start < bound.len() {
            let mut end = start + 1;
            while end < bound.len() && bound[end].0 == bound[end - 1].0 + 1 {
                end += 1;
            }
            let run: Vec<VertexBufferSlot> = bound[start..end].iter().map(|(_, s)| *s).collect();
            let mut first = bound[start].0;
            for (count, slots) in inline_chunks::<_, { packets::INLINE_CAPACITY }>(&run) {
                self.list.push(&packets::BindVertexBuffers {
                    first,
                    count,
                    slots,
                });
                first += count;
            }
            start = end;
        }
    }

    pub fn bind_vertex_buffers(&mut self, first: u32, buffers: &[(&Buffer, u64)]) -> Result<()> {
        self.recording()?;
        let limit = self.limits.max_vertex_bindings.min(packets::INLINE_CAPACITY as u32);
        let end = u64::from(first) + buffers.len() as u64;
        if end > u64::from(limit) {
            return Err(ValidationError::TooMany {
                what: "vertex buffer bindings",
                count: end,
                limit: u64::from(limit),
            }
            .into());
        }
        for (i, (buffer, offset)) in buffers.iter().enumerate() {
            self.reference_buffer(buffer);
            self.vertex_buffers[first as usize + i] = Some((buffer.id(), *offset));
        }
        self.emit_vertex_buffers(first, buffers.len() as u32);
        Ok(())
    }

    pub fn bind_index_buffer(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.recording()?;
        if offset % index_type.size() != 0 {
            return Err(ValidationError::Misaligned {
                offset,
                alignment: index_type.size(),
            }
            .into());
        }
        self.reference_buffer(buffer);
        self.index_buffer = Some((offset, index_type));
        self.push(packets::BindIndexBuffer {
            buffer: buffer.id(),
        });
        Ok(())
    }

    /// Captures `data` by value into the push-constant block at `offset`.
    pub fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.recording()?;
        let limit = self
            .limits
            .max_push_constant_size
            .min(packets::PUSH_CONSTANT_CAPACITY as u32);
        let end = u64::from(offset) + data.len() as u64;
        if end > u64::from(limit) {
            return Err(ValidationError::TooMany {
                what: "push constant bytes",
                count: end,
                limit: u64::from(limit),
            }
            .into());
        }
        if offset % 4 != 0 || data.len() % 4 != 0 {
            return Err(ValidationError::Misaligned {
                offset: u64::from(offset),
                alignment: 4,
            }
            .into());
        }
        let mut bytes = [0u8; packets::PUSH_CONSTANT_CAPACITY];
        bytes[..data.len()].copy_from_slice(data);
        self.push(packets::PushConstants {
            offset,
            size: data.len() as u32,
            data: bytes,
        });
        Ok(())
    }

    // Dynamic state.

    pub fn set_viewports(&mut self, first: u32, viewports: &[Viewport]) -> Result<()> {
        self.recording()?;
        let end = u64::from(first) + viewports.len() as u64;
        if end > u64::from(self.limits.max_viewports) {
            return Err(ValidationError::TooMany {
                what: "viewports",
                count: end,
                limit: u64::from(self.limits.max_viewports),
            }
            .into());
        }
        let mut first = first;
        for (count, chunk) in inline_chunks::<_, { packets::INLINE_CAPACITY }>(viewports) {
            self.list.push(&packets::SetViewports {
                first,
                count,
                viewports: chunk,
            });
            first += count;
        }
        Ok(())
    }

    pub fn set_scissors(&mut self, first: u32, rects: &[Rect2d]) -> Result<()> {
        self.recording()?;
        let end = u64::from(first) + rects.len() as u64;
        if end > u64::from(self.limits.max_viewports) {
            return Err(ValidationError::TooMany {
                what: "scissors",
                count: end,
                limit: u64::from(self.limits.max_viewports),
            }
            .into());
        }
        let mut first = first;
        for (count, chunk) in inline_chunks::<_, { packets::INLINE_CAPACITY }>(rects) {
            self.list.push(&packets::SetScissors {
                first,
                count,
                rects: chunk,
            });
            first += count;
        }
        Ok(())
    }

    pub fn set_line_width(&mut self, width: f32) -> Result<()> {
        self.recording()?;
        self.push(packets::SetLineWidth { width });
        Ok(())
    }

    pub fn set_depth_bias(&mut self, constant: f32, clamp: f32, slope: f32) -> Result<()> {
        self.recording()?;
        self.push(packets::SetDepthBias {
            constant,
            clamp,
            slope,
        });
        Ok(())
    }

    pub fn set_blend_constants(&mut self, constants: [f32; 4]) -> Result<()> {
        self.recording()?;
        self.push(packets::SetBlendConstants { constants });
        Ok(())
    }

    // Draws and dispatches.

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        self.inside_pass()?;
        let mode = self.graphics_mode()?;
        self.push(packets::Draw {
            mode,
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.inside_pass()?;
        let mode = self.graphics_mode()?;
        let (offset, index_type) = self.index_buffer.ok_or(ValidationError::NoIndexBuffer)?;
        self.push(packets::DrawIndexed {
            mode,
            index_type: index_type.gl_type(),
            index_count,
            instance_count,
            first_instance,
            vertex_offset,
            index_offset: offset + u64::from(first_index) * index_type.size(),
        });
        Ok(())
    }

    pub fn draw_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        self.inside_pass()?;
        let mode = self.graphics_mode()?;
        self.reference_buffer(buffer);
        self.push(packets::DrawIndirect {
            mode,
            buffer: buffer.id(),
            draw_count,
            stride,
            offset,
        });
        Ok(())
    }

    pub fn draw_indexed_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        self.inside_pass()?;
        let mode = self.graphics_mode()?;
        let (ib_offset, index_type) = self.index_buffer.ok_or(ValidationError::NoIndexBuffer)?;
        if ib_offset != 0 {
            // Indirect commands carry their own first index; the target has no separate base.
            return Err(
                ValidationError::Invalid("index buffer offset with indexed indirect draw").into(),
            );
        }
        self.reference_buffer(buffer);
        self.push(packets::DrawIndexedIndirect {
            mode,
            index_type: index_type.gl_type(),
            buffer: buffer.id(),
            draw_count,
            stride,
            offset,
        });
        Ok(())
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.outside_pass()?;
        if self.compute.is_none() {
            return Err(ValidationError::NoPipelineBound("compute").into());
        }
        self.push(packets::Dispatch { x, y, z });
        Ok(())
    }

    pub fn dispatch_indirect(&mut self, buffer: &Buffer, offset: u64) -> Result<()> {
        self.outside_pass()?;
        if self.compute.is_none() {
            return Err(ValidationError::NoPipelineBound("compute").into());
        }
        if offset % 4 != 0 {
            return Err(ValidationError::Misaligned {
                offset,
                alignment: 4,
            }
            .into());
        }
        self.reference_buffer(buffer);
        self.push(packets::DispatchIndirect {
            buffer: buffer.id(),
            offset,
        });
        Ok(())
    }

    // Buffer transfers.

    pub fn copy_buffer(
        &mut self,
        src: &Buffer,
        dst: &Buffer,
        regions: &[BufferCopy],
    ) -> Result<()> {
        self.outside_pass()?;
        for region in regions {
            checked_range(region.src_offset, region.size, src.desc().size)?;
            checked_range(region.dst_offset, region.size, dst.desc().size)?;
        }
        self.reference_buffer(src);
        self.reference_buffer(dst);
        for region in regions {
            self.push(packets::CopyBuffer {
                src: src.id(),
                dst: dst.id(),
                src_offset: region.src_offset,
                dst_offset: region.dst_offset,
                size: region.size,
            });
        }
        Ok(())
    }

    /// Captures `data` by value; it is written at replay time.
    pub fn update_buffer(&mut self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<()> {
        self.outside_pass()?;
        if data.is_empty() {
            return Err(ValidationError::Zero("update size").into());
        }
        if data.len() > packets::UPDATE_BUFFER_MAX_BYTES {
            return Err(ValidationError::TooMany {
                what: "update bytes",
                count: data.len() as u64,
                limit: packets::UPDATE_BUFFER_MAX_BYTES as u64,
            }
            .into());
        }
        if offset % 4 != 0 || data.len() % 4 != 0 {
            return Err(ValidationError::Misaligned {
                offset,
                alignment: 4,
            }
            .into());
        }
        checked_range(offset, data.len() as u64, buffer.desc().size)?;
        self.reference_buffer(buffer);
        self.list.push_with_tail(
            &packets::UpdateBuffer {
                buffer: buffer.id(),
                size: data.len() as u32,
                offset,
            },
            data,
        );
        Ok(())
    }

    /// Fills `size` bytes (or the rest of the buffer, rounded down to words) with `data`.
    pub fn fill_buffer(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        size: u64,
        data: u32,
    ) -> Result<()> {
        self.outside_pass()?;
        let limit = buffer.desc().size;
        let size = if size == WHOLE_SIZE {
            limit.saturating_sub(offset) & !3
        } else {
            size
        };
        if offset % 4 != 0 || size % 4 != 0 {
            return Err(ValidationError::Misaligned {
                offset,
                alignment: 4,
            }
            .into());
        }
        checked_range(offset, size, limit)?;
        self.reference_buffer(buffer);
        self.push(packets::FillBuffer {
            buffer: buffer.id(),
            data,
            offset,
            size,
        });
        Ok(())
    }

    // Buffer/image transfers.

    fn buffer_image_regions(
        &self,
        buffer: &Buffer,
        image: &Image,
        regions: &[BufferImageCopy],
    ) -> Result<Vec<packets::BufferImageRegion>> {
        let desc = image.desc();
        if desc.dimension_class().is_multisample() {
            return Err(UnsupportedError::MultisampleTransfer.into());
        }
        let mut out = Vec::new();
        for region in regions {
            let sub = &region.subresource;
            check_level(desc, sub.level)?;
            check_layers(desc, sub.base_layer, sub.layer_count)?;
            check_region(desc, sub.level, region.offset, region.extent)?;
            let e = region.extent;
            let row_length = match region.row_length {
                0 => e.width,
                n => n,
            };
            let image_height = match region.image_height {
                0 => e.height,
                n => n,
            };
            let layer_size =
                get_size(Extent3d::new(row_length, image_height, e.depth), desc.format);
            checked_range(
                region.buffer_offset,
                layer_size * u64::from(sub.layer_count),
                buffer.desc().size,
            )?;
            for i in 0..sub.layer_count {
                out.push(packets::BufferImageRegion {
                    buffer: buffer.id(),
                    image: image.id(),
                    level: sub.level,
                    layer: sub.base_layer + i,
                    row_length: region.row_length,
                    image_height: region.image_height,
                    offset: region.offset,
                    extent: [e.width, e.height, e.depth],
                    buffer_offset: region.buffer_offset + u64::from(i) * layer_size,
                });
            }
        }
        Ok(out)
    }

    pub fn copy_buffer_to_image(
        &mut self,
        buffer: &Buffer,
        image: &Image,
        regions: &[BufferImageCopy],
    ) -> Result<()> {
        self.outside_pass()?;
        let lowered = self.buffer_image_regions(buffer, image, regions)?;
        self.reference_buffer(buffer);
        self.reference_image(image);
        for region in lowered {
            self.push(packets::CopyBufferToImage { region });
        }
        Ok(())
    }

    pub fn copy_image_to_buffer(
        &mut self,
        image: &Image,
        buffer: &Buffer,
        regions: &[BufferImageCopy],
    ) -> Result<()> {
        self.outside_pass()?;
        let lowered = self.buffer_image_regions(buffer, image, regions)?;
        self.reference_buffer(buffer);
        self.reference_image(image);
        for region in lowered {
            self.push(packets::CopyImageToBuffer { region });
        }
        Ok(())
    }

    // Image transfers.

    fn attach_transfer(&mut self, slot: u32, image: &Image, level: u32, layer: u32) {
        self.push(packets::AttachTransferTarget {
            slot,
            image: image.id(),
            level,
            layer,
            aspects: image.desc().aspects().bits(),
        });
    }

    /// Copies regions between images, natively when enabled and through blits otherwise.
    pub fn copy_image(&mut self, src: &Image, dst: &Image, regions: &[ImageCopy]) -> Result<()> {
        self.outside_pass()?;
        let (sd, dd) = (src.desc(), dst.desc());
        for region in regions {
            let (ss, ds) = (&region.src_subresource, &region.dst_subresource);
            check_level(sd, ss.level)?;
            check_level(dd, ds.level)?;
            check_layers(sd, ss.base_layer, ss.layer_count)?;
            check_layers(dd, ds.base_layer, ds.layer_count)?;
            check_region(sd, ss.level, region.src_offset, region.extent)?;
            check_region(dd, ds.level, region.dst_offset, region.extent)?;
            if ss.layer_count != ds.layer_count {
                return Err(ValidationError::Invalid("copy layer counts differ").into());
            }
        }
        if !self.native_copy_image && sd.format.is_compressed() {
            return Err(UnsupportedError::CompressedBlit(sd.format).into());
        }
        self.reference_image(src);
        self.reference_image(dst);

        for region in regions {
            let (ss, ds) = (&region.src_subresource, &region.dst_subresource);
            if self.native_copy_image {
                let (src_offset, extent) = copy_coords(sd, ss, region.src_offset, region.extent);
                let (dst_offset, _) = copy_coords(dd, ds, region.dst_offset, region.extent);
                self.push(packets::CopyImage {
                    src: src.id(),
                    dst: dst.id(),
                    src_level: ss.level,
                    dst_level: ds.level,
                    src_offset,
                    dst_offset,
                    extent,
                });
                continue;
            }
            let e = region.extent;
            let src_layers =
                transfer_layers(sd, ss.base_layer, ss.layer_count, region.src_offset[2], e.depth);
            let dst_layers =
                transfer_layers(dd, ds.base_layer, ds.layer_count, region.dst_offset[2], e.depth);
            let (sx, sy) = (region.src_offset[0] as i32, region.src_offset[1] as i32);
            let (dx, dy) = (region.dst_offset[0] as i32, region.dst_offset[1] as i32);
            let (w, h) = (e.width as i32, e.height as i32);
            for (src_layer, dst_layer) in src_layers.into_iter().zip(dst_layers) {
                self.attach_transfer(packets::TRANSFER_SLOT_READ, src, ss.level, src_layer);
                self.attach_transfer(packets::TRANSFER_SLOT_DRAW, dst, ds.level, dst_layer);
                self.push(packets::BlitFramebuffer {
                    src: [sx, sy, sx + w, sy + h],
                    dst: [dx, dy, dx + w, dy + h],
                    mask: blit_mask(ss.aspects),
                    filter: NEAREST,
                });
            }
        }
        Ok(())
    }

    /// Scaled copy between images. Depth and stencil blits must use nearest filtering.
    pub fn blit_image(
        &mut self,
        src: &Image,
        dst: &Image,
        regions: &[ImageBlit],
        filter: Filter,
    ) -> Result<()> {
        self.outside_pass()?;
        let (sd, dd) = (src.desc(), dst.desc());
        for format in [sd.format, dd.format] {
            if format.is_compressed() {
                return Err(UnsupportedError::CompressedBlit(format).into());
            }
        }
        if filter == Filter::Linear && !sd.format.is_color() {
            return Err(ValidationError::Invalid("linear filter for a depth/stencil blit").into());
        }
        let mut lowered = Vec::new();
        for region in regions {
            let (ss, ds) = (&region.src_subresource, &region.dst_subresource);
            check_level(sd, ss.level)?;
            check_level(dd, ds.level)?;
            check_layers(sd, ss.base_layer, ss.layer_count)?;
            check_layers(dd, ds.base_layer, ds.layer_count)?;
            let (src_low, src_size) = blit_box(region.src_offsets)?;
            let (dst_low, dst_size) = blit_box(region.dst_offsets)?;
            check_region(sd, ss.level, src_low, src_size)?;
            check_region(dd, ds.level, dst_low, dst_size)?;
            if ss.layer_count != ds.layer_count || src_size.depth != dst_size.depth {
                return Err(ValidationError::Invalid("blit layer counts differ").into());
            }
            let src_layers =
                transfer_layers(sd, ss.base_layer, ss.layer_count, src_low[2], src_size.depth);
            let dst_layers =
                transfer_layers(dd, ds.base_layer, ds.layer_count, dst_low[2], dst_size.depth);
            let [s0, s1] = region.src_offsets;
            let [d0, d1] = region.dst_offsets;
            let src_rect = [s0[0], s0[1], s1[0], s1[1]];
            let dst_rect = [d0[0], d0[1], d1[0], d1[1]];
            for (src_layer, dst_layer) in src_layers.into_iter().zip(dst_layers) {
                lowered.push((*ss, src_layer, *ds, dst_layer, src_rect, dst_rect));
            }
        }
        self.reference_image(src);
        self.reference_image(dst);
        for (ss, src_layer, ds, dst_layer, src_rect, dst_rect) in lowered {
            self.attach_transfer(packets::TRANSFER_SLOT_READ, src, ss.level, src_layer);
            self.attach_transfer(packets::TRANSFER_SLOT_DRAW, dst, ds.level, dst_layer);
            self.push(packets::BlitFramebuffer {
                src: src_rect,
                dst: dst_rect,
                mask: blit_mask(ss.aspects & sd.aspects()),
                filter: filter.gl_filter(),
            });
        }
        Ok(())
    }

    /// Resolves `ranges` into `(level, layer)` pairs, validating them against the image.
    fn clear_targets(
        desc: &ImageDesc,
        ranges: &[ImageSubresourceRange],
    ) -> Result<Vec<(u32, u32)>> {
        let mut out = Vec::new();
        for range in ranges {
            let (levels, layers) = range.resolve(desc);
            if levels.is_empty() {
                return Err(ValidationError::Zero("level count").into());
            }
            check_level(desc, levels.end - 1)?;
            for level in levels {
                let layers = match desc.ty {
                    ImageType::D3 => 0..desc.level_extent(level).depth,
                    _ => {
                        check_layers(desc, layers.start, layers.end - layers.start)?;
                        layers.clone()
                    }
                };
                out.extend(layers.map(|layer| (level, layer)));
            }
        }
        Ok(out)
    }

    pub fn clear_color_image(
        &mut self,
        image: &Image,
        value: ClearColorValue,
        ranges: &[ImageSubresourceRange],
    ) -> Result<()> {
        self.outside_pass()?;
        let desc = image.desc();
        if !desc.format.is_color() {
            return Err(ValidationError::Invalid("colour clear of a depth/stencil image").into());
        }
        if desc.format.is_compressed() {
            return Err(UnsupportedError::CompressedBlit(desc.format).into());
        }
        let targets = Self::clear_targets(desc, ranges)?;
        self.reference_image(image);
        let kind = clear_kind_raw(desc.format);
        for (level, layer) in targets {
            self.attach_transfer(packets::TRANSFER_SLOT_DRAW, image, level, layer);
            self.push(packets::ClearColor {
                draw_buffer: 0,
                kind,
                value: value.bits(),
                has_rect: 0,
                rect: Rect2d::zeroed(),
            });
        }
        Ok(())
    }

    pub fn clear_depth_stencil_image(
        &mut self,
        image: &Image,
        depth: f32,
        stencil: u32,
        ranges: &[ImageSubresourceRange],
    ) -> Result<()> {
        self.outside_pass()?;
        let desc = image.desc();
        if desc.format.is_color() {
            return Err(ValidationError::Invalid("depth/stencil clear of a colour image").into());
        }
        let mut lowered = Vec::new();
        for range in ranges {
            let aspects = range.aspects & desc.aspects();
            if aspects.is_empty() {
                return Err(ValidationError::Invalid("clear aspects").into());
            }
            for target in Self::clear_targets(desc, std::slice::from_ref(range))? {
                lowered.push((aspects, target));
            }
        }
        self.reference_image(image);
        for (aspects, (level, layer)) in lowered {
            self.attach_transfer(packets::TRANSFER_SLOT_DRAW, image, level, layer);
            self.push(packets::ClearDepthStencil {
                aspects: aspects.bits(),
                depth,
                stencil,
                has_rect: 0,
                rect: Rect2d::zeroed(),
            });
        }
        Ok(())
    }

    // Render passes.

    /// Begins the single subpass of `render_pass` on `framebuffer`. Attachments with a clear
    /// load op are cleared to the matching entry of `clear_values` within `area`.
    pub fn begin_render_pass(
        &mut self,
        render_pass: &RenderPass,
        framebuffer: &Framebuffer,
        area: Rect2d,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.outside_pass()?;
        let pass_desc = render_pass.desc();
        let fb_desc = framebuffer.desc();
        if fb_desc.attachments.len() != pass_desc.attachments.len() {
            return Err(ValidationError::Invalid("framebuffer attachment count").into());
        }
        let subpass = pass_desc.subpass();

        let mut clears = Vec::new();
        for (draw_buffer, &index) in subpass.color.iter().enumerate() {
            let att = &pass_desc.attachments[index as usize];
            if att.load_op != LoadOp::Clear {
                continue;
            }
            match clear_values.get(index as usize) {
                Some(ClearValue::Color(value)) => clears.push(packets::ClearColor {
                    draw_buffer: draw_buffer as u32,
                    kind: clear_kind_raw(att.format),
                    value: value.bits(),
                    has_rect: 1,
                    rect: area,
                }),
                _ => return Err(ValidationError::Invalid("missing colour clear value").into()),
            }
        }
        let mut depth_clear = None;
        if let Some(index) = subpass.depth_stencil {
            let att = &pass_desc.attachments[index as usize];
            let aspects = att.cleared_aspects();
            if !aspects.is_empty() {
                match clear_values.get(index as usize) {
                    Some(&ClearValue::DepthStencil { depth, stencil }) => {
                        depth_clear = Some(packets::ClearDepthStencil {
                            aspects: aspects.bits(),
                            depth,
                            stencil,
                            has_rect: 1,
                            rect: area,
                        })
                    }
                    _ => {
                        return Err(
                            ValidationError::Invalid("missing depth/stencil clear value").into()
                        )
                    }
                }
            }
        }

        self.referenced
            .insert(ResourceRef::Framebuffer(framebuffer.id()));
        for view in &fb_desc.attachments {
            self.reference_image(&view.desc().image);
        }
        self.push(packets::BeginRenderPass {
            framebuffer: framebuffer.id(),
            area,
        });
        for clear in clears {
            self.push(clear);
        }
        if let Some(clear) = depth_clear {
            self.push(clear);
        }
        self.pass = Some(ActivePass {
            render_pass: render_pass.clone(),
            framebuffer: framebuffer.clone(),
            area,
        });
        Ok(())
    }

    /// Clears regions of the current subpass attachments.
    pub fn clear_attachments(
        &mut self,
        attachments: &[ClearAttachment],
        rects: &[ClearRect],
    ) -> Result<()> {
        let pass = self.inside_pass()?;
        let pass_desc = pass.render_pass.desc();
        let subpass = pass_desc.subpass();
        let mut lowered = Vec::new();
        for attachment in attachments {
            for clear_rect in rects {
                let rect = clear_rect.rect;
                match attachment.value {
                    ClearValue::Color(value) => {
                        let index = subpass
                            .color
                            .get(attachment.color_attachment as usize)
                            .ok_or(ValidationError::Invalid("colour attachment index"))?;
                        let format = pass_desc.attachments[*index as usize].format;
                        lowered.push(Clear::Color(packets::ClearColor {
                            draw_buffer: attachment.color_attachment,
                            kind: clear_kind_raw(format),
                            value: value.bits(),
                            has_rect: 1,
                            rect,
                        }));
                    }
                    ClearValue::DepthStencil { depth, stencil } => {
                        let index = subpass.depth_stencil.ok_or(ValidationError::Invalid(
                            "clear of a missing depth/stencil attachment",
                        ))?;
                        let format = pass_desc.attachments[index as usize].format;
                        let aspects = attachment.aspects & format.aspects();
                        if aspects.is_empty() {
                            return Err(ValidationError::Invalid("clear aspects").into());
                        }
                        lowered.push(Clear::DepthStencil(packets::ClearDepthStencil {
                            aspects: aspects.bits(),
                            depth,
                            stencil,
                            has_rect: 1,
                            rect,
                        }));
                    }
                }
            }
        }
        for clear in lowered {
            match clear {
                Clear::Color(p) => self.push(p),
                Clear::DepthStencil(p) => self.push(p),
            }
        }
        Ok(())
    }

    /// Ends the pass: resolves multisample attachments and discards `DontCare` stores.
    pub fn end_render_pass(&mut self) -> Result<()> {
        self.inside_pass()?;
        let Some(pass) = self.pass.take() else {
            return Err(ValidationError::NoRenderPass.into());
        };
        let pass_desc = pass.render_pass.desc();
        let fb_desc = pass.framebuffer.desc();
        let subpass = pass_desc.subpass();
        let area = pass.area;
        let area_rect = [
            area.x,
            area.y,
            area.x + area.width as i32,
            area.y + area.height as i32,
        ];

        for (i, resolve) in subpass.resolve.iter().enumerate() {
            let (Some(target), Some(&source)) = (resolve, subpass.color.get(i)) else {
                continue;
            };
            let src_view = fb_desc.attachments[source as usize].desc();
            let dst_view = fb_desc.attachments[*target as usize].desc();
            let layers = src_view.layer_count.min(dst_view.layer_count);
            for l in 0..layers {
                self.attach_transfer(
                    packets::TRANSFER_SLOT_READ,
                    &src_view.image,
                    src_view.level,
                    src_view.base_layer + l,
                );
                self.attach_transfer(
                    packets::TRANSFER_SLOT_DRAW,
                    &dst_view.image,
                    dst_view.level,
                    dst_view.base_layer + l,
                );
                self.push(packets::BlitFramebuffer {
                    src: area_rect,
                    dst: area_rect,
                    mask: COLOR_BUFFER_BIT,
                    filter: NEAREST,
                });
            }
        }

        let mut discard_mask = 0;
        for (i, &index) in subpass.color.iter().enumerate() {
            if pass_desc.attachments[index as usize].store_op == StoreOp::DontCare {
                discard_mask |= 1 << i;
            }
        }
        if let Some(index) = subpass.depth_stencil {
            let att = &pass_desc.attachments[index as usize];
            let aspects = att.format.aspects();
            if aspects.contains(ImageAspects::DEPTH) && att.store_op == StoreOp::DontCare {
                discard_mask |= packets::DISCARD_DEPTH_BIT;
            }
            if aspects.contains(ImageAspects::STENCIL)
                && att.stencil_store_op == StoreOp::DontCare
            {
                discard_mask |= packets::DISCARD_STENCIL_BIT;
            }
        }
        self.push(packets::EndRenderPass {
            framebuffer: pass.framebuffer.id(),
            discard_mask,
        });
        Ok(())
    }

    // Synchronization and annotations.

    /// One instruction per memory barrier; a barrier with none still orders execution and
    /// is recorded as a single instruction without bits.
    pub fn pipeline_barrier(
        &mut self,
        src_stages: PipelineStageFlags,
        dst_stages: PipelineStageFlags,
        barriers: &[MemoryBarrier],
    ) -> Result<()> {
        self.recording()?;
        if barriers.is_empty() {
            self.push(packets::PipelineBarrier {
                src_stages: src_stages.bits(),
                dst_stages: dst_stages.bits(),
                barrier_bits: 0,
            });
        }
        for barrier in barriers {
            self.push(packets::PipelineBarrier {
                src_stages: src_stages.bits(),
                dst_stages: dst_stages.bits(),
                barrier_bits: barrier.gl_bits(),
            });
        }
        Ok(())
    }

    pub fn begin_debug_label(&mut self, label: &str) -> Result<()> {
        self.recording()?;
        if label.len() > packets::DEBUG_LABEL_MAX_BYTES {
            return Err(ValidationError::TooMany {
                what: "debug label bytes",
                count: label.len() as u64,
                limit: packets::DEBUG_LABEL_MAX_BYTES as u64,
            }
            .into());
        }
        self.list.push_with_tail(
            &packets::BeginDebugLabel {
                len: label.len() as u32,
            },
            label.as_bytes(),
        );
        self.label_depth += 1;
        Ok(())
    }

    pub fn end_debug_label(&mut self) -> Result<()> {
        self.recording()?;
        if self.label_depth == 0 {
            return Err(ValidationError::Invalid("debug label end without begin").into());
        }
        self.label_depth -= 1;
        self.push(packets::EndDebugLabel { reserved: 0 });
        Ok(())
    }
}
