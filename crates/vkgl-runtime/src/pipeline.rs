//! Pipeline, render pass and framebuffer descriptions.
//!
//! Only the state replay consumes is kept: the linked program, the primitive topology and the
//! vertex binding strides. Everything else a pipeline carries belongs to the external shader
//! and pipeline layer.

use vkgl_format::{Format, ImageAspects};
use vkgl_gl::consts::*;
use vkgl_gl::GlProgram;

use crate::resource::{ImageView, RenderPass};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}

impl PipelineBindPoint {
    pub(crate) fn raw(self) -> u32 {
        match self {
            PipelineBindPoint::Graphics => 0,
            PipelineBindPoint::Compute => 1,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            PipelineBindPoint::Graphics => "graphics",
            PipelineBindPoint::Compute => "compute",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    LineListWithAdjacency,
    LineStripWithAdjacency,
    TriangleListWithAdjacency,
    TriangleStripWithAdjacency,
    PatchList,
}

impl PrimitiveTopology {
    pub fn gl_mode(self) -> GLenum {
        match self {
            PrimitiveTopology::PointList => POINTS,
            PrimitiveTopology::LineList => LINES,
            PrimitiveTopology::LineStrip => LINE_STRIP,
            PrimitiveTopology::TriangleList => TRIANGLES,
            PrimitiveTopology::TriangleStrip => TRIANGLE_STRIP,
            PrimitiveTopology::TriangleFan => TRIANGLE_FAN,
            PrimitiveTopology::LineListWithAdjacency => LINES_ADJACENCY,
            PrimitiveTopology::LineStripWithAdjacency => LINE_STRIP_ADJACENCY,
            PrimitiveTopology::TriangleListWithAdjacency => TRIANGLES_ADJACENCY,
            PrimitiveTopology::TriangleStripWithAdjacency => TRIANGLE_STRIP_ADJACENCY,
            PrimitiveTopology::PatchList => PATCHES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    Uint16,
    Uint32,
}

impl IndexType {
    pub fn size(self) -> u64 {
        match self {
            IndexType::Uint16 => 2,
            IndexType::Uint32 => 4,
        }
    }

    pub fn gl_type(self) -> GLenum {
        match self {
            IndexType::Uint16 => UNSIGNED_SHORT,
            IndexType::Uint32 => UNSIGNED_INT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineDesc {
    pub bind_point: PipelineBindPoint,
    /// Program linked by the external shader layer.
    pub program: GlProgram,
    pub topology: PrimitiveTopology,
    /// Stride per vertex binding slot; slots past the end have stride 0.
    pub vertex_strides: Vec<u32>,
}

impl PipelineDesc {
    pub fn graphics(program: GlProgram, topology: PrimitiveTopology, strides: &[u32]) -> Self {
        Self {
            bind_point: PipelineBindPoint::Graphics,
            program,
            topology,
            vertex_strides: strides.to_vec(),
        }
    }

    pub fn compute(program: GlProgram) -> Self {
        Self {
            bind_point: PipelineBindPoint::Compute,
            program,
            topology: PrimitiveTopology::PointList,
            vertex_strides: Vec::new(),
        }
    }

    pub fn stride(&self, binding: u32) -> u32 {
        self.vertex_strides
            .get(binding as usize)
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Store,
    DontCare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentDescription {
    pub format: Format,
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
}

impl AttachmentDescription {
    pub fn new(format: Format, load_op: LoadOp, store_op: StoreOp) -> Self {
        Self {
            format,
            samples: 1,
            load_op,
            store_op,
            stencil_load_op: load_op,
            stencil_store_op: store_op,
        }
    }

    /// Aspects cleared on load: depth follows `load_op`, stencil `stencil_load_op`.
    pub(crate) fn cleared_aspects(&self) -> ImageAspects {
        let aspects = self.format.aspects();
        let mut cleared = ImageAspects::empty();
        if self.load_op == LoadOp::Clear {
            cleared |= aspects & (ImageAspects::COLOR | ImageAspects::DEPTH);
        }
        if self.stencil_load_op == LoadOp::Clear {
            cleared |= aspects & ImageAspects::STENCIL;
        }
        cleared
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubpassDescription {
    /// Indices into the render pass attachment list.
    pub color: Vec<u32>,
    pub depth_stencil: Option<u32>,
    /// Either empty or one entry per colour reference; `None` skips the resolve.
    pub resolve: Vec<Option<u32>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
}

impl RenderPassDesc {
    pub fn single(attachments: Vec<AttachmentDescription>, subpass: SubpassDescription) -> Self {
        Self {
            attachments,
            subpasses: vec![subpass],
        }
    }

    pub(crate) fn subpass(&self) -> &SubpassDescription {
        &self.subpasses[0]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramebufferDesc {
    pub render_pass: RenderPass,
    pub attachments: Vec<ImageView>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_past_the_end_are_zero() {
        let desc = PipelineDesc::graphics(GlProgram(1), PrimitiveTopology::TriangleList, &[16, 8]);
        assert_eq!(desc.stride(1), 8);
        assert_eq!(desc.stride(5), 0);
    }

    #[test]
    fn stencil_clear_follows_its_own_load_op() {
        let mut att =
            AttachmentDescription::new(Format::D24UnormS8Uint, LoadOp::Clear, StoreOp::Store);
        att.stencil_load_op = LoadOp::Load;
        assert_eq!(att.cleared_aspects(), ImageAspects::DEPTH);
        att.load_op = LoadOp::Load;
        att.stencil_load_op = LoadOp::Clear;
        assert_eq!(att.cleared_aspects(), ImageAspects::STENCIL);
    }
}
