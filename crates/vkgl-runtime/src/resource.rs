//! Handle types handed to callers and the immutable descriptions behind them.
//!
//! Handles are cheap clones of an id plus an `Arc` description. The device keeps the mutable
//! side (target objects, bindings) keyed by id, so a handle stays valid to hold after its object
//! is destroyed; using it afterwards is a validation error.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use vkgl_format::{Extent3d, Format, ImageAspects};
use vkgl_gl::consts::*;

/// Sentinel size meaning "to the end of the allocation / buffer".
pub const WHOLE_SIZE: u64 = u64::MAX;
/// Sentinel level/layer count meaning "every remaining level / layer".
pub const REMAINING: u32 = u32::MAX;

#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Ids start at 1 and are never reused.
    pub(crate) fn next(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 0x001;
        const TRANSFER_DST = 0x002;
        const UNIFORM_TEXEL = 0x004;
        const STORAGE_TEXEL = 0x008;
        const UNIFORM = 0x010;
        const STORAGE = 0x020;
        const INDEX = 0x040;
        const VERTEX = 0x080;
        const INDIRECT = 0x100;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 0x01;
        const TRANSFER_DST = 0x02;
        const SAMPLED = 0x04;
        const STORAGE = 0x08;
        const COLOR_ATTACHMENT = 0x10;
        const DEPTH_STENCIL_ATTACHMENT = 0x20;
        const TRANSIENT_ATTACHMENT = 0x40;
        const INPUT_ATTACHMENT = 0x80;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    D1,
    D2,
    D3,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    pub ty: ImageType,
    pub format: Format,
    pub extent: Extent3d,
    pub mip_levels: u32,
    /// Includes the six faces of each cube for cube-compatible images.
    pub array_layers: u32,
    pub samples: u32,
    pub usage: ImageUsage,
    pub cube_compatible: bool,
}

impl ImageDesc {
    pub fn new_2d(format: Format, width: u32, height: u32) -> Self {
        Self {
            ty: ImageType::D2,
            format,
            extent: Extent3d::new(width, height, 1),
            mip_levels: 1,
            array_layers: 1,
            samples: 1,
            usage: ImageUsage::TRANSFER_SRC
                | ImageUsage::TRANSFER_DST
                | ImageUsage::SAMPLED
                | ImageUsage::COLOR_ATTACHMENT,
            cube_compatible: false,
        }
    }

    pub fn dimension_class(&self) -> DimensionClass {
        let layered = self.array_layers > 1;
        match self.ty {
            ImageType::D1 if layered => DimensionClass::D1Array,
            ImageType::D1 => DimensionClass::D1,
            ImageType::D3 => DimensionClass::D3,
            ImageType::D2 if self.samples > 1 && layered => DimensionClass::D2MsArray,
            ImageType::D2 if self.samples > 1 => DimensionClass::D2Ms,
            ImageType::D2 if self.cube_compatible && self.array_layers == 6 => DimensionClass::Cube,
            ImageType::D2 if self.cube_compatible && self.array_layers % 6 == 0 => {
                DimensionClass::CubeArray
            }
            ImageType::D2 if layered => DimensionClass::D2Array,
            ImageType::D2 => DimensionClass::D2,
        }
    }

    /// Extent of `level`; 1D images keep height and depth at 1 and only 3D images shrink depth.
    pub fn level_extent(&self, level: u32) -> Extent3d {
        let mip = self.extent.mip(level);
        match self.ty {
            ImageType::D1 => Extent3d::new(mip.width, 1, 1),
            ImageType::D2 => Extent3d::new(mip.width, mip.height, 1),
            ImageType::D3 => mip,
        }
    }

    pub fn aspects(&self) -> ImageAspects {
        self.format.aspects()
    }
}

/// How an image maps onto the target's texture targets and attach entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DimensionClass {
    D1,
    D1Array,
    D2,
    D2Array,
    Cube,
    CubeArray,
    D3,
    D2Ms,
    D2MsArray,
}

impl DimensionClass {
    pub fn texture_target(self) -> GLenum {
        match self {
            DimensionClass::D1 => TEXTURE_1D,
            DimensionClass::D1Array => TEXTURE_1D_ARRAY,
            DimensionClass::D2 => TEXTURE_2D,
            DimensionClass::D2Array => TEXTURE_2D_ARRAY,
            DimensionClass::Cube => TEXTURE_CUBE_MAP,
            DimensionClass::CubeArray => TEXTURE_CUBE_MAP_ARRAY,
            DimensionClass::D3 => TEXTURE_3D,
            DimensionClass::D2Ms => TEXTURE_2D_MULTISAMPLE,
            DimensionClass::D2MsArray => TEXTURE_2D_MULTISAMPLE_ARRAY,
        }
    }

    pub fn is_multisample(self) -> bool {
        matches!(self, DimensionClass::D2Ms | DimensionClass::D2MsArray)
    }

    /// Array layers live in the texture's `z` axis (the 1D array keeps them in `y`).
    pub fn layers_in_z(self) -> bool {
        matches!(
            self,
            DimensionClass::D2Array
                | DimensionClass::Cube
                | DimensionClass::CubeArray
                | DimensionClass::D2MsArray
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub aspects: ImageAspects,
    pub base_level: u32,
    pub level_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl ImageSubresourceRange {
    pub fn all(aspects: ImageAspects) -> Self {
        Self {
            aspects,
            base_level: 0,
            level_count: REMAINING,
            base_layer: 0,
            layer_count: REMAINING,
        }
    }

    /// Resolves `REMAINING` counts against `desc`.
    pub fn resolve(&self, desc: &ImageDesc) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let levels = match self.level_count {
            REMAINING => desc.mip_levels.saturating_sub(self.base_level),
            n => n,
        };
        let layers = match self.layer_count {
            REMAINING => desc.array_layers.saturating_sub(self.base_layer),
            n => n,
        };
        (
            self.base_level..self.base_level.saturating_add(levels),
            self.base_layer..self.base_layer.saturating_add(layers),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageViewDesc {
    pub image: Image,
    pub aspects: ImageAspects,
    pub level: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryRequirements {
    pub size: u64,
    pub alignment: u64,
    pub type_bits: u32,
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $desc:ty, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            id: u32,
            desc: Arc<$desc>,
        }

        impl $name {
            pub const KIND: &'static str = $kind;

            pub(crate) fn new(id: u32, desc: $desc) -> Self {
                Self {
                    id,
                    desc: Arc::new(desc),
                }
            }

            pub fn id(&self) -> u32 {
                self.id
            }

            pub fn desc(&self) -> &$desc {
                &self.desc
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $name {}
    };
}

handle!(Buffer, BufferDesc, "buffer");
handle!(Image, ImageDesc, "image");
handle!(ImageView, ImageViewDesc, "image view");
handle!(
    /// A logical memory block. Backing bytes live in the device; see `Device::allocate`.
    Allocation,
    AllocationDesc,
    "allocation"
);
handle!(Fence, FenceDesc, "fence");
handle!(Pipeline, crate::pipeline::PipelineDesc, "pipeline");
handle!(RenderPass, crate::pipeline::RenderPassDesc, "render pass");
handle!(Framebuffer, crate::pipeline::FramebufferDesc, "framebuffer");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationDesc {
    pub size: u64,
    pub memory_type_index: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FenceDesc {
    pub signaled: bool,
}
