//! The live target context and everything that must only be touched under its lock.

use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};

use vkgl_gl::consts::*;
use vkgl_gl::{GlApi, GlBuffer, GlFramebuffer, GlSync, GlTexture, GlVertexArray};

use crate::config::DeviceConfig;
use crate::error::{DriverError, Error, Result, ValidationError};
use crate::framebuffer::{CacheRef, FramebufferCache};
use crate::memory::AllocationState;
use crate::resource::{Buffer, DimensionClass, Image, ImageView, Pipeline, RenderPass};
use crate::state::ContextStateStack;
use crate::stats::ContextStats;

/// Bytes reserved for push constants in the backing uniform buffer.
pub(crate) const PUSH_CONSTANT_BUFFER_SIZE: u64 = 128;

#[derive(Debug)]
pub(crate) struct BufferEntry {
    pub handle: Buffer,
    pub gl: Option<GlBuffer>,
    /// `(allocation, slot)` of the owning binding.
    pub binding: Option<(u32, u32)>,
}

#[derive(Debug)]
pub(crate) struct ImageEntry {
    pub handle: Image,
    pub gl: Option<GlTexture>,
    pub binding: Option<(u32, u32)>,
}

#[derive(Debug)]
pub(crate) struct FramebufferEntry {
    pub cached: CacheRef,
}

#[derive(Debug, Default)]
pub(crate) struct FenceEntry {
    pub sync: Option<GlSync>,
    pub signaled: bool,
}

pub struct Context {
    pub(crate) gl: Box<dyn GlApi + Send>,
    pub(crate) state: ContextStateStack,
    pub(crate) stats: Arc<ContextStats>,
    pub(crate) config: DeviceConfig,

    pub(crate) buffers: HashMap<u32, BufferEntry>,
    pub(crate) images: HashMap<u32, ImageEntry>,
    pub(crate) views: HashMap<u32, ImageView>,
    pub(crate) allocations: HashMap<u32, AllocationState>,
    pub(crate) pipelines: HashMap<u32, Pipeline>,
    pub(crate) render_passes: HashMap<u32, RenderPass>,
    pub(crate) framebuffers: HashMap<u32, FramebufferEntry>,
    pub(crate) framebuffer_cache: FramebufferCache,
    pub(crate) fences: HashMap<u32, FenceEntry>,
    pub(crate) heap_usage: Vec<u64>,

    /// First target error raised during replay that has not been reported yet.
    pub(crate) pending_error: Option<DriverError>,

    pub(crate) default_vertex_array: GlVertexArray,
    pub(crate) push_constant_buffer: GlBuffer,
    /// Scratch framebuffers for transfers, indexed by transfer slot (read, draw).
    pub(crate) transfer_framebuffers: [GlFramebuffer; 2],
}

impl Context {
    pub(crate) fn new(
        mut gl: Box<dyn GlApi + Send>,
        config: DeviceConfig,
        stats: Arc<ContextStats>,
    ) -> Self {
        let mut state = ContextStateStack::new(stats.clone());

        let default_vertex_array = gl.create_vertex_array();
        let push_constant_buffer = gl.create_buffer();
        state.bind_buffer(&mut *gl, COPY_WRITE_BUFFER, Some(push_constant_buffer));
        gl.buffer_storage(
            COPY_WRITE_BUFFER,
            PUSH_CONSTANT_BUFFER_SIZE,
            DYNAMIC_STORAGE_BIT,
        );
        let transfer_framebuffers = [gl.create_framebuffer(), gl.create_framebuffer()];

        let heap_usage = vec![0; config.memory.heaps.len()];
        Self {
            gl,
            state,
            stats,
            config,
            buffers: HashMap::new(),
            images: HashMap::new(),
            views: HashMap::new(),
            allocations: HashMap::new(),
            pipelines: HashMap::new(),
            render_passes: HashMap::new(),
            framebuffers: HashMap::new(),
            framebuffer_cache: FramebufferCache::new(),
            fences: HashMap::new(),
            heap_usage,
            pending_error: None,
            default_vertex_array,
            push_constant_buffer,
            transfer_framebuffers,
        }
    }

    /// Disjoint borrows of the target and the state stack.
    pub(crate) fn parts(&mut self) -> (&mut dyn GlApi, &mut ContextStateStack) {
        (&mut *self.gl, &mut self.state)
    }

    pub(crate) fn buffer_entry(&self, id: u32) -> Result<&BufferEntry, ValidationError> {
        self.buffers.get(&id).ok_or(ValidationError::UnknownHandle {
            kind: Buffer::KIND,
            id,
        })
    }

    pub(crate) fn image_entry(&self, id: u32) -> Result<&ImageEntry, ValidationError> {
        self.images.get(&id).ok_or(ValidationError::UnknownHandle {
            kind: Image::KIND,
            id,
        })
    }

    pub(crate) fn allocation(&self, id: u32) -> Result<&AllocationState, ValidationError> {
        self.allocations
            .get(&id)
            .ok_or(ValidationError::UnknownHandle {
                kind: crate::resource::Allocation::KIND,
                id,
            })
    }

    pub(crate) fn allocation_mut(
        &mut self,
        id: u32,
    ) -> Result<&mut AllocationState, ValidationError> {
        self.allocations
            .get_mut(&id)
            .ok_or(ValidationError::UnknownHandle {
                kind: crate::resource::Allocation::KIND,
                id,
            })
    }

    /// Creates the target buffer object with immutable storage of the buffer's size.
    pub(crate) fn realize_buffer(&mut self, size: u64) -> GlBuffer {
        let (gl, state) = self.parts();
        let buffer = gl.create_buffer();
        state.bind_buffer(gl, COPY_WRITE_BUFFER, Some(buffer));
        gl.buffer_storage(COPY_WRITE_BUFFER, size, DYNAMIC_STORAGE_BIT);
        buffer
    }

    /// Creates the target texture with immutable storage for every level and layer.
    pub(crate) fn realize_image(&mut self, image: &Image) -> Result<GlTexture> {
        let desc = image.desc();
        let target = desc.format.target()?;
        let class = desc.dimension_class();
        let unit = self.config.transfer_texture_unit;
        let (gl, state) = self.parts();
        let texture = gl.create_texture();
        state.bind_texture(gl, unit, class.texture_target(), Some(texture));

        let e = desc.extent;
        let layers = desc.array_layers;
        let (width, height, depth) = match class {
            DimensionClass::D1 => (e.width, 1, 1),
            DimensionClass::D1Array => (e.width, layers, 1),
            DimensionClass::D2 | DimensionClass::D2Ms => (e.width, e.height, 1),
            DimensionClass::Cube => (e.width, e.height, 1),
            DimensionClass::D2Array | DimensionClass::CubeArray | DimensionClass::D2MsArray => {
                (e.width, e.height, layers)
            }
            DimensionClass::D3 => (e.width, e.height, e.depth),
        };
        let (levels, samples) = if class.is_multisample() {
            (1, desc.samples)
        } else {
            (desc.mip_levels, 1)
        };
        gl.tex_storage(
            class.texture_target(),
            levels,
            target.internal_format,
            width,
            height,
            depth,
            samples,
        );
        Ok(texture)
    }

    pub(crate) fn delete_buffer_object(&mut self, buffer: GlBuffer) {
        self.gl.delete_buffer(buffer);
        self.state.forget_buffer(buffer);
    }

    /// Deletes the texture and every cached framebuffer attaching `image`.
    pub(crate) fn delete_image_object(&mut self, image: u32, texture: GlTexture) {
        let (gl, state) = (&mut *self.gl, &mut self.state);
        self.framebuffer_cache.evict_image(gl, state, image);
        gl.delete_texture(texture);
        state.forget_texture(texture);
    }

    /// Records a target error; only the first unreported one is kept.
    pub(crate) fn record_driver_error(&mut self, err: DriverError) {
        self.stats.inc_driver_errors();
        tracing::warn!(%err, "target error during replay");
        if self.pending_error.is_none() {
            self.pending_error = Some(err);
        }
    }

    /// Reports the pending replay error, or queries the target for a fresh one.
    pub(crate) fn check_status(&mut self) -> Result<()> {
        if let Some(err) = self.pending_error.take() {
            return Err(err.into());
        }
        match self.gl.get_error() {
            NO_ERROR => Ok(()),
            code => {
                self.stats.inc_driver_errors();
                Err(Error::Driver(DriverError {
                    code,
                    opcode: None,
                    at: None,
                }))
            }
        }
    }

    pub(crate) fn take_pending_error(&mut self) -> Result<()> {
        match self.pending_error.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        let gl = &mut *self.gl;
        self.framebuffer_cache.clear(gl);
        for entry in self.buffers.values() {
            if let Some(buffer) = entry.gl {
                gl.delete_buffer(buffer);
            }
        }
        for entry in self.images.values() {
            if let Some(texture) = entry.gl {
                gl.delete_texture(texture);
            }
        }
        for fence in self.fences.values() {
            if let Some(sync) = fence.sync {
                gl.delete_sync(sync);
            }
        }
        for fb in self.transfer_framebuffers {
            gl.delete_framebuffer(fb);
        }
        gl.delete_buffer(self.push_constant_buffer);
        gl.delete_vertex_array(self.default_vertex_array);
        self.state.invalidate();
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Exclusive access to the live context, held for the duration of a submission or by an
/// external collaborator that needs to issue its own target calls.
pub struct ContextLock<'a> {
    pub(crate) guard: MutexGuard<'a, Context>,
}

impl ContextLock<'_> {
    /// Direct access to the target. Tracked state is forgotten, since the caller may change
    /// anything.
    pub fn gl(&mut self) -> &mut dyn GlApi {
        self.guard.state.invalidate();
        &mut *self.guard.gl
    }

    pub fn stats(&self) -> &ContextStats {
        &self.guard.stats
    }

    pub(crate) fn context(&mut self) -> &mut Context {
        &mut self.guard
    }
}
