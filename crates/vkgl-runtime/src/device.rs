//! The device: object lifetimes, memory binding and host access.
//!
//! Every call that touches the target takes the context lock for its duration. Validation
//! always happens before the first target call, so a rejected request leaves the target
//! untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vkgl_gl::consts::*;
use vkgl_gl::GlApi;

use crate::config::DeviceConfig;
use crate::context::{BufferEntry, Context, ContextLock, FenceEntry, FramebufferEntry, ImageEntry};
use crate::encode::CommandBuffer;
use crate::error::{DriverError, Error, OutOfMemoryError, Result, UnsupportedError, ValidationError};
use crate::framebuffer::{attach_call, attachment_point, AttachmentKey, ResolvedAttachment};
use crate::image_layout::image_size;
use crate::memory::{checked_range, AllocationState, BoundResource};
use crate::memory_type::{MemoryProperties, MemoryPropertyFlags};
use crate::pipeline::{FramebufferDesc, PipelineDesc, RenderPassDesc};
use crate::queue::Queue;
use crate::resource::{
    Allocation, AllocationDesc, Buffer, BufferDesc, BufferUsage, Fence, FenceDesc, Framebuffer,
    IdAllocator, Image, ImageDesc, ImageType, ImageView, ImageViewDesc, MemoryRequirements,
    Pipeline, RenderPass,
};
use crate::stats::{ContextStats, ContextStatsSnapshot};

pub struct Device {
    pub(crate) config: DeviceConfig,
    pub(crate) context: Mutex<Context>,
    stats: Arc<ContextStats>,
    ids: IdAllocator,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn unknown(kind: &'static str, id: u32) -> ValidationError {
    ValidationError::UnknownHandle { kind, id }
}

impl Device {
    pub fn new(gl: Box<dyn GlApi + Send>, config: DeviceConfig) -> Self {
        let stats = Arc::new(ContextStats::new());
        let context = Context::new(gl, config.clone(), stats.clone());
        tracing::debug!(
            memory_types = config.memory.types.len(),
            native_copy_image = config.native_copy_image,
            "created device"
        );
        Self {
            config,
            context: Mutex::new(context),
            stats,
            ids: IdAllocator::default(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn memory_properties(&self) -> &MemoryProperties {
        &self.config.memory
    }

    pub fn stats(&self) -> ContextStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn context(&self) -> MutexGuard<'_, Context> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the live context. Blocks while a submission is replaying.
    pub fn lock_context(&self) -> ContextLock<'_> {
        ContextLock {
            guard: self.context(),
        }
    }

    pub fn queue(&self) -> Queue<'_> {
        Queue::new(self)
    }

    // Buffers and images.

    pub fn create_buffer(&self, desc: BufferDesc) -> Result<Buffer> {
        if desc.size == 0 {
            return Err(ValidationError::Zero("buffer size").into());
        }
        let buffer = Buffer::new(self.ids.next(), desc);
        tracing::debug!(id = buffer.id(), size = buffer.desc().size, "created buffer");
        self.context().buffers.insert(
            buffer.id(),
            BufferEntry {
                handle: buffer.clone(),
                gl: None,
                binding: None,
            },
        );
        Ok(buffer)
    }

    /// Destroys the buffer along with its binding and target object.
    pub fn destroy_buffer(&self, buffer: &Buffer) -> Result<()> {
        let mut ctx = self.context();
        let entry = ctx
            .buffers
            .remove(&buffer.id())
            .ok_or_else(|| unknown(Buffer::KIND, buffer.id()))?;
        if let Some((allocation, slot)) = entry.binding {
            if let Some(alloc) = ctx.allocations.get_mut(&allocation) {
                alloc.remove_binding(slot);
            }
        }
        if let Some(object) = entry.gl {
            ctx.delete_buffer_object(object);
        }
        tracing::debug!(id = buffer.id(), "destroyed buffer");
        Ok(())
    }

    pub fn create_image(&self, desc: ImageDesc) -> Result<Image> {
        let e = desc.extent;
        if e.width == 0 || e.height == 0 || e.depth == 0 {
            return Err(ValidationError::Zero("image extent").into());
        }
        if desc.mip_levels == 0 {
            return Err(ValidationError::Zero("mip level count").into());
        }
        if desc.array_layers == 0 {
            return Err(ValidationError::Zero("array layer count").into());
        }
        if desc.samples == 0 {
            return Err(ValidationError::Zero("sample count").into());
        }
        if desc.ty == ImageType::D3 && desc.array_layers > 1 {
            return Err(ValidationError::Invalid("layered 3D image").into());
        }
        if desc.cube_compatible && desc.array_layers % 6 != 0 {
            return Err(ValidationError::Invalid("cube layer count").into());
        }
        if desc.samples > 1 && desc.mip_levels > 1 {
            return Err(ValidationError::Invalid("multisampled mip chain").into());
        }
        desc.format.target()?;

        let image = Image::new(self.ids.next(), desc);
        tracing::debug!(
            id = image.id(),
            format = ?image.desc().format,
            class = ?image.desc().dimension_class(),
            "created image"
        );
        self.context().images.insert(
            image.id(),
            ImageEntry {
                handle: image.clone(),
                gl: None,
                binding: None,
            },
        );
        Ok(image)
    }

    /// Destroys the image. Cached framebuffers attaching it are deleted with it.
    pub fn destroy_image(&self, image: &Image) -> Result<()> {
        let mut ctx = self.context();
        let entry = ctx
            .images
            .remove(&image.id())
            .ok_or_else(|| unknown(Image::KIND, image.id()))?;
        if let Some((allocation, slot)) = entry.binding {
            if let Some(alloc) = ctx.allocations.get_mut(&allocation) {
                alloc.remove_binding(slot);
            }
        }
        if let Some(texture) = entry.gl {
            ctx.delete_image_object(image.id(), texture);
        }
        tracing::debug!(id = image.id(), "destroyed image");
        Ok(())
    }

    pub fn create_image_view(&self, desc: ImageViewDesc) -> Result<ImageView> {
        let mut ctx = self.context();
        ctx.image_entry(desc.image.id())?;
        let image = desc.image.desc();
        if desc.level >= image.mip_levels {
            return Err(ValidationError::TooMany {
                what: "mip level",
                count: u64::from(desc.level) + 1,
                limit: u64::from(image.mip_levels),
            }
            .into());
        }
        let layers = match image.ty {
            ImageType::D3 => image.level_extent(desc.level).depth,
            _ => image.array_layers,
        };
        if desc.layer_count == 0 {
            return Err(ValidationError::Zero("view layer count").into());
        }
        if u64::from(desc.base_layer) + u64::from(desc.layer_count) > u64::from(layers) {
            return Err(ValidationError::TooMany {
                what: "view layer",
                count: u64::from(desc.base_layer) + u64::from(desc.layer_count),
                limit: u64::from(layers),
            }
            .into());
        }
        if desc.aspects.is_empty() || !image.aspects().contains(desc.aspects) {
            return Err(ValidationError::Invalid("view aspects").into());
        }
        let view = ImageView::new(self.ids.next(), desc);
        ctx.views.insert(view.id(), view.clone());
        Ok(view)
    }

    pub fn destroy_image_view(&self, view: &ImageView) -> Result<()> {
        self.context()
            .views
            .remove(&view.id())
            .map(|_| ())
            .ok_or_else(|| unknown(ImageView::KIND, view.id()).into())
    }

    // Pipelines, render passes and framebuffers.

    pub fn create_pipeline(&self, desc: PipelineDesc) -> Result<Pipeline> {
        let pipeline = Pipeline::new(self.ids.next(), desc);
        tracing::debug!(
            id = pipeline.id(),
            bind_point = pipeline.desc().bind_point.name(),
            "created pipeline"
        );
        self.context()
            .pipelines
            .insert(pipeline.id(), pipeline.clone());
        Ok(pipeline)
    }

    pub fn destroy_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        self.context()
            .pipelines
            .remove(&pipeline.id())
            .map(|_| ())
            .ok_or_else(|| unknown(Pipeline::KIND, pipeline.id()).into())
    }

    /// Only single-subpass render passes are expressible on the target.
    pub fn create_render_pass(&self, desc: RenderPassDesc) -> Result<RenderPass> {
        match desc.subpasses.len() {
            0 => return Err(ValidationError::Zero("subpass count").into()),
            1 => {}
            n => return Err(UnsupportedError::MultipleSubpasses(n).into()),
        }
        let subpass = &desc.subpasses[0];
        let count = desc.attachments.len() as u32;
        let in_range = |index: &u32| *index < count;
        if !subpass.color.iter().all(in_range)
            || !subpass.depth_stencil.iter().all(in_range)
            || !subpass.resolve.iter().flatten().all(in_range)
        {
            return Err(ValidationError::Invalid("attachment reference").into());
        }
        let limit = self.config.limits.max_color_attachments;
        if subpass.color.len() as u64 > u64::from(limit) {
            return Err(ValidationError::TooMany {
                what: "colour attachments",
                count: subpass.color.len() as u64,
                limit: u64::from(limit),
            }
            .into());
        }
        if !subpass.resolve.is_empty() && subpass.resolve.len() != subpass.color.len() {
            return Err(ValidationError::Invalid("resolve reference count").into());
        }
        if let Some(index) = subpass.depth_stencil {
            if desc.attachments[index as usize].format.is_color() {
                return Err(ValidationError::Invalid("depth/stencil attachment format").into());
            }
        }

        let render_pass = RenderPass::new(self.ids.next(), desc);
        self.context()
            .render_passes
            .insert(render_pass.id(), render_pass.clone());
        Ok(render_pass)
    }

    pub fn destroy_render_pass(&self, render_pass: &RenderPass) -> Result<()> {
        self.context()
            .render_passes
            .remove(&render_pass.id())
            .map(|_| ())
            .ok_or_else(|| unknown(RenderPass::KIND, render_pass.id()).into())
    }

    /// Resolves the attachment set of the render pass's subpass and acquires the cached target
    /// framebuffer for it. Attached images must be bound.
    pub fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Framebuffer> {
        let mut ctx = self.context();
        let pass = desc.render_pass.desc();
        if !ctx.render_passes.contains_key(&desc.render_pass.id()) {
            return Err(unknown(RenderPass::KIND, desc.render_pass.id()).into());
        }
        if desc.attachments.len() != pass.attachments.len() {
            return Err(ValidationError::Invalid("framebuffer attachment count").into());
        }
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            return Err(ValidationError::Zero("framebuffer extent").into());
        }

        let subpass = pass.subpass();
        let slots = subpass
            .color
            .iter()
            .enumerate()
            .map(|(i, &index)| (index, Some(i as u32)))
            .chain(subpass.depth_stencil.map(|index| (index, None)));
        let mut resolved = Vec::new();
        for (index, color_index) in slots {
            let view = &desc.attachments[index as usize];
            if !ctx.views.contains_key(&view.id()) {
                return Err(unknown(ImageView::KIND, view.id()).into());
            }
            let v = view.desc();
            let entry = ctx.image_entry(v.image.id())?;
            let texture = entry.gl.ok_or(ValidationError::NotBound {
                kind: Image::KIND,
                id: v.image.id(),
            })?;
            let point = attachment_point(v.aspects, color_index.unwrap_or(0));
            let call = attach_call(v.image.desc(), texture, v.level, v.base_layer, v.layer_count)?;
            resolved.push(ResolvedAttachment {
                key: AttachmentKey {
                    image: v.image.id(),
                    aspects: v.aspects,
                    level: v.level,
                    base_layer: v.base_layer,
                    layer_count: v.layer_count,
                    point,
                },
                call,
            });
        }
        // Resolve targets are written through the transfer framebuffers; they only need to be
        // live and bound.
        for index in subpass.resolve.iter().flatten() {
            let v = desc.attachments[*index as usize].desc();
            if ctx.image_entry(v.image.id())?.gl.is_none() {
                return Err(ValidationError::NotBound {
                    kind: Image::KIND,
                    id: v.image.id(),
                }
                .into());
            }
        }

        let Context {
            gl,
            state,
            stats,
            framebuffer_cache,
            ..
        } = &mut *ctx;
        let (cached, object) = framebuffer_cache.acquire(&mut **gl, state, stats, &resolved)?;
        let framebuffer = Framebuffer::new(self.ids.next(), desc);
        tracing::debug!(id = framebuffer.id(), object = object.0, "created framebuffer");
        ctx.framebuffers
            .insert(framebuffer.id(), FramebufferEntry { cached });
        Ok(framebuffer)
    }

    /// Releases the framebuffer's cache entry; the target object goes with the last user.
    pub fn destroy_framebuffer(&self, framebuffer: &Framebuffer) -> Result<()> {
        let mut ctx = self.context();
        let entry = ctx
            .framebuffers
            .remove(&framebuffer.id())
            .ok_or_else(|| unknown(Framebuffer::KIND, framebuffer.id()))?;
        let Context {
            gl,
            state,
            framebuffer_cache,
            ..
        } = &mut *ctx;
        framebuffer_cache.release(&mut **gl, state, &entry.cached);
        Ok(())
    }

    // Memory.

    fn buffer_requirements(&self, desc: &BufferDesc) -> MemoryRequirements {
        let limits = &self.config.limits;
        let alignment = if desc.usage.contains(BufferUsage::UNIFORM) {
            limits.min_uniform_buffer_alignment
        } else {
            limits.min_buffer_alignment
        };
        MemoryRequirements {
            size: desc.size,
            alignment,
            type_bits: self.config.memory.all_type_bits(),
        }
    }

    fn image_requirements(&self, desc: &ImageDesc) -> MemoryRequirements {
        // Multisample contents have no host layout, so only device memory is offered.
        let type_bits = if desc.dimension_class().is_multisample() {
            self.config.memory.device_only_type_bits()
        } else {
            self.config.memory.all_type_bits()
        };
        MemoryRequirements {
            size: image_size(desc),
            alignment: self.config.limits.image_alignment,
            type_bits,
        }
    }

    pub fn buffer_memory_requirements(&self, buffer: &Buffer) -> Result<MemoryRequirements> {
        self.context().buffer_entry(buffer.id())?;
        Ok(self.buffer_requirements(buffer.desc()))
    }

    pub fn image_memory_requirements(&self, image: &Image) -> Result<MemoryRequirements> {
        self.context().image_entry(image.id())?;
        Ok(self.image_requirements(image.desc()))
    }

    /// Lowest memory type index in `type_bits` whose flags contain `required`.
    pub fn find_memory_type(&self, type_bits: u32, required: MemoryPropertyFlags) -> Result<u32> {
        Ok(self.config.memory.find_memory_type(type_bits, required)?)
    }

    /// Allocates `size` zeroed bytes of memory type `memory_type_index`.
    pub fn allocate(&self, size: u64, memory_type_index: u32) -> Result<Allocation> {
        if size == 0 {
            return Err(ValidationError::Zero("allocation size").into());
        }
        let ty = self
            .config
            .memory
            .types
            .get(memory_type_index as usize)
            .ok_or(ValidationError::InvalidMemoryType(memory_type_index))?;
        let heap = ty.heap_index;
        let budget = self
            .config
            .memory
            .heaps
            .get(heap as usize)
            .map_or(0, |h| h.size);

        let mut ctx = self.context();
        let used = ctx.heap_usage.get(heap as usize).copied().unwrap_or(0);
        let available = budget.saturating_sub(used);
        if size > available {
            return Err(OutOfMemoryError::HeapExhausted {
                heap,
                requested: size,
                available,
            }
            .into());
        }
        if let Some(used) = ctx.heap_usage.get_mut(heap as usize) {
            *used += size;
        }
        let allocation = Allocation::new(
            self.ids.next(),
            AllocationDesc {
                size,
                memory_type_index,
            },
        );
        ctx.allocations.insert(
            allocation.id(),
            AllocationState::new(allocation.id(), size, memory_type_index, ty.property_flags, heap),
        );
        tracing::debug!(id = allocation.id(), size, memory_type_index, "allocated memory");
        Ok(allocation)
    }

    /// Frees the allocation. Every binding goes first: bound resources lose their target
    /// object and become unbound.
    pub fn free(&self, allocation: &Allocation) -> Result<()> {
        let mut ctx = self.context();
        let state = ctx
            .allocations
            .remove(&allocation.id())
            .ok_or_else(|| unknown(Allocation::KIND, allocation.id()))?;
        if let Some(used) = ctx.heap_usage.get_mut(state.heap as usize) {
            *used = used.saturating_sub(state.size());
        }
        for binding in state.bindings.values() {
            match binding.resource {
                BoundResource::Buffer(id) => {
                    let object = ctx.buffers.get_mut(&id).and_then(|entry| {
                        entry.binding = None;
                        entry.gl.take()
                    });
                    if let Some(object) = object {
                        ctx.delete_buffer_object(object);
                    }
                }
                BoundResource::Image(id) => {
                    let texture = ctx.images.get_mut(&id).and_then(|entry| {
                        entry.binding = None;
                        entry.gl.take()
                    });
                    if let Some(texture) = texture {
                        ctx.delete_image_object(id, texture);
                    }
                }
            }
        }
        tracing::debug!(
            id = allocation.id(),
            bindings = state.bindings.len(),
            "freed memory"
        );
        Ok(())
    }

    fn check_bind(
        ctx: &Context,
        kind: &'static str,
        id: u32,
        bound: bool,
        allocation: &Allocation,
        offset: u64,
        reqs: &MemoryRequirements,
    ) -> Result<std::ops::Range<u64>, ValidationError> {
        if bound {
            return Err(ValidationError::AlreadyBound { kind, id });
        }
        let alloc = ctx.allocation(allocation.id())?;
        if reqs.type_bits & (1 << alloc.type_index) == 0 {
            return Err(ValidationError::IncompatibleMemoryType {
                type_index: alloc.type_index,
                type_bits: reqs.type_bits,
            });
        }
        // A zero alignment places no constraint.
        if offset.checked_rem(reqs.alignment).is_some_and(|r| r != 0) {
            return Err(ValidationError::Misaligned {
                offset,
                alignment: reqs.alignment,
            });
        }
        checked_range(offset, reqs.size, alloc.size())
    }

    /// Binds `buffer` at `offset` of `allocation`, creates its target object and uploads the
    /// bound bytes.
    pub fn bind_buffer_memory(
        &self,
        buffer: &Buffer,
        allocation: &Allocation,
        offset: u64,
    ) -> Result<()> {
        let reqs = self.buffer_requirements(buffer.desc());
        let mut ctx = self.context();
        let bound = ctx.buffer_entry(buffer.id())?.binding.is_some();
        let range = Self::check_bind(
            &ctx,
            Buffer::KIND,
            buffer.id(),
            bound,
            allocation,
            offset,
            &reqs,
        )?;

        let object = ctx.realize_buffer(buffer.desc().size);
        let slot = ctx
            .allocation_mut(allocation.id())?
            .insert_binding(BoundResource::Buffer(buffer.id()), range.clone());
        if let Some(entry) = ctx.buffers.get_mut(&buffer.id()) {
            entry.gl = Some(object);
            entry.binding = Some((allocation.id(), slot));
        }
        ctx.upload_binding(allocation.id(), slot, &range)?;
        tracing::debug!(
            buffer = buffer.id(),
            allocation = allocation.id(),
            offset,
            "bound buffer memory"
        );
        Ok(())
    }

    /// Binds `image` at `offset` of `allocation`, creates its texture and uploads every
    /// subresource from the host block.
    pub fn bind_image_memory(
        &self,
        image: &Image,
        allocation: &Allocation,
        offset: u64,
    ) -> Result<()> {
        let reqs = self.image_requirements(image.desc());
        let mut ctx = self.context();
        let bound = ctx.image_entry(image.id())?.binding.is_some();
        let range = Self::check_bind(
            &ctx,
            Image::KIND,
            image.id(),
            bound,
            allocation,
            offset,
            &reqs,
        )?;

        let texture = ctx.realize_image(image)?;
        let slot = ctx
            .allocation_mut(allocation.id())?
            .insert_binding(BoundResource::Image(image.id()), range.clone());
        if let Some(entry) = ctx.images.get_mut(&image.id()) {
            entry.gl = Some(texture);
            entry.binding = Some((allocation.id(), slot));
        }
        ctx.upload_binding(allocation.id(), slot, &range)?;
        tracing::debug!(
            image = image.id(),
            allocation = allocation.id(),
            offset,
            "bound image memory"
        );
        Ok(())
    }

    /// Maps `[offset, offset + size)` for host access. `size` may be `WHOLE_SIZE`.
    pub fn map(&self, allocation: &Allocation, offset: u64, size: u64) -> Result<()> {
        let mut ctx = self.context();
        let range = ctx.allocation_mut(allocation.id())?.map(offset, size)?;
        tracing::trace!(allocation = allocation.id(), ?range, "mapped");
        Ok(())
    }

    /// Unmaps the allocation and reports whether anything was written while mapped. Coherent
    /// memory flushes its outstanding writes first.
    pub fn unmap(&self, allocation: &Allocation) -> Result<bool> {
        let mut ctx = self.context();
        let alloc = ctx.allocation(allocation.id())?;
        if alloc.mapped.is_none() {
            return Err(ValidationError::NotMapped(allocation.id()).into());
        }
        if alloc.is_coherent() {
            ctx.flush_dirty(allocation.id())?;
        }
        Ok(ctx.allocation_mut(allocation.id())?.unmap()?)
    }

    /// Writes through the mapping; `offset` is allocation-relative.
    pub fn write_mapped(&self, allocation: &Allocation, offset: u64, data: &[u8]) -> Result<()> {
        let mut ctx = self.context();
        Ok(ctx.allocation_mut(allocation.id())?.write(offset, data)?)
    }

    pub fn read_mapped(&self, allocation: &Allocation, offset: u64, out: &mut [u8]) -> Result<()> {
        let ctx = self.context();
        Ok(ctx.allocation(allocation.id())?.read(offset, out)?)
    }

    /// Uploads host bytes in the range to every binding it intersects.
    pub fn flush(&self, allocation: &Allocation, offset: u64, size: u64) -> Result<()> {
        let mut ctx = self.context();
        let range = ctx.allocation(allocation.id())?.mapped_range(offset, size)?;
        ctx.flush_allocation_range(allocation.id(), &range)
    }

    /// Reads target contents in the range back into the host block.
    pub fn invalidate(&self, allocation: &Allocation, offset: u64, size: u64) -> Result<()> {
        let mut ctx = self.context();
        let range = ctx.allocation(allocation.id())?.mapped_range(offset, size)?;
        ctx.invalidate_allocation_range(allocation.id(), &range)
    }

    // Commands and synchronization.

    pub fn create_command_buffer(&self) -> CommandBuffer {
        CommandBuffer::new(
            self.ids.next(),
            self.config.limits,
            self.config.native_copy_image,
        )
    }

    pub fn create_fence(&self, signaled: bool) -> Fence {
        let fence = Fence::new(self.ids.next(), FenceDesc { signaled });
        self.context().fences.insert(
            fence.id(),
            FenceEntry {
                sync: None,
                signaled,
            },
        );
        fence
    }

    pub fn destroy_fence(&self, fence: &Fence) -> Result<()> {
        let mut ctx = self.context();
        let entry = ctx
            .fences
            .remove(&fence.id())
            .ok_or_else(|| unknown(Fence::KIND, fence.id()))?;
        if let Some(sync) = entry.sync {
            ctx.gl.delete_sync(sync);
        }
        Ok(())
    }

    /// Waits up to `timeout_ns` for the fence. Returns `false` on timeout. A target error
    /// recorded during an earlier replay is reported here first.
    pub fn wait_for_fence(&self, fence: &Fence, timeout_ns: u64) -> Result<bool> {
        let mut ctx = self.context();
        ctx.take_pending_error()?;
        let entry = ctx
            .fences
            .get(&fence.id())
            .ok_or_else(|| unknown(Fence::KIND, fence.id()))?;
        if entry.signaled {
            return Ok(true);
        }
        let Some(sync) = entry.sync else {
            return Ok(false);
        };
        match ctx.gl.client_wait_sync(sync, timeout_ns) {
            ALREADY_SIGNALED | CONDITION_SATISFIED => {
                ctx.gl.delete_sync(sync);
                if let Some(entry) = ctx.fences.get_mut(&fence.id()) {
                    entry.sync = None;
                    entry.signaled = true;
                }
                Ok(true)
            }
            TIMEOUT_EXPIRED => Ok(false),
            code => {
                ctx.stats.inc_driver_errors();
                Err(Error::Driver(DriverError {
                    code,
                    opcode: None,
                    at: None,
                }))
            }
        }
    }

    pub fn fence_status(&self, fence: &Fence) -> Result<bool> {
        self.wait_for_fence(fence, 0)
    }

    pub fn reset_fence(&self, fence: &Fence) -> Result<()> {
        let mut ctx = self.context();
        let entry = ctx
            .fences
            .get_mut(&fence.id())
            .ok_or_else(|| unknown(Fence::KIND, fence.id()))?;
        let sync = entry.sync.take();
        entry.signaled = false;
        if let Some(sync) = sync {
            ctx.gl.delete_sync(sync);
        }
        Ok(())
    }

    /// Blocks until the target is idle, signals every pending fence and reports any target
    /// error.
    pub fn wait_idle(&self) -> Result<()> {
        let mut ctx = self.context();
        ctx.gl.finish();
        let Context { gl, fences, .. } = &mut *ctx;
        for entry in fences.values_mut() {
            if let Some(sync) = entry.sync.take() {
                gl.delete_sync(sync);
                entry.signaled = true;
            }
        }
        ctx.check_status()
    }

    /// Reports the first target error raised since the last check.
    pub fn check_status(&self) -> Result<()> {
        self.context().check_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vkgl_format::Format;
    use vkgl_gl::RecordingGl;

    use crate::config::Limits;
    use crate::resource::{BufferUsage, WHOLE_SIZE};

    fn device() -> (Device, RecordingGl) {
        let gl = RecordingGl::new();
        (Device::new(Box::new(gl.clone()), DeviceConfig::default()), gl)
    }

    fn vertex_buffer(device: &Device, size: u64) -> Buffer {
        device
            .create_buffer(BufferDesc {
                size,
                usage: BufferUsage::VERTEX,
            })
            .unwrap()
    }

    #[test]
    fn allocation_validation() {
        let (device, _) = device();
        assert_eq!(
            device.allocate(0, 1).unwrap_err(),
            ValidationError::Zero("allocation size").into()
        );
        assert_eq!(
            device.allocate(64, 9).unwrap_err(),
            ValidationError::InvalidMemoryType(9).into()
        );
        assert!(matches!(
            device.allocate(1 << 40, 1).unwrap_err(),
            Error::OutOfMemory(OutOfMemoryError::HeapExhausted { heap: 1, .. })
        ));
    }

    #[test]
    fn heap_budget_is_returned_on_free() {
        let (device, _) = device();
        let budget = device.memory_properties().heaps[1].size;
        let a = device.allocate(budget, 1).unwrap();
        assert!(device.allocate(4, 1).is_err());
        device.free(&a).unwrap();
        device.allocate(4, 1).unwrap();
    }

    #[test]
    fn bind_checks_run_in_order() {
        let (device, gl) = device();
        let mem = device.allocate(256, 1).unwrap();
        let buffer = vertex_buffer(&device, 128);
        gl.clear_calls();

        assert!(matches!(
            device.bind_buffer_memory(&buffer, &mem, 2).unwrap_err(),
            Error::Validation(ValidationError::Misaligned { offset: 2, alignment: 4 })
        ));
        assert!(matches!(
            device.bind_buffer_memory(&buffer, &mem, 192).unwrap_err(),
            Error::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(gl.calls().is_empty());

        device.bind_buffer_memory(&buffer, &mem, 128).unwrap();
        assert_eq!(
            device.bind_buffer_memory(&buffer, &mem, 0).unwrap_err(),
            ValidationError::AlreadyBound {
                kind: Buffer::KIND,
                id: buffer.id()
            }
            .into()
        );
    }

    #[test]
    fn zero_alignment_limits_accept_any_offset() {
        let gl = RecordingGl::new();
        let config = DeviceConfig {
            limits: Limits {
                min_buffer_alignment: 0,
                ..Limits::default()
            },
            ..DeviceConfig::default()
        };
        let device = Device::new(Box::new(gl), config);
        let mem = device.allocate(256, 1).unwrap();
        let buffer = vertex_buffer(&device, 128);
        assert_eq!(device.buffer_memory_requirements(&buffer).unwrap().alignment, 0);
        device.bind_buffer_memory(&buffer, &mem, 3).unwrap();
    }

    #[test]
    fn multisample_images_need_device_memory() {
        let (device, _) = device();
        let mut desc = ImageDesc::new_2d(Format::R8G8B8A8Unorm, 4, 4);
        desc.samples = 4;
        let image = device.create_image(desc).unwrap();
        let reqs = device.image_memory_requirements(&image).unwrap();
        assert_eq!(reqs.type_bits, 0b0001);

        let host = device.allocate(reqs.size, 1).unwrap();
        assert!(matches!(
            device.bind_image_memory(&image, &host, 0).unwrap_err(),
            Error::Validation(ValidationError::IncompatibleMemoryType { type_index: 1, .. })
        ));
        let local = device.allocate(reqs.size, 0).unwrap();
        device.bind_image_memory(&image, &local, 0).unwrap();
    }

    #[test]
    fn map_is_exclusive_and_host_visible_only() {
        let (device, _) = device();
        let local = device.allocate(64, 0).unwrap();
        assert!(matches!(
            device.map(&local, 0, WHOLE_SIZE).unwrap_err(),
            Error::Validation(ValidationError::NotHostVisible(_))
        ));
        let host = device.allocate(64, 2).unwrap();
        device.map(&host, 0, 32).unwrap();
        assert_eq!(
            device.map(&host, 0, 32).unwrap_err(),
            ValidationError::AlreadyMapped(host.id()).into()
        );
        assert_eq!(
            device.write_mapped(&host, 30, &[0; 4]).unwrap_err(),
            ValidationError::OutsideMappedRange { offset: 30, size: 4 }.into()
        );
        assert!(!device.unmap(&host).unwrap());
        assert_eq!(
            device.unmap(&host).unwrap_err(),
            ValidationError::NotMapped(host.id()).into()
        );
    }

    #[test]
    fn multiple_subpasses_are_unsupported() {
        let (device, _) = device();
        let desc = RenderPassDesc {
            attachments: Vec::new(),
            subpasses: vec![Default::default(), Default::default()],
        };
        assert_eq!(
            device.create_render_pass(desc).unwrap_err(),
            UnsupportedError::MultipleSubpasses(2).into()
        );
    }

    #[test]
    fn unsubmitted_fences() {
        let (device, _) = device();
        let signaled = device.create_fence(true);
        let pending = device.create_fence(false);
        assert!(device.fence_status(&signaled).unwrap());
        assert!(!device.wait_for_fence(&pending, 1_000).unwrap());
        device.reset_fence(&signaled).unwrap();
        assert!(!device.fence_status(&signaled).unwrap());
    }
}
