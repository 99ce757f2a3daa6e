//! Replays recorded instructions against the live context.
//!
//! Dispatch is a flat table indexed by opcode. A failing instruction is reported as an event
//! and replay moves on to the next one; a malformed list stops at the first undecodable
//! record.

use vkgl_cmd::packets::{self, Rect2d};
use vkgl_cmd::{inline_items, CommandList, DecodeError, Opcode, Packet};
use vkgl_format::ImageAspects;
use vkgl_gl::consts::*;
use vkgl_gl::{GlBuffer, GlProgram, GlTexture, PixelDest, PixelSource, Rect};

use crate::context::{Context, PUSH_CONSTANT_BUFFER_SIZE};
use crate::error::{DriverError, ReplayError, UnsupportedError};
use crate::framebuffer::{attach_call, attachment_point};
use crate::pipeline::PipelineBindPoint;
use crate::resource::{Buffer, Framebuffer, Image, Pipeline};
use crate::state::AttachCall;
use crate::upload::{region_size, texture_region, upload_buffer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// An instruction could not be executed.
    Error {
        at: usize,
        opcode: Option<Opcode>,
        message: String,
    },
    /// The target raised an error while executing an instruction.
    DriverError(DriverError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub instructions_replayed: u32,
    pub events: Vec<ReplayEvent>,
}

impl ReplayReport {
    pub fn is_ok(&self) -> bool {
        self.events.is_empty()
    }
}

type Handler = fn(&mut Replay<'_>, &Packet<'_>) -> Result<(), ReplayError>;

const HANDLERS: [Handler; Opcode::COUNT] = [
    exec_nop,
    exec_bind_pipeline,
    exec_bind_vertex_buffers,
    exec_bind_index_buffer,
    exec_push_constants,
    exec_set_viewports,
    exec_set_scissors,
    exec_set_line_width,
    exec_set_depth_bias,
    exec_set_blend_constants,
    exec_draw,
    exec_draw_indexed,
    exec_draw_indirect,
    exec_draw_indexed_indirect,
    exec_dispatch,
    exec_dispatch_indirect,
    exec_copy_buffer,
    exec_update_buffer,
    exec_fill_buffer,
    exec_copy_buffer_to_image,
    exec_copy_image_to_buffer,
    exec_copy_image,
    exec_attach_transfer_target,
    exec_blit_framebuffer,
    exec_clear_color,
    exec_clear_depth_stencil,
    exec_begin_render_pass,
    exec_end_render_pass,
    exec_pipeline_barrier,
    exec_begin_debug_label,
    exec_end_debug_label,
];

struct Replay<'a> {
    ctx: &'a mut Context,
    graphics_program: Option<GlProgram>,
    compute_program: Option<GlProgram>,
}

impl Replay<'_> {
    fn buffer(&self, id: u32) -> Result<GlBuffer, ReplayError> {
        self.ctx
            .buffers
            .get(&id)
            .and_then(|entry| entry.gl)
            .ok_or(ReplayError::Missing {
                kind: Buffer::KIND,
                id,
            })
    }

    fn image(&self, id: u32) -> Result<(Image, GlTexture), ReplayError> {
        self.ctx
            .images
            .get(&id)
            .and_then(|entry| entry.gl.map(|tex| (entry.handle.clone(), tex)))
            .ok_or(ReplayError::Missing {
                kind: Image::KIND,
                id,
            })
    }

    /// Target framebuffer and draw buffers of a live framebuffer handle.
    fn framebuffer(&self, id: u32) -> Result<(vkgl_gl::GlFramebuffer, Vec<GLenum>), ReplayError> {
        let entry = self
            .ctx
            .framebuffers
            .get(&id)
            .ok_or(ReplayError::Missing {
                kind: Framebuffer::KIND,
                id,
            })?;
        self.ctx
            .framebuffer_cache
            .lookup(&entry.cached)
            .map(|(fb, draw_buffers)| (fb, draw_buffers.to_vec()))
            .ok_or(ReplayError::StaleFramebuffer(id))
    }

    fn prepare_graphics(&mut self) -> Result<(), ReplayError> {
        let program = self
            .graphics_program
            .ok_or(ReplayError::NotBound("graphics pipeline"))?;
        let vao = self.ctx.default_vertex_array;
        let (gl, state) = self.ctx.parts();
        state.use_program(gl, Some(program));
        state.bind_vertex_array(gl, Some(vao));
        Ok(())
    }

    fn prepare_compute(&mut self) -> Result<(), ReplayError> {
        let program = self
            .compute_program
            .ok_or(ReplayError::NotBound("compute pipeline"))?;
        let (gl, state) = self.ctx.parts();
        state.use_program(gl, Some(program));
        Ok(())
    }

    fn bind_default_vertex_array(&mut self) {
        let vao = self.ctx.default_vertex_array;
        let (gl, state) = self.ctx.parts();
        state.bind_vertex_array(gl, Some(vao));
    }

    /// Points the clear scissor at `rect`, or disables scissoring for whole-attachment clears.
    fn clear_scissor(&mut self, has_rect: u32, rect: Rect2d) {
        let (gl, state) = self.ctx.parts();
        if has_rect != 0 {
            let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
            state.scissor(gl, 0, Rect::new(x, y, w as i32, h as i32));
            state.set_enabled(gl, SCISSOR_TEST, true);
        } else {
            state.set_enabled(gl, SCISSOR_TEST, false);
        }
    }
}

/// Replays `list` on `ctx`. Tracked state is forgotten first, since anything may have touched
/// the context since the last replay.
pub(crate) fn replay(ctx: &mut Context, list: &CommandList) -> ReplayReport {
    ctx.state.invalidate();
    let check_errors = ctx.config.check_errors;
    let mut replay = Replay {
        ctx,
        graphics_program: None,
        compute_program: None,
    };
    let mut report = ReplayReport::default();

    for (index, packet) in list.iter().enumerate() {
        let packet = match packet {
            Ok(packet) => packet,
            Err(err) => {
                tracing::warn!(at = index, %err, "malformed command list");
                report.events.push(ReplayEvent::Error {
                    at: index,
                    opcode: None,
                    message: err.to_string(),
                });
                break;
            }
        };
        tracing::trace!(at = index, offset = packet.offset, opcode = ?packet.opcode, "replay");

        let handler = HANDLERS[packet.opcode.index()];
        if let Err(err) = handler(&mut replay, &packet) {
            tracing::warn!(at = index, opcode = ?packet.opcode, %err, "instruction failed");
            report.events.push(ReplayEvent::Error {
                at: index,
                opcode: Some(packet.opcode),
                message: err.to_string(),
            });
        }
        if check_errors {
            let code = replay.ctx.gl.get_error();
            if code != NO_ERROR {
                let err = DriverError {
                    code,
                    opcode: Some(packet.opcode),
                    at: Some(index),
                };
                replay.ctx.record_driver_error(err.clone());
                report.events.push(ReplayEvent::DriverError(err));
            }
        }
        report.instructions_replayed += 1;
    }

    replay
        .ctx
        .stats
        .add_instructions_replayed(u64::from(report.instructions_replayed));
    report
}

fn exec_nop(_: &mut Replay<'_>, _: &Packet<'_>) -> Result<(), ReplayError> {
    Ok(())
}

fn exec_bind_pipeline(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BindPipeline = packet.decode()?;
    let id = p.pipeline;
    let desc = r
        .ctx
        .pipelines
        .get(&id)
        .map(|pipeline| pipeline.desc().clone())
        .ok_or(ReplayError::Missing {
            kind: Pipeline::KIND,
            id,
        })?;
    match desc.bind_point {
        PipelineBindPoint::Graphics => {
            r.graphics_program = Some(desc.program);
            r.bind_default_vertex_array();
        }
        PipelineBindPoint::Compute => r.compute_program = Some(desc.program),
    }
    Ok(())
}

fn exec_bind_vertex_buffers(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BindVertexBuffers = packet.decode()?;
    let slots = p.slots;
    let items = inline_items(packet.opcode, p.count, &slots)?;
    let first = p.first;
    let mut bound = Vec::with_capacity(items.len());
    for slot in items {
        bound.push((r.buffer(slot.buffer)?, slot.offset, slot.stride));
    }
    r.bind_default_vertex_array();
    let (gl, state) = r.ctx.parts();
    for (i, (buffer, offset, stride)) in bound.into_iter().enumerate() {
        state.bind_vertex_buffer(gl, first + i as u32, Some(buffer), offset, stride);
    }
    Ok(())
}

fn exec_bind_index_buffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BindIndexBuffer = packet.decode()?;
    let buffer = r.buffer(p.buffer)?;
    r.bind_default_vertex_array();
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, ELEMENT_ARRAY_BUFFER, Some(buffer));
    Ok(())
}

fn exec_push_constants(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::PushConstants = packet.decode()?;
    let (offset, size) = (p.offset as usize, p.size as usize);
    if offset + size > packets::PUSH_CONSTANT_CAPACITY {
        return Err(DecodeError::CountExceedsCapacity {
            opcode: packet.opcode,
            count: p.offset + p.size,
            capacity: packets::PUSH_CONSTANT_CAPACITY,
        }
        .into());
    }
    let data = p.data;
    let bytes = &data[..size];
    let ubo = r.ctx.push_constant_buffer;
    let binding = r.ctx.config.push_constant_binding;
    let (gl, state) = r.ctx.parts();
    upload_buffer(gl, state, ubo, offset as u64, bytes);
    state.bind_buffer_range(
        gl,
        UNIFORM_BUFFER,
        binding,
        Some(ubo),
        0,
        PUSH_CONSTANT_BUFFER_SIZE,
    );
    Ok(())
}

fn exec_set_viewports(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::SetViewports = packet.decode()?;
    let viewports = p.viewports;
    let items = inline_items(packet.opcode, p.count, &viewports)?;
    let first = p.first;
    let (gl, state) = r.ctx.parts();
    for (i, v) in items.iter().enumerate() {
        let index = first + i as u32;
        state.viewport(gl, index, [v.x, v.y, v.width, v.height]);
        state.depth_range(gl, index, f64::from(v.min_depth), f64::from(v.max_depth));
    }
    Ok(())
}

fn exec_set_scissors(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::SetScissors = packet.decode()?;
    let rects = p.rects;
    let items = inline_items(packet.opcode, p.count, &rects)?;
    let first = p.first;
    let (gl, state) = r.ctx.parts();
    for (i, rect) in items.iter().enumerate() {
        let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
        state.scissor(gl, first + i as u32, Rect::new(x, y, w as i32, h as i32));
    }
    state.set_enabled(gl, SCISSOR_TEST, true);
    Ok(())
}

fn exec_set_line_width(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::SetLineWidth = packet.decode()?;
    let (gl, state) = r.ctx.parts();
    state.line_width(gl, p.width);
    Ok(())
}

fn exec_set_depth_bias(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::SetDepthBias = packet.decode()?;
    let (constant, clamp, slope) = (p.constant, p.clamp, p.slope);
    let (gl, state) = r.ctx.parts();
    state.depth_bias(gl, slope, constant, clamp);
    state.set_enabled(gl, POLYGON_OFFSET_FILL, constant != 0.0 || slope != 0.0);
    Ok(())
}

fn exec_set_blend_constants(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::SetBlendConstants = packet.decode()?;
    let (gl, state) = r.ctx.parts();
    state.blend_color(gl, p.constants);
    Ok(())
}

fn exec_draw(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::Draw = packet.decode()?;
    r.prepare_graphics()?;
    r.ctx.gl.draw_arrays_instanced_base_instance(
        p.mode,
        p.first_vertex,
        p.vertex_count,
        p.instance_count,
        p.first_instance,
    );
    Ok(())
}

fn exec_draw_indexed(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::DrawIndexed = packet.decode()?;
    r.prepare_graphics()?;
    r.ctx.gl.draw_elements_instanced_base_vertex_base_instance(
        p.mode,
        p.index_count,
        p.index_type,
        p.index_offset,
        p.instance_count,
        p.vertex_offset,
        p.first_instance,
    );
    Ok(())
}

fn exec_draw_indirect(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::DrawIndirect = packet.decode()?;
    let buffer = r.buffer(p.buffer)?;
    r.prepare_graphics()?;
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, DRAW_INDIRECT_BUFFER, Some(buffer));
    gl.multi_draw_arrays_indirect(p.mode, p.offset, p.draw_count, p.stride);
    Ok(())
}

fn exec_draw_indexed_indirect(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::DrawIndexedIndirect = packet.decode()?;
    let buffer = r.buffer(p.buffer)?;
    r.prepare_graphics()?;
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, DRAW_INDIRECT_BUFFER, Some(buffer));
    gl.multi_draw_elements_indirect(p.mode, p.index_type, p.offset, p.draw_count, p.stride);
    Ok(())
}

fn exec_dispatch(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::Dispatch = packet.decode()?;
    r.prepare_compute()?;
    r.ctx.gl.dispatch_compute(p.x, p.y, p.z);
    Ok(())
}

fn exec_dispatch_indirect(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::DispatchIndirect = packet.decode()?;
    let buffer = r.buffer(p.buffer)?;
    r.prepare_compute()?;
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, DISPATCH_INDIRECT_BUFFER, Some(buffer));
    gl.dispatch_compute_indirect(p.offset);
    Ok(())
}

fn exec_copy_buffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::CopyBuffer = packet.decode()?;
    let src = r.buffer(p.src)?;
    let dst = r.buffer(p.dst)?;
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, COPY_READ_BUFFER, Some(src));
    state.bind_buffer(gl, COPY_WRITE_BUFFER, Some(dst));
    gl.copy_buffer_sub_data(
        COPY_READ_BUFFER,
        COPY_WRITE_BUFFER,
        p.src_offset,
        p.dst_offset,
        p.size,
    );
    Ok(())
}

fn exec_update_buffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::UpdateBuffer = packet.decode()?;
    let bytes = packet.tail::<packets::UpdateBuffer>(p.size as usize)?;
    let buffer = r.buffer(p.buffer)?;
    let (gl, state) = r.ctx.parts();
    upload_buffer(gl, state, buffer, p.offset, bytes);
    Ok(())
}

fn exec_fill_buffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::FillBuffer = packet.decode()?;
    let buffer = r.buffer(p.buffer)?;
    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, COPY_WRITE_BUFFER, Some(buffer));
    gl.clear_buffer_sub_data(COPY_WRITE_BUFFER, p.offset, p.size, p.data);
    Ok(())
}

fn exec_copy_buffer_to_image(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::CopyBufferToImage = packet.decode()?;
    let region = p.region;
    let buffer = r.buffer(region.buffer)?;
    let (image, texture) = r.image(region.image)?;
    let desc = image.desc();
    let target = desc
        .format
        .target()
        .map_err(|_| UnsupportedError::Format(desc.format))?;
    let class = desc.dimension_class();
    let layout = texture_region(class, region.layer, region.offset, region.extent);
    let unit = r.ctx.config.transfer_texture_unit;

    let (gl, state) = r.ctx.parts();
    state.bind_texture(gl, unit, class.texture_target(), Some(texture));
    state.bind_buffer(gl, PIXEL_UNPACK_BUFFER, Some(buffer));
    state.pixel_store(gl, UNPACK_ROW_LENGTH, region.row_length as i32);
    state.pixel_store(gl, UNPACK_IMAGE_HEIGHT, region.image_height as i32);
    state.pixel_store(gl, UNPACK_ALIGNMENT, 1);
    let src = PixelSource::UnpackBuffer {
        offset: region.buffer_offset,
    };
    if desc.format.is_compressed() {
        gl.compressed_tex_sub_image(
            layout.upload_target,
            region.level,
            layout.upload_offset,
            layout.extent,
            target.internal_format,
            src,
        );
    } else {
        gl.tex_sub_image(
            layout.upload_target,
            region.level,
            layout.upload_offset,
            layout.extent,
            target.format,
            target.ty,
            src,
        );
    }
    Ok(())
}

fn exec_copy_image_to_buffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::CopyImageToBuffer = packet.decode()?;
    let region = p.region;
    let buffer = r.buffer(region.buffer)?;
    let (image, texture) = r.image(region.image)?;
    let desc = image.desc();
    let target = desc
        .format
        .target()
        .map_err(|_| UnsupportedError::Format(desc.format))?;
    let layout = texture_region(desc.dimension_class(), region.layer, region.offset, region.extent);
    let extent = region.extent;
    let [w, h, d] = extent;
    let packed = [
        if region.row_length == 0 { w } else { region.row_length },
        if region.image_height == 0 { h } else { region.image_height },
        d,
    ];
    let dst = PixelDest::PackBuffer {
        offset: region.buffer_offset,
        size: region_size(desc.format, packed),
    };

    let (gl, state) = r.ctx.parts();
    state.bind_buffer(gl, PIXEL_PACK_BUFFER, Some(buffer));
    state.pixel_store(gl, PACK_ROW_LENGTH, region.row_length as i32);
    state.pixel_store(gl, PACK_IMAGE_HEIGHT, region.image_height as i32);
    state.pixel_store(gl, PACK_ALIGNMENT, 1);
    if desc.format.is_compressed() {
        gl.get_compressed_texture_sub_image(
            texture,
            region.level,
            layout.read_offset,
            layout.extent,
            dst,
        );
    } else {
        gl.get_texture_sub_image(
            texture,
            region.level,
            layout.read_offset,
            layout.extent,
            target.format,
            target.ty,
            dst,
        );
    }
    Ok(())
}

fn exec_copy_image(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::CopyImage = packet.decode()?;
    let (src, src_texture) = r.image(p.src)?;
    let (dst, dst_texture) = r.image(p.dst)?;
    r.ctx.gl.copy_image_sub_data(
        src_texture,
        src.desc().dimension_class().texture_target(),
        p.src_level,
        p.src_offset,
        dst_texture,
        dst.desc().dimension_class().texture_target(),
        p.dst_level,
        p.dst_offset,
        p.extent,
    );
    Ok(())
}

fn exec_attach_transfer_target(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::AttachTransferTarget = packet.decode()?;
    let slot = p.slot;
    let (framebuffer, target) = match slot {
        packets::TRANSFER_SLOT_READ => (r.ctx.transfer_framebuffers[0], READ_FRAMEBUFFER),
        packets::TRANSFER_SLOT_DRAW => (r.ctx.transfer_framebuffers[1], DRAW_FRAMEBUFFER),
        _ => {
            return Err(ReplayError::Missing {
                kind: "transfer slot",
                id: slot,
            })
        }
    };
    let (image, texture) = r.image(p.image)?;
    let call = attach_call(image.desc(), texture, p.level, p.layer, 1)?;
    let aspects = ImageAspects::from_bits_truncate(p.aspects);
    let point = attachment_point(aspects, 0);

    let (gl, state) = r.ctx.parts();
    state.bind_framebuffer(gl, target, Some(framebuffer));
    let others: &[GLenum] = match point {
        DEPTH_STENCIL_ATTACHMENT => &[COLOR_ATTACHMENT0],
        DEPTH_ATTACHMENT => &[COLOR_ATTACHMENT0, STENCIL_ATTACHMENT],
        STENCIL_ATTACHMENT => &[COLOR_ATTACHMENT0, DEPTH_ATTACHMENT],
        _ => &[DEPTH_ATTACHMENT, STENCIL_ATTACHMENT],
    };
    for &other in others {
        state.attach(gl, target, other, AttachCall::Detach);
    }
    state.attach(gl, target, point, call);

    let buffer = if aspects.contains(ImageAspects::COLOR) {
        COLOR_ATTACHMENT0
    } else {
        NONE
    };
    if target == READ_FRAMEBUFFER {
        state.read_buffer(gl, buffer);
    } else {
        state.draw_buffers(gl, &[buffer]);
    }
    Ok(())
}

fn exec_blit_framebuffer(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BlitFramebuffer = packet.decode()?;
    let ([sx0, sy0, sx1, sy1], [dx0, dy0, dx1, dy1]) = (p.src, p.dst);
    let (gl, state) = r.ctx.parts();
    state.push();
    state.set_enabled(gl, SCISSOR_TEST, false);
    gl.blit_framebuffer(
        Rect::new(sx0, sy0, sx1 - sx0, sy1 - sy0),
        Rect::new(dx0, dy0, dx1 - dx0, dy1 - dy0),
        p.mask,
        p.filter,
    );
    state.pop(gl);
    Ok(())
}

fn exec_clear_color(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::ClearColor = packet.decode()?;
    let (draw_buffer, value) = (p.draw_buffer, p.value);
    r.ctx.state.push();
    r.clear_scissor(p.has_rect, p.rect);
    let (gl, state) = r.ctx.parts();
    state.color_mask(gl, draw_buffer, [true; 4]);
    let index = draw_buffer as i32;
    match p.kind {
        packets::CLEAR_KIND_SINT => gl.clear_buffer_iv(COLOR, index, value.map(|v| v as i32)),
        packets::CLEAR_KIND_UINT => gl.clear_buffer_uiv(COLOR, index, value),
        _ => gl.clear_buffer_fv(COLOR, index, value.map(f32::from_bits)),
    }
    state.pop(gl);
    Ok(())
}

fn exec_clear_depth_stencil(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::ClearDepthStencil = packet.decode()?;
    let aspects = ImageAspects::from_bits_truncate(p.aspects);
    let (depth, stencil) = (p.depth, p.stencil as i32);
    r.ctx.state.push();
    r.clear_scissor(p.has_rect, p.rect);
    let (gl, state) = r.ctx.parts();
    let clear_depth = aspects.contains(ImageAspects::DEPTH);
    let clear_stencil = aspects.contains(ImageAspects::STENCIL);
    if clear_depth {
        state.depth_mask(gl, true);
    }
    if clear_stencil {
        state.stencil_mask(gl, u32::MAX);
    }
    match (clear_depth, clear_stencil) {
        (true, true) => gl.clear_buffer_fi(depth, stencil),
        (true, false) => gl.clear_buffer_fv(DEPTH, 0, [depth, 0.0, 0.0, 0.0]),
        (false, true) => gl.clear_buffer_iv(STENCIL, 0, [stencil, 0, 0, 0]),
        (false, false) => {}
    }
    state.pop(gl);
    Ok(())
}

fn exec_begin_render_pass(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BeginRenderPass = packet.decode()?;
    let (framebuffer, draw_buffers) = r.framebuffer(p.framebuffer)?;
    let (gl, state) = r.ctx.parts();
    state.bind_framebuffer(gl, DRAW_FRAMEBUFFER, Some(framebuffer));
    state.draw_buffers(gl, &draw_buffers);
    Ok(())
}

fn exec_end_render_pass(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::EndRenderPass = packet.decode()?;
    let mask = p.discard_mask;
    if mask == 0 {
        return Ok(());
    }
    let (framebuffer, _) = r.framebuffer(p.framebuffer)?;
    let mut discarded: Vec<GLenum> = (0..8)
        .filter(|&i| mask & (1u32 << i) != 0)
        .map(|i| COLOR_ATTACHMENT0 + i)
        .collect();
    if mask & packets::DISCARD_DEPTH_BIT != 0 {
        discarded.push(DEPTH_ATTACHMENT);
    }
    if mask & packets::DISCARD_STENCIL_BIT != 0 {
        discarded.push(STENCIL_ATTACHMENT);
    }
    // Resolves may have left a transfer framebuffer bound.
    let (gl, state) = r.ctx.parts();
    state.bind_framebuffer(gl, DRAW_FRAMEBUFFER, Some(framebuffer));
    gl.invalidate_framebuffer(DRAW_FRAMEBUFFER, &discarded);
    Ok(())
}

fn exec_pipeline_barrier(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::PipelineBarrier = packet.decode()?;
    if p.barrier_bits != 0 {
        r.ctx.gl.memory_barrier(p.barrier_bits);
    }
    Ok(())
}

fn exec_begin_debug_label(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    let p: packets::BeginDebugLabel = packet.decode()?;
    let bytes = packet.tail::<packets::BeginDebugLabel>(p.len as usize)?;
    let label = String::from_utf8_lossy(bytes);
    r.ctx.gl.push_debug_group(&label);
    Ok(())
}

fn exec_end_debug_label(r: &mut Replay<'_>, packet: &Packet<'_>) -> Result<(), ReplayError> {
    packet.decode::<packets::EndDebugLabel>()?;
    r.ctx.gl.pop_debug_group();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn handler_table_is_indexed_by_opcode() {
        // Every slot must be distinct and reachable through `Opcode::index`.
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
        assert_eq!(HANDLERS.len(), Opcode::COUNT);
    }

    #[test]
    fn report_is_ok_without_events() {
        let mut report = ReplayReport::default();
        assert!(report.is_ok());
        report.events.push(ReplayEvent::Error {
            at: 3,
            opcode: Some(Opcode::Draw),
            message: "no graphics pipeline is bound".into(),
        });
        assert!(!report.is_ok());
    }
}
