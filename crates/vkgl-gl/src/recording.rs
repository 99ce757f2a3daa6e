//! Headless [`GlApi`] implementation that records every call and emulates enough storage to
//! round-trip buffer and texture bytes.
//!
//! Clones share state, so a test can hand one clone to a device and inspect the log through
//! another.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{
    GlApi, GlBuffer, GlFramebuffer, GlProgram, GlSync, GlTexture, GlVertexArray, PixelDest,
    PixelSource, Rect,
};
use crate::consts::*;

/// One recorded entry point invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum GlCall {
    GetError,
    Flush,
    Finish,
    CreateBuffer(GlBuffer),
    DeleteBuffer(GlBuffer),
    BindBuffer {
        target: GLenum,
        buffer: Option<GlBuffer>,
    },
    BindBufferRange {
        target: GLenum,
        index: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        size: u64,
    },
    BufferStorage {
        target: GLenum,
        size: u64,
        flags: GLbitfield,
    },
    BufferSubData {
        target: GLenum,
        offset: u64,
        data: Vec<u8>,
    },
    GetBufferSubData {
        target: GLenum,
        offset: u64,
        len: usize,
    },
    CopyBufferSubData {
        read_target: GLenum,
        write_target: GLenum,
        read_offset: u64,
        write_offset: u64,
        size: u64,
    },
    ClearBufferSubData {
        target: GLenum,
        offset: u64,
        size: u64,
        word: u32,
    },
    CreateTexture(GlTexture),
    DeleteTexture(GlTexture),
    ActiveTexture(u32),
    BindTexture {
        target: GLenum,
        texture: Option<GlTexture>,
    },
    TexStorage {
        target: GLenum,
        levels: u32,
        internal_format: GLenum,
        width: u32,
        height: u32,
        depth: u32,
        samples: u32,
    },
    PixelStore {
        pname: GLenum,
        value: i32,
    },
    TexSubImage {
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
        source: RecordedSource,
    },
    CompressedTexSubImage {
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        internal_format: GLenum,
        source: RecordedSource,
    },
    GetTextureSubImage {
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
    },
    GetCompressedTextureSubImage {
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
    },
    CopyImageSubData {
        src: GlTexture,
        src_level: u32,
        src_offset: [u32; 3],
        dst: GlTexture,
        dst_level: u32,
        dst_offset: [u32; 3],
        extent: [u32; 3],
    },
    CreateFramebuffer(GlFramebuffer),
    DeleteFramebuffer(GlFramebuffer),
    BindFramebuffer {
        target: GLenum,
        framebuffer: Option<GlFramebuffer>,
    },
    FramebufferTexture {
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    },
    FramebufferTexture2d {
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    },
    FramebufferTextureLayer {
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
        layer: u32,
    },
    CheckFramebufferStatus(GLenum),
    DrawBuffers(Vec<GLenum>),
    ReadBuffer(GLenum),
    InvalidateFramebuffer {
        target: GLenum,
        attachments: Vec<GLenum>,
    },
    BlitFramebuffer {
        src: Rect,
        dst: Rect,
        mask: GLbitfield,
        filter: GLenum,
    },
    ClearBufferFv {
        buffer: GLenum,
        draw_buffer: i32,
        value: [f32; 4],
    },
    ClearBufferIv {
        buffer: GLenum,
        draw_buffer: i32,
        value: [i32; 4],
    },
    ClearBufferUiv {
        buffer: GLenum,
        draw_buffer: i32,
        value: [u32; 4],
    },
    ClearBufferFi {
        depth: f32,
        stencil: i32,
    },
    Enable(GLenum),
    Disable(GLenum),
    ViewportIndexed {
        index: u32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    DepthRangeIndexed {
        index: u32,
        near: f64,
        far: f64,
    },
    ScissorIndexed {
        index: u32,
        rect: Rect,
    },
    ColorMask {
        index: u32,
        mask: [bool; 4],
    },
    DepthMask(bool),
    StencilMask(u32),
    LineWidth(f32),
    PolygonOffsetClamp {
        factor: f32,
        units: f32,
        clamp: f32,
    },
    BlendColor([f32; 4]),
    CreateVertexArray(GlVertexArray),
    DeleteVertexArray(GlVertexArray),
    BindVertexArray(Option<GlVertexArray>),
    BindVertexBuffer {
        binding: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        stride: u32,
    },
    UseProgram(Option<GlProgram>),
    DrawArrays {
        mode: GLenum,
        first: u32,
        count: u32,
        instances: u32,
        base_instance: u32,
    },
    DrawElements {
        mode: GLenum,
        count: u32,
        ty: GLenum,
        offset: u64,
        instances: u32,
        base_vertex: i32,
        base_instance: u32,
    },
    MultiDrawArraysIndirect {
        mode: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    MultiDrawElementsIndirect {
        mode: GLenum,
        ty: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    DispatchCompute([u32; 3]),
    DispatchComputeIndirect(u64),
    MemoryBarrier(GLbitfield),
    FenceSync(GlSync),
    ClientWaitSync {
        sync: GlSync,
        timeout_ns: u64,
    },
    DeleteSync(GlSync),
    PushDebugGroup(String),
    PopDebugGroup,
}

impl GlCall {
    /// True for calls that create or destroy driver objects.
    pub fn is_object_lifetime(&self) -> bool {
        matches!(
            self,
            GlCall::CreateBuffer(_)
                | GlCall::DeleteBuffer(_)
                | GlCall::CreateTexture(_)
                | GlCall::DeleteTexture(_)
                | GlCall::CreateFramebuffer(_)
                | GlCall::DeleteFramebuffer(_)
                | GlCall::CreateVertexArray(_)
                | GlCall::DeleteVertexArray(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedSource {
    Bytes(Vec<u8>),
    UnpackBuffer { offset: u64 },
}

/// Attachment recorded on an emulated framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedAttachment {
    pub texture: GlTexture,
    pub level: u32,
    /// `None` when the whole level (or every layer) is attached.
    pub layer: Option<u32>,
}

#[derive(Default, Debug)]
struct TextureState {
    target: GLenum,
    levels: u32,
    width: u32,
    height: u32,
    depth: u32,
    allocated: bool,
    /// `(level, z)` → tightly packed slice bytes.
    slices: HashMap<(u32, u32), Vec<u8>>,
}

impl TextureState {
    fn level_extent(&self, level: u32) -> [u32; 3] {
        let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
        let w = shrink(self.width);
        let h = if self.target == TEXTURE_1D_ARRAY {
            self.height
        } else {
            shrink(self.height)
        };
        let d = if self.target == TEXTURE_3D {
            shrink(self.depth)
        } else {
            self.depth
        };
        [w, h, d]
    }
}

#[derive(Default, Debug)]
struct FramebufferState {
    attachments: HashMap<GLenum, RecordedAttachment>,
    draw_buffers: Vec<GLenum>,
    read_buffer: GLenum,
}

#[derive(Default)]
struct Inner {
    calls: Vec<GlCall>,
    next_name: u32,
    next_sync: u64,
    errors: VecDeque<GLenum>,
    buffers: HashMap<GlBuffer, Vec<u8>>,
    buffer_bindings: HashMap<GLenum, GlBuffer>,
    textures: HashMap<GlTexture, TextureState>,
    texture_bindings: HashMap<(u32, GLenum), GlTexture>,
    active_unit: u32,
    framebuffers: HashMap<GlFramebuffer, FramebufferState>,
    read_framebuffer: Option<GlFramebuffer>,
    draw_framebuffer: Option<GlFramebuffer>,
    vertex_arrays: HashMap<GlVertexArray, ()>,
    vertex_array: Option<GlVertexArray>,
    program: Option<GlProgram>,
    pixel_store: HashMap<GLenum, i32>,
    syncs: HashMap<GlSync, ()>,
}

/// Recording, storage-emulating target.
#[derive(Clone, Default)]
pub struct RecordingGl {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut self.state().calls)
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Queues an error for the next `get_error`.
    pub fn inject_error(&self, code: GLenum) {
        self.state().errors.push_back(code);
    }

    pub fn buffer_contents(&self, buffer: GlBuffer) -> Option<Vec<u8>> {
        self.state().buffers.get(&buffer).cloned()
    }

    pub fn texture_slice(&self, texture: GlTexture, level: u32, z: u32) -> Option<Vec<u8>> {
        self.state()
            .textures
            .get(&texture)
            .and_then(|t| t.slices.get(&(level, z)).cloned())
    }

    pub fn framebuffer_attachment(
        &self,
        framebuffer: GlFramebuffer,
        attachment: GLenum,
    ) -> Option<RecordedAttachment> {
        self.state()
            .framebuffers
            .get(&framebuffer)
            .and_then(|fb| fb.attachments.get(&attachment).copied())
    }

    pub fn live_buffers(&self) -> usize {
        self.state().buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state().framebuffers.len()
    }
}

/// Bytes per pixel for an uncompressed `(format, type)` transfer pair.
pub fn transfer_texel_size(format: GLenum, ty: GLenum) -> Option<usize> {
    let packed = match ty {
        UNSIGNED_SHORT_4_4_4_4
        | UNSIGNED_SHORT_5_5_5_1
        | UNSIGNED_SHORT_5_6_5
        | UNSIGNED_SHORT_1_5_5_5_REV => Some(2),
        UNSIGNED_INT_2_10_10_10_REV
        | UNSIGNED_INT_24_8
        | UNSIGNED_INT_10F_11F_11F_REV
        | UNSIGNED_INT_5_9_9_9_REV => Some(4),
        FLOAT_32_UNSIGNED_INT_24_8_REV => Some(8),
        _ => None,
    };
    if packed.is_some() {
        return packed;
    }
    let components = match format {
        RED | RED_INTEGER | DEPTH_COMPONENT | STENCIL_INDEX => 1,
        RG | RG_INTEGER => 2,
        RGB | BGR | RGB_INTEGER | BGR_INTEGER => 3,
        RGBA | BGRA | RGBA_INTEGER | BGRA_INTEGER => 4,
        _ => return None,
    };
    let component = match ty {
        BYTE | UNSIGNED_BYTE => 1,
        SHORT | UNSIGNED_SHORT | HALF_FLOAT => 2,
        INT | UNSIGNED_INT | FLOAT => 4,
        _ => return None,
    };
    Some(components * component)
}

fn is_cube_face(target: GLenum) -> bool {
    (TEXTURE_CUBE_MAP_POSITIVE_X..=TEXTURE_CUBE_MAP_NEGATIVE_Z).contains(&target)
}

/// Row/slice pitches for a transfer honoring the pixel-store row length and image height.
struct Pitches {
    row: usize,
    slice: usize,
}

impl Inner {
    fn record(&mut self, call: GlCall) {
        self.calls.push(call);
    }

    fn error(&mut self, code: GLenum) {
        tracing::debug!(code, "recording target raised error");
        self.errors.push_back(code);
    }

    fn alloc_name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn bound_buffer_mut(&mut self, target: GLenum) -> Option<&mut Vec<u8>> {
        let name = *self.buffer_bindings.get(&target)?;
        self.buffers.get_mut(&name)
    }

    /// Resolves a bind target to the bound texture and the `z` index a face target selects.
    fn bound_texture(&self, target: GLenum) -> Option<(GlTexture, u32)> {
        if is_cube_face(target) {
            let tex = self
                .texture_bindings
                .get(&(self.active_unit, TEXTURE_CUBE_MAP))?;
            return Some((*tex, target - TEXTURE_CUBE_MAP_POSITIVE_X));
        }
        self.texture_bindings
            .get(&(self.active_unit, target))
            .map(|tex| (*tex, 0))
    }

    fn pitches(&self, unpack: bool, extent: [u32; 3], texel: usize) -> Pitches {
        let (row_name, height_name) = if unpack {
            (UNPACK_ROW_LENGTH, UNPACK_IMAGE_HEIGHT)
        } else {
            (PACK_ROW_LENGTH, PACK_IMAGE_HEIGHT)
        };
        let row_length = match self.pixel_store.get(&row_name) {
            Some(&v) if v > 0 => v as usize,
            _ => extent[0] as usize,
        };
        let image_height = match self.pixel_store.get(&height_name) {
            Some(&v) if v > 0 => v as usize,
            _ => extent[1] as usize,
        };
        let row = row_length * texel;
        Pitches {
            row,
            slice: row * image_height,
        }
    }

    fn source_bytes(&self, src: &PixelSource<'_>, len: usize) -> Option<Vec<u8>> {
        match *src {
            PixelSource::Bytes(bytes) => bytes.get(..len).map(<[u8]>::to_vec),
            PixelSource::UnpackBuffer { offset } => {
                let name = self.buffer_bindings.get(&PIXEL_UNPACK_BUFFER)?;
                let storage = self.buffers.get(name)?;
                let start = usize::try_from(offset).ok()?;
                storage.get(start..start.checked_add(len)?).map(<[u8]>::to_vec)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_region(
        &mut self,
        texture: GlTexture,
        level: u32,
        z_base: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        texel: usize,
        src: &[u8],
        pitches: &Pitches,
    ) -> bool {
        let Some(tex) = self.textures.get_mut(&texture) else {
            return false;
        };
        let [lw, lh, _] = tex.level_extent(level);
        if offset[0] + extent[0] > lw || offset[1] + extent[1] > lh {
            return false;
        }
        let slice_row = lw as usize * texel;
        for z in 0..extent[2] {
            let key = (level, z_base + offset[2] + z);
            let slice = tex
                .slices
                .entry(key)
                .or_insert_with(|| vec![0u8; slice_row * lh as usize]);
            for y in 0..extent[1] as usize {
                let src_start = z as usize * pitches.slice + y * pitches.row;
                let Some(row) = src.get(src_start..src_start + extent[0] as usize * texel) else {
                    return false;
                };
                let dst_start = (offset[1] as usize + y) * slice_row + offset[0] as usize * texel;
                slice[dst_start..dst_start + row.len()].copy_from_slice(row);
            }
        }
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn read_region(
        &self,
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        texel: usize,
        out: &mut [u8],
        pitches: &Pitches,
    ) -> bool {
        let Some(tex) = self.textures.get(&texture) else {
            return false;
        };
        let [lw, lh, _] = tex.level_extent(level);
        if offset[0] + extent[0] > lw || offset[1] + extent[1] > lh {
            return false;
        }
        let slice_row = lw as usize * texel;
        for z in 0..extent[2] {
            let slice = tex.slices.get(&(level, offset[2] + z));
            for y in 0..extent[1] as usize {
                let dst_start = z as usize * pitches.slice + y * pitches.row;
                let row_len = extent[0] as usize * texel;
                let Some(dst) = out.get_mut(dst_start..dst_start + row_len) else {
                    return false;
                };
                match slice {
                    Some(slice) => {
                        let src_start =
                            (offset[1] as usize + y) * slice_row + offset[0] as usize * texel;
                        dst.copy_from_slice(&slice[src_start..src_start + row_len]);
                    }
                    None => dst.fill(0),
                }
            }
        }
        true
    }

    fn write_dest(&mut self, dst: PixelDest<'_>, bytes: &[u8]) {
        match dst {
            PixelDest::Bytes(out) => {
                let n = out.len().min(bytes.len());
                out[..n].copy_from_slice(&bytes[..n]);
            }
            PixelDest::PackBuffer { offset, size } => {
                let start = offset as usize;
                let len = (size as usize).min(bytes.len());
                let ok = match self.bound_buffer_mut(PIXEL_PACK_BUFFER) {
                    Some(storage) => match storage.get_mut(start..start + len) {
                        Some(slot) => {
                            slot.copy_from_slice(&bytes[..len]);
                            true
                        }
                        None => false,
                    },
                    None => false,
                };
                if !ok {
                    self.error(INVALID_OPERATION);
                }
            }
        }
    }

    fn attachment_for_blit(
        &self,
        framebuffer: Option<GlFramebuffer>,
        point: GLenum,
    ) -> Option<RecordedAttachment> {
        let fb = self.framebuffers.get(&framebuffer?)?;
        fb.attachments.get(&point).copied()
    }

    fn copy_slice_region(
        &mut self,
        src: RecordedAttachment,
        src_offset: [u32; 2],
        dst: RecordedAttachment,
        dst_offset: [u32; 2],
        extent: [u32; 2],
    ) -> bool {
        let src_key = (src.level, src.layer.unwrap_or(0));
        let dst_key = (dst.level, dst.layer.unwrap_or(0));
        let Some(src_tex) = self.textures.get(&src.texture) else {
            return false;
        };
        let [sw, sh, _] = src_tex.level_extent(src.level);
        let Some(src_slice) = src_tex.slices.get(&src_key).cloned() else {
            // Nothing uploaded yet: nothing to copy.
            return true;
        };
        let texel = src_slice.len() / (sw as usize * sh as usize).max(1);
        let Some(dst_tex) = self.textures.get_mut(&dst.texture) else {
            return false;
        };
        let [dw, dh, _] = dst_tex.level_extent(dst.level);
        if src_offset[0] + extent[0] > sw
            || src_offset[1] + extent[1] > sh
            || dst_offset[0] + extent[0] > dw
            || dst_offset[1] + extent[1] > dh
        {
            return false;
        }
        let dst_slice = dst_tex
            .slices
            .entry(dst_key)
            .or_insert_with(|| vec![0u8; dw as usize * dh as usize * texel]);
        if dst_slice.len() != dw as usize * dh as usize * texel {
            return false;
        }
        let row_len = extent[0] as usize * texel;
        for y in 0..extent[1] as usize {
            let s = (src_offset[1] as usize + y) * sw as usize * texel
                + src_offset[0] as usize * texel;
            let d = (dst_offset[1] as usize + y) * dw as usize * texel
                + dst_offset[0] as usize * texel;
            dst_slice[d..d + row_len].copy_from_slice(&src_slice[s..s + row_len]);
        }
        true
    }

    fn attach(&mut self, target: GLenum, attachment: GLenum, value: Option<RecordedAttachment>) {
        let bound = match target {
            READ_FRAMEBUFFER => self.read_framebuffer,
            _ => self.draw_framebuffer,
        };
        let Some(fb) = bound.and_then(|name| self.framebuffers.get_mut(&name)) else {
            self.error(INVALID_OPERATION);
            return;
        };
        // The combined point aliases the depth and stencil points.
        let points: &[GLenum] = if attachment == DEPTH_STENCIL_ATTACHMENT {
            &[DEPTH_ATTACHMENT, STENCIL_ATTACHMENT]
        } else {
            std::slice::from_ref(&attachment)
        };
        for &point in points {
            match value {
                Some(att) => {
                    fb.attachments.insert(point, att);
                }
                None => {
                    fb.attachments.remove(&point);
                }
            }
        }
    }
}

impl GlApi for RecordingGl {
    fn get_error(&mut self) -> GLenum {
        let mut s = self.state();
        s.record(GlCall::GetError);
        s.errors.pop_front().unwrap_or(NO_ERROR)
    }

    fn flush(&mut self) {
        self.state().record(GlCall::Flush);
    }

    fn finish(&mut self) {
        self.state().record(GlCall::Finish);
    }

    fn create_buffer(&mut self) -> GlBuffer {
        let mut s = self.state();
        let name = GlBuffer(s.alloc_name());
        s.buffers.insert(name, Vec::new());
        s.record(GlCall::CreateBuffer(name));
        name
    }

    fn delete_buffer(&mut self, buffer: GlBuffer) {
        let mut s = self.state();
        s.record(GlCall::DeleteBuffer(buffer));
        s.buffers.remove(&buffer);
        s.buffer_bindings.retain(|_, b| *b != buffer);
    }

    fn bind_buffer(&mut self, target: GLenum, buffer: Option<GlBuffer>) {
        let mut s = self.state();
        s.record(GlCall::BindBuffer { target, buffer });
        match buffer {
            Some(b) => {
                s.buffer_bindings.insert(target, b);
            }
            None => {
                s.buffer_bindings.remove(&target);
            }
        }
    }

    fn bind_buffer_range(
        &mut self,
        target: GLenum,
        index: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        size: u64,
    ) {
        let mut s = self.state();
        s.record(GlCall::BindBufferRange {
            target,
            index,
            buffer,
            offset,
            size,
        });
        if let Some(b) = buffer {
            s.buffer_bindings.insert(target, b);
        }
    }

    fn buffer_storage(&mut self, target: GLenum, size: u64, flags: GLbitfield) {
        let mut s = self.state();
        s.record(GlCall::BufferStorage {
            target,
            size,
            flags,
        });
        match s.bound_buffer_mut(target) {
            Some(storage) => *storage = vec![0u8; size as usize],
            None => s.error(INVALID_OPERATION),
        }
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: u64, data: &[u8]) {
        let mut s = self.state();
        s.record(GlCall::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
        let start = offset as usize;
        let ok = match s.bound_buffer_mut(target) {
            Some(storage) => match storage.get_mut(start..start + data.len()) {
                Some(slot) => {
                    slot.copy_from_slice(data);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !ok {
            s.error(INVALID_VALUE);
        }
    }

    fn get_buffer_sub_data(&mut self, target: GLenum, offset: u64, out: &mut [u8]) {
        let mut s = self.state();
        s.record(GlCall::GetBufferSubData {
            target,
            offset,
            len: out.len(),
        });
        let start = offset as usize;
        let ok = match s.bound_buffer_mut(target) {
            Some(storage) => match storage.get(start..start + out.len()) {
                Some(slot) => {
                    out.copy_from_slice(slot);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !ok {
            s.error(INVALID_VALUE);
        }
    }

    fn copy_buffer_sub_data(
        &mut self,
        read_target: GLenum,
        write_target: GLenum,
        read_offset: u64,
        write_offset: u64,
        size: u64,
    ) {
        let mut s = self.state();
        s.record(GlCall::CopyBufferSubData {
            read_target,
            write_target,
            read_offset,
            write_offset,
            size,
        });
        let (r, w, n) = (read_offset as usize, write_offset as usize, size as usize);
        let bytes = s
            .bound_buffer_mut(read_target)
            .and_then(|src| src.get(r..r + n).map(<[u8]>::to_vec));
        let ok = match bytes {
            Some(bytes) => match s.bound_buffer_mut(write_target) {
                Some(dst) => match dst.get_mut(w..w + n) {
                    Some(slot) => {
                        slot.copy_from_slice(&bytes);
                        true
                    }
                    None => false,
                },
                None => false,
            },
            None => false,
        };
        if !ok {
            s.error(INVALID_VALUE);
        }
    }

    fn clear_buffer_sub_data(&mut self, target: GLenum, offset: u64, size: u64, word: u32) {
        let mut s = self.state();
        s.record(GlCall::ClearBufferSubData {
            target,
            offset,
            size,
            word,
        });
        let (start, n) = (offset as usize, size as usize);
        let ok = match s.bound_buffer_mut(target) {
            Some(storage) => match storage.get_mut(start..start + n) {
                Some(slot) => {
                    for (i, b) in slot.iter_mut().enumerate() {
                        *b = word.to_le_bytes()[i % 4];
                    }
                    true
                }
                None => false,
            },
            None => false,
        };
        if !ok {
            s.error(INVALID_VALUE);
        }
    }

    fn create_texture(&mut self) -> GlTexture {
        let mut s = self.state();
        let name = GlTexture(s.alloc_name());
        s.textures.insert(name, TextureState::default());
        s.record(GlCall::CreateTexture(name));
        name
    }

    fn delete_texture(&mut self, texture: GlTexture) {
        let mut s = self.state();
        s.record(GlCall::DeleteTexture(texture));
        s.textures.remove(&texture);
        s.texture_bindings.retain(|_, t| *t != texture);
        for fb in s.framebuffers.values_mut() {
            fb.attachments.retain(|_, att| att.texture != texture);
        }
    }

    fn active_texture(&mut self, unit: u32) {
        let mut s = self.state();
        s.record(GlCall::ActiveTexture(unit));
        s.active_unit = unit;
    }

    fn bind_texture(&mut self, target: GLenum, texture: Option<GlTexture>) {
        let mut s = self.state();
        s.record(GlCall::BindTexture { target, texture });
        let unit = s.active_unit;
        match texture {
            Some(t) => {
                if let Some(tex) = s.textures.get_mut(&t) {
                    if tex.target == 0 {
                        tex.target = target;
                    }
                }
                s.texture_bindings.insert((unit, target), t);
            }
            None => {
                s.texture_bindings.remove(&(unit, target));
            }
        }
    }

    fn tex_storage(
        &mut self,
        target: GLenum,
        levels: u32,
        internal_format: GLenum,
        width: u32,
        height: u32,
        depth: u32,
        samples: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::TexStorage {
            target,
            levels,
            internal_format,
            width,
            height,
            depth,
            samples,
        });
        let Some((name, _)) = s.bound_texture(target) else {
            s.error(INVALID_OPERATION);
            return;
        };
        let depth = if target == TEXTURE_CUBE_MAP { 6 } else { depth };
        if s.textures.get(&name).map_or(true, |tex| tex.allocated) {
            s.error(INVALID_OPERATION);
            return;
        }
        let Some(tex) = s.textures.get_mut(&name) else {
            return;
        };
        tex.target = target;
        tex.levels = levels;
        tex.width = width;
        tex.height = height;
        tex.depth = depth;
        tex.allocated = true;
    }

    fn pixel_store(&mut self, pname: GLenum, value: i32) {
        let mut s = self.state();
        s.record(GlCall::PixelStore { pname, value });
        s.pixel_store.insert(pname, value);
    }

    fn tex_sub_image(
        &mut self,
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
        src: PixelSource<'_>,
    ) {
        let mut s = self.state();
        let texel = transfer_texel_size(format, ty);
        let pitches = s.pitches(true, extent, texel.unwrap_or(0));
        let len = pitches.slice * extent[2].saturating_sub(1) as usize
            + pitches.row * extent[1].saturating_sub(1) as usize
            + extent[0] as usize * texel.unwrap_or(0);
        let bytes = s.source_bytes(&src, len);
        s.record(GlCall::TexSubImage {
            target,
            level,
            offset,
            extent,
            format,
            ty,
            source: match src {
                PixelSource::Bytes(b) => RecordedSource::Bytes(b.to_vec()),
                PixelSource::UnpackBuffer { offset } => RecordedSource::UnpackBuffer { offset },
            },
        });
        let (Some(texel), Some(bytes)) = (texel, bytes) else {
            s.error(INVALID_VALUE);
            return;
        };
        let Some((name, z_base)) = s.bound_texture(target) else {
            s.error(INVALID_OPERATION);
            return;
        };
        if !s.write_region(name, level, z_base, offset, extent, texel, &bytes, &pitches) {
            s.error(INVALID_VALUE);
        }
    }

    fn compressed_tex_sub_image(
        &mut self,
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        internal_format: GLenum,
        src: PixelSource<'_>,
    ) {
        let mut s = self.state();
        let len = match src {
            PixelSource::Bytes(b) => b.len(),
            PixelSource::UnpackBuffer { offset } => s
                .buffer_bindings
                .get(&PIXEL_UNPACK_BUFFER)
                .and_then(|b| s.buffers.get(b))
                .map_or(0, |storage| storage.len().saturating_sub(offset as usize)),
        };
        let bytes = s.source_bytes(&src, len);
        s.record(GlCall::CompressedTexSubImage {
            target,
            level,
            offset,
            extent,
            internal_format,
            source: match src {
                PixelSource::Bytes(b) => RecordedSource::Bytes(b.to_vec()),
                PixelSource::UnpackBuffer { offset } => RecordedSource::UnpackBuffer { offset },
            },
        });
        let (Some(bytes), Some((name, z_base))) = (bytes, s.bound_texture(target)) else {
            s.error(INVALID_OPERATION);
            return;
        };
        // Only whole-slice compressed uploads are emulated; each z slice gets an equal share.
        let depth = extent[2].max(1) as usize;
        let per_slice = bytes.len() / depth;
        if let Some(tex) = s.textures.get_mut(&name) {
            for z in 0..depth {
                let chunk = bytes[z * per_slice..(z + 1) * per_slice].to_vec();
                tex.slices
                    .insert((level, z_base + offset[2] + z as u32), chunk);
            }
        }
    }

    fn get_texture_sub_image(
        &mut self,
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
        dst: PixelDest<'_>,
    ) {
        let mut s = self.state();
        s.record(GlCall::GetTextureSubImage {
            texture,
            level,
            offset,
            extent,
            format,
            ty,
        });
        let Some(texel) = transfer_texel_size(format, ty) else {
            s.error(INVALID_ENUM);
            return;
        };
        let pitches = s.pitches(false, extent, texel);
        let len = pitches.slice * extent[2] as usize;
        let mut bytes = vec![0u8; len];
        if !s.read_region(texture, level, offset, extent, texel, &mut bytes, &pitches) {
            s.error(INVALID_VALUE);
            return;
        }
        s.write_dest(dst, &bytes);
    }

    fn get_compressed_texture_sub_image(
        &mut self,
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        dst: PixelDest<'_>,
    ) {
        let mut s = self.state();
        s.record(GlCall::GetCompressedTextureSubImage {
            texture,
            level,
            offset,
            extent,
        });
        let mut bytes = Vec::new();
        if let Some(tex) = s.textures.get(&texture) {
            for z in 0..extent[2].max(1) {
                if let Some(slice) = tex.slices.get(&(level, offset[2] + z)) {
                    bytes.extend_from_slice(slice);
                }
            }
        }
        s.write_dest(dst, &bytes);
    }

    fn copy_image_sub_data(
        &mut self,
        src: GlTexture,
        _src_target: GLenum,
        src_level: u32,
        src_offset: [u32; 3],
        dst: GlTexture,
        _dst_target: GLenum,
        dst_level: u32,
        dst_offset: [u32; 3],
        extent: [u32; 3],
    ) {
        let mut s = self.state();
        s.record(GlCall::CopyImageSubData {
            src,
            src_level,
            src_offset,
            dst,
            dst_level,
            dst_offset,
            extent,
        });
        for z in 0..extent[2] {
            let from = RecordedAttachment {
                texture: src,
                level: src_level,
                layer: Some(src_offset[2] + z),
            };
            let to = RecordedAttachment {
                texture: dst,
                level: dst_level,
                layer: Some(dst_offset[2] + z),
            };
            if !s.copy_slice_region(
                from,
                [src_offset[0], src_offset[1]],
                to,
                [dst_offset[0], dst_offset[1]],
                [extent[0], extent[1]],
            ) {
                s.error(INVALID_VALUE);
                return;
            }
        }
    }

    fn create_framebuffer(&mut self) -> GlFramebuffer {
        let mut s = self.state();
        let name = GlFramebuffer(s.alloc_name());
        s.framebuffers.insert(
            name,
            FramebufferState {
                draw_buffers: vec![COLOR_ATTACHMENT0],
                read_buffer: COLOR_ATTACHMENT0,
                ..FramebufferState::default()
            },
        );
        s.record(GlCall::CreateFramebuffer(name));
        name
    }

    fn delete_framebuffer(&mut self, framebuffer: GlFramebuffer) {
        let mut s = self.state();
        s.record(GlCall::DeleteFramebuffer(framebuffer));
        s.framebuffers.remove(&framebuffer);
        if s.read_framebuffer == Some(framebuffer) {
            s.read_framebuffer = None;
        }
        if s.draw_framebuffer == Some(framebuffer) {
            s.draw_framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: Option<GlFramebuffer>) {
        let mut s = self.state();
        s.record(GlCall::BindFramebuffer {
            target,
            framebuffer,
        });
        match target {
            READ_FRAMEBUFFER => s.read_framebuffer = framebuffer,
            DRAW_FRAMEBUFFER => s.draw_framebuffer = framebuffer,
            _ => {
                s.read_framebuffer = framebuffer;
                s.draw_framebuffer = framebuffer;
            }
        }
    }

    fn framebuffer_texture(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::FramebufferTexture {
            target,
            attachment,
            texture,
            level,
        });
        let value = texture.map(|texture| RecordedAttachment {
            texture,
            level,
            layer: None,
        });
        s.attach(target, attachment, value);
    }

    fn framebuffer_texture_2d(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::FramebufferTexture2d {
            target,
            attachment,
            tex_target,
            texture,
            level,
        });
        let layer = is_cube_face(tex_target).then(|| tex_target - TEXTURE_CUBE_MAP_POSITIVE_X);
        let value = texture.map(|texture| RecordedAttachment {
            texture,
            level,
            layer,
        });
        s.attach(target, attachment, value);
    }

    fn framebuffer_texture_layer(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
        layer: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::FramebufferTextureLayer {
            target,
            attachment,
            texture,
            level,
            layer,
        });
        let value = texture.map(|texture| RecordedAttachment {
            texture,
            level,
            layer: Some(layer),
        });
        s.attach(target, attachment, value);
    }

    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        let mut s = self.state();
        s.record(GlCall::CheckFramebufferStatus(target));
        let bound = match target {
            READ_FRAMEBUFFER => s.read_framebuffer,
            _ => s.draw_framebuffer,
        };
        match bound.and_then(|name| s.framebuffers.get(&name)) {
            Some(fb) if !fb.attachments.is_empty() => FRAMEBUFFER_COMPLETE,
            // INCOMPLETE_MISSING_ATTACHMENT
            Some(_) => 0x8CD7,
            None => FRAMEBUFFER_COMPLETE,
        }
    }

    fn draw_buffers(&mut self, buffers: &[GLenum]) {
        let mut s = self.state();
        s.record(GlCall::DrawBuffers(buffers.to_vec()));
        let bound = s.draw_framebuffer;
        if let Some(fb) = bound.and_then(|name| s.framebuffers.get_mut(&name)) {
            fb.draw_buffers = buffers.to_vec();
        }
    }

    fn read_buffer(&mut self, buffer: GLenum) {
        let mut s = self.state();
        s.record(GlCall::ReadBuffer(buffer));
        let bound = s.read_framebuffer;
        if let Some(fb) = bound.and_then(|name| s.framebuffers.get_mut(&name)) {
            fb.read_buffer = buffer;
        }
    }

    fn invalidate_framebuffer(&mut self, target: GLenum, attachments: &[GLenum]) {
        self.state().record(GlCall::InvalidateFramebuffer {
            target,
            attachments: attachments.to_vec(),
        });
    }

    fn blit_framebuffer(&mut self, src: Rect, dst: Rect, mask: GLbitfield, filter: GLenum) {
        let mut s = self.state();
        s.record(GlCall::BlitFramebuffer {
            src,
            dst,
            mask,
            filter,
        });
        // Only unscaled copies are emulated.
        if src.width != dst.width || src.height != dst.height {
            return;
        }
        let read_fb = s.read_framebuffer;
        let draw_fb = s.draw_framebuffer;
        let mut pairs = Vec::new();
        if mask & COLOR_BUFFER_BIT != 0 {
            let read_point = read_fb
                .and_then(|n| s.framebuffers.get(&n))
                .map_or(NONE, |fb| fb.read_buffer);
            let draw_point = draw_fb
                .and_then(|n| s.framebuffers.get(&n))
                .and_then(|fb| fb.draw_buffers.first().copied())
                .unwrap_or(NONE);
            pairs.push((read_point, draw_point));
        }
        if mask & DEPTH_BUFFER_BIT != 0 {
            pairs.push((DEPTH_ATTACHMENT, DEPTH_ATTACHMENT));
        }
        if mask & STENCIL_BUFFER_BIT != 0 {
            pairs.push((STENCIL_ATTACHMENT, STENCIL_ATTACHMENT));
        }
        for (read_point, draw_point) in pairs {
            let from = s.attachment_for_blit(read_fb, read_point);
            let to = s.attachment_for_blit(draw_fb, draw_point);
            let (Some(from), Some(to)) = (from, to) else {
                s.error(INVALID_OPERATION);
                return;
            };
            if !s.copy_slice_region(
                from,
                [src.x as u32, src.y as u32],
                to,
                [dst.x as u32, dst.y as u32],
                [src.width as u32, src.height as u32],
            ) {
                s.error(INVALID_OPERATION);
                return;
            }
        }
    }

    fn clear_buffer_fv(&mut self, buffer: GLenum, draw_buffer: i32, value: [f32; 4]) {
        self.state().record(GlCall::ClearBufferFv {
            buffer,
            draw_buffer,
            value,
        });
    }

    fn clear_buffer_iv(&mut self, buffer: GLenum, draw_buffer: i32, value: [i32; 4]) {
        self.state().record(GlCall::ClearBufferIv {
            buffer,
            draw_buffer,
            value,
        });
    }

    fn clear_buffer_uiv(&mut self, buffer: GLenum, draw_buffer: i32, value: [u32; 4]) {
        self.state().record(GlCall::ClearBufferUiv {
            buffer,
            draw_buffer,
            value,
        });
    }

    fn clear_buffer_fi(&mut self, depth: f32, stencil: i32) {
        self.state().record(GlCall::ClearBufferFi { depth, stencil });
    }

    fn enable(&mut self, cap: GLenum) {
        self.state().record(GlCall::Enable(cap));
    }

    fn disable(&mut self, cap: GLenum) {
        self.state().record(GlCall::Disable(cap));
    }

    fn viewport_indexed(&mut self, index: u32, x: f32, y: f32, width: f32, height: f32) {
        self.state().record(GlCall::ViewportIndexed {
            index,
            x,
            y,
            width,
            height,
        });
    }

    fn depth_range_indexed(&mut self, index: u32, near: f64, far: f64) {
        self.state()
            .record(GlCall::DepthRangeIndexed { index, near, far });
    }

    fn scissor_indexed(&mut self, index: u32, rect: Rect) {
        self.state().record(GlCall::ScissorIndexed { index, rect });
    }

    fn color_mask(&mut self, index: u32, mask: [bool; 4]) {
        self.state().record(GlCall::ColorMask { index, mask });
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.state().record(GlCall::DepthMask(enabled));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.state().record(GlCall::StencilMask(mask));
    }

    fn line_width(&mut self, width: f32) {
        self.state().record(GlCall::LineWidth(width));
    }

    fn polygon_offset_clamp(&mut self, factor: f32, units: f32, clamp: f32) {
        self.state().record(GlCall::PolygonOffsetClamp {
            factor,
            units,
            clamp,
        });
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.state().record(GlCall::BlendColor(color));
    }

    fn create_vertex_array(&mut self) -> GlVertexArray {
        let mut s = self.state();
        let name = GlVertexArray(s.alloc_name());
        s.vertex_arrays.insert(name, ());
        s.record(GlCall::CreateVertexArray(name));
        name
    }

    fn delete_vertex_array(&mut self, vertex_array: GlVertexArray) {
        let mut s = self.state();
        s.record(GlCall::DeleteVertexArray(vertex_array));
        s.vertex_arrays.remove(&vertex_array);
        if s.vertex_array == Some(vertex_array) {
            s.vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<GlVertexArray>) {
        let mut s = self.state();
        s.record(GlCall::BindVertexArray(vertex_array));
        s.vertex_array = vertex_array;
    }

    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        stride: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::BindVertexBuffer {
            binding,
            buffer,
            offset,
            stride,
        });
        if s.vertex_array.is_none() {
            s.error(INVALID_OPERATION);
        }
    }

    fn use_program(&mut self, program: Option<GlProgram>) {
        let mut s = self.state();
        s.record(GlCall::UseProgram(program));
        s.program = program;
    }

    fn draw_arrays_instanced_base_instance(
        &mut self,
        mode: GLenum,
        first: u32,
        count: u32,
        instances: u32,
        base_instance: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::DrawArrays {
            mode,
            first,
            count,
            instances,
            base_instance,
        });
        if s.program.is_none() || s.vertex_array.is_none() {
            s.error(INVALID_OPERATION);
        }
    }

    fn draw_elements_instanced_base_vertex_base_instance(
        &mut self,
        mode: GLenum,
        count: u32,
        ty: GLenum,
        offset: u64,
        instances: u32,
        base_vertex: i32,
        base_instance: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::DrawElements {
            mode,
            count,
            ty,
            offset,
            instances,
            base_vertex,
            base_instance,
        });
        if s.program.is_none() || s.vertex_array.is_none() {
            s.error(INVALID_OPERATION);
        }
    }

    fn multi_draw_arrays_indirect(
        &mut self,
        mode: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::MultiDrawArraysIndirect {
            mode,
            offset,
            draw_count,
            stride,
        });
        if s.program.is_none() || !s.buffer_bindings.contains_key(&DRAW_INDIRECT_BUFFER) {
            s.error(INVALID_OPERATION);
        }
    }

    fn multi_draw_elements_indirect(
        &mut self,
        mode: GLenum,
        ty: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        let mut s = self.state();
        s.record(GlCall::MultiDrawElementsIndirect {
            mode,
            ty,
            offset,
            draw_count,
            stride,
        });
        if s.program.is_none() || !s.buffer_bindings.contains_key(&DRAW_INDIRECT_BUFFER) {
            s.error(INVALID_OPERATION);
        }
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        let mut s = self.state();
        s.record(GlCall::DispatchCompute([x, y, z]));
        if s.program.is_none() {
            s.error(INVALID_OPERATION);
        }
    }

    fn dispatch_compute_indirect(&mut self, offset: u64) {
        let mut s = self.state();
        s.record(GlCall::DispatchComputeIndirect(offset));
        if s.program.is_none() || !s.buffer_bindings.contains_key(&DISPATCH_INDIRECT_BUFFER) {
            s.error(INVALID_OPERATION);
        }
    }

    fn memory_barrier(&mut self, bits: GLbitfield) {
        self.state().record(GlCall::MemoryBarrier(bits));
    }

    fn fence_sync(&mut self) -> GlSync {
        let mut s = self.state();
        s.next_sync += 1;
        let sync = GlSync(s.next_sync);
        s.syncs.insert(sync, ());
        s.record(GlCall::FenceSync(sync));
        sync
    }

    fn client_wait_sync(&mut self, sync: GlSync, timeout_ns: u64) -> GLenum {
        let mut s = self.state();
        s.record(GlCall::ClientWaitSync { sync, timeout_ns });
        // Work completes synchronously here, so a live sync is always signaled.
        if s.syncs.contains_key(&sync) {
            ALREADY_SIGNALED
        } else {
            WAIT_FAILED
        }
    }

    fn delete_sync(&mut self, sync: GlSync) {
        let mut s = self.state();
        s.record(GlCall::DeleteSync(sync));
        s.syncs.remove(&sync);
    }

    fn push_debug_group(&mut self, message: &str) {
        self.state().record(GlCall::PushDebugGroup(message.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        self.state().record(GlCall::PopDebugGroup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_storage_round_trips_bytes() {
        let mut gl = RecordingGl::new();
        let buf = gl.create_buffer();
        gl.bind_buffer(COPY_WRITE_BUFFER, Some(buf));
        gl.buffer_storage(COPY_WRITE_BUFFER, 8, DYNAMIC_STORAGE_BIT);
        gl.buffer_sub_data(COPY_WRITE_BUFFER, 2, &[1, 2, 3]);

        let mut out = [0u8; 8];
        gl.get_buffer_sub_data(COPY_WRITE_BUFFER, 0, &mut out);
        assert_eq!(out, [0, 0, 1, 2, 3, 0, 0, 0]);
        assert_eq!(gl.get_error(), NO_ERROR);
    }

    #[test]
    fn out_of_range_buffer_write_raises_invalid_value() {
        let mut gl = RecordingGl::new();
        let buf = gl.create_buffer();
        gl.bind_buffer(COPY_WRITE_BUFFER, Some(buf));
        gl.buffer_storage(COPY_WRITE_BUFFER, 4, 0);
        gl.buffer_sub_data(COPY_WRITE_BUFFER, 2, &[1, 2, 3]);
        assert_eq!(gl.get_error(), INVALID_VALUE);
        assert_eq!(gl.get_error(), NO_ERROR);
    }

    #[test]
    fn texture_array_layer_upload_and_readback() {
        let mut gl = RecordingGl::new();
        let tex = gl.create_texture();
        gl.bind_texture(TEXTURE_2D_ARRAY, Some(tex));
        gl.tex_storage(TEXTURE_2D_ARRAY, 1, RGBA8, 2, 2, 3, 1);

        let layer: Vec<u8> = (0u8..16).collect();
        gl.tex_sub_image(
            TEXTURE_2D_ARRAY,
            0,
            [0, 0, 1],
            [2, 2, 1],
            RGBA,
            UNSIGNED_BYTE,
            PixelSource::Bytes(&layer),
        );
        assert_eq!(gl.texture_slice(tex, 0, 1), Some(layer.clone()));

        let mut out = vec![0u8; 16];
        gl.get_texture_sub_image(
            tex,
            0,
            [0, 0, 1],
            [2, 2, 1],
            RGBA,
            UNSIGNED_BYTE,
            PixelDest::Bytes(&mut out),
        );
        assert_eq!(out, layer);
        assert_eq!(gl.get_error(), NO_ERROR);
    }

    #[test]
    fn draw_without_program_raises_invalid_operation() {
        let mut gl = RecordingGl::new();
        let vao = gl.create_vertex_array();
        gl.bind_vertex_array(Some(vao));
        gl.draw_arrays_instanced_base_instance(TRIANGLES, 0, 3, 1, 0);
        assert_eq!(gl.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn clones_share_the_call_log() {
        let gl = RecordingGl::new();
        let mut other = gl.clone();
        other.line_width(2.0);
        assert_eq!(gl.calls(), vec![GlCall::LineWidth(2.0)]);
    }

    #[test]
    fn transfer_texel_sizes() {
        assert_eq!(transfer_texel_size(RGBA, UNSIGNED_BYTE), Some(4));
        assert_eq!(transfer_texel_size(RG, HALF_FLOAT), Some(4));
        assert_eq!(transfer_texel_size(RGB, FLOAT), Some(12));
        assert_eq!(transfer_texel_size(DEPTH_STENCIL, UNSIGNED_INT_24_8), Some(4));
        assert_eq!(
            transfer_texel_size(DEPTH_STENCIL, FLOAT_32_UNSIGNED_INT_24_8_REV),
            Some(8)
        );
        assert_eq!(transfer_texel_size(0x1234, UNSIGNED_BYTE), None);
    }
}
