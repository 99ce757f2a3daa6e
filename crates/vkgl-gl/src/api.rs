//! The downward boundary: the fixed set of immediate-mode entry points the translation core
//! drives.
//!
//! Object names are plain non-zero integers owned by the driver. Everything is bind-to-edit
//! except the two texture readback entry points, which take the texture directly.

use crate::consts::{GLbitfield, GLenum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlBuffer(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlTexture(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlFramebuffer(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlVertexArray(pub u32);

/// A linked program produced by the external shader layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlProgram(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlSync(pub u64);

/// Where pixel data for an upload comes from.
#[derive(Clone, Copy, Debug)]
pub enum PixelSource<'a> {
    Bytes(&'a [u8]),
    /// Byte offset into the buffer bound to `PIXEL_UNPACK_BUFFER`.
    UnpackBuffer { offset: u64 },
}

/// Where pixel data for a readback goes.
#[derive(Debug)]
pub enum PixelDest<'a> {
    Bytes(&'a mut [u8]),
    /// Byte offset into the buffer bound to `PIXEL_PACK_BUFFER`.
    PackBuffer { offset: u64, size: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `[x0, y0, x1, y1]` as the blit entry point expects.
    pub const fn corners(self) -> [i32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

pub trait GlApi {
    fn get_error(&mut self) -> GLenum;
    fn flush(&mut self);
    fn finish(&mut self);

    fn create_buffer(&mut self) -> GlBuffer;
    fn delete_buffer(&mut self, buffer: GlBuffer);
    fn bind_buffer(&mut self, target: GLenum, buffer: Option<GlBuffer>);
    fn bind_buffer_range(
        &mut self,
        target: GLenum,
        index: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        size: u64,
    );
    fn buffer_storage(&mut self, target: GLenum, size: u64, flags: GLbitfield);
    fn buffer_sub_data(&mut self, target: GLenum, offset: u64, data: &[u8]);
    fn get_buffer_sub_data(&mut self, target: GLenum, offset: u64, out: &mut [u8]);
    fn copy_buffer_sub_data(
        &mut self,
        read_target: GLenum,
        write_target: GLenum,
        read_offset: u64,
        write_offset: u64,
        size: u64,
    );
    /// Fills `[offset, offset + size)` with a repeated 32-bit word.
    fn clear_buffer_sub_data(&mut self, target: GLenum, offset: u64, size: u64, word: u32);

    fn create_texture(&mut self) -> GlTexture;
    fn delete_texture(&mut self, texture: GlTexture);
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: GLenum, texture: Option<GlTexture>);
    /// Immutable storage. `depth` carries array layers for array targets; `samples` is only
    /// meaningful for multisample targets.
    #[allow(clippy::too_many_arguments)]
    fn tex_storage(
        &mut self,
        target: GLenum,
        levels: u32,
        internal_format: GLenum,
        width: u32,
        height: u32,
        depth: u32,
        samples: u32,
    );
    fn pixel_store(&mut self, pname: GLenum, value: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image(
        &mut self,
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
        src: PixelSource<'_>,
    );
    fn compressed_tex_sub_image(
        &mut self,
        target: GLenum,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        internal_format: GLenum,
        src: PixelSource<'_>,
    );
    #[allow(clippy::too_many_arguments)]
    fn get_texture_sub_image(
        &mut self,
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        format: GLenum,
        ty: GLenum,
        dst: PixelDest<'_>,
    );
    fn get_compressed_texture_sub_image(
        &mut self,
        texture: GlTexture,
        level: u32,
        offset: [u32; 3],
        extent: [u32; 3],
        dst: PixelDest<'_>,
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_image_sub_data(
        &mut self,
        src: GlTexture,
        src_target: GLenum,
        src_level: u32,
        src_offset: [u32; 3],
        dst: GlTexture,
        dst_target: GLenum,
        dst_level: u32,
        dst_offset: [u32; 3],
        extent: [u32; 3],
    );

    fn create_framebuffer(&mut self) -> GlFramebuffer;
    fn delete_framebuffer(&mut self, framebuffer: GlFramebuffer);
    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: Option<GlFramebuffer>);
    /// Whole texture level; layered when the texture has layers.
    fn framebuffer_texture(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    );
    fn framebuffer_texture_2d(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: Option<GlTexture>,
        level: u32,
    );
    fn framebuffer_texture_layer(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: Option<GlTexture>,
        level: u32,
        layer: u32,
    );
    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum;
    fn draw_buffers(&mut self, buffers: &[GLenum]);
    fn read_buffer(&mut self, buffer: GLenum);
    fn invalidate_framebuffer(&mut self, target: GLenum, attachments: &[GLenum]);
    fn blit_framebuffer(&mut self, src: Rect, dst: Rect, mask: GLbitfield, filter: GLenum);
    fn clear_buffer_fv(&mut self, buffer: GLenum, draw_buffer: i32, value: [f32; 4]);
    fn clear_buffer_iv(&mut self, buffer: GLenum, draw_buffer: i32, value: [i32; 4]);
    fn clear_buffer_uiv(&mut self, buffer: GLenum, draw_buffer: i32, value: [u32; 4]);
    fn clear_buffer_fi(&mut self, depth: f32, stencil: i32);

    fn enable(&mut self, cap: GLenum);
    fn disable(&mut self, cap: GLenum);
    fn viewport_indexed(&mut self, index: u32, x: f32, y: f32, width: f32, height: f32);
    fn depth_range_indexed(&mut self, index: u32, near: f64, far: f64);
    fn scissor_indexed(&mut self, index: u32, rect: Rect);
    fn color_mask(&mut self, index: u32, mask: [bool; 4]);
    fn depth_mask(&mut self, enabled: bool);
    fn stencil_mask(&mut self, mask: u32);
    fn line_width(&mut self, width: f32);
    fn polygon_offset_clamp(&mut self, factor: f32, units: f32, clamp: f32);
    fn blend_color(&mut self, color: [f32; 4]);

    fn create_vertex_array(&mut self) -> GlVertexArray;
    fn delete_vertex_array(&mut self, vertex_array: GlVertexArray);
    fn bind_vertex_array(&mut self, vertex_array: Option<GlVertexArray>);
    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        stride: u32,
    );
    fn use_program(&mut self, program: Option<GlProgram>);
    fn draw_arrays_instanced_base_instance(
        &mut self,
        mode: GLenum,
        first: u32,
        count: u32,
        instances: u32,
        base_instance: u32,
    );
    #[allow(clippy::too_many_arguments)]
    fn draw_elements_instanced_base_vertex_base_instance(
        &mut self,
        mode: GLenum,
        count: u32,
        ty: GLenum,
        offset: u64,
        instances: u32,
        base_vertex: i32,
        base_instance: u32,
    );
    fn multi_draw_arrays_indirect(
        &mut self,
        mode: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );
    fn multi_draw_elements_indirect(
        &mut self,
        mode: GLenum,
        ty: GLenum,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32);
    fn dispatch_compute_indirect(&mut self, offset: u64);
    fn memory_barrier(&mut self, bits: GLbitfield);

    fn fence_sync(&mut self) -> GlSync;
    fn client_wait_sync(&mut self, sync: GlSync, timeout_ns: u64) -> GLenum;
    fn delete_sync(&mut self, sync: GlSync);

    fn push_debug_group(&mut self, message: &str);
    fn pop_debug_group(&mut self);
}
