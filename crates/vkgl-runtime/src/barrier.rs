//! Pipeline barriers, reduced to the target's memory-barrier bits.
//!
//! The target orders everything except incoherent shader writes, so a barrier only produces
//! bits when its source access includes a shader or generic memory write. Stage masks are
//! carried through the instruction for tracing but do not affect the bits.

use bitflags::bitflags;
use vkgl_gl::consts::*;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PipelineStageFlags: u32 {
        const TOP_OF_PIPE = 0x0000_0001;
        const DRAW_INDIRECT = 0x0000_0002;
        const VERTEX_INPUT = 0x0000_0004;
        const VERTEX_SHADER = 0x0000_0008;
        const TESSELLATION_CONTROL_SHADER = 0x0000_0010;
        const TESSELLATION_EVALUATION_SHADER = 0x0000_0020;
        const GEOMETRY_SHADER = 0x0000_0040;
        const FRAGMENT_SHADER = 0x0000_0080;
        const EARLY_FRAGMENT_TESTS = 0x0000_0100;
        const LATE_FRAGMENT_TESTS = 0x0000_0200;
        const COLOR_ATTACHMENT_OUTPUT = 0x0000_0400;
        const COMPUTE_SHADER = 0x0000_0800;
        const TRANSFER = 0x0000_1000;
        const BOTTOM_OF_PIPE = 0x0000_2000;
        const HOST = 0x0000_4000;
        const ALL_GRAPHICS = 0x0000_8000;
        const ALL_COMMANDS = 0x0001_0000;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 0x0000_0001;
        const INDEX_READ = 0x0000_0002;
        const VERTEX_ATTRIBUTE_READ = 0x0000_0004;
        const UNIFORM_READ = 0x0000_0008;
        const INPUT_ATTACHMENT_READ = 0x0000_0010;
        const SHADER_READ = 0x0000_0020;
        const SHADER_WRITE = 0x0000_0040;
        const COLOR_ATTACHMENT_READ = 0x0000_0080;
        const COLOR_ATTACHMENT_WRITE = 0x0000_0100;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x0000_0200;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x0000_0400;
        const TRANSFER_READ = 0x0000_0800;
        const TRANSFER_WRITE = 0x0000_1000;
        const HOST_READ = 0x0000_2000;
        const HOST_WRITE = 0x0000_4000;
        const MEMORY_READ = 0x0000_8000;
        const MEMORY_WRITE = 0x0001_0000;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryBarrier {
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

impl MemoryBarrier {
    pub fn new(src_access: AccessFlags, dst_access: AccessFlags) -> Self {
        Self {
            src_access,
            dst_access,
        }
    }

    /// Target barrier bits this barrier needs; zero when nothing has to be waited for.
    pub fn gl_bits(&self) -> GLbitfield {
        if !self
            .src_access
            .intersects(AccessFlags::SHADER_WRITE | AccessFlags::MEMORY_WRITE)
        {
            return 0;
        }
        let dst = self.dst_access;
        if dst.intersects(AccessFlags::MEMORY_READ | AccessFlags::MEMORY_WRITE) {
            return ALL_BARRIER_BITS;
        }
        let mut bits = 0;
        if dst.contains(AccessFlags::INDIRECT_COMMAND_READ) {
            bits |= COMMAND_BARRIER_BIT;
        }
        if dst.contains(AccessFlags::INDEX_READ) {
            bits |= ELEMENT_ARRAY_BARRIER_BIT;
        }
        if dst.contains(AccessFlags::VERTEX_ATTRIBUTE_READ) {
            bits |= VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
        }
        if dst.contains(AccessFlags::UNIFORM_READ) {
            bits |= UNIFORM_BARRIER_BIT;
        }
        if dst.contains(AccessFlags::SHADER_READ) {
            bits |= TEXTURE_FETCH_BARRIER_BIT
                | SHADER_IMAGE_ACCESS_BARRIER_BIT
                | SHADER_STORAGE_BARRIER_BIT;
        }
        if dst.contains(AccessFlags::SHADER_WRITE) {
            bits |= SHADER_IMAGE_ACCESS_BARRIER_BIT | SHADER_STORAGE_BARRIER_BIT;
        }
        if dst.intersects(
            AccessFlags::INPUT_ATTACHMENT_READ
                | AccessFlags::COLOR_ATTACHMENT_READ
                | AccessFlags::COLOR_ATTACHMENT_WRITE
                | AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ) {
            bits |= FRAMEBUFFER_BARRIER_BIT;
        }
        if dst.intersects(AccessFlags::TRANSFER_READ | AccessFlags::TRANSFER_WRITE) {
            bits |=
                TEXTURE_UPDATE_BARRIER_BIT | BUFFER_UPDATE_BARRIER_BIT | PIXEL_BUFFER_BARRIER_BIT;
        }
        if dst.intersects(AccessFlags::HOST_READ | AccessFlags::HOST_WRITE) {
            bits |= CLIENT_MAPPED_BUFFER_BARRIER_BIT;
        }
        bits
    }
}
