//! Moves bytes between an allocation's host block and the target objects bound into it.
//!
//! Every transfer goes through the state stack: buffers are edited through the copy bind
//! points, textures on the configured transfer unit with pixel-buffer bindings cleared and
//! pixel-store parameters set for tightly packed rows.

use std::ops::Range;

use vkgl_format::Format;
use vkgl_gl::consts::*;
use vkgl_gl::{GlApi, GlBuffer, GlTexture, PixelDest, PixelSource};

use crate::context::Context;
use crate::error::Result;
use crate::image_layout::{subresources, Subresource};
use crate::memory::{intersect, BoundResource};
use crate::resource::{DimensionClass, ImageDesc};
use crate::state::ContextStateStack;

/// Addressing of one subresource region on the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TextureRegion {
    /// Bind target for uploads; a face target for cube maps.
    pub upload_target: GLenum,
    pub upload_offset: [u32; 3],
    /// Offset for the readback entry points, which address cube faces through z.
    pub read_offset: [u32; 3],
    pub extent: [u32; 3],
}

/// Places `layer` of a region according to how the dimension class stores layers.
pub(crate) fn texture_region(
    class: DimensionClass,
    layer: u32,
    offset: [u32; 3],
    extent: [u32; 3],
) -> TextureRegion {
    let target = class.texture_target();
    let (upload_target, upload_offset, read_offset, extent) = match class {
        DimensionClass::D1 => (target, [offset[0], 0, 0], [offset[0], 0, 0], [extent[0], 1, 1]),
        DimensionClass::D1Array => {
            let o = [offset[0], layer, 0];
            (target, o, o, [extent[0], 1, 1])
        }
        DimensionClass::Cube => (
            TEXTURE_CUBE_MAP_POSITIVE_X + layer,
            [offset[0], offset[1], 0],
            [offset[0], offset[1], layer],
            [extent[0], extent[1], 1],
        ),
        DimensionClass::D3 => (target, offset, offset, extent),
        class if class.layers_in_z() => {
            let o = [offset[0], offset[1], layer];
            (target, o, o, [extent[0], extent[1], 1])
        }
        _ => {
            let o = [offset[0], offset[1], 0];
            (target, o, o, [extent[0], extent[1], 1])
        }
    };
    TextureRegion {
        upload_target,
        upload_offset,
        read_offset,
        extent,
    }
}

/// Sets pixel-store parameters for tightly packed host rows and unbinds the pixel buffer.
fn tight_pixel_store(gl: &mut dyn GlApi, state: &mut ContextStateStack, unpack: bool) {
    if unpack {
        state.bind_buffer(gl, PIXEL_UNPACK_BUFFER, None);
        state.pixel_store(gl, UNPACK_ROW_LENGTH, 0);
        state.pixel_store(gl, UNPACK_IMAGE_HEIGHT, 0);
        state.pixel_store(gl, UNPACK_ALIGNMENT, 1);
    } else {
        state.bind_buffer(gl, PIXEL_PACK_BUFFER, None);
        state.pixel_store(gl, PACK_ROW_LENGTH, 0);
        state.pixel_store(gl, PACK_IMAGE_HEIGHT, 0);
        state.pixel_store(gl, PACK_ALIGNMENT, 1);
    }
}

pub(crate) fn upload_buffer(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    buffer: GlBuffer,
    offset: u64,
    bytes: &[u8],
) {
    state.bind_buffer(gl, COPY_WRITE_BUFFER, Some(buffer));
    gl.buffer_sub_data(COPY_WRITE_BUFFER, offset, bytes);
}

pub(crate) fn download_buffer(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    buffer: GlBuffer,
    offset: u64,
    out: &mut [u8],
) {
    state.bind_buffer(gl, COPY_READ_BUFFER, Some(buffer));
    gl.get_buffer_sub_data(COPY_READ_BUFFER, offset, out);
}

/// Block rows of `sub` touched by the subresource-relative byte range `part`, per depth slice.
pub(crate) fn covered_rows(
    format: Format,
    sub: &Subresource,
    part: &Range<u64>,
) -> Vec<(u32, Range<u32>)> {
    let row_bytes = vkgl_format::row_pitch(sub.extent.width, format);
    let rows_per_slice = u64::from(sub.extent.height.div_ceil(format.block().height));
    if row_bytes == 0 || rows_per_slice == 0 || part.is_empty() {
        return Vec::new();
    }
    let first = part.start / row_bytes;
    let last = part.end.div_ceil(row_bytes);
    (first / rows_per_slice..last.div_ceil(rows_per_slice))
        .map(|z| {
            let base = z * rows_per_slice;
            let start = first.max(base) - base;
            let end = last.min(base + rows_per_slice) - base;
            (z as u32, start as u32..end as u32)
        })
        .collect()
}

/// Uploads tightly packed texels into `[offset, offset + extent)` of one subresource.
#[allow(clippy::too_many_arguments)]
fn upload_texels(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    unit: u32,
    desc: &ImageDesc,
    texture: GlTexture,
    sub: &Subresource,
    offset: [u32; 3],
    extent: [u32; 3],
    bytes: &[u8],
) -> Result<()> {
    let class = desc.dimension_class();
    let target = desc.format.target()?;
    let region = texture_region(class, sub.layer, offset, extent);

    tight_pixel_store(gl, state, true);
    state.bind_texture(gl, unit, class.texture_target(), Some(texture));
    if desc.format.is_compressed() {
        gl.compressed_tex_sub_image(
            region.upload_target,
            sub.level,
            region.upload_offset,
            region.extent,
            target.internal_format,
            PixelSource::Bytes(bytes),
        );
    } else {
        gl.tex_sub_image(
            region.upload_target,
            sub.level,
            region.upload_offset,
            region.extent,
            target.format,
            target.ty,
            PixelSource::Bytes(bytes),
        );
    }
    Ok(())
}

/// Uploads one whole subresource from tightly packed host bytes.
pub(crate) fn upload_subresource(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    unit: u32,
    desc: &ImageDesc,
    texture: GlTexture,
    sub: &Subresource,
    bytes: &[u8],
) -> Result<()> {
    let extent = [sub.extent.width, sub.extent.height, sub.extent.depth];
    upload_texels(gl, state, unit, desc, texture, sub, [0; 3], extent, bytes)
}

/// Uploads the block rows of `sub` that `part` touches. `bytes` is the whole subresource.
#[allow(clippy::too_many_arguments)]
fn upload_rows(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    unit: u32,
    desc: &ImageDesc,
    texture: GlTexture,
    sub: &Subresource,
    part: &Range<u64>,
    bytes: &[u8],
) -> Result<u64> {
    let block_height = desc.format.block().height;
    let row_bytes = vkgl_format::row_pitch(sub.extent.width, desc.format);
    let rows_per_slice = sub.extent.height.div_ceil(block_height);
    let mut uploaded = 0;
    for (z, rows) in covered_rows(desc.format, sub, part) {
        let y = rows.start * block_height;
        let height = (rows.end * block_height).min(sub.extent.height) - y;
        let first_row = u64::from(z * rows_per_slice + rows.start);
        let start = first_row * row_bytes;
        let end = start + u64::from(rows.end - rows.start) * row_bytes;
        let texels = &bytes[slice(&(start..end))];
        upload_texels(
            gl,
            state,
            unit,
            desc,
            texture,
            sub,
            [0, y, z],
            [sub.extent.width, height, 1],
            texels,
        )?;
        uploaded += end - start;
    }
    Ok(uploaded)
}

/// Reads one whole subresource back into tightly packed host bytes.
pub(crate) fn download_subresource(
    gl: &mut dyn GlApi,
    state: &mut ContextStateStack,
    desc: &ImageDesc,
    texture: GlTexture,
    sub: &Subresource,
    out: &mut [u8],
) -> Result<()> {
    let target = desc.format.target()?;
    let extent = [sub.extent.width, sub.extent.height, sub.extent.depth];
    let region = texture_region(desc.dimension_class(), sub.layer, [0; 3], extent);

    tight_pixel_store(gl, state, false);
    if desc.format.is_compressed() {
        gl.get_compressed_texture_sub_image(
            texture,
            sub.level,
            region.read_offset,
            region.extent,
            PixelDest::Bytes(out),
        );
    } else {
        gl.get_texture_sub_image(
            texture,
            sub.level,
            region.read_offset,
            region.extent,
            target.format,
            target.ty,
            PixelDest::Bytes(out),
        );
    }
    Ok(())
}

fn slice(range: &Range<u64>) -> Range<usize> {
    range.start as usize..range.end as usize
}

impl Context {
    /// Uploads the part of binding `slot` that intersects `range` (allocation-relative).
    ///
    /// Images are transferred in whole block rows: a subresource covered completely goes up
    /// in one call, otherwise each depth slice's touched rows go up separately.
    pub(crate) fn upload_binding(
        &mut self,
        allocation: u32,
        slot: u32,
        range: &Range<u64>,
    ) -> Result<()> {
        let unit = self.config.transfer_texture_unit;
        let Context {
            gl,
            state,
            stats,
            allocations,
            buffers,
            images,
            ..
        } = self;
        let gl = &mut **gl;
        let alloc = allocations
            .get(&allocation)
            .ok_or(crate::error::ValidationError::UnknownHandle {
                kind: crate::resource::Allocation::KIND,
                id: allocation,
            })?;
        let Some(binding) = alloc.bindings.get(&slot) else {
            return Ok(());
        };
        let Some(hit) = intersect(&binding.range, range) else {
            return Ok(());
        };
        match binding.resource {
            BoundResource::Buffer(id) => {
                let Some(buffer) = buffers.get(&id).and_then(|e| e.gl) else {
                    return Ok(());
                };
                let bytes = &alloc.storage[slice(&hit)];
                upload_buffer(gl, state, buffer, hit.start - binding.range.start, bytes);
                stats.add_bytes_uploaded(bytes.len() as u64);
            }
            BoundResource::Image(id) => {
                let Some(entry) = images.get(&id) else {
                    return Ok(());
                };
                let Some(texture) = entry.gl else {
                    return Ok(());
                };
                let desc = entry.handle.desc();
                if desc.dimension_class().is_multisample() {
                    return Ok(());
                }
                let base = binding.range.start;
                for sub in subresources(desc) {
                    let abs = base + sub.offset..base + sub.offset + sub.size;
                    let Some(part) = intersect(&abs, &hit) else {
                        continue;
                    };
                    let bytes = &alloc.storage[slice(&abs)];
                    if part == abs {
                        upload_subresource(gl, state, unit, desc, texture, &sub, bytes)?;
                        stats.add_bytes_uploaded(sub.size);
                    } else {
                        let part = part.start - abs.start..part.end - abs.start;
                        let uploaded =
                            upload_rows(gl, state, unit, desc, texture, &sub, &part, bytes)?;
                        stats.add_bytes_uploaded(uploaded);
                    }
                }
            }
        }
        Ok(())
    }

    /// Copies the part of binding `slot` that intersects `range` back into the host block.
    /// Bytes outside `range` are left untouched.
    pub(crate) fn download_binding(
        &mut self,
        allocation: u32,
        slot: u32,
        range: &Range<u64>,
    ) -> Result<()> {
        let Context {
            gl,
            state,
            stats,
            allocations,
            buffers,
            images,
            ..
        } = self;
        let gl = &mut **gl;
        let Some(alloc) = allocations.get_mut(&allocation) else {
            return Ok(());
        };
        let Some(binding) = alloc.bindings.get(&slot).cloned() else {
            return Ok(());
        };
        let Some(hit) = intersect(&binding.range, range) else {
            return Ok(());
        };
        match binding.resource {
            BoundResource::Buffer(id) => {
                let Some(buffer) = buffers.get(&id).and_then(|e| e.gl) else {
                    return Ok(());
                };
                let out = &mut alloc.storage[slice(&hit)];
                download_buffer(gl, state, buffer, hit.start - binding.range.start, out);
                stats.add_bytes_downloaded(out.len() as u64);
            }
            BoundResource::Image(id) => {
                let Some(entry) = images.get(&id) else {
                    return Ok(());
                };
                let Some(texture) = entry.gl else {
                    return Ok(());
                };
                let desc = entry.handle.desc();
                if desc.dimension_class().is_multisample() {
                    return Ok(());
                }
                let base = binding.range.start;
                for sub in subresources(desc) {
                    let abs = base + sub.offset..base + sub.offset + sub.size;
                    let Some(part) = intersect(&abs, &hit) else {
                        continue;
                    };
                    let mut scratch = vec![0u8; sub.size as usize];
                    download_subresource(gl, state, desc, texture, &sub, &mut scratch)?;
                    let from = slice(&(part.start - abs.start..part.end - abs.start));
                    alloc.storage[slice(&part)].copy_from_slice(&scratch[from]);
                    stats.add_bytes_downloaded(part.end - part.start);
                }
            }
        }
        Ok(())
    }

    /// Uploads `range` to every binding it intersects.
    pub(crate) fn flush_allocation_range(
        &mut self,
        allocation: u32,
        range: &Range<u64>,
    ) -> Result<()> {
        let hits = self.allocation(allocation)?.intersecting(range);
        for (slot, resource, part) in hits {
            tracing::trace!(allocation, kind = resource.kind(), id = resource.id(), ?part, "flush");
            self.upload_binding(allocation, slot, &part)?;
        }
        self.allocation_mut(allocation)?.clear_dirty(range);
        Ok(())
    }

    /// Reads `range` back from every binding it intersects. Bindings later in slot order win
    /// where aliased bindings overlap.
    pub(crate) fn invalidate_allocation_range(
        &mut self,
        allocation: u32,
        range: &Range<u64>,
    ) -> Result<()> {
        let hits = self.allocation(allocation)?.intersecting(range);
        for (slot, _, part) in hits {
            self.download_binding(allocation, slot, &part)?;
        }
        Ok(())
    }

    /// Flushes each outstanding dirty range of `allocation` separately.
    pub(crate) fn flush_dirty(&mut self, allocation: u32) -> Result<()> {
        let dirty = self.allocation(allocation)?.dirty.clone();
        for range in &dirty {
            self.flush_allocation_range(allocation, range)?;
        }
        Ok(())
    }

    /// Flushes the dirty ranges of every coherent allocation.
    pub(crate) fn flush_coherent(&mut self) -> Result<()> {
        let mut pending: Vec<u32> = self
            .allocations
            .values()
            .filter(|a| a.is_coherent() && !a.dirty.is_empty())
            .map(|a| a.id)
            .collect();
        pending.sort_unstable();
        for id in pending {
            self.flush_dirty(id)?;
        }
        Ok(())
    }
}

/// Bytes of one tightly packed region of `format`.
pub(crate) fn region_size(format: Format, extent: [u32; 3]) -> u64 {
    vkgl_format::get_size(
        vkgl_format::Extent3d::new(extent[0], extent[1], extent[2]),
        format,
    )
}
