//! Render-target emulation: resolving attachments to attach calls, and the cache of target
//! framebuffer objects keyed by the exact attachment set.

use std::collections::HashMap;

use vkgl_format::ImageAspects;
use vkgl_gl::consts::*;
use vkgl_gl::{GlApi, GlFramebuffer, GlTexture};

use crate::error::UnsupportedError;
use crate::resource::{DimensionClass, ImageDesc};
use crate::state::{AttachCall, ContextStateStack};
use crate::stats::ContextStats;

/// Picks the attach entry point for `layer_count` layers from `base_layer` of `level`.
///
/// Single layers attach as one layer (or one cube face); the full layer set attaches layered
/// through the whole-level entry point. Anything in between has no target equivalent.
pub fn attach_call(
    desc: &ImageDesc,
    texture: GlTexture,
    level: u32,
    base_layer: u32,
    layer_count: u32,
) -> Result<AttachCall, UnsupportedError> {
    let class = desc.dimension_class();
    let partial = |total: u32| UnsupportedError::PartialLayerRange {
        base: base_layer,
        count: layer_count,
        total,
    };
    let layered = |total: u32| -> Result<AttachCall, UnsupportedError> {
        if layer_count == 1 && base_layer < total {
            Ok(AttachCall::Layer {
                texture,
                level,
                layer: base_layer,
            })
        } else if base_layer == 0 && layer_count == total {
            Ok(AttachCall::Whole { texture, level })
        } else {
            Err(partial(total))
        }
    };

    match class {
        DimensionClass::D1 => Ok(AttachCall::Whole { texture, level }),
        DimensionClass::D2 | DimensionClass::D2Ms => Ok(AttachCall::Texture2d {
            tex_target: class.texture_target(),
            texture,
            level,
        }),
        DimensionClass::Cube => {
            if layer_count == 1 && base_layer < 6 {
                Ok(AttachCall::Texture2d {
                    tex_target: TEXTURE_CUBE_MAP_POSITIVE_X + base_layer,
                    texture,
                    level,
                })
            } else if base_layer == 0 && layer_count == 6 {
                Ok(AttachCall::Whole { texture, level })
            } else {
                Err(partial(6))
            }
        }
        DimensionClass::D3 => layered(desc.level_extent(level).depth),
        DimensionClass::D1Array
        | DimensionClass::D2Array
        | DimensionClass::CubeArray
        | DimensionClass::D2MsArray => layered(desc.array_layers),
    }
}

/// Attachment point for the aspects of one attachment.
pub fn attachment_point(aspects: ImageAspects, color_index: u32) -> GLenum {
    if aspects.contains(ImageAspects::DEPTH | ImageAspects::STENCIL) {
        DEPTH_STENCIL_ATTACHMENT
    } else if aspects.contains(ImageAspects::DEPTH) {
        DEPTH_ATTACHMENT
    } else if aspects.contains(ImageAspects::STENCIL) {
        STENCIL_ATTACHMENT
    } else {
        COLOR_ATTACHMENT0 + color_index
    }
}

/// One slot of a resolved attachment set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    pub image: u32,
    pub aspects: ImageAspects,
    pub level: u32,
    pub base_layer: u32,
    pub layer_count: u32,
    pub point: GLenum,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FramebufferKey(pub Vec<AttachmentKey>);

impl FramebufferKey {
    pub fn contains_image(&self, image: u32) -> bool {
        self.0.iter().any(|slot| slot.image == image)
    }
}

/// A slot ready to attach.
#[derive(Clone, Debug)]
pub struct ResolvedAttachment {
    pub key: AttachmentKey,
    pub call: AttachCall,
}

/// A counted reference to one cache entry. An entry recreated under the same key gets a new
/// generation, so references to an evicted entry never reach its successor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheRef {
    pub key: FramebufferKey,
    pub generation: u64,
}

#[derive(Debug)]
struct CacheEntry {
    framebuffer: GlFramebuffer,
    generation: u64,
    refs: u32,
    draw_buffers: Vec<GLenum>,
}

#[derive(Debug, Default)]
pub struct FramebufferCache {
    entries: HashMap<FramebufferKey, CacheEntry>,
    next_generation: u64,
}

impl FramebufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, cached: &CacheRef) -> Option<(GlFramebuffer, &[GLenum])> {
        self.entries
            .get(&cached.key)
            .filter(|e| e.generation == cached.generation)
            .map(|e| (e.framebuffer, e.draw_buffers.as_slice()))
    }

    /// Returns the framebuffer for `slots`, creating and attaching it on first use.
    pub fn acquire(
        &mut self,
        gl: &mut dyn GlApi,
        state: &mut ContextStateStack,
        stats: &ContextStats,
        slots: &[ResolvedAttachment],
    ) -> Result<(CacheRef, GlFramebuffer), UnsupportedError> {
        let key = FramebufferKey(slots.iter().map(|s| s.key.clone()).collect());
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.refs += 1;
            stats.inc_framebuffer_cache_hits();
            let generation = entry.generation;
            return Ok((CacheRef { key, generation }, entry.framebuffer));
        }
        stats.inc_framebuffer_cache_misses();

        let framebuffer = gl.create_framebuffer();
        state.bind_framebuffer(gl, DRAW_FRAMEBUFFER, Some(framebuffer));
        for slot in slots {
            state.attach(gl, DRAW_FRAMEBUFFER, slot.key.point, slot.call);
        }
        let mut draw_buffers: Vec<GLenum> = slots
            .iter()
            .map(|s| s.key.point)
            .filter(|&p| (COLOR_ATTACHMENT0..COLOR_ATTACHMENT0 + 32).contains(&p))
            .collect();
        draw_buffers.sort_unstable();
        if draw_buffers.is_empty() {
            draw_buffers.push(NONE);
        }
        state.draw_buffers(gl, &draw_buffers);

        let status = gl.check_framebuffer_status(DRAW_FRAMEBUFFER);
        if status != FRAMEBUFFER_COMPLETE {
            tracing::warn!(status, "attachment set is incomplete");
            gl.delete_framebuffer(framebuffer);
            state.forget_framebuffer(framebuffer);
            return Err(UnsupportedError::IncompleteFramebuffer(status));
        }

        stats.inc_framebuffers_created();
        let generation = self.next_generation;
        self.next_generation += 1;
        tracing::debug!(
            framebuffer = framebuffer.0,
            generation,
            slots = slots.len(),
            "created framebuffer"
        );
        self.entries.insert(
            key.clone(),
            CacheEntry {
                framebuffer,
                generation,
                refs: 1,
                draw_buffers,
            },
        );
        Ok((CacheRef { key, generation }, framebuffer))
    }

    /// Drops one reference; the target framebuffer is deleted with the last one. References
    /// to an evicted entry are ignored.
    pub fn release(
        &mut self,
        gl: &mut dyn GlApi,
        state: &mut ContextStateStack,
        cached: &CacheRef,
    ) {
        let Some(entry) = self.entries.get_mut(&cached.key) else {
            return;
        };
        if entry.generation != cached.generation {
            return;
        }
        entry.refs -= 1;
        if entry.refs == 0 {
            if let Some(entry) = self.entries.remove(&cached.key) {
                gl.delete_framebuffer(entry.framebuffer);
                state.forget_framebuffer(entry.framebuffer);
            }
        }
    }

    /// Deletes every entry that attaches `image`, regardless of references.
    pub fn evict_image(&mut self, gl: &mut dyn GlApi, state: &mut ContextStateStack, image: u32) {
        let stale: Vec<FramebufferKey> = self
            .entries
            .keys()
            .filter(|key| key.contains_image(image))
            .cloned()
            .collect();
        for key in stale {
            if let Some(entry) = self.entries.remove(&key) {
                tracing::debug!(image, framebuffer = entry.framebuffer.0, "evicted framebuffer");
                gl.delete_framebuffer(entry.framebuffer);
                state.forget_framebuffer(entry.framebuffer);
            }
        }
    }

    /// Deletes every entry; used when the device is dropped.
    pub fn clear(&mut self, gl: &mut dyn GlApi) {
        for (_, entry) in self.entries.drain() {
            gl.delete_framebuffer(entry.framebuffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vkgl_format::{Extent3d, Format};
    use vkgl_gl::{GlCall, RecordingGl};

    use crate::resource::ImageType;

    const TEX: GlTexture = GlTexture(9);

    fn desc(ty: ImageType, layers: u32, cube: bool) -> ImageDesc {
        ImageDesc {
            ty,
            array_layers: layers,
            cube_compatible: cube,
            ..ImageDesc::new_2d(Format::R8G8B8A8Unorm, 8, 8)
        }
    }

    #[test]
    fn entry_point_follows_dimension_class() {
        let d2 = desc(ImageType::D2, 1, false);
        assert_eq!(
            attach_call(&d2, TEX, 1, 0, 1),
            Ok(AttachCall::Texture2d {
                tex_target: TEXTURE_2D,
                texture: TEX,
                level: 1
            })
        );

        let cube = desc(ImageType::D2, 6, true);
        assert_eq!(
            attach_call(&cube, TEX, 0, 3, 1),
            Ok(AttachCall::Texture2d {
                tex_target: TEXTURE_CUBE_MAP_POSITIVE_X + 3,
                texture: TEX,
                level: 0
            })
        );
        assert_eq!(
            attach_call(&cube, TEX, 0, 0, 6),
            Ok(AttachCall::Whole {
                texture: TEX,
                level: 0
            })
        );

        let array = desc(ImageType::D2, 4, false);
        assert_eq!(
            attach_call(&array, TEX, 0, 2, 1),
            Ok(AttachCall::Layer {
                texture: TEX,
                level: 0,
                layer: 2
            })
        );
        assert_eq!(
            attach_call(&array, TEX, 0, 1, 2),
            Err(UnsupportedError::PartialLayerRange {
                base: 1,
                count: 2,
                total: 4
            })
        );

        let volume = ImageDesc {
            ty: ImageType::D3,
            extent: Extent3d::new(8, 8, 8),
            ..desc(ImageType::D3, 1, false)
        };
        // Level 1 has four slices.
        assert_eq!(
            attach_call(&volume, TEX, 1, 0, 4),
            Ok(AttachCall::Whole {
                texture: TEX,
                level: 1
            })
        );
        assert!(attach_call(&volume, TEX, 1, 0, 8).is_err());

        let d1 = desc(ImageType::D1, 1, false);
        assert_eq!(
            attach_call(&d1, TEX, 0, 0, 1),
            Ok(AttachCall::Whole {
                texture: TEX,
                level: 0
            })
        );
    }

    fn slot(gl: &mut RecordingGl, image: u32, level: u32) -> ResolvedAttachment {
        let texture = gl.create_texture();
        ResolvedAttachment {
            key: AttachmentKey {
                image,
                aspects: ImageAspects::COLOR,
                level,
                base_layer: 0,
                layer_count: 1,
                point: COLOR_ATTACHMENT0,
            },
            call: AttachCall::Texture2d {
                tex_target: TEXTURE_2D,
                texture,
                level,
            },
        }
    }

    #[test]
    fn identical_tuples_share_one_framebuffer() {
        let stats = Arc::new(ContextStats::new());
        let mut state = ContextStateStack::new(stats.clone());
        let mut gl = RecordingGl::new();
        let rec = gl.clone();
        let mut cache = FramebufferCache::new();
        let slots = [slot(&mut gl, 1, 0)];

        let (ref_a, fb_a) = cache.acquire(&mut gl, &mut state, &stats, &slots).unwrap();
        rec.clear_calls();
        let (ref_b, fb_b) = cache.acquire(&mut gl, &mut state, &stats, &slots).unwrap();

        assert_eq!(fb_a, fb_b);
        assert_eq!(ref_a, ref_b);
        assert!(rec.calls().is_empty());
        let snap = stats.snapshot();
        assert_eq!(snap.framebuffer_cache_hits, 1);
        assert_eq!(snap.framebuffers_created, 1);

        cache.release(&mut gl, &mut state, &ref_a);
        assert_eq!(cache.len(), 1);
        cache.release(&mut gl, &mut state, &ref_b);
        assert!(cache.is_empty());
        assert!(rec.calls().contains(&GlCall::DeleteFramebuffer(fb_a)));
    }

    #[test]
    fn eviction_removes_every_entry_with_the_image() {
        let stats = Arc::new(ContextStats::new());
        let mut state = ContextStateStack::new(stats.clone());
        let mut gl = RecordingGl::new();
        let mut cache = FramebufferCache::new();

        let level0 = [slot(&mut gl, 1, 0)];
        let level1 = [slot(&mut gl, 1, 1)];
        let other = [slot(&mut gl, 2, 0)];
        let (_, fb0) = cache.acquire(&mut gl, &mut state, &stats, &level0).unwrap();
        let (_, fb1) = cache.acquire(&mut gl, &mut state, &stats, &level1).unwrap();
        cache.acquire(&mut gl, &mut state, &stats, &other).unwrap();
        assert_ne!(fb0, fb1);

        cache.evict_image(&mut gl, &mut state, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(gl.live_framebuffers(), 1);
    }

    #[test]
    fn evicted_references_do_not_reach_a_recreated_entry() {
        let stats = Arc::new(ContextStats::new());
        let mut state = ContextStateStack::new(stats.clone());
        let mut gl = RecordingGl::new();
        let mut cache = FramebufferCache::new();
        let slots = [slot(&mut gl, 1, 0)];

        let (old, _) = cache.acquire(&mut gl, &mut state, &stats, &slots).unwrap();
        cache.evict_image(&mut gl, &mut state, 1);
        let (new, fb) = cache.acquire(&mut gl, &mut state, &stats, &slots).unwrap();
        assert_eq!(old.key, new.key);
        assert_ne!(old.generation, new.generation);
        assert!(cache.lookup(&old).is_none());

        cache.release(&mut gl, &mut state, &old);
        assert_eq!(cache.lookup(&new).map(|(f, _)| f), Some(fb));
        assert_eq!(gl.live_framebuffers(), 1);
    }
}
