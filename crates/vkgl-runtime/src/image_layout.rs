//! Linear host layout of image subresources within a binding.
//!
//! Subresources are stored layer-major: every level of layer 0, then every level of layer 1,
//! and so on. Each subresource is tightly packed at its level extent; 3D levels carry their
//! full depth.

use std::ops::Range;

use vkgl_format::{get_size, Extent3d};

use crate::resource::{ImageDesc, ImageType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subresource {
    pub level: u32,
    pub layer: u32,
    /// Byte offset from the start of the binding.
    pub offset: u64,
    pub size: u64,
    pub extent: Extent3d,
}

impl Subresource {
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.size
    }
}

pub fn subresources(desc: &ImageDesc) -> Vec<Subresource> {
    let layers = match desc.ty {
        ImageType::D3 => 1,
        _ => desc.array_layers,
    };
    let mut out = Vec::with_capacity((layers * desc.mip_levels) as usize);
    let mut offset = 0;
    for layer in 0..layers {
        for level in 0..desc.mip_levels {
            let extent = desc.level_extent(level);
            let size = get_size(extent, desc.format);
            out.push(Subresource {
                level,
                layer,
                offset,
                size,
                extent,
            });
            offset += size;
        }
    }
    out
}

/// Total bytes of every subresource.
pub fn image_size(desc: &ImageDesc) -> u64 {
    subresources(desc).iter().map(|s| s.size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vkgl_format::Format;

    #[test]
    fn layers_are_outermost() {
        let desc = ImageDesc {
            mip_levels: 2,
            array_layers: 2,
            ..ImageDesc::new_2d(Format::R8G8B8A8Unorm, 4, 4)
        };
        let subs: Vec<_> = subresources(&desc)
            .iter()
            .map(|s| (s.layer, s.level, s.offset, s.size))
            .collect();
        assert_eq!(
            subs,
            vec![(0, 0, 0, 64), (0, 1, 64, 16), (1, 0, 80, 64), (1, 1, 144, 16)]
        );
        assert_eq!(image_size(&desc), 160);
    }

    #[test]
    fn volume_levels_keep_their_depth() {
        let desc = ImageDesc {
            ty: ImageType::D3,
            extent: Extent3d::new(4, 4, 4),
            mip_levels: 2,
            ..ImageDesc::new_2d(Format::R8Unorm, 4, 4)
        };
        let sizes: Vec<_> = subresources(&desc).iter().map(|s| s.size).collect();
        assert_eq!(sizes, vec![64, 8]);
    }

    #[test]
    fn compressed_levels_round_up_to_blocks() {
        let desc = ImageDesc {
            mip_levels: 3,
            ..ImageDesc::new_2d(Format::BC1RgbaUnorm, 8, 8)
        };
        let sizes: Vec<_> = subresources(&desc).iter().map(|s| s.size).collect();
        // 2x2 blocks, then 1x1, then a 2x2 level still occupies one block.
        assert_eq!(sizes, vec![32, 8, 8]);
    }
}
