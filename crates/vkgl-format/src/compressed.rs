//! Per-family block tables for the block-compressed format ranges.

use vkgl_gl::consts::*;

use crate::{tf, TargetFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub width: u32,
    pub height: u32,
    pub bytes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionFamily {
    Bc,
    Etc2Eac,
    Astc,
}

const BC_FIRST: u32 = 131;
const ETC_FIRST: u32 = 147;
const ASTC_FIRST: u32 = 157;

/// Indexed by `value - BC_FIRST`.
const BC_TABLE: [(u32, GLenum); 16] = [
    (8, COMPRESSED_RGB_S3TC_DXT1_EXT),
    (8, COMPRESSED_SRGB_S3TC_DXT1_EXT),
    (8, COMPRESSED_RGBA_S3TC_DXT1_EXT),
    (8, COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT),
    (16, COMPRESSED_RGBA_S3TC_DXT3_EXT),
    (16, COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT),
    (16, COMPRESSED_RGBA_S3TC_DXT5_EXT),
    (16, COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT),
    (8, COMPRESSED_RED_RGTC1),
    (8, COMPRESSED_SIGNED_RED_RGTC1),
    (16, COMPRESSED_RG_RGTC2),
    (16, COMPRESSED_SIGNED_RG_RGTC2),
    (16, COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT),
    (16, COMPRESSED_RGB_BPTC_SIGNED_FLOAT),
    (16, COMPRESSED_RGBA_BPTC_UNORM),
    (16, COMPRESSED_SRGB_ALPHA_BPTC_UNORM),
];

/// Indexed by `value - ETC_FIRST`.
const ETC_TABLE: [(u32, GLenum); 10] = [
    (8, COMPRESSED_RGB8_ETC2),
    (8, COMPRESSED_SRGB8_ETC2),
    (8, COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2),
    (8, COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2),
    (16, COMPRESSED_RGBA8_ETC2_EAC),
    (16, COMPRESSED_SRGB8_ALPHA8_ETC2_EAC),
    (8, COMPRESSED_R11_EAC),
    (8, COMPRESSED_SIGNED_R11_EAC),
    (16, COMPRESSED_RG11_EAC),
    (16, COMPRESSED_SIGNED_RG11_EAC),
];

/// ASTC footprints; each appears as a unorm/srgb pair in the wire numbering and as one entry
/// in each of the two target enumerant runs.
const ASTC_FOOTPRINTS: [(u32, u32); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (8, 8),
    (10, 5),
    (10, 6),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

impl CompressionFamily {
    /// `value` must lie in this family's range.
    pub(crate) fn block(self, value: u32) -> BlockInfo {
        match self {
            CompressionFamily::Bc => BlockInfo {
                width: 4,
                height: 4,
                bytes: BC_TABLE[(value - BC_FIRST) as usize].0,
            },
            CompressionFamily::Etc2Eac => BlockInfo {
                width: 4,
                height: 4,
                bytes: ETC_TABLE[(value - ETC_FIRST) as usize].0,
            },
            CompressionFamily::Astc => {
                let (width, height) = ASTC_FOOTPRINTS[((value - ASTC_FIRST) / 2) as usize];
                BlockInfo {
                    width,
                    height,
                    bytes: 16,
                }
            }
        }
    }

    pub(crate) fn target(self, value: u32) -> TargetFormat {
        let internal = match self {
            CompressionFamily::Bc => BC_TABLE[(value - BC_FIRST) as usize].1,
            CompressionFamily::Etc2Eac => ETC_TABLE[(value - ETC_FIRST) as usize].1,
            CompressionFamily::Astc => {
                let idx = value - ASTC_FIRST;
                let base = if idx % 2 == 0 {
                    COMPRESSED_RGBA_ASTC_4X4
                } else {
                    COMPRESSED_SRGB8_ALPHA8_ASTC_4X4
                };
                base + idx / 2
            }
        };
        tf(internal, 0, 0)
    }
}
