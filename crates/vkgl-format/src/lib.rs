//! Wire pixel formats and their translation to target storage formats.
//!
//! Format values follow the wire protocol numbering. Each family occupies a contiguous run of
//! values, so classification is a range check rather than a lookup.

use std::ops::RangeInclusive;

use bitflags::bitflags;
use vkgl_gl::consts::*;

mod compressed;

pub use compressed::{BlockInfo, CompressionFamily};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown format value {0}")]
    UnknownFormat(u32),
    #[error("format {0:?} has no target representation")]
    Unsupported(Format),
}

/// Target storage triple: sized internal format plus the pixel format/type pair used for
/// uncompressed transfers. Compressed formats leave `format` and `ty` zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetFormat {
    pub internal_format: GLenum,
    pub format: GLenum,
    pub ty: GLenum,
}

const fn tf(internal_format: GLenum, format: GLenum, ty: GLenum) -> TargetFormat {
    TargetFormat {
        internal_format,
        format,
        ty,
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ImageAspects: u32 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
        const STENCIL = 0x4;
    }
}

/// How a colour clear value must be passed to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearKind {
    Float,
    Sint,
    Uint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent3d {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Extent of mip `level`, each axis clamped to 1.
    pub fn mip(self, level: u32) -> Self {
        Self {
            width: mip_dim(self.width, level),
            height: mip_dim(self.height, level),
            depth: mip_dim(self.depth, level),
        }
    }
}

pub fn mip_dim(base: u32, level: u32) -> u32 {
    base.checked_shr(level).unwrap_or(0).max(1)
}

macro_rules! formats {
    ($($name:ident = $value:literal => $texel:literal, $target:expr;)+) => {
        #[repr(u32)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Format {
            $($name = $value,)+
        }

        impl Format {
            pub const ALL: &'static [Format] = &[$(Format::$name,)+];

            pub const fn from_u32(v: u32) -> Option<Self> {
                match v {
                    $($value => Some(Self::$name),)+
                    _ => None,
                }
            }

            /// Bytes per texel for uncompressed formats (the transfer layout for packed
            /// depth/stencil); zero for block-compressed and undefined formats.
            const fn uncompressed_texel_size(self) -> u32 {
                match self {
                    $(Self::$name => $texel,)+
                }
            }

            const fn uncompressed_target(self) -> Option<TargetFormat> {
                match self {
                    $(Self::$name => $target,)+
                }
            }
        }
    };
}

formats! {
    Undefined = 0 => 0, None;
    R4G4UnormPack8 = 1 => 1, None;
    R4G4B4A4UnormPack16 = 2 => 2, Some(tf(RGBA4, RGBA, UNSIGNED_SHORT_4_4_4_4));
    B4G4R4A4UnormPack16 = 3 => 2, Some(tf(RGBA4, BGRA, UNSIGNED_SHORT_4_4_4_4));
    R5G6B5UnormPack16 = 4 => 2, Some(tf(RGB565, RGB, UNSIGNED_SHORT_5_6_5));
    B5G6R5UnormPack16 = 5 => 2, Some(tf(RGB565, BGR, UNSIGNED_SHORT_5_6_5));
    R5G5B5A1UnormPack16 = 6 => 2, Some(tf(RGB5_A1, RGBA, UNSIGNED_SHORT_5_5_5_1));
    B5G5R5A1UnormPack16 = 7 => 2, Some(tf(RGB5_A1, BGRA, UNSIGNED_SHORT_5_5_5_1));
    A1R5G5B5UnormPack16 = 8 => 2, Some(tf(RGB5_A1, BGRA, UNSIGNED_SHORT_1_5_5_5_REV));
    R8Unorm = 9 => 1, Some(tf(R8, RED, UNSIGNED_BYTE));
    R8Snorm = 10 => 1, Some(tf(R8_SNORM, RED, BYTE));
    R8Uscaled = 11 => 1, None;
    R8Sscaled = 12 => 1, None;
    R8Uint = 13 => 1, Some(tf(R8UI, RED_INTEGER, UNSIGNED_BYTE));
    R8Sint = 14 => 1, Some(tf(R8I, RED_INTEGER, BYTE));
    R8Srgb = 15 => 1, Some(tf(SR8_EXT, RED, UNSIGNED_BYTE));
    R8G8Unorm = 16 => 2, Some(tf(RG8, RG, UNSIGNED_BYTE));
    R8G8Snorm = 17 => 2, Some(tf(RG8_SNORM, RG, BYTE));
    R8G8Uscaled = 18 => 2, None;
    R8G8Sscaled = 19 => 2, None;
    R8G8Uint = 20 => 2, Some(tf(RG8UI, RG_INTEGER, UNSIGNED_BYTE));
    R8G8Sint = 21 => 2, Some(tf(RG8I, RG_INTEGER, BYTE));
    R8G8Srgb = 22 => 2, Some(tf(SRG8_EXT, RG, UNSIGNED_BYTE));
    R8G8B8Unorm = 23 => 3, Some(tf(RGB8, RGB, UNSIGNED_BYTE));
    R8G8B8Snorm = 24 => 3, Some(tf(RGB8_SNORM, RGB, BYTE));
    R8G8B8Uscaled = 25 => 3, None;
    R8G8B8Sscaled = 26 => 3, None;
    R8G8B8Uint = 27 => 3, Some(tf(RGB8UI, RGB_INTEGER, UNSIGNED_BYTE));
    R8G8B8Sint = 28 => 3, Some(tf(RGB8I, RGB_INTEGER, BYTE));
    R8G8B8Srgb = 29 => 3, Some(tf(SRGB8, RGB, UNSIGNED_BYTE));
    B8G8R8Unorm = 30 => 3, Some(tf(RGB8, BGR, UNSIGNED_BYTE));
    B8G8R8Snorm = 31 => 3, Some(tf(RGB8_SNORM, BGR, BYTE));
    B8G8R8Uscaled = 32 => 3, None;
    B8G8R8Sscaled = 33 => 3, None;
    B8G8R8Uint = 34 => 3, Some(tf(RGB8UI, BGR_INTEGER, UNSIGNED_BYTE));
    B8G8R8Sint = 35 => 3, Some(tf(RGB8I, BGR_INTEGER, BYTE));
    B8G8R8Srgb = 36 => 3, Some(tf(SRGB8, BGR, UNSIGNED_BYTE));
    R8G8B8A8Unorm = 37 => 4, Some(tf(RGBA8, RGBA, UNSIGNED_BYTE));
    R8G8B8A8Snorm = 38 => 4, Some(tf(RGBA8_SNORM, RGBA, BYTE));
    R8G8B8A8Uscaled = 39 => 4, None;
    R8G8B8A8Sscaled = 40 => 4, None;
    R8G8B8A8Uint = 41 => 4, Some(tf(RGBA8UI, RGBA_INTEGER, UNSIGNED_BYTE));
    R8G8B8A8Sint = 42 => 4, Some(tf(RGBA8I, RGBA_INTEGER, BYTE));
    R8G8B8A8Srgb = 43 => 4, Some(tf(SRGB8_ALPHA8, RGBA, UNSIGNED_BYTE));
    B8G8R8A8Unorm = 44 => 4, Some(tf(RGBA8, BGRA, UNSIGNED_BYTE));
    B8G8R8A8Snorm = 45 => 4, Some(tf(RGBA8_SNORM, BGRA, BYTE));
    B8G8R8A8Uscaled = 46 => 4, None;
    B8G8R8A8Sscaled = 47 => 4, None;
    B8G8R8A8Uint = 48 => 4, Some(tf(RGBA8UI, BGRA_INTEGER, UNSIGNED_BYTE));
    B8G8R8A8Sint = 49 => 4, Some(tf(RGBA8I, BGRA_INTEGER, BYTE));
    B8G8R8A8Srgb = 50 => 4, Some(tf(SRGB8_ALPHA8, BGRA, UNSIGNED_BYTE));
    A8B8G8R8UnormPack32 = 51 => 4, Some(tf(RGBA8, RGBA, UNSIGNED_BYTE));
    A8B8G8R8SnormPack32 = 52 => 4, Some(tf(RGBA8_SNORM, RGBA, BYTE));
    A8B8G8R8UscaledPack32 = 53 => 4, None;
    A8B8G8R8SscaledPack32 = 54 => 4, None;
    A8B8G8R8UintPack32 = 55 => 4, Some(tf(RGBA8UI, RGBA_INTEGER, UNSIGNED_BYTE));
    A8B8G8R8SintPack32 = 56 => 4, Some(tf(RGBA8I, RGBA_INTEGER, BYTE));
    A8B8G8R8SrgbPack32 = 57 => 4, Some(tf(SRGB8_ALPHA8, RGBA, UNSIGNED_BYTE));
    A2R10G10B10UnormPack32 = 58 => 4, Some(tf(RGB10_A2, BGRA, UNSIGNED_INT_2_10_10_10_REV));
    A2R10G10B10SnormPack32 = 59 => 4, None;
    A2R10G10B10UscaledPack32 = 60 => 4, None;
    A2R10G10B10SscaledPack32 = 61 => 4, None;
    A2R10G10B10UintPack32 = 62 => 4, Some(tf(RGB10_A2UI, BGRA_INTEGER, UNSIGNED_INT_2_10_10_10_REV));
    A2R10G10B10SintPack32 = 63 => 4, None;
    A2B10G10R10UnormPack32 = 64 => 4, Some(tf(RGB10_A2, RGBA, UNSIGNED_INT_2_10_10_10_REV));
    A2B10G10R10SnormPack32 = 65 => 4, None;
    A2B10G10R10UscaledPack32 = 66 => 4, None;
    A2B10G10R10SscaledPack32 = 67 => 4, None;
    A2B10G10R10UintPack32 = 68 => 4, Some(tf(RGB10_A2UI, RGBA_INTEGER, UNSIGNED_INT_2_10_10_10_REV));
    A2B10G10R10SintPack32 = 69 => 4, None;
    R16Unorm = 70 => 2, Some(tf(R16, RED, UNSIGNED_SHORT));
    R16Snorm = 71 => 2, Some(tf(R16_SNORM, RED, SHORT));
    R16Uscaled = 72 => 2, None;
    R16Sscaled = 73 => 2, None;
    R16Uint = 74 => 2, Some(tf(R16UI, RED_INTEGER, UNSIGNED_SHORT));
    R16Sint = 75 => 2, Some(tf(R16I, RED_INTEGER, SHORT));
    R16Sfloat = 76 => 2, Some(tf(R16F, RED, HALF_FLOAT));
    R16G16Unorm = 77 => 4, Some(tf(RG16, RG, UNSIGNED_SHORT));
    R16G16Snorm = 78 => 4, Some(tf(RG16_SNORM, RG, SHORT));
    R16G16Uscaled = 79 => 4, None;
    R16G16Sscaled = 80 => 4, None;
    R16G16Uint = 81 => 4, Some(tf(RG16UI, RG_INTEGER, UNSIGNED_SHORT));
    R16G16Sint = 82 => 4, Some(tf(RG16I, RG_INTEGER, SHORT));
    R16G16Sfloat = 83 => 4, Some(tf(RG16F, RG, HALF_FLOAT));
    R16G16B16Unorm = 84 => 6, Some(tf(RGB16, RGB, UNSIGNED_SHORT));
    R16G16B16Snorm = 85 => 6, Some(tf(RGB16_SNORM, RGB, SHORT));
    R16G16B16Uscaled = 86 => 6, None;
    R16G16B16Sscaled = 87 => 6, None;
    R16G16B16Uint = 88 => 6, Some(tf(RGB16UI, RGB_INTEGER, UNSIGNED_SHORT));
    R16G16B16Sint = 89 => 6, Some(tf(RGB16I, RGB_INTEGER, SHORT));
    R16G16B16Sfloat = 90 => 6, Some(tf(RGB16F, RGB, HALF_FLOAT));
    R16G16B16A16Unorm = 91 => 8, Some(tf(RGBA16, RGBA, UNSIGNED_SHORT));
    R16G16B16A16Snorm = 92 => 8, Some(tf(RGBA16_SNORM, RGBA, SHORT));
    R16G16B16A16Uscaled = 93 => 8, None;
    R16G16B16A16Sscaled = 94 => 8, None;
    R16G16B16A16Uint = 95 => 8, Some(tf(RGBA16UI, RGBA_INTEGER, UNSIGNED_SHORT));
    R16G16B16A16Sint = 96 => 8, Some(tf(RGBA16I, RGBA_INTEGER, SHORT));
    R16G16B16A16Sfloat = 97 => 8, Some(tf(RGBA16F, RGBA, HALF_FLOAT));
    R32Uint = 98 => 4, Some(tf(R32UI, RED_INTEGER, UNSIGNED_INT));
    R32Sint = 99 => 4, Some(tf(R32I, RED_INTEGER, INT));
    R32Sfloat = 100 => 4, Some(tf(R32F, RED, FLOAT));
    R32G32Uint = 101 => 8, Some(tf(RG32UI, RG_INTEGER, UNSIGNED_INT));
    R32G32Sint = 102 => 8, Some(tf(RG32I, RG_INTEGER, INT));
    R32G32Sfloat = 103 => 8, Some(tf(RG32F, RG, FLOAT));
    R32G32B32Uint = 104 => 12, Some(tf(RGB32UI, RGB_INTEGER, UNSIGNED_INT));
    R32G32B32Sint = 105 => 12, Some(tf(RGB32I, RGB_INTEGER, INT));
    R32G32B32Sfloat = 106 => 12, Some(tf(RGB32F, RGB, FLOAT));
    R32G32B32A32Uint = 107 => 16, Some(tf(RGBA32UI, RGBA_INTEGER, UNSIGNED_INT));
    R32G32B32A32Sint = 108 => 16, Some(tf(RGBA32I, RGBA_INTEGER, INT));
    R32G32B32A32Sfloat = 109 => 16, Some(tf(RGBA32F, RGBA, FLOAT));
    R64Uint = 110 => 8, None;
    R64Sint = 111 => 8, None;
    R64Sfloat = 112 => 8, None;
    R64G64Uint = 113 => 16, None;
    R64G64Sint = 114 => 16, None;
    R64G64Sfloat = 115 => 16, None;
    R64G64B64Uint = 116 => 24, None;
    R64G64B64Sint = 117 => 24, None;
    R64G64B64Sfloat = 118 => 24, None;
    R64G64B64A64Uint = 119 => 32, None;
    R64G64B64A64Sint = 120 => 32, None;
    R64G64B64A64Sfloat = 121 => 32, None;
    B10G11R11UfloatPack32 = 122 => 4, Some(tf(R11F_G11F_B10F, RGB, UNSIGNED_INT_10F_11F_11F_REV));
    E5B9G9R9UfloatPack32 = 123 => 4, Some(tf(RGB9_E5, RGB, UNSIGNED_INT_5_9_9_9_REV));
    D16Unorm = 124 => 2, Some(tf(DEPTH_COMPONENT16, DEPTH_COMPONENT, UNSIGNED_SHORT));
    X8D24UnormPack32 = 125 => 4, Some(tf(DEPTH_COMPONENT24, DEPTH_COMPONENT, UNSIGNED_INT));
    D32Sfloat = 126 => 4, Some(tf(DEPTH_COMPONENT32F, DEPTH_COMPONENT, FLOAT));
    S8Uint = 127 => 1, Some(tf(STENCIL_INDEX8, STENCIL_INDEX, UNSIGNED_BYTE));
    D16UnormS8Uint = 128 => 3, None;
    D24UnormS8Uint = 129 => 4, Some(tf(DEPTH24_STENCIL8, DEPTH_STENCIL, UNSIGNED_INT_24_8));
    D32SfloatS8Uint = 130 => 8, Some(tf(DEPTH32F_STENCIL8, DEPTH_STENCIL, FLOAT_32_UNSIGNED_INT_24_8_REV));
    BC1RgbUnorm = 131 => 0, None;
    BC1RgbSrgb = 132 => 0, None;
    BC1RgbaUnorm = 133 => 0, None;
    BC1RgbaSrgb = 134 => 0, None;
    BC2Unorm = 135 => 0, None;
    BC2Srgb = 136 => 0, None;
    BC3Unorm = 137 => 0, None;
    BC3Srgb = 138 => 0, None;
    BC4Unorm = 139 => 0, None;
    BC4Snorm = 140 => 0, None;
    BC5Unorm = 141 => 0, None;
    BC5Snorm = 142 => 0, None;
    BC6HUfloat = 143 => 0, None;
    BC6HSfloat = 144 => 0, None;
    BC7Unorm = 145 => 0, None;
    BC7Srgb = 146 => 0, None;
    Etc2R8G8B8Unorm = 147 => 0, None;
    Etc2R8G8B8Srgb = 148 => 0, None;
    Etc2R8G8B8A1Unorm = 149 => 0, None;
    Etc2R8G8B8A1Srgb = 150 => 0, None;
    Etc2R8G8B8A8Unorm = 151 => 0, None;
    Etc2R8G8B8A8Srgb = 152 => 0, None;
    EacR11Unorm = 153 => 0, None;
    EacR11Snorm = 154 => 0, None;
    EacR11G11Unorm = 155 => 0, None;
    EacR11G11Snorm = 156 => 0, None;
    Astc4x4Unorm = 157 => 0, None;
    Astc4x4Srgb = 158 => 0, None;
    Astc5x4Unorm = 159 => 0, None;
    Astc5x4Srgb = 160 => 0, None;
    Astc5x5Unorm = 161 => 0, None;
    Astc5x5Srgb = 162 => 0, None;
    Astc6x5Unorm = 163 => 0, None;
    Astc6x5Srgb = 164 => 0, None;
    Astc6x6Unorm = 165 => 0, None;
    Astc6x6Srgb = 166 => 0, None;
    Astc8x5Unorm = 167 => 0, None;
    Astc8x5Srgb = 168 => 0, None;
    Astc8x6Unorm = 169 => 0, None;
    Astc8x6Srgb = 170 => 0, None;
    Astc8x8Unorm = 171 => 0, None;
    Astc8x8Srgb = 172 => 0, None;
    Astc10x5Unorm = 173 => 0, None;
    Astc10x5Srgb = 174 => 0, None;
    Astc10x6Unorm = 175 => 0, None;
    Astc10x6Srgb = 176 => 0, None;
    Astc10x8Unorm = 177 => 0, None;
    Astc10x8Srgb = 178 => 0, None;
    Astc10x10Unorm = 179 => 0, None;
    Astc10x10Srgb = 180 => 0, None;
    Astc12x10Unorm = 181 => 0, None;
    Astc12x10Srgb = 182 => 0, None;
    Astc12x12Unorm = 183 => 0, None;
    Astc12x12Srgb = 184 => 0, None;
}

const DEPTH_STENCIL_RANGE: RangeInclusive<u32> = 124..=130;
const BC_RANGE: RangeInclusive<u32> = 131..=146;
const ETC_RANGE: RangeInclusive<u32> = 147..=156;
const ASTC_RANGE: RangeInclusive<u32> = 157..=184;

impl TryFrom<u32> for Format {
    type Error = FormatError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::from_u32(v).ok_or(FormatError::UnknownFormat(v))
    }
}

impl Format {
    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub fn is_depth_stencil_family(self) -> bool {
        DEPTH_STENCIL_RANGE.contains(&self.raw())
    }

    pub fn is_bc(self) -> bool {
        BC_RANGE.contains(&self.raw())
    }

    pub fn is_etc(self) -> bool {
        ETC_RANGE.contains(&self.raw())
    }

    pub fn is_astc(self) -> bool {
        ASTC_RANGE.contains(&self.raw())
    }

    pub fn is_compressed(self) -> bool {
        self.compression_family().is_some()
    }

    pub fn compression_family(self) -> Option<CompressionFamily> {
        let v = self.raw();
        if BC_RANGE.contains(&v) {
            Some(CompressionFamily::Bc)
        } else if ETC_RANGE.contains(&v) {
            Some(CompressionFamily::Etc2Eac)
        } else if ASTC_RANGE.contains(&v) {
            Some(CompressionFamily::Astc)
        } else {
            None
        }
    }

    pub fn aspects(self) -> ImageAspects {
        match self.raw() {
            0 => ImageAspects::empty(),
            124..=126 => ImageAspects::DEPTH,
            127 => ImageAspects::STENCIL,
            128..=130 => ImageAspects::DEPTH | ImageAspects::STENCIL,
            _ => ImageAspects::COLOR,
        }
    }

    pub fn is_depth(self) -> bool {
        self.aspects().contains(ImageAspects::DEPTH)
    }

    pub fn is_stencil(self) -> bool {
        self.aspects().contains(ImageAspects::STENCIL)
    }

    pub fn is_color(self) -> bool {
        self.aspects().contains(ImageAspects::COLOR)
    }

    /// Block footprint and byte size. Uncompressed formats are 1x1 blocks of one texel.
    pub fn block(self) -> BlockInfo {
        match self.compression_family() {
            Some(family) => family.block(self.raw()),
            None => BlockInfo {
                width: 1,
                height: 1,
                bytes: self.uncompressed_texel_size(),
            },
        }
    }

    /// Bytes per texel; `None` for block-compressed formats.
    pub fn texel_size(self) -> Option<u32> {
        (!self.is_compressed()).then(|| self.uncompressed_texel_size())
    }

    pub fn target(self) -> Result<TargetFormat, FormatError> {
        let found = match self.compression_family() {
            Some(family) => Some(family.target(self.raw())),
            None => self.uncompressed_target(),
        };
        found.ok_or(FormatError::Unsupported(self))
    }

    pub fn is_supported(self) -> bool {
        self.target().is_ok()
    }

    pub fn clear_kind(self) -> ClearKind {
        let Ok(target) = self.target() else {
            return ClearKind::Float;
        };
        match target.format {
            RED_INTEGER | RG_INTEGER | RGB_INTEGER | RGBA_INTEGER | BGR_INTEGER
            | BGRA_INTEGER => match target.ty {
                BYTE | SHORT | INT => ClearKind::Sint,
                _ => ClearKind::Uint,
            },
            _ => ClearKind::Float,
        }
    }

    /// Smallest addressable extent: one block footprint.
    pub fn minimal_extent(self) -> Extent3d {
        let block = self.block();
        Extent3d::new(block.width, block.height, 1)
    }

    /// Byte size of an `extent` worth of texels, rounding partial blocks up.
    pub fn size_of(self, extent: Extent3d) -> u64 {
        get_size(extent, self)
    }
}

/// Byte size of `extent` texels of `format`. Compressed formats round width and height up to
/// the block grid; depth is never blocked.
pub fn get_size(extent: Extent3d, format: Format) -> u64 {
    let block = format.block();
    let blocks_w = u64::from(extent.width.div_ceil(block.width));
    let blocks_h = u64::from(extent.height.div_ceil(block.height));
    blocks_w * blocks_h * u64::from(extent.depth) * u64::from(block.bytes)
}

/// Bytes in one row of `width` texels.
pub fn row_pitch(width: u32, format: Format) -> u64 {
    let block = format.block();
    u64::from(width.div_ceil(block.width)) * u64::from(block.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_values_are_dense() {
        for (i, format) in Format::ALL.iter().enumerate() {
            assert_eq!(format.raw(), i as u32);
            assert_eq!(Format::from_u32(i as u32), Some(*format));
        }
        assert_eq!(Format::from_u32(185), None);
        assert_eq!(Format::try_from(999), Err(FormatError::UnknownFormat(999)));
    }

    #[test]
    fn uncompressed_size_is_texel_product() {
        let extent = Extent3d::new(7, 5, 3);
        for &format in Format::ALL.iter().filter(|f| !f.is_compressed()) {
            let texel = u64::from(format.texel_size().unwrap());
            assert_eq!(get_size(extent, format), 7 * 5 * 3 * texel, "{format:?}");
        }
    }

    #[test]
    fn compressed_minimal_extent_is_one_block() {
        for &format in Format::ALL.iter().filter(|f| f.is_compressed()) {
            let block = format.block();
            assert_eq!(
                get_size(format.minimal_extent(), format),
                u64::from(block.bytes),
                "{format:?}"
            );
        }
    }

    #[test]
    fn compressed_sizes_round_up_to_block_grid() {
        // 5x5 texels of BC1 cover 2x2 blocks of 8 bytes.
        assert_eq!(get_size(Extent3d::new(5, 5, 1), Format::BC1RgbaUnorm), 32);
        // 1x1 of BC7 is still a whole block.
        assert_eq!(get_size(Extent3d::new(1, 1, 1), Format::BC7Unorm), 16);
        // ASTC 10x8 over 21x9 texels: 3x2 blocks.
        assert_eq!(get_size(Extent3d::new(21, 9, 1), Format::Astc10x8Srgb), 96);
        // Depth slices multiply.
        assert_eq!(get_size(Extent3d::new(4, 4, 3), Format::EacR11G11Unorm), 48);
    }

    #[test]
    fn aspects_follow_ranges() {
        assert_eq!(Format::D16Unorm.aspects(), ImageAspects::DEPTH);
        assert_eq!(Format::S8Uint.aspects(), ImageAspects::STENCIL);
        assert_eq!(
            Format::D24UnormS8Uint.aspects(),
            ImageAspects::DEPTH | ImageAspects::STENCIL
        );
        assert_eq!(Format::R8G8B8A8Unorm.aspects(), ImageAspects::COLOR);
        assert_eq!(Format::BC3Srgb.aspects(), ImageAspects::COLOR);
        assert!(Format::Undefined.aspects().is_empty());
    }

    #[test]
    fn unsupported_formats_fail_closed() {
        for format in [
            Format::Undefined,
            Format::R8Uscaled,
            Format::R64G64Sfloat,
            Format::D16UnormS8Uint,
        ] {
            assert_eq!(format.target(), Err(FormatError::Unsupported(format)));
        }
    }

    #[test]
    fn target_triples() {
        assert_eq!(
            Format::B8G8R8A8Srgb.target(),
            Ok(tf(SRGB8_ALPHA8, BGRA, UNSIGNED_BYTE))
        );
        assert_eq!(
            Format::R16G16Sfloat.target(),
            Ok(tf(RG16F, RG, HALF_FLOAT))
        );
        assert_eq!(
            Format::BC1RgbSrgb.target(),
            Ok(tf(COMPRESSED_SRGB_S3TC_DXT1_EXT, 0, 0))
        );
        assert_eq!(
            Format::Astc12x12Srgb.target().map(|t| t.internal_format),
            Ok(0x93DD)
        );
    }

    #[test]
    fn clear_kinds() {
        assert_eq!(Format::R8G8B8A8Unorm.clear_kind(), ClearKind::Float);
        assert_eq!(Format::R32Uint.clear_kind(), ClearKind::Uint);
        assert_eq!(Format::R16G16Sint.clear_kind(), ClearKind::Sint);
        assert_eq!(Format::A2B10G10R10UintPack32.clear_kind(), ClearKind::Uint);
    }

    #[test]
    fn mip_extents_clamp_to_one() {
        let e = Extent3d::new(16, 4, 1);
        assert_eq!(e.mip(3), Extent3d::new(2, 1, 1));
        assert_eq!(e.mip(40), Extent3d::new(1, 1, 1));
    }
}
