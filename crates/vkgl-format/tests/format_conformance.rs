use vkgl_format::{get_size, Extent3d, Format};

// Keeps the supported-format list and the exhaustive match in sync. The match has no
// wildcard arm, so a new wire format fails to compile until it is classified here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpectedSupport {
    Supported,
    Unsupported,
}

macro_rules! format_expectations {
    ($($variant:ident => $support:ident,)+) => {
        const ALL_WIRE_FORMATS: &[Format] = &[
            $(Format::$variant,)+
        ];

        fn expected_support(format: Format) -> ExpectedSupport {
            match format {
                $(Format::$variant => ExpectedSupport::$support,)+
            }
        }
    }
}

format_expectations! {
    Undefined => Unsupported,
    R4G4UnormPack8 => Unsupported,
    R4G4B4A4UnormPack16 => Supported,
    B4G4R4A4UnormPack16 => Supported,
    R5G6B5UnormPack16 => Supported,
    B5G6R5UnormPack16 => Supported,
    R5G5B5A1UnormPack16 => Supported,
    B5G5R5A1UnormPack16 => Supported,
    A1R5G5B5UnormPack16 => Supported,
    R8Unorm => Supported,
    R8Snorm => Supported,
    R8Uscaled => Unsupported,
    R8Sscaled => Unsupported,
    R8Uint => Supported,
    R8Sint => Supported,
    R8Srgb => Supported,
    R8G8Unorm => Supported,
    R8G8Snorm => Supported,
    R8G8Uscaled => Unsupported,
    R8G8Sscaled => Unsupported,
    R8G8Uint => Supported,
    R8G8Sint => Supported,
    R8G8Srgb => Supported,
    R8G8B8Unorm => Supported,
    R8G8B8Snorm => Supported,
    R8G8B8Uscaled => Unsupported,
    R8G8B8Sscaled => Unsupported,
    R8G8B8Uint => Supported,
    R8G8B8Sint => Supported,
    R8G8B8Srgb => Supported,
    B8G8R8Unorm => Supported,
    B8G8R8Snorm => Supported,
    B8G8R8Uscaled => Unsupported,
    B8G8R8Sscaled => Unsupported,
    B8G8R8Uint => Supported,
    B8G8R8Sint => Supported,
    B8G8R8Srgb => Supported,
    R8G8B8A8Unorm => Supported,
    R8G8B8A8Snorm => Supported,
    R8G8B8A8Uscaled => Unsupported,
    R8G8B8A8Sscaled => Unsupported,
    R8G8B8A8Uint => Supported,
    R8G8B8A8Sint => Supported,
    R8G8B8A8Srgb => Supported,
    B8G8R8A8Unorm => Supported,
    B8G8R8A8Snorm => Supported,
    B8G8R8A8Uscaled => Unsupported,
    B8G8R8A8Sscaled => Unsupported,
    B8G8R8A8Uint => Supported,
    B8G8R8A8Sint => Supported,
    B8G8R8A8Srgb => Supported,
    A8B8G8R8UnormPack32 => Supported,
    A8B8G8R8SnormPack32 => Supported,
    A8B8G8R8UscaledPack32 => Unsupported,
    A8B8G8R8SscaledPack32 => Unsupported,
    A8B8G8R8UintPack32 => Supported,
    A8B8G8R8SintPack32 => Supported,
    A8B8G8R8SrgbPack32 => Supported,
    A2R10G10B10UnormPack32 => Supported,
    A2R10G10B10SnormPack32 => Unsupported,
    A2R10G10B10UscaledPack32 => Unsupported,
    A2R10G10B10SscaledPack32 => Unsupported,
    A2R10G10B10UintPack32 => Supported,
    A2R10G10B10SintPack32 => Unsupported,
    A2B10G10R10UnormPack32 => Supported,
    A2B10G10R10SnormPack32 => Unsupported,
    A2B10G10R10UscaledPack32 => Unsupported,
    A2B10G10R10SscaledPack32 => Unsupported,
    A2B10G10R10UintPack32 => Supported,
    A2B10G10R10SintPack32 => Unsupported,
    R16Unorm => Supported,
    R16Snorm => Supported,
    R16Uscaled => Unsupported,
    R16Sscaled => Unsupported,
    R16Uint => Supported,
    R16Sint => Supported,
    R16Sfloat => Supported,
    R16G16Unorm => Supported,
    R16G16Snorm => Supported,
    R16G16Uscaled => Unsupported,
    R16G16Sscaled => Unsupported,
    R16G16Uint => Supported,
    R16G16Sint => Supported,
    R16G16Sfloat => Supported,
    R16G16B16Unorm => Supported,
    R16G16B16Snorm => Supported,
    R16G16B16Uscaled => Unsupported,
    R16G16B16Sscaled => Unsupported,
    R16G16B16Uint => Supported,
    R16G16B16Sint => Supported,
    R16G16B16Sfloat => Supported,
    R16G16B16A16Unorm => Supported,
    R16G16B16A16Snorm => Supported,
    R16G16B16A16Uscaled => Unsupported,
    R16G16B16A16Sscaled => Unsupported,
    R16G16B16A16Uint => Supported,
    R16G16B16A16Sint => Supported,
    R16G16B16A16Sfloat => Supported,
    R32Uint => Supported,
    R32Sint => Supported,
    R32Sfloat => Supported,
    R32G32Uint => Supported,
    R32G32Sint => Supported,
    R32G32Sfloat => Supported,
    R32G32B32Uint => Supported,
    R32G32B32Sint => Supported,
    R32G32B32Sfloat => Supported,
    R32G32B32A32Uint => Supported,
    R32G32B32A32Sint => Supported,
    R32G32B32A32Sfloat => Supported,
    R64Uint => Unsupported,
    R64Sint => Unsupported,
    R64Sfloat => Unsupported,
    R64G64Uint => Unsupported,
    R64G64Sint => Unsupported,
    R64G64Sfloat => Unsupported,
    R64G64B64Uint => Unsupported,
    R64G64B64Sint => Unsupported,
    R64G64B64Sfloat => Unsupported,
    R64G64B64A64Uint => Unsupported,
    R64G64B64A64Sint => Unsupported,
    R64G64B64A64Sfloat => Unsupported,
    B10G11R11UfloatPack32 => Supported,
    E5B9G9R9UfloatPack32 => Supported,
    D16Unorm => Supported,
    X8D24UnormPack32 => Supported,
    D32Sfloat => Supported,
    S8Uint => Supported,
    D16UnormS8Uint => Unsupported,
    D24UnormS8Uint => Supported,
    D32SfloatS8Uint => Supported,
    BC1RgbUnorm => Supported,
    BC1RgbSrgb => Supported,
    BC1RgbaUnorm => Supported,
    BC1RgbaSrgb => Supported,
    BC2Unorm => Supported,
    BC2Srgb => Supported,
    BC3Unorm => Supported,
    BC3Srgb => Supported,
    BC4Unorm => Supported,
    BC4Snorm => Supported,
    BC5Unorm => Supported,
    BC5Snorm => Supported,
    BC6HUfloat => Supported,
    BC6HSfloat => Supported,
    BC7Unorm => Supported,
    BC7Srgb => Supported,
    Etc2R8G8B8Unorm => Supported,
    Etc2R8G8B8Srgb => Supported,
    Etc2R8G8B8A1Unorm => Supported,
    Etc2R8G8B8A1Srgb => Supported,
    Etc2R8G8B8A8Unorm => Supported,
    Etc2R8G8B8A8Srgb => Supported,
    EacR11Unorm => Supported,
    EacR11Snorm => Supported,
    EacR11G11Unorm => Supported,
    EacR11G11Snorm => Supported,
    Astc4x4Unorm => Supported,
    Astc4x4Srgb => Supported,
    Astc5x4Unorm => Supported,
    Astc5x4Srgb => Supported,
    Astc5x5Unorm => Supported,
    Astc5x5Srgb => Supported,
    Astc6x5Unorm => Supported,
    Astc6x5Srgb => Supported,
    Astc6x6Unorm => Supported,
    Astc6x6Srgb => Supported,
    Astc8x5Unorm => Supported,
    Astc8x5Srgb => Supported,
    Astc8x6Unorm => Supported,
    Astc8x6Srgb => Supported,
    Astc8x8Unorm => Supported,
    Astc8x8Srgb => Supported,
    Astc10x5Unorm => Supported,
    Astc10x5Srgb => Supported,
    Astc10x6Unorm => Supported,
    Astc10x6Srgb => Supported,
    Astc10x8Unorm => Supported,
    Astc10x8Srgb => Supported,
    Astc10x10Unorm => Supported,
    Astc10x10Srgb => Supported,
    Astc12x10Unorm => Supported,
    Astc12x10Srgb => Supported,
    Astc12x12Unorm => Supported,
    Astc12x12Srgb => Supported,
}

#[test]
fn expectation_table_covers_every_format() {
    assert_eq!(ALL_WIRE_FORMATS, Format::ALL);
}

#[test]
fn target_mapping_matches_expectations() {
    for &format in ALL_WIRE_FORMATS {
        let expected = expected_support(format);
        let actual = if format.is_supported() {
            ExpectedSupport::Supported
        } else {
            ExpectedSupport::Unsupported
        };
        assert_eq!(actual, expected, "{format:?}");
    }
}

#[test]
fn supported_uncompressed_formats_have_a_transfer_pair() {
    for &format in ALL_WIRE_FORMATS {
        let Ok(target) = format.target() else {
            continue;
        };
        if format.is_compressed() {
            assert_eq!((target.format, target.ty), (0, 0), "{format:?}");
        } else {
            assert_ne!(target.format, 0, "{format:?}");
            assert_ne!(target.ty, 0, "{format:?}");
        }
    }
}

#[test]
fn family_predicates_partition_the_compressed_range() {
    for &format in ALL_WIRE_FORMATS {
        let families = [format.is_bc(), format.is_etc(), format.is_astc()]
            .iter()
            .filter(|b| **b)
            .count();
        assert_eq!(families == 1, format.is_compressed(), "{format:?}");
        if format.is_compressed() {
            assert!(format.is_color(), "{format:?}");
            assert_eq!(format.texel_size(), None);
        }
    }
}

#[test]
fn one_block_sizes_across_families() {
    for &format in ALL_WIRE_FORMATS.iter().filter(|f| f.is_compressed()) {
        let block = format.block();
        let two_by_two = Extent3d::new(block.width * 2, block.height * 2, 1);
        assert_eq!(
            get_size(two_by_two, format),
            4 * u64::from(block.bytes),
            "{format:?}"
        );
        let one_past = Extent3d::new(block.width + 1, block.height, 1);
        assert_eq!(
            get_size(one_past, format),
            2 * u64::from(block.bytes),
            "{format:?}"
        );
    }
}

#[test]
fn texel_size_matches_transfer_pair() {
    for &format in ALL_WIRE_FORMATS {
        let Ok(target) = format.target() else {
            continue;
        };
        if format.is_compressed() {
            continue;
        }
        assert_eq!(
            format.texel_size().map(|s| s as usize),
            vkgl_gl::recording::transfer_texel_size(target.format, target.ty),
            "{format:?}"
        );
    }
}
