//! Target driver enumerants.
//!
//! Values match the registry numbering so recorded call logs can be compared against traces
//! taken from a real driver.

pub type GLenum = u32;
pub type GLbitfield = u32;

pub const NO_ERROR: GLenum = 0;
pub const INVALID_ENUM: GLenum = 0x0500;
pub const INVALID_VALUE: GLenum = 0x0501;
pub const INVALID_OPERATION: GLenum = 0x0502;
pub const OUT_OF_MEMORY: GLenum = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

// Buffer targets.
pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const PIXEL_PACK_BUFFER: GLenum = 0x88EB;
pub const PIXEL_UNPACK_BUFFER: GLenum = 0x88EC;
pub const UNIFORM_BUFFER: GLenum = 0x8A11;
pub const COPY_READ_BUFFER: GLenum = 0x8F36;
pub const COPY_WRITE_BUFFER: GLenum = 0x8F37;
pub const DRAW_INDIRECT_BUFFER: GLenum = 0x8F3F;
pub const DISPATCH_INDIRECT_BUFFER: GLenum = 0x90EE;
pub const SHADER_STORAGE_BUFFER: GLenum = 0x90D2;

// Buffer storage flags.
pub const MAP_READ_BIT: GLbitfield = 0x0001;
pub const MAP_WRITE_BIT: GLbitfield = 0x0002;
pub const DYNAMIC_STORAGE_BIT: GLbitfield = 0x0100;

// Texture targets.
pub const TEXTURE_1D: GLenum = 0x0DE0;
pub const TEXTURE_2D: GLenum = 0x0DE1;
pub const TEXTURE_3D: GLenum = 0x806F;
pub const TEXTURE_1D_ARRAY: GLenum = 0x8C18;
pub const TEXTURE_2D_ARRAY: GLenum = 0x8C1A;
pub const TEXTURE_CUBE_MAP: GLenum = 0x8513;
pub const TEXTURE_CUBE_MAP_POSITIVE_X: GLenum = 0x8515;
pub const TEXTURE_CUBE_MAP_NEGATIVE_Z: GLenum = 0x851A;
pub const TEXTURE_CUBE_MAP_ARRAY: GLenum = 0x9009;
pub const TEXTURE_2D_MULTISAMPLE: GLenum = 0x9100;
pub const TEXTURE_2D_MULTISAMPLE_ARRAY: GLenum = 0x9102;
pub const TEXTURE0: GLenum = 0x84C0;

// Pixel store parameters.
pub const UNPACK_ROW_LENGTH: GLenum = 0x0CF2;
pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;
pub const PACK_ROW_LENGTH: GLenum = 0x0D02;
pub const PACK_ALIGNMENT: GLenum = 0x0D05;
pub const PACK_IMAGE_HEIGHT: GLenum = 0x806C;
pub const UNPACK_IMAGE_HEIGHT: GLenum = 0x806E;

// Pixel formats.
pub const STENCIL_INDEX: GLenum = 0x1901;
pub const DEPTH_COMPONENT: GLenum = 0x1902;
pub const RED: GLenum = 0x1903;
pub const RGB: GLenum = 0x1907;
pub const RGBA: GLenum = 0x1908;
pub const BGR: GLenum = 0x80E0;
pub const BGRA: GLenum = 0x80E1;
pub const RG: GLenum = 0x8227;
pub const RG_INTEGER: GLenum = 0x8228;
pub const DEPTH_STENCIL: GLenum = 0x84F9;
pub const RED_INTEGER: GLenum = 0x8D94;
pub const RGB_INTEGER: GLenum = 0x8D98;
pub const RGBA_INTEGER: GLenum = 0x8D99;
pub const BGR_INTEGER: GLenum = 0x8D9A;
pub const BGRA_INTEGER: GLenum = 0x8D9B;

// Component types.
pub const BYTE: GLenum = 0x1400;
pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const SHORT: GLenum = 0x1402;
pub const UNSIGNED_SHORT: GLenum = 0x1403;
pub const INT: GLenum = 0x1404;
pub const UNSIGNED_INT: GLenum = 0x1405;
pub const FLOAT: GLenum = 0x1406;
pub const HALF_FLOAT: GLenum = 0x140B;
pub const UNSIGNED_SHORT_4_4_4_4: GLenum = 0x8033;
pub const UNSIGNED_SHORT_5_5_5_1: GLenum = 0x8034;
pub const UNSIGNED_SHORT_5_6_5: GLenum = 0x8363;
pub const UNSIGNED_SHORT_1_5_5_5_REV: GLenum = 0x8366;
pub const UNSIGNED_INT_2_10_10_10_REV: GLenum = 0x8368;
pub const UNSIGNED_INT_24_8: GLenum = 0x84FA;
pub const UNSIGNED_INT_10F_11F_11F_REV: GLenum = 0x8C3B;
pub const UNSIGNED_INT_5_9_9_9_REV: GLenum = 0x8C3E;
pub const FLOAT_32_UNSIGNED_INT_24_8_REV: GLenum = 0x8DAD;

// Sized internal formats.
pub const RGB8: GLenum = 0x8051;
pub const RGB16: GLenum = 0x8054;
pub const RGBA4: GLenum = 0x8056;
pub const RGB5_A1: GLenum = 0x8057;
pub const RGBA8: GLenum = 0x8058;
pub const RGB10_A2: GLenum = 0x8059;
pub const RGBA16: GLenum = 0x805B;
pub const DEPTH_COMPONENT16: GLenum = 0x81A5;
pub const DEPTH_COMPONENT24: GLenum = 0x81A6;
pub const R8: GLenum = 0x8229;
pub const R16: GLenum = 0x822A;
pub const RG8: GLenum = 0x822B;
pub const RG16: GLenum = 0x822C;
pub const R16F: GLenum = 0x822D;
pub const R32F: GLenum = 0x822E;
pub const RG16F: GLenum = 0x822F;
pub const RG32F: GLenum = 0x8230;
pub const R8I: GLenum = 0x8231;
pub const R8UI: GLenum = 0x8232;
pub const R16I: GLenum = 0x8233;
pub const R16UI: GLenum = 0x8234;
pub const R32I: GLenum = 0x8235;
pub const R32UI: GLenum = 0x8236;
pub const RG8I: GLenum = 0x8237;
pub const RG8UI: GLenum = 0x8238;
pub const RG16I: GLenum = 0x8239;
pub const RG16UI: GLenum = 0x823A;
pub const RG32I: GLenum = 0x823B;
pub const RG32UI: GLenum = 0x823C;
pub const RGBA32F: GLenum = 0x8814;
pub const RGB32F: GLenum = 0x8815;
pub const RGBA16F: GLenum = 0x881A;
pub const RGB16F: GLenum = 0x881B;
pub const DEPTH24_STENCIL8: GLenum = 0x88F0;
pub const R11F_G11F_B10F: GLenum = 0x8C3A;
pub const RGB9_E5: GLenum = 0x8C3D;
pub const SRGB8: GLenum = 0x8C41;
pub const SRGB8_ALPHA8: GLenum = 0x8C43;
pub const DEPTH_COMPONENT32F: GLenum = 0x8CAC;
pub const DEPTH32F_STENCIL8: GLenum = 0x8CAD;
pub const STENCIL_INDEX8: GLenum = 0x8D48;
pub const RGB565: GLenum = 0x8D62;
pub const RGBA32UI: GLenum = 0x8D70;
pub const RGB32UI: GLenum = 0x8D71;
pub const RGBA16UI: GLenum = 0x8D76;
pub const RGB16UI: GLenum = 0x8D77;
pub const RGBA8UI: GLenum = 0x8D7C;
pub const RGB8UI: GLenum = 0x8D7D;
pub const RGBA32I: GLenum = 0x8D82;
pub const RGB32I: GLenum = 0x8D83;
pub const RGBA16I: GLenum = 0x8D88;
pub const RGB16I: GLenum = 0x8D89;
pub const RGBA8I: GLenum = 0x8D8E;
pub const RGB8I: GLenum = 0x8D8F;
pub const R8_SNORM: GLenum = 0x8F94;
pub const RG8_SNORM: GLenum = 0x8F95;
pub const RGB8_SNORM: GLenum = 0x8F96;
pub const RGBA8_SNORM: GLenum = 0x8F97;
pub const R16_SNORM: GLenum = 0x8F98;
pub const RG16_SNORM: GLenum = 0x8F99;
pub const RGB16_SNORM: GLenum = 0x8F9A;
pub const RGBA16_SNORM: GLenum = 0x8F9B;
pub const SR8_EXT: GLenum = 0x8FBD;
pub const SRG8_EXT: GLenum = 0x8FBE;
pub const RGB10_A2UI: GLenum = 0x906F;

// Compressed internal formats.
pub const COMPRESSED_RGB_S3TC_DXT1_EXT: GLenum = 0x83F0;
pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: GLenum = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: GLenum = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: GLenum = 0x83F3;
pub const COMPRESSED_SRGB_S3TC_DXT1_EXT: GLenum = 0x8C4C;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT: GLenum = 0x8C4D;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT: GLenum = 0x8C4E;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT: GLenum = 0x8C4F;
pub const COMPRESSED_RED_RGTC1: GLenum = 0x8DBB;
pub const COMPRESSED_SIGNED_RED_RGTC1: GLenum = 0x8DBC;
pub const COMPRESSED_RG_RGTC2: GLenum = 0x8DBD;
pub const COMPRESSED_SIGNED_RG_RGTC2: GLenum = 0x8DBE;
pub const COMPRESSED_RGBA_BPTC_UNORM: GLenum = 0x8E8C;
pub const COMPRESSED_SRGB_ALPHA_BPTC_UNORM: GLenum = 0x8E8D;
pub const COMPRESSED_RGB_BPTC_SIGNED_FLOAT: GLenum = 0x8E8E;
pub const COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: GLenum = 0x8E8F;
pub const COMPRESSED_R11_EAC: GLenum = 0x9270;
pub const COMPRESSED_SIGNED_R11_EAC: GLenum = 0x9271;
pub const COMPRESSED_RG11_EAC: GLenum = 0x9272;
pub const COMPRESSED_SIGNED_RG11_EAC: GLenum = 0x9273;
pub const COMPRESSED_RGB8_ETC2: GLenum = 0x9274;
pub const COMPRESSED_SRGB8_ETC2: GLenum = 0x9275;
pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: GLenum = 0x9276;
pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: GLenum = 0x9277;
pub const COMPRESSED_RGBA8_ETC2_EAC: GLenum = 0x9278;
pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: GLenum = 0x9279;
/// First of the 14 consecutive `COMPRESSED_RGBA_ASTC_*` enumerants (4x4 .. 12x12).
pub const COMPRESSED_RGBA_ASTC_4X4: GLenum = 0x93B0;
/// First of the 14 consecutive `COMPRESSED_SRGB8_ALPHA8_ASTC_*` enumerants.
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_4X4: GLenum = 0x93D0;

// Framebuffers.
pub const READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const STENCIL_ATTACHMENT: GLenum = 0x8D20;
pub const DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;
pub const NONE: GLenum = 0;
pub const COLOR: GLenum = 0x1800;
pub const DEPTH: GLenum = 0x1801;
pub const STENCIL: GLenum = 0x1802;

pub const DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const STENCIL_BUFFER_BIT: GLbitfield = 0x0000_0400;
pub const COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;

pub const NEAREST: GLenum = 0x2600;
pub const LINEAR: GLenum = 0x2601;

// Capabilities.
pub const SCISSOR_TEST: GLenum = 0x0C11;
pub const POLYGON_OFFSET_FILL: GLenum = 0x8037;

// Primitive modes.
pub const POINTS: GLenum = 0x0000;
pub const LINES: GLenum = 0x0001;
pub const LINE_STRIP: GLenum = 0x0003;
pub const TRIANGLES: GLenum = 0x0004;
pub const TRIANGLE_STRIP: GLenum = 0x0005;
pub const TRIANGLE_FAN: GLenum = 0x0006;
pub const LINES_ADJACENCY: GLenum = 0x000A;
pub const LINE_STRIP_ADJACENCY: GLenum = 0x000B;
pub const TRIANGLES_ADJACENCY: GLenum = 0x000C;
pub const TRIANGLE_STRIP_ADJACENCY: GLenum = 0x000D;
pub const PATCHES: GLenum = 0x000E;

// Memory barrier bits.
pub const VERTEX_ATTRIB_ARRAY_BARRIER_BIT: GLbitfield = 0x0000_0001;
pub const ELEMENT_ARRAY_BARRIER_BIT: GLbitfield = 0x0000_0002;
pub const UNIFORM_BARRIER_BIT: GLbitfield = 0x0000_0004;
pub const TEXTURE_FETCH_BARRIER_BIT: GLbitfield = 0x0000_0008;
pub const SHADER_IMAGE_ACCESS_BARRIER_BIT: GLbitfield = 0x0000_0020;
pub const COMMAND_BARRIER_BIT: GLbitfield = 0x0000_0040;
pub const PIXEL_BUFFER_BARRIER_BIT: GLbitfield = 0x0000_0080;
pub const TEXTURE_UPDATE_BARRIER_BIT: GLbitfield = 0x0000_0100;
pub const BUFFER_UPDATE_BARRIER_BIT: GLbitfield = 0x0000_0200;
pub const FRAMEBUFFER_BARRIER_BIT: GLbitfield = 0x0000_0400;
pub const CLIENT_MAPPED_BUFFER_BARRIER_BIT: GLbitfield = 0x0000_4000;
pub const SHADER_STORAGE_BARRIER_BIT: GLbitfield = 0x0000_2000;
pub const ALL_BARRIER_BITS: GLbitfield = 0xFFFF_FFFF;

// Sync objects.
pub const ALREADY_SIGNALED: GLenum = 0x911A;
pub const TIMEOUT_EXPIRED: GLenum = 0x911B;
pub const CONDITION_SATISFIED: GLenum = 0x911C;
pub const WAIT_FAILED: GLenum = 0x911D;
