//! Device configuration and its environment overrides.

use crate::memory_type::MemoryProperties;

/// Forces the target error query after every replayed instruction.
pub const CHECK_ERRORS_ENV: &str = "VKGL_CHECK_ERRORS";
/// Disables the direct image-copy entry point; image copies are lowered to blits instead.
pub const DISABLE_COPY_IMAGE_ENV: &str = "VKGL_DISABLE_COPY_IMAGE";

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub min_buffer_alignment: u64,
    pub min_uniform_buffer_alignment: u64,
    pub image_alignment: u64,
    pub max_push_constant_size: u32,
    pub max_color_attachments: u32,
    pub max_viewports: u32,
    pub max_vertex_bindings: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_buffer_alignment: 4,
            min_uniform_buffer_alignment: 256,
            image_alignment: 256,
            max_push_constant_size: 128,
            max_color_attachments: 8,
            max_viewports: 16,
            max_vertex_bindings: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Query the target error state after each replayed instruction.
    pub check_errors: bool,
    /// Encode image copies with the direct copy entry point.
    pub native_copy_image: bool,
    /// Uniform block binding that receives push-constant data.
    pub push_constant_binding: u32,
    /// Texture unit used for uploads and downloads.
    pub transfer_texture_unit: u32,
    pub limits: Limits,
    pub memory: MemoryProperties,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            check_errors: false,
            native_copy_image: true,
            push_constant_binding: 0,
            transfer_texture_unit: 0,
            limits: Limits::default(),
            memory: MemoryProperties::default(),
        }
    }
}

impl DeviceConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if env_var_truthy(CHECK_ERRORS_ENV) {
            self.check_errors = true;
        }
        if env_var_truthy(DISABLE_COPY_IMAGE_ENV) {
            self.native_copy_image = false;
        }
        self
    }
}
