//! Texture configuration and creation helpers.
//!
//! Provides `TextureConfig` for specifying texture parameters and
//! `create_texture` for allocating GPU textures through a
//! [`GraphicsDevice`]. Render target color buffers use RGBA16F with
//! nearest filtering so stylization passes read exact texels.

use crate::error::PipelineError;

use super::device::GraphicsDevice;

/// Largest width or height accepted for any texture or render target.
///
/// A common `GL_MAX_TEXTURE_SIZE` on desktop and WebGL2 hardware. Keeps
/// every extent and byte length well inside `i32` and `usize`.
pub const MAX_TEXTURE_SIZE: u32 = 16_384;

/// Checks that `width` x `height` is non-zero and within [`MAX_TEXTURE_SIZE`].
///
/// # Errors
///
/// Returns `PipelineError::InvalidDimensions` naming `label` otherwise.
pub fn validate_extent(label: &str, width: u32, height: u32) -> Result<(), PipelineError> {
    if width == 0 || height == 0 || width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
        return Err(PipelineError::InvalidDimensions {
            label: label.to_string(),
            width,
            height,
        });
    }
    Ok(())
}

/// Internal storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Half-float RGBA, the format of every render target color buffer.
    Rgba16F,
    /// 8-bit normalized RGBA, used for uploaded images such as paper grain.
    Rgba8,
}

impl TextureFormat {
    /// Size of one texel of uploaded data in bytes.
    pub fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Rgba16F => 8,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Minification and magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Configuration for creating a GPU texture.
///
/// Wrapping is always clamp-to-edge on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    pub format: TextureFormat,
    pub filter: TextureFilter,
}

impl TextureConfig {
    /// Creates a config for an RGBA16F texture with NEAREST filtering.
    ///
    /// This is the color buffer format of every [`RenderTarget`](super::target::RenderTarget).
    pub fn rgba16f(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba16F,
            filter: TextureFilter::Nearest,
        }
    }

    /// Creates a config for an RGBA8 texture with LINEAR filtering.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            filter: TextureFilter::Linear,
        }
    }

    /// Number of bytes an upload for this config must contain, or `None`
    /// if that does not fit in `usize`.
    pub fn byte_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.format.bytes_per_texel())
    }
}

/// Creates a GPU texture from the given configuration.
///
/// With `data == None` storage is allocated but left uninitialized.
///
/// # Errors
///
/// Returns `PipelineError::InvalidDimensions` for a zero or oversized
/// config, `PipelineError::InvalidConfig` if `data` does not match
/// [`TextureConfig::byte_len`], and `PipelineError::ResourceCreation`
/// if the device fails to create the texture.
pub fn create_texture<D: GraphicsDevice>(
    device: &D,
    config: &TextureConfig,
    data: Option<&[u8]>,
) -> Result<D::Texture, PipelineError> {
    validate_extent("texture", config.width, config.height)?;

    if let Some(bytes) = data {
        let expected = config.byte_len().unwrap_or(usize::MAX);
        if bytes.len() != expected {
            return Err(PipelineError::InvalidConfig(format!(
                "texture upload has {} bytes, expected {expected}",
                bytes.len(),
            )));
        }
    }

    let texture = device
        .create_texture()
        .map_err(|reason| PipelineError::ResourceCreation {
            what: "texture".into(),
            reason,
        })?;
    device.texture_storage(texture, config, data);

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Command, RecordingDevice};

    #[test]
    fn rgba16f_uses_nearest_half_float() {
        let config = TextureConfig::rgba16f(1024, 768);
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert_eq!(config.format, TextureFormat::Rgba16F);
        assert_eq!(config.filter, TextureFilter::Nearest);
    }

    #[test]
    fn rgba8_uses_linear_filter() {
        let config = TextureConfig::rgba8(64, 32);
        assert_eq!(config.format, TextureFormat::Rgba8);
        assert_eq!(config.filter, TextureFilter::Linear);
    }

    #[test]
    fn byte_len_accounts_for_texel_size() {
        assert_eq!(TextureConfig::rgba8(4, 2).byte_len(), Some(32));
        assert_eq!(TextureConfig::rgba16f(4, 2).byte_len(), Some(64));
    }

    #[test]
    fn byte_len_is_none_when_it_overflows_usize() {
        assert_eq!(TextureConfig::rgba8(u32::MAX, u32::MAX).byte_len(), None);
    }

    #[test]
    fn validate_extent_accepts_up_to_max_texture_size() {
        assert!(validate_extent("t", 1, 1).is_ok());
        assert!(validate_extent("t", MAX_TEXTURE_SIZE, MAX_TEXTURE_SIZE).is_ok());
        assert!(matches!(
            validate_extent("wide", MAX_TEXTURE_SIZE + 1, 1),
            Err(PipelineError::InvalidDimensions { ref label, .. }) if label == "wide"
        ));
    }

    #[test]
    fn create_texture_rejects_oversized_config_without_gpu_calls() {
        let device = RecordingDevice::new();
        let config = TextureConfig::rgba8(4_000_000_000, 4_000_000_000);
        let result = create_texture(&device, &config, None);
        assert!(matches!(result, Err(PipelineError::InvalidDimensions { .. })));
        assert!(device.commands().is_empty());
    }

    #[test]
    fn create_texture_allocates_storage_with_config() {
        let device = RecordingDevice::new();
        let config = TextureConfig::rgba16f(16, 8);
        let texture = create_texture(&device, &config, None).unwrap();

        let commands = device.commands();
        assert_eq!(commands[0], Command::CreateTexture(texture));
        assert_eq!(
            commands[1],
            Command::TextureStorage {
                texture,
                config,
                uploaded: false
            }
        );
    }

    #[test]
    fn create_texture_rejects_zero_size() {
        let device = RecordingDevice::new();
        let result = create_texture(&device, &TextureConfig::rgba8(0, 4), None);
        assert!(matches!(result, Err(PipelineError::InvalidDimensions { .. })));
        assert!(device.commands().is_empty(), "no GPU call expected");
    }

    #[test]
    fn create_texture_rejects_mismatched_upload() {
        let device = RecordingDevice::new();
        let result = create_texture(&device, &TextureConfig::rgba8(2, 2), Some(&[0u8; 15]));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
        assert!(device.commands().is_empty(), "no GPU call expected");
    }

    #[test]
    fn create_texture_reports_device_failure() {
        let device = RecordingDevice::new();
        device.fail_texture_creation("out of memory");
        let result = create_texture(&device, &TextureConfig::rgba8(2, 2), None);
        match result {
            Err(PipelineError::ResourceCreation { reason, .. }) => {
                assert_eq!(reason, "out of memory");
            }
            other => panic!("expected ResourceCreation, got {other:?}"),
        }
    }

    #[test]
    fn texture_config_debug_format_is_readable() {
        let config = TextureConfig::rgba16f(100, 200);
        let debug = format!("{config:?}");
        assert!(debug.contains("100"), "missing width in debug: {debug}");
        assert!(debug.contains("200"), "missing height in debug: {debug}");
    }
}
