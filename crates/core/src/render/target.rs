//! Render target (FBO + texture) for off-screen passes.
//!
//! A `RenderTarget` pairs a framebuffer object with an RGBA16F color
//! attachment. Each offscreen [`Pass`](super::pass::Pass) owns exactly one;
//! the texture is what later passes sample.

use crate::error::PipelineError;

use super::device::{gl_extent, FramebufferStatus, GraphicsDevice};
use super::texture::{create_texture, validate_extent, TextureConfig};

/// An off-screen render target consisting of a framebuffer object and
/// its attached RGBA16F color texture.
///
/// Dimensions are fixed at creation. There is no resize: a resolution
/// change rebuilds the pipeline that owns the target.
pub struct RenderTarget<D: GraphicsDevice> {
    label: String,
    fbo: D::Framebuffer,
    texture: D::Texture,
    width: u32,
    height: u32,
}

impl<D: GraphicsDevice> RenderTarget<D> {
    /// Creates a new render target with an RGBA16F texture at the given dimensions.
    ///
    /// Creates a framebuffer, attaches a new texture as color attachment 0,
    /// declares it as the only draw buffer, and verifies framebuffer
    /// completeness. Leaves the default framebuffer bound.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for a zero width or height or one above
    /// [`MAX_TEXTURE_SIZE`](super::texture::MAX_TEXTURE_SIZE),
    /// `ResourceCreation` naming `label` if a GPU object cannot be created, or
    /// `IncompleteFramebuffer` naming `label` if the attachment is rejected.
    /// No GPU objects survive a failed construction.
    pub fn new(device: &D, label: &str, width: u32, height: u32) -> Result<Self, PipelineError> {
        validate_extent(label, width, height)?;

        let texture = create_texture(device, &TextureConfig::rgba16f(width, height), None)
            .map_err(|e| match e {
                PipelineError::ResourceCreation { reason, .. } => PipelineError::ResourceCreation {
                    what: format!("color texture for '{label}'"),
                    reason,
                },
                other => other,
            })?;

        let fbo = match device.create_framebuffer() {
            Ok(fbo) => fbo,
            Err(reason) => {
                device.delete_texture(texture);
                return Err(PipelineError::ResourceCreation {
                    what: format!("framebuffer for '{label}'"),
                    reason,
                });
            }
        };

        device.bind_framebuffer(Some(fbo));
        device.attach_color_texture(texture);
        device.draw_color_attachment_only();
        let status = device.check_framebuffer_status();
        device.bind_framebuffer(None);

        if let FramebufferStatus::Incomplete(status) = status {
            device.delete_framebuffer(fbo);
            device.delete_texture(texture);
            return Err(PipelineError::IncompleteFramebuffer {
                label: label.to_string(),
                status,
            });
        }

        log::info!("created render target '{label}' ({width}x{height})");

        Ok(Self {
            label: label.to_string(),
            fbo,
            texture,
            width,
            height,
        })
    }

    /// Binds this render target's framebuffer as the active draw target
    /// and sets the viewport to match the texture dimensions.
    pub fn bind(&self, device: &D) {
        device.bind_framebuffer(Some(self.fbo));
        device.viewport(0, 0, gl_extent(self.width), gl_extent(self.height));
    }

    /// Returns the texture handle for sampling this render target.
    pub fn texture(&self) -> D::Texture {
        self.texture
    }

    /// Returns the framebuffer handle this target renders into.
    pub fn framebuffer(&self) -> D::Framebuffer {
        self.fbo
    }

    /// Returns the name used in logs and errors for this target.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the width of this render target in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of this render target in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Deletes the framebuffer and texture, releasing GPU resources.
    ///
    /// The GL context has no destructor for individual objects, so the
    /// owning pipeline calls this on teardown.
    pub fn destroy(self, device: &D) {
        device.delete_framebuffer(self.fbo);
        device.delete_texture(self.texture);
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for RenderTarget<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("label", &self.label)
            .field("fbo", &self.fbo)
            .field("texture", &self.texture)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
