//! `glow` backend for [`GraphicsDevice`].
//!
//! `GlowDevice` wraps a `glow::Context` and checks capabilities at
//! initialization. Render target color buffers are RGBA16F, which GLES
//! and WebGL2 contexts can only render into with `EXT_color_buffer_float`.

use glam::Vec3;
use glow::HasContext;

use crate::error::PipelineError;

use super::device::{gl_extent, Capability, FramebufferStatus, GraphicsDevice};
use super::texture::{TextureConfig, TextureFilter, TextureFormat};

/// Wraps a `glow::Context` with detected GPU capabilities.
///
/// Created once at initialization and handed to every pipeline call.
pub struct GlowDevice {
    gl: glow::Context,
    supports_color_buffer_float: bool,
}

impl GlowDevice {
    /// Wraps the given GL context, verifying float color buffer support.
    ///
    /// Desktop GL 3.0+ renders into float attachments natively; embedded
    /// contexts need `EXT_color_buffer_float`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingExtension` on an embedded context
    /// without the extension, since no render target could be completed.
    pub fn new(gl: glow::Context) -> Result<Self, PipelineError> {
        let extensions = gl.supported_extensions();
        let supports_color_buffer_float = !gl.version().is_embedded
            || extensions.contains("EXT_color_buffer_float")
            || extensions.contains("GL_EXT_color_buffer_float");

        if !supports_color_buffer_float {
            return Err(PipelineError::MissingExtension(
                "EXT_color_buffer_float".to_string(),
            ));
        }

        log::info!("GL context ready: {:?}", gl.version());

        Ok(Self {
            gl,
            supports_color_buffer_float,
        })
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying `glow::Context`.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }

    pub fn supports_color_buffer_float(&self) -> bool {
        self.supports_color_buffer_float
    }
}

/// GL internal format for a [`TextureFormat`].
pub fn internal_format(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Rgba16F => glow::RGBA16F,
        TextureFormat::Rgba8 => glow::RGBA8,
    }
}

/// GL pixel type used to upload data for a [`TextureFormat`].
pub fn pixel_type_for_format(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Rgba16F => glow::HALF_FLOAT,
        TextureFormat::Rgba8 => glow::UNSIGNED_BYTE,
    }
}

/// GL filter constant for a [`TextureFilter`].
pub fn filter_mode(filter: TextureFilter) -> u32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
    }
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
    }
}

impl GraphicsDevice for GlowDevice {
    type Texture = <glow::Context as HasContext>::Texture;
    type Framebuffer = <glow::Context as HasContext>::Framebuffer;
    type Program = <glow::Context as HasContext>::Program;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    #[allow(unsafe_code)]
    fn create_texture(&self) -> Result<Self::Texture, String> {
        // SAFETY: object creation on the context this device owns.
        unsafe { self.gl.create_texture() }
    }

    #[allow(unsafe_code)]
    fn texture_storage(&self, texture: Self::Texture, config: &TextureConfig, data: Option<&[u8]>) {
        let filter = filter_mode(config.filter) as i32;
        // SAFETY: `texture` comes from this context. `create_texture` has
        // checked that `data`, when present, holds exactly
        // `width * height` texels of `config.format`, so GL never reads past it.
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format(config.format) as i32,
                gl_extent(config.width),
                gl_extent(config.height),
                0,
                glow::RGBA,
                pixel_type_for_format(config.format),
                glow::PixelUnpackData::Slice(data),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    #[allow(unsafe_code)]
    fn delete_texture(&self, texture: Self::Texture) {
        // SAFETY: `texture` was created on this context and is not used again.
        unsafe { self.gl.delete_texture(texture) }
    }

    #[allow(unsafe_code)]
    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        // SAFETY: object creation on the context this device owns.
        unsafe { self.gl.create_framebuffer() }
    }

    #[allow(unsafe_code)]
    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>) {
        // SAFETY: `None` selects the default framebuffer; `Some` holds a
        // handle from this context.
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) }
    }

    #[allow(unsafe_code)]
    fn attach_color_texture(&self, texture: Self::Texture) {
        // SAFETY: attaches a texture from this context to the bound framebuffer.
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
        }
    }

    #[allow(unsafe_code)]
    fn draw_color_attachment_only(&self) {
        // SAFETY: the draw-buffer list is a valid one-element slice.
        unsafe { self.gl.draw_buffers(&[glow::COLOR_ATTACHMENT0]) }
    }

    #[allow(unsafe_code)]
    fn check_framebuffer_status(&self) -> FramebufferStatus {
        // SAFETY: a status query with no side effects.
        let status = unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(status)
        }
    }

    #[allow(unsafe_code)]
    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        // SAFETY: `framebuffer` was created on this context and is not used again.
        unsafe { self.gl.delete_framebuffer(framebuffer) }
    }

    #[allow(unsafe_code)]
    fn use_program(&self, program: Option<Self::Program>) {
        // SAFETY: programs are linked by the caller on this same context.
        unsafe { self.gl.use_program(program) }
    }

    #[allow(unsafe_code)]
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        // SAFETY: a name lookup on a program from this context.
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    #[allow(unsafe_code)]
    fn uniform_i32(&self, location: &Self::UniformLocation, value: i32) {
        // SAFETY: `location` was resolved for the program currently in use.
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    #[allow(unsafe_code)]
    fn uniform_f32(&self, location: &Self::UniformLocation, value: f32) {
        // SAFETY: `location` was resolved for the program currently in use.
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    #[allow(unsafe_code)]
    fn uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3) {
        // SAFETY: `location` was resolved for the program currently in use.
        unsafe {
            self.gl
                .uniform_3_f32(Some(location), value.x, value.y, value.z)
        }
    }

    #[allow(unsafe_code)]
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        // SAFETY: plain state setter; GL clamps oversized extents.
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    #[allow(unsafe_code)]
    fn set_capability(&self, capability: Capability, enabled: bool) {
        let cap = capability_enum(capability);
        // SAFETY: `cap` is one of the glow capability constants.
        unsafe {
            if enabled {
                self.gl.enable(cap);
            } else {
                self.gl.disable(cap);
            }
        }
    }

    #[allow(unsafe_code)]
    fn clear_color(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        // SAFETY: plain state setter.
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    #[allow(unsafe_code)]
    fn clear(&self) {
        // SAFETY: clears the bound framebuffer with a valid bitmask.
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        }
    }

    #[allow(unsafe_code)]
    fn active_texture(&self, unit: u32) {
        // SAFETY: units come from the per-pass allocator and start at 0.
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    #[allow(unsafe_code)]
    fn bind_texture(&self, texture: Option<Self::Texture>) {
        // SAFETY: `texture` is `None` or a handle from this context.
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    #[allow(unsafe_code)]
    fn draw_triangles(&self, first: i32, count: i32) {
        // SAFETY: a non-indexed draw; the fullscreen triangle reads no
        // vertex buffers.
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }
}
