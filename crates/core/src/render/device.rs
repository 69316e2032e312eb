//! The graphics device seam.
//!
//! `GraphicsDevice` is the narrow slice of an immediate-mode GL API that the
//! pass pipeline drives. [`GlowDevice`](super::context::GlowDevice) maps it
//! onto a live `glow::Context`; [`RecordingDevice`](super::recording::RecordingDevice)
//! logs every call for headless inspection and tests.
//!
//! Methods take `&self` like `glow::HasContext`: the GL context is a single
//! mutable global owned by the driver, not by Rust.

use std::fmt::Debug;

use glam::Vec3;

use super::texture::TextureConfig;

/// Fixed-function state toggled by passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Blend,
}

/// Result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// Incomplete, carrying the raw driver status code.
    Incomplete(u32),
}

/// Converts a pixel extent to the `i32` GL expects, saturating at `i32::MAX`.
///
/// The driver clamps viewports to `GL_MAX_VIEWPORT_DIMS` anyway; a wrapped
/// negative extent would be a GL error instead.
pub fn gl_extent(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Operations the render-pass core issues against the GPU.
pub trait GraphicsDevice {
    type Texture: Copy + Eq + Debug;
    type Framebuffer: Copy + Eq + Debug;
    type Program: Copy + Eq + Debug;
    type UniformLocation: Clone + Debug;

    /// Creates an empty texture object.
    fn create_texture(&self) -> Result<Self::Texture, String>;

    /// Configures sampling parameters and allocates 2D storage for `texture`,
    /// optionally uploading tightly packed pixel data. Leaves no texture bound.
    fn texture_storage(&self, texture: Self::Texture, config: &TextureConfig, data: Option<&[u8]>);

    fn delete_texture(&self, texture: Self::Texture);

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;

    /// Binds `framebuffer` as the draw target, or the default framebuffer for `None`.
    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);

    /// Attaches `texture` as color attachment 0 of the bound framebuffer.
    fn attach_color_texture(&self, texture: Self::Texture);

    /// Declares color attachment 0 as the only draw buffer of the bound framebuffer.
    fn draw_color_attachment_only(&self);

    fn check_framebuffer_status(&self) -> FramebufferStatus;

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    fn use_program(&self, program: Option<Self::Program>);

    /// Looks up a uniform by name. `None` means the program does not declare it
    /// (or the compiler stripped it as unused).
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    fn uniform_i32(&self, location: &Self::UniformLocation, value: i32);

    fn uniform_f32(&self, location: &Self::UniformLocation, value: f32);

    fn uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    fn set_capability(&self, capability: Capability, enabled: bool);

    fn clear_color(&self, rgba: [f32; 4]);

    /// Clears color and depth of the bound framebuffer.
    fn clear(&self);

    /// Makes texture unit `unit` (zero-based) the active unit.
    fn active_texture(&self, unit: u32);

    /// Binds a 2D texture to the active unit.
    fn bind_texture(&self, texture: Option<Self::Texture>);

    /// Draws `count` vertices as triangles starting at `first`.
    fn draw_triangles(&self, first: i32, count: i32);
}
