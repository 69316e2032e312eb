//! Render-pass infrastructure.
//!
//! Everything here talks to the GPU through [`GraphicsDevice`], so the same
//! pass code runs against a live GL context ([`GlowDevice`], `render`
//! feature) or the headless [`RecordingDevice`].
//!
//! # Module overview
//!
//! - [`device`] -- The device trait and its small state enums.
//! - [`texture`] -- Texture configuration and creation helpers.
//! - [`target`] -- FBO + texture render targets.
//! - [`units`] -- Deterministic texture unit allocation.
//! - [`uniforms`] -- Per-program uniform location cache.
//! - [`pass`] -- One full-screen stage and its input payload.
//! - [`gbuffer`] -- G-buffer handles from the geometry pass.
//! - [`fullscreen`] -- Fullscreen triangle draw callback.
//! - [`recording`] -- Headless command-recording device.
//! - `context` -- `glow` backend (`render` feature).

#[cfg(feature = "render")]
pub mod context;
pub mod device;
pub mod fullscreen;
pub mod gbuffer;
pub mod pass;
pub mod recording;
pub mod target;
pub mod texture;
pub mod uniforms;
pub mod units;

// Re-export key types at the render module level for convenience.
#[cfg(feature = "render")]
pub use context::GlowDevice;
pub use device::{Capability, FramebufferStatus, GraphicsDevice};
pub use fullscreen::{fullscreen_triangle, FULLSCREEN_VERTEX_SHADER};
pub use gbuffer::GBuffer;
pub use pass::{CommonUniforms, DrawFn, InputSlot, Pass, PassInputs};
pub use recording::RecordingDevice;
pub use target::RenderTarget;
pub use texture::{
    create_texture, validate_extent, TextureConfig, TextureFilter, TextureFormat, MAX_TEXTURE_SIZE,
};
pub use uniforms::UniformCache;
pub use units::TextureUnitAllocator;
