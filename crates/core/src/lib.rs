#![deny(unsafe_code)]
//! Render-pass core for the aquarelle stylized renderer.
//!
//! Provides offscreen `RenderTarget`s, the `TextureUnitAllocator` binding
//! protocol, the `Pass` abstraction that sequences one full-screen stage,
//! and `StagePlan`/`FrameTracker` for validating a fixed pass order. All
//! GPU access goes through the `GraphicsDevice` trait.

pub mod error;
pub mod plan;
pub mod render;

pub use error::PipelineError;
pub use plan::{FrameTracker, StageDescriptor, StageOutput, StagePlan};
pub use render::{
    fullscreen_triangle, CommonUniforms, DrawFn, GBuffer, GraphicsDevice, InputSlot, Pass,
    PassInputs, RecordingDevice, RenderTarget, TextureConfig, TextureUnitAllocator, UniformCache,
    MAX_TEXTURE_SIZE,
};

#[cfg(feature = "render")]
pub use render::GlowDevice;
