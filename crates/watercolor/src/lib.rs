#![deny(unsafe_code)]
//! Watercolor composition for the aquarelle renderer.
//!
//! Chains three full-screen passes on top of an externally produced
//! G-buffer: a diffuse pass writing the pigment base layer, a texture pass
//! laying that layer onto procedural paper, and a lighting pass compositing
//! everything onto the screen. Configuration is plain JSON
//! ([`WatercolorConfig`]).

pub mod config;
pub mod lights;
pub mod paper;
pub mod pipeline;

pub use config::{Light, WatercolorConfig, MAX_LIGHTS};
pub use pipeline::{watercolor_plan, WatercolorPipeline, WatercolorPrograms};
