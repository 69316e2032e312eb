//! JSON configuration for the watercolor pipeline.
//!
//! Every field has a default, so `{}` is a valid configuration. Values are
//! checked by [`WatercolorConfig::validate`] before any GPU object exists.

use aquarelle_core::{PipelineError, MAX_TEXTURE_SIZE};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Upper bound on lights uploaded to the lighting stage; matches the
/// fixed-size `lights[]` array the shaders declare.
pub const MAX_LIGHTS: usize = 8;

/// Default offscreen layer width in pixels.
const DEFAULT_WIDTH: u32 = 1024;
/// Default offscreen layer height in pixels.
const DEFAULT_HEIGHT: u32 = 768;
/// Default paper texture edge length in pixels.
const DEFAULT_PAPER_SIZE: u32 = 512;

/// A point light passed to the lighting stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 4.0, 2.0),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

/// Settings for [`WatercolorPipeline`](crate::WatercolorPipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatercolorConfig {
    /// Width of the diffuse and texture layers.
    pub width: u32,
    /// Height of the diffuse and texture layers.
    pub height: u32,
    /// Background every pass clears to.
    pub clear_color: [f32; 4],
    /// Run the diffuse and texture stages. When off, lighting reads the G-buffer only.
    pub stylize: bool,
    /// Generate and bind a paper grain texture.
    pub paper: bool,
    pub edge_darkening: bool,
    /// Edge length of the square paper texture.
    pub paper_size: u32,
    /// Paper grain frequency multiplier.
    pub paper_scale: f32,
    pub paper_seed: u32,
    /// Pigment concentration, 0 (clear water) to 1 (saturated).
    pub pigment_density: f32,
    pub lights: Vec<Light>,
}

impl Default for WatercolorConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            stylize: true,
            paper: true,
            edge_darkening: true,
            paper_size: DEFAULT_PAPER_SIZE,
            paper_scale: 1.0,
            paper_seed: 0,
            pigment_density: 0.6,
            lights: vec![Light::default()],
        }
    }
}

impl WatercolorConfig {
    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` on malformed JSON or a value
    /// rejected by [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidConfig(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`from_json`](Self::from_json) for an already parsed value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| PipelineError::InvalidConfig(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks sizes, light count, and scalar ranges.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let in_range = |v: u32| (1..=MAX_TEXTURE_SIZE).contains(&v);
        if !(in_range(self.width) && in_range(self.height)) {
            return Err(PipelineError::InvalidConfig(format!(
                "layer size must be within 1..={MAX_TEXTURE_SIZE}, got {}x{}",
                self.width, self.height
            )));
        }
        if self.paper && !in_range(self.paper_size) {
            return Err(PipelineError::InvalidConfig(format!(
                "paper_size must be within 1..={MAX_TEXTURE_SIZE} when paper is enabled, got {}",
                self.paper_size
            )));
        }
        if self.lights.len() > MAX_LIGHTS {
            return Err(PipelineError::InvalidConfig(format!(
                "at most {MAX_LIGHTS} lights are supported, got {}",
                self.lights.len()
            )));
        }
        if !(self.paper_scale.is_finite() && self.paper_scale > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "paper_scale must be positive, got {}",
                self.paper_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.pigment_density) {
            return Err(PipelineError::InvalidConfig(format!(
                "pigment_density must be in [0, 1], got {}",
                self.pigment_density
            )));
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "clear_color must be finite".into(),
            ));
        }
        for (i, light) in self.lights.iter().enumerate() {
            let finite = light.position.is_finite()
                && light.color.is_finite()
                && light.intensity.is_finite();
            if !finite {
                return Err(PipelineError::InvalidConfig(format!(
                    "light {i} has a non-finite component"
                )));
            }
        }
        Ok(())
    }
}
