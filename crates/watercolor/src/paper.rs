//! Procedural watercolor paper.
//!
//! Paper grain is multi-octave Perlin noise plus a stretched high-frequency
//! term for fibers. The RGB channels hold a warm off-white paper tone that
//! darkens in the grain's valleys; alpha holds the normalized grain height,
//! which the texture stage uses to pool pigment.

use aquarelle_core::render::{create_texture, validate_extent, TextureConfig};
use aquarelle_core::{GraphicsDevice, PipelineError};
use noise::{NoiseFn, Perlin};

/// Octaves summed for the base grain.
const OCTAVES: usize = 4;
/// Frequency of the first octave, in cycles across the texture.
const BASE_FREQUENCY: f64 = 12.0;
/// Amplitude falloff per octave.
const PERSISTENCE: f64 = 0.5;
/// Horizontal stretch of the fiber term.
const FIBER_STRETCH: f64 = 6.0;
/// Weight of the fiber term relative to the grain.
const FIBER_WEIGHT: f64 = 0.15;
/// Brightest paper value (0-255).
const PAPER_WHITE: f64 = 250.0;
/// How far grain valleys darken the paper.
const GRAIN_DEPTH: f64 = 40.0;

/// Generates `width * height` RGBA8 texels of paper grain.
///
/// Output is deterministic for a given `(width, height, seed, scale)`.
///
/// # Errors
///
/// Returns `PipelineError::InvalidDimensions` for a zero size or one above
/// [`MAX_TEXTURE_SIZE`](aquarelle_core::MAX_TEXTURE_SIZE).
pub fn paper_grain(
    width: u32,
    height: u32,
    seed: u32,
    scale: f32,
) -> Result<Vec<u8>, PipelineError> {
    validate_extent("paper", width, height)?;
    let len = TextureConfig::rgba8(width, height).byte_len().ok_or(
        PipelineError::InvalidDimensions {
            label: "paper".into(),
            width,
            height,
        },
    )?;

    let noise = Perlin::new(seed);
    let fibers = Perlin::new(seed.wrapping_add(7919));
    let scale = f64::from(scale);
    let mut texels = Vec::with_capacity(len);

    for y in 0..height {
        let v = f64::from(y) / f64::from(height.max(1)) * scale;
        for x in 0..width {
            let u = f64::from(x) / f64::from(width.max(1)) * scale;

            let mut sum = 0.0;
            let mut amplitude = 1.0;
            let mut frequency = BASE_FREQUENCY;
            let mut norm = 0.0;
            for _ in 0..OCTAVES {
                sum += amplitude * noise.get([u * frequency, v * frequency]);
                norm += amplitude;
                amplitude *= PERSISTENCE;
                frequency *= 2.0;
            }
            let fiber = fibers.get([u * BASE_FREQUENCY * FIBER_STRETCH, v * BASE_FREQUENCY]);

            let grain = sum / norm + FIBER_WEIGHT * fiber;
            let height_value = (0.5 + 0.5 * grain).clamp(0.0, 1.0);

            let tone = PAPER_WHITE - GRAIN_DEPTH * (1.0 - height_value);
            let r = tone.round() as u8;
            let g = (tone - 3.0).round() as u8;
            let b = (tone - 10.0).round() as u8;
            let a = (height_value * 255.0).round() as u8;
            texels.extend_from_slice(&[r, g, b, a]);
        }
    }

    Ok(texels)
}

/// Generates a square paper texture and uploads it as linear-filtered RGBA8.
///
/// # Errors
///
/// Propagates size validation and texture creation failures.
pub fn upload_paper<D: GraphicsDevice>(
    device: &D,
    size: u32,
    seed: u32,
    scale: f32,
) -> Result<D::Texture, PipelineError> {
    let texels = paper_grain(size, size, seed, scale)?;
    let config = TextureConfig::rgba8(size, size);
    let texture = create_texture(device, &config, Some(texels.as_slice()))?;
    log::info!("uploaded {size}x{size} paper texture (seed {seed})");
    Ok(texture)
}
