//! Light array upload.
//!
//! Shaders declare `uniform Light lights[MAX_LIGHTS]` and `uniform int lightCount`.
//! Each member is set through its own location (`lights[i].position`, ...),
//! so a program that ignores lighting simply receives nothing.

use aquarelle_core::{GraphicsDevice, UniformCache};

use crate::config::{Light, MAX_LIGHTS};

/// Uploads `lights` (capped at [`MAX_LIGHTS`]) and `lightCount`.
///
/// Returns the number of lights written.
pub fn upload_lights<D: GraphicsDevice>(
    device: &D,
    uniforms: &mut UniformCache<D>,
    lights: &[Light],
) -> usize {
    let count = lights.len().min(MAX_LIGHTS);
    uniforms.set_i32(device, "lightCount", count as i32);

    for (i, light) in lights.iter().take(count).enumerate() {
        uniforms.set_vec3(device, &format!("lights[{i}].position"), light.position);
        uniforms.set_vec3(device, &format!("lights[{i}].color"), light.color);
        uniforms.set_f32(device, &format!("lights[{i}].intensity"), light.intensity);
    }

    count
}
