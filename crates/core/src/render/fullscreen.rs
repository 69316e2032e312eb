//! Fullscreen triangle draw for post-processing passes.
//!
//! Passes take their draw as a shared callback. `fullscreen_triangle`
//! provides the usual one: a single oversized triangle whose positions
//! come from `gl_VertexID`, so no vertex buffer is involved. The host must
//! have an (empty) vertex array object bound, as core-profile GL requires.

use std::rc::Rc;

use super::device::GraphicsDevice;
use super::pass::DrawFn;

/// GLSL ES 3.0 vertex shader matching [`fullscreen_triangle`].
///
/// Emits `v_uv` in [0, 1] across the visible screen. Fragment shaders of
/// stylization passes sample their inputs at `v_uv`.
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"#version 300 es
out vec2 v_uv;
void main() {
    v_uv = vec2((gl_VertexID << 1) & 2, gl_VertexID & 2);
    gl_Position = vec4(v_uv * 2.0 - 1.0, 0.0, 1.0);
}
"#;

/// Returns a draw callback issuing one 3-vertex triangle.
pub fn fullscreen_triangle<D: GraphicsDevice + 'static>() -> DrawFn<D> {
    Rc::new(|device: &D| device.draw_triangles(0, 3))
}
