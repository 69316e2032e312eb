//! G-buffer handles produced by the geometry pass.

/// The four per-pixel channels written by the upstream geometry pass.
///
/// The geometry pass itself lives outside this crate; passes only ever
/// sample these textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GBuffer<T> {
    pub albedo: T,
    pub specular: T,
    pub normal: T,
    pub position: T,
    /// Width of every channel in pixels.
    pub width: u32,
    /// Height of every channel in pixels.
    pub height: u32,
}
