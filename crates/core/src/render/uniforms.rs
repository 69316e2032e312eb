//! Per-program uniform location cache.
//!
//! Lookups go to the device once per name; absent uniforms are cached as
//! absent too. Every setter skips silently when the program does not
//! declare the uniform, the same capability rule the texture unit
//! allocator applies to samplers.

use std::collections::HashMap;

use glam::Vec3;

use super::device::GraphicsDevice;
use super::units::TextureUnitAllocator;

/// Cached uniform locations for one program.
pub struct UniformCache<D: GraphicsDevice> {
    program: D::Program,
    locations: HashMap<String, Option<D::UniformLocation>>,
}

impl<D: GraphicsDevice> UniformCache<D> {
    pub fn new(program: D::Program) -> Self {
        Self {
            program,
            locations: HashMap::new(),
        }
    }

    pub fn program(&self) -> D::Program {
        self.program
    }

    /// Returns the location of `name`, querying the device on first use.
    pub fn location(&mut self, device: &D, name: &str) -> Option<D::UniformLocation> {
        if let Some(cached) = self.locations.get(name) {
            return cached.clone();
        }
        let location = device.uniform_location(self.program, name);
        self.locations.insert(name.to_string(), location.clone());
        location
    }

    pub fn has_uniform(&mut self, device: &D, name: &str) -> bool {
        self.location(device, name).is_some()
    }

    /// Sets an `int` (or `bool`) uniform. Returns false if the program lacks it.
    pub fn set_i32(&mut self, device: &D, name: &str, value: i32) -> bool {
        self.location(device, name)
            .map(|loc| device.uniform_i32(&loc, value))
            .is_some()
    }

    pub fn set_bool(&mut self, device: &D, name: &str, value: bool) -> bool {
        self.set_i32(device, name, i32::from(value))
    }

    pub fn set_f32(&mut self, device: &D, name: &str, value: f32) -> bool {
        self.location(device, name)
            .map(|loc| device.uniform_f32(&loc, value))
            .is_some()
    }

    pub fn set_vec3(&mut self, device: &D, name: &str, value: Vec3) -> bool {
        self.location(device, name)
            .map(|loc| device.uniform_vec3(&loc, value))
            .is_some()
    }

    /// Binds `texture` to the sampler `name` through `units`.
    ///
    /// Returns the unit used, or `None` if the program has no such sampler.
    pub fn bind_sampler(
        &mut self,
        device: &D,
        units: &mut TextureUnitAllocator,
        name: &str,
        texture: D::Texture,
    ) -> Option<u32> {
        let location = self.location(device, name);
        let unit = units.bind(device, texture, location.as_ref());
        match unit {
            Some(unit) => log::trace!("bound sampler '{name}' to unit {unit}"),
            None => log::trace!("program has no sampler '{name}', skipped"),
        }
        unit
    }

    /// Number of distinct names looked up so far.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
