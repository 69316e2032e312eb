//! Deterministic texture unit assignment for one pass execution.
//!
//! `TextureUnitAllocator` hands out units 0, 1, 2, ... to the binds that
//! actually happen. A bind whose sampler uniform is absent from the program
//! is skipped without touching GPU state or consuming a unit, which lets one
//! pass serve shader variants that declare different input sets.

use super::device::GraphicsDevice;

/// Counter mapping a sequence of sampler binds onto ascending texture units.
///
/// The invariant is that after any sequence of binds since the last
/// [`reset`](Self::reset), the consumed units are exactly `0..next_unit()`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextureUnitAllocator {
    next: u32,
}

impl TextureUnitAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes unit 0 the next unit handed out.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// The unit the next successful bind will use; equals the number of units consumed.
    pub fn next_unit(&self) -> u32 {
        self.next
    }

    /// Binds `texture` to the next free unit and points `location` at it.
    ///
    /// Returns the unit used, or `None` when `location` is absent, in which
    /// case no device call is made and no unit is consumed.
    pub fn bind<D: GraphicsDevice>(
        &mut self,
        device: &D,
        texture: D::Texture,
        location: Option<&D::UniformLocation>,
    ) -> Option<u32> {
        let location = location?;
        let unit = self.next;

        device.active_texture(unit);
        device.bind_texture(Some(texture));
        device.uniform_i32(location, unit as i32);

        self.next += 1;
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Command, RecordingDevice};

    #[test]
    fn new_starts_at_unit_zero() {
        assert_eq!(TextureUnitAllocator::new().next_unit(), 0);
    }

    #[test]
    fn bind_uses_active_texture_bind_and_sampler_uniform() {
        let device = RecordingDevice::new();
        let program = device.create_program(&["gAlbedo"]);
        let tex = device.create_texture().unwrap();
        let location = device.uniform_location(program, "gAlbedo");
        device.take_commands();

        let mut units = TextureUnitAllocator::new();
        assert_eq!(units.bind(&device, tex, location.as_ref()), Some(0));
        assert_eq!(
            device.commands(),
            vec![
                Command::ActiveTexture(0),
                Command::BindTexture(Some(tex)),
                Command::UniformI32 {
                    name: "gAlbedo".into(),
                    value: 0
                },
            ]
        );
        assert_eq!(units.next_unit(), 1);
    }

    #[test]
    fn absent_location_is_a_silent_no_op() {
        let device = RecordingDevice::new();
        let tex = device.create_texture().unwrap();
        device.take_commands();

        let mut units = TextureUnitAllocator::new();
        assert_eq!(units.bind(&device, tex, None), None);
        assert!(device.commands().is_empty());
        assert_eq!(units.next_unit(), 0);
    }

    #[test]
    fn skipped_bind_does_not_shift_later_units() {
        let device = RecordingDevice::new();
        let program = device.create_program(&["a", "c"]);
        let tex = device.create_texture().unwrap();

        let mut units = TextureUnitAllocator::new();
        let a = device.uniform_location(program, "a");
        let b = device.uniform_location(program, "b");
        let c = device.uniform_location(program, "c");
        assert_eq!(units.bind(&device, tex, a.as_ref()), Some(0));
        assert_eq!(units.bind(&device, tex, b.as_ref()), None);
        assert_eq!(units.bind(&device, tex, c.as_ref()), Some(1));
    }

    #[test]
    fn reset_without_binds_stays_at_zero_and_is_idempotent() {
        let mut once = TextureUnitAllocator::new();
        once.reset();
        let mut twice = TextureUnitAllocator::new();
        twice.reset();
        twice.reset();
        assert_eq!(once.next_unit(), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn reset_after_binds_restarts_at_zero() {
        let device = RecordingDevice::new();
        let program = device.create_program(&["a"]);
        let tex = device.create_texture().unwrap();
        let a = device.uniform_location(program, "a");

        let mut units = TextureUnitAllocator::new();
        units.bind(&device, tex, a.as_ref());
        units.bind(&device, tex, a.as_ref());
        units.reset();
        assert_eq!(units.bind(&device, tex, a.as_ref()), Some(0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn consumed_units_are_exactly_zero_to_k(present in prop::collection::vec(any::<bool>(), 0..32)) {
                let device = RecordingDevice::new();
                let program = device.create_program(&["present"]);
                let tex = device.create_texture().unwrap();

                let mut units = TextureUnitAllocator::new();
                units.reset();
                let consumed: Vec<u32> = present
                    .iter()
                    .filter_map(|&p| {
                        let name = if p { "present" } else { "absent" };
                        let location = device.uniform_location(program, name);
                        units.bind(&device, tex, location.as_ref())
                    })
                    .collect();

                let k = present.iter().filter(|&&p| p).count() as u32;
                prop_assert_eq!(consumed, (0..k).collect::<Vec<_>>());
                prop_assert_eq!(units.next_unit(), k);
            }
        }
    }
}
