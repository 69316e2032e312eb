//! A single full-screen render stage.
//!
//! A `Pass` owns one program (with its uniform cache), an optional
//! [`RenderTarget`], and a shared full-screen draw callback. [`Pass::execute`]
//! runs the fixed sequence:
//!
//! 1. use the program
//! 2. bind the owned target (viewport = target size) or the default
//!    framebuffer (viewport = payload size)
//! 3. disable depth test and blending
//! 4. clear
//! 5. bind payload inputs through a fresh [`TextureUnitAllocator`]
//! 6. run the payload's common-uniform hook with that same allocator
//! 7. draw
//! 8. rebind the default framebuffer
//! 9. return the owned target's texture, if any
//!
//! Nothing carries over between executions except the uniform cache: every
//! call rebinds its own program and restores the default framebuffer.

use std::rc::Rc;

use crate::error::PipelineError;

use super::device::{gl_extent, Capability, GraphicsDevice};
use super::gbuffer::GBuffer;
use super::target::RenderTarget;
use super::uniforms::UniformCache;
use super::units::TextureUnitAllocator;

/// Shared callback issuing the draw for a screen-covering primitive.
pub type DrawFn<D> = Rc<dyn Fn(&D)>;

/// Composer-supplied hook uploading cross-cutting uniforms (lights, feature
/// toggles). It receives the pass's program, uniform cache, and the same
/// allocator the pass used for its inputs, so further sampler binds continue
/// from the next free unit.
pub type CommonUniforms<'a, D> = &'a dyn Fn(
    &D,
    <D as GraphicsDevice>::Program,
    &mut UniformCache<D>,
    &mut TextureUnitAllocator,
);

/// Named inputs a pass may sample, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSlot {
    Albedo,
    Specular,
    Normal,
    Position,
    Paper,
    /// Output of the immediately preceding pass.
    Previous,
    /// Unprocessed output kept around for blending.
    Original,
}

impl InputSlot {
    pub const ALL: [InputSlot; 7] = [
        InputSlot::Albedo,
        InputSlot::Specular,
        InputSlot::Normal,
        InputSlot::Position,
        InputSlot::Paper,
        InputSlot::Previous,
        InputSlot::Original,
    ];

    /// Sampler uniform this slot binds to.
    pub fn uniform_name(self) -> &'static str {
        match self {
            InputSlot::Albedo => "gAlbedo",
            InputSlot::Specular => "gSpecular",
            InputSlot::Normal => "gNormal",
            InputSlot::Position => "gPosition",
            InputSlot::Paper => "paperTex",
            InputSlot::Previous => "inputTex",
            InputSlot::Original => "originalTex",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-invocation payload for [`Pass::execute`].
pub struct PassInputs<'a, D: GraphicsDevice> {
    /// Output width, used only by passes that render to the screen.
    pub width: u32,
    /// Output height, used only by passes that render to the screen.
    pub height: u32,
    slots: [Option<D::Texture>; InputSlot::ALL.len()],
    extra: Vec<(&'a str, D::Texture)>,
    common: Option<CommonUniforms<'a, D>>,
}

impl<'a, D: GraphicsDevice> PassInputs<'a, D> {
    /// Creates an empty payload for a `width` x `height` screen output.
    ///
    /// Extents beyond `i32::MAX` saturate when they reach the viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            slots: [None; InputSlot::ALL.len()],
            extra: Vec::new(),
            common: None,
        }
    }

    /// Supplies `texture` for `slot`, replacing any earlier one.
    pub fn with(mut self, slot: InputSlot, texture: D::Texture) -> Self {
        self.slots[slot.index()] = Some(texture);
        self
    }

    /// Like [`with`](Self::with), leaving the slot empty for `None`.
    pub fn with_optional(self, slot: InputSlot, texture: Option<D::Texture>) -> Self {
        match texture {
            Some(texture) => self.with(slot, texture),
            None => self,
        }
    }

    /// Supplies all four G-buffer channels.
    pub fn with_gbuffer(self, gbuffer: &GBuffer<D::Texture>) -> Self {
        self.with(InputSlot::Albedo, gbuffer.albedo)
            .with(InputSlot::Specular, gbuffer.specular)
            .with(InputSlot::Normal, gbuffer.normal)
            .with(InputSlot::Position, gbuffer.position)
    }

    /// Supplies a texture for an arbitrary sampler name, bound after the fixed slots.
    pub fn with_extra(mut self, uniform: &'a str, texture: D::Texture) -> Self {
        self.extra.push((uniform, texture));
        self
    }

    /// Installs the hook run after input binding, before the draw.
    pub fn with_common_uniforms(mut self, hook: CommonUniforms<'a, D>) -> Self {
        self.common = Some(hook);
        self
    }

    /// The texture supplied for `slot`, if any.
    pub fn get(&self, slot: InputSlot) -> Option<D::Texture> {
        self.slots[slot.index()]
    }
}

/// One render stage: program, optional owned target, shared draw callback.
pub struct Pass<D: GraphicsDevice> {
    name: String,
    uniforms: UniformCache<D>,
    target: Option<RenderTarget<D>>,
    draw: DrawFn<D>,
    clear_color: [f32; 4],
}

impl<D: GraphicsDevice> Pass<D> {
    /// Opaque white, the background every pass clears to unless overridden.
    pub const DEFAULT_CLEAR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// Creates a pass that renders into the default framebuffer.
    pub fn to_screen(name: &str, program: D::Program, draw: DrawFn<D>) -> Self {
        Self {
            name: name.to_string(),
            uniforms: UniformCache::new(program),
            target: None,
            draw,
            clear_color: Self::DEFAULT_CLEAR,
        }
    }

    /// Creates a pass rendering into its own `width` x `height` target.
    ///
    /// # Errors
    ///
    /// Propagates [`RenderTarget::new`] failures, labelled with `name`.
    pub fn offscreen(
        device: &D,
        name: &str,
        program: D::Program,
        width: u32,
        height: u32,
        draw: DrawFn<D>,
    ) -> Result<Self, PipelineError> {
        let target = RenderTarget::new(device, name, width, height)?;
        Ok(Self {
            name: name.to_string(),
            uniforms: UniformCache::new(program),
            target: Some(target),
            draw,
            clear_color: Self::DEFAULT_CLEAR,
        })
    }

    /// Overrides the color the destination is cleared to.
    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    /// Name used in logs and as the render target label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The program activated by [`execute`](Self::execute).
    pub fn program(&self) -> D::Program {
        self.uniforms.program()
    }

    /// The owned render target, or `None` for a screen pass.
    pub fn target(&self) -> Option<&RenderTarget<D>> {
        self.target.as_ref()
    }

    /// Texture this pass writes, or `None` for a screen pass.
    pub fn output(&self) -> Option<D::Texture> {
        self.target.as_ref().map(RenderTarget::texture)
    }

    /// Runs the pass once. Returns the owned target's texture, or `None`
    /// when the pass rendered to the screen.
    pub fn execute(&mut self, device: &D, inputs: &PassInputs<'_, D>) -> Option<D::Texture> {
        let program = self.uniforms.program();
        device.use_program(Some(program));

        match &self.target {
            Some(target) => target.bind(device),
            None => {
                device.bind_framebuffer(None);
                device.viewport(0, 0, gl_extent(inputs.width), gl_extent(inputs.height));
            }
        }

        device.set_capability(Capability::DepthTest, false);
        device.set_capability(Capability::Blend, false);

        device.clear_color(self.clear_color);
        device.clear();

        let mut units = TextureUnitAllocator::new();
        units.reset();
        for slot in InputSlot::ALL {
            if let Some(texture) = inputs.get(slot) {
                self.uniforms
                    .bind_sampler(device, &mut units, slot.uniform_name(), texture);
            }
        }
        for (uniform, texture) in &inputs.extra {
            self.uniforms
                .bind_sampler(device, &mut units, uniform, *texture);
        }

        if let Some(common) = inputs.common {
            common(device, program, &mut self.uniforms, &mut units);
        }

        log::debug!(
            "pass '{}': {} texture unit(s), target {}",
            self.name,
            units.next_unit(),
            if self.target.is_some() { "offscreen" } else { "screen" }
        );

        (self.draw)(device);

        device.bind_framebuffer(None);

        self.output()
    }

    /// Releases the owned render target, if any.
    pub fn destroy(self, device: &D) {
        if let Some(target) = self.target {
            target.destroy(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Command, ProgramId, RecordingDevice, TextureId};

    fn quad() -> DrawFn<RecordingDevice> {
        Rc::new(|device: &RecordingDevice| device.draw_triangles(0, 3))
    }

    fn viewports(commands: &[Command]) -> Vec<(i32, i32, i32, i32)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Viewport {
                    x,
                    y,
                    width,
                    height,
                } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect()
    }

    fn program(device: &RecordingDevice, uniforms: &[&str]) -> ProgramId {
        device.create_program(uniforms)
    }

    #[test]
    fn screen_pass_uses_payload_size_and_default_framebuffer() {
        let device = RecordingDevice::new();
        let mut pass = Pass::to_screen("lighting", program(&device, &[]), quad());

        let out = pass.execute(&device, &PassInputs::new(800, 600));
        assert_eq!(out, None);

        let commands = device.commands();
        assert_eq!(viewports(&commands), vec![(0, 0, 800, 600)]);
        assert_eq!(commands[1], Command::BindFramebuffer(None));
        assert!(commands.contains(&Command::DrawTriangles {
            first: 0,
            count: 3,
            framebuffer: None
        }));
    }

    #[test]
    fn offscreen_pass_uses_target_size_regardless_of_payload() {
        let device = RecordingDevice::new();
        let mut pass =
            Pass::offscreen(&device, "diffuse", program(&device, &[]), 512, 512, quad()).unwrap();
        let fbo = pass.target().unwrap().framebuffer();
        device.take_commands();

        let out = pass.execute(&device, &PassInputs::new(800, 600));
        assert_eq!(out, pass.output());
        assert!(out.is_some());

        let commands = device.commands();
        assert_eq!(viewports(&commands), vec![(0, 0, 512, 512)]);
        assert_eq!(commands[1], Command::BindFramebuffer(Some(fbo)));
        assert!(commands.contains(&Command::DrawTriangles {
            first: 0,
            count: 3,
            framebuffer: Some(fbo)
        }));
    }

    #[test]
    fn oversized_screen_payload_saturates_viewport() {
        let device = RecordingDevice::new();
        let mut pass = Pass::to_screen("lighting", program(&device, &[]), quad());

        pass.execute(&device, &PassInputs::new(3_000_000_000, 600));
        assert_eq!(viewports(&device.commands()), vec![(0, 0, i32::MAX, 600)]);
    }

    #[test]
    fn execute_runs_the_fixed_state_sequence() {
        let device = RecordingDevice::new();
        let prog = program(&device, &[]);
        let mut pass = Pass::to_screen("final", prog, quad()).with_clear_color([0.0, 0.0, 0.0, 1.0]);

        pass.execute(&device, &PassInputs::new(4, 4));
        assert_eq!(
            device.commands(),
            vec![
                Command::UseProgram(Some(prog)),
                Command::BindFramebuffer(None),
                Command::Viewport {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4
                },
                Command::SetCapability {
                    capability: Capability::DepthTest,
                    enabled: false
                },
                Command::SetCapability {
                    capability: Capability::Blend,
                    enabled: false
                },
                Command::ClearColor([0.0, 0.0, 0.0, 1.0]),
                Command::Clear,
                Command::DrawTriangles {
                    first: 0,
                    count: 3,
                    framebuffer: None
                },
                Command::BindFramebuffer(None),
            ]
        );
    }

    #[test]
    fn default_clear_is_opaque_white() {
        let device = RecordingDevice::new();
        let mut pass = Pass::to_screen("p", program(&device, &[]), quad());
        pass.execute(&device, &PassInputs::new(1, 1));
        assert!(device
            .commands()
            .contains(&Command::ClearColor([1.0, 1.0, 1.0, 1.0])));
    }

    #[test]
    fn missing_sampler_consumes_no_unit_and_is_never_referenced() {
        let device = RecordingDevice::new();
        let prog = program(&device, &["gAlbedo", "paperTex"]);
        let albedo = device.create_texture().unwrap();
        let specular = device.create_texture().unwrap();
        let paper = device.create_texture().unwrap();
        let mut pass = Pass::to_screen("texture", prog, quad());

        let inputs = PassInputs::new(64, 64)
            .with(InputSlot::Albedo, albedo)
            .with(InputSlot::Specular, specular)
            .with(InputSlot::Paper, paper);
        pass.execute(&device, &inputs);

        let bindings = device.sampler_bindings();
        let units: Vec<_> = bindings.iter().map(|b| b.unit).collect();
        assert_eq!(units, vec![0, 1]);
        assert_eq!(bindings[0].texture, albedo);
        assert_eq!(bindings[1].texture, paper);

        let commands = device.commands();
        assert!(!commands.iter().any(|c| c.references_uniform("gSpecular")));
        assert!(!commands.contains(&Command::BindTexture(Some(specular))));
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, Command::ActiveTexture(_)))
                .count(),
            2
        );
    }

    #[test]
    fn chained_pass_samples_previous_texture_not_framebuffer() {
        let device = RecordingDevice::new();
        let mut a = Pass::offscreen(&device, "a", program(&device, &[]), 32, 32, quad()).unwrap();
        let mut b = Pass::to_screen("b", program(&device, &["inputTex"]), quad());
        let ra_fbo = a.target().unwrap().framebuffer();

        let ta = a.execute(&device, &PassInputs::new(32, 32)).unwrap();
        device.take_commands();
        b.execute(&device, &PassInputs::new(32, 32).with(InputSlot::Previous, ta));

        let bindings = device.sampler_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "inputTex");
        assert_eq!(bindings[0].texture, ta);
        assert_ne!(bindings[0].texture.0, ra_fbo.0);
    }

    #[test]
    fn fixed_slots_bind_in_declaration_order_then_extras() {
        let device = RecordingDevice::new();
        let names = [
            "gAlbedo",
            "gSpecular",
            "gNormal",
            "gPosition",
            "paperTex",
            "inputTex",
            "originalTex",
            "bleedTex",
        ];
        let prog = program(&device, &names);
        let textures: Vec<TextureId> = (0..names.len())
            .map(|_| device.create_texture().unwrap())
            .collect();
        let mut pass = Pass::to_screen("all", prog, quad());

        // Supplied out of order on purpose.
        let inputs = PassInputs::new(8, 8)
            .with_extra("bleedTex", textures[7])
            .with(InputSlot::Original, textures[6])
            .with(InputSlot::Paper, textures[4])
            .with(InputSlot::Previous, textures[5])
            .with_gbuffer(&GBuffer {
                albedo: textures[0],
                specular: textures[1],
                normal: textures[2],
                position: textures[3],
                width: 8,
                height: 8,
            });
        pass.execute(&device, &inputs);

        let bound: Vec<_> = device
            .sampler_bindings()
            .into_iter()
            .map(|b| (b.name, b.unit, b.texture))
            .collect();
        let expected: Vec<_> = names
            .iter()
            .zip(&textures)
            .enumerate()
            .map(|(i, (n, t))| (n.to_string(), i as u32, *t))
            .collect();
        assert_eq!(bound, expected);
    }

    #[test]
    fn common_hook_runs_after_inputs_and_before_draw_with_shared_allocator() {
        let device = RecordingDevice::new();
        let prog = program(&device, &["gAlbedo", "lightRamp", "lightCount"]);
        let albedo = device.create_texture().unwrap();
        let ramp = device.create_texture().unwrap();
        let mut pass = Pass::to_screen("lighting", prog, quad());

        let hook = |device: &RecordingDevice,
                    program: ProgramId,
                    uniforms: &mut UniformCache<RecordingDevice>,
                    units: &mut TextureUnitAllocator| {
            assert_eq!(program, uniforms.program());
            assert_eq!(units.next_unit(), 1, "inputs must be bound before the hook");
            uniforms.set_i32(device, "lightCount", 2);
            uniforms.bind_sampler(device, units, "lightRamp", ramp);
        };
        let inputs = PassInputs::new(8, 8)
            .with(InputSlot::Albedo, albedo)
            .with_common_uniforms(&hook);
        pass.execute(&device, &inputs);

        let commands = device.commands();
        let bindings = device.sampler_bindings();
        assert_eq!(bindings[1].name, "lightRamp");
        assert_eq!(bindings[1].unit, 1);

        let count_at = commands
            .iter()
            .position(|c| c.references_uniform("lightCount"))
            .unwrap();
        let draw_at = commands
            .iter()
            .position(|c| matches!(c, Command::DrawTriangles { .. }))
            .unwrap();
        assert!(count_at < draw_at);
    }

    #[test]
    fn repeated_execution_restarts_units_at_zero() {
        let device = RecordingDevice::new();
        let prog = program(&device, &["gAlbedo"]);
        let albedo = device.create_texture().unwrap();
        let mut pass = Pass::to_screen("p", prog, quad());
        let inputs = PassInputs::new(8, 8).with(InputSlot::Albedo, albedo);

        pass.execute(&device, &inputs);
        pass.execute(&device, &inputs);

        let units: Vec<_> = device.sampler_bindings().iter().map(|b| b.unit).collect();
        assert_eq!(units, vec![0, 0]);
        // Locations are cached after the first execution.
        assert_eq!(device.lookups(), vec!["gAlbedo"]);
    }

    #[test]
    fn offscreen_construction_failure_propagates() {
        let device = RecordingDevice::new();
        device.force_incomplete_framebuffers(0x8CDD);
        let result = Pass::offscreen(&device, "diffuse", program(&device, &[]), 16, 16, quad());
        assert!(matches!(
            result,
            Err(PipelineError::IncompleteFramebuffer { ref label, .. }) if label == "diffuse"
        ));
    }

    #[test]
    fn destroy_releases_owned_target_only() {
        let device = RecordingDevice::new();
        let screen = Pass::to_screen("s", program(&device, &[]), quad());
        screen.destroy(&device);
        assert!(device.commands().is_empty());

        let offscreen =
            Pass::offscreen(&device, "o", program(&device, &[]), 4, 4, quad()).unwrap();
        device.take_commands();
        offscreen.destroy(&device);
        assert_eq!(device.commands().len(), 2);
    }
}
