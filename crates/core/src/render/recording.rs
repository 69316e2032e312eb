//! Headless device that records every command it receives.
//!
//! `RecordingDevice` implements [`GraphicsDevice`] without a GPU. Programs
//! are modelled as the set of uniform names they declare, so a pass can be
//! executed against any "shader shape" and the resulting command stream
//! inspected. Failures (texture or framebuffer creation, incomplete
//! framebuffers) can be injected to exercise setup error paths.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use glam::Vec3;

use super::device::{Capability, FramebufferStatus, GraphicsDevice};
use super::texture::TextureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Uniform location handed out by [`RecordingDevice`]: the owning program and the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformSlot {
    pub program: ProgramId,
    pub name: String,
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTexture(TextureId),
    TextureStorage {
        texture: TextureId,
        config: TextureConfig,
        uploaded: bool,
    },
    DeleteTexture(TextureId),
    CreateFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    AttachColorTexture {
        framebuffer: Option<FramebufferId>,
        texture: TextureId,
    },
    DrawColorAttachmentOnly,
    DeleteFramebuffer(FramebufferId),
    UseProgram(Option<ProgramId>),
    UniformI32 { name: String, value: i32 },
    UniformF32 { name: String, value: f32 },
    UniformVec3 { name: String, value: [f32; 3] },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    SetCapability { capability: Capability, enabled: bool },
    ClearColor([f32; 4]),
    Clear,
    ActiveTexture(u32),
    BindTexture(Option<TextureId>),
    DrawTriangles {
        first: i32,
        count: i32,
        framebuffer: Option<FramebufferId>,
    },
}

impl Command {
    /// Returns true if this command names the given uniform.
    pub fn references_uniform(&self, uniform: &str) -> bool {
        match self {
            Command::UniformI32 { name, .. }
            | Command::UniformF32 { name, .. }
            | Command::UniformVec3 { name, .. } => name == uniform,
            _ => false,
        }
    }
}

/// A sampler uniform pointed at a texture unit holding a texture, as
/// reconstructed from an `ActiveTexture` / `BindTexture` / `UniformI32` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerBinding {
    pub name: String,
    pub unit: u32,
    pub texture: TextureId,
}

#[derive(Default)]
struct State {
    commands: Vec<Command>,
    next_id: u32,
    programs: HashMap<ProgramId, HashSet<String>>,
    lookups: Vec<String>,
    bound_framebuffer: Option<FramebufferId>,
    texture_failure: Option<String>,
    framebuffer_failure: Option<String>,
    forced_status: Option<u32>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`GraphicsDevice`] that records commands instead of executing them.
#[derive(Default)]
pub struct RecordingDevice {
    state: RefCell<State>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a program declaring exactly the given uniforms.
    pub fn create_program(&self, uniforms: &[&str]) -> ProgramId {
        let mut state = self.state.borrow_mut();
        let id = ProgramId(state.next_id());
        state
            .programs
            .insert(id, uniforms.iter().map(|u| (*u).to_string()).collect());
        id
    }

    /// Makes every subsequent `create_texture` fail with `reason`.
    pub fn fail_texture_creation(&self, reason: &str) {
        self.state.borrow_mut().texture_failure = Some(reason.to_string());
    }

    /// Makes every subsequent `create_framebuffer` fail with `reason`.
    pub fn fail_framebuffer_creation(&self, reason: &str) {
        self.state.borrow_mut().framebuffer_failure = Some(reason.to_string());
    }

    /// Makes every subsequent completeness check report `status`.
    pub fn force_incomplete_framebuffers(&self, status: u32) {
        self.state.borrow_mut().forced_status = Some(status);
    }

    /// Snapshot of all commands recorded so far.
    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Returns the recorded commands and clears the log.
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Uniform names queried through `uniform_location`, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.state.borrow().lookups.clone()
    }

    /// Framebuffer currently bound for drawing (`None` is the default framebuffer).
    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.borrow().bound_framebuffer
    }

    /// Reconstructs sampler bindings from the recorded command stream.
    pub fn sampler_bindings(&self) -> Vec<SamplerBinding> {
        sampler_bindings(&self.state.borrow().commands)
    }

    fn record(&self, command: Command) {
        self.state.borrow_mut().commands.push(command);
    }
}

/// Extracts every `ActiveTexture(u)`, `BindTexture(Some(t))`, `UniformI32 { value: u }`
/// triple from `commands`.
pub fn sampler_bindings(commands: &[Command]) -> Vec<SamplerBinding> {
    commands
        .windows(3)
        .filter_map(|w| match w {
            [Command::ActiveTexture(unit), Command::BindTexture(Some(texture)), Command::UniformI32 { name, value }]
                if i64::from(*value) == i64::from(*unit) =>
            {
                Some(SamplerBinding {
                    name: name.clone(),
                    unit: *unit,
                    texture: *texture,
                })
            }
            _ => None,
        })
        .collect()
}

impl GraphicsDevice for RecordingDevice {
    type Texture = TextureId;
    type Framebuffer = FramebufferId;
    type Program = ProgramId;
    type UniformLocation = UniformSlot;

    fn create_texture(&self) -> Result<TextureId, String> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.texture_failure {
            return Err(reason.clone());
        }
        let id = TextureId(state.next_id());
        state.commands.push(Command::CreateTexture(id));
        Ok(id)
    }

    fn texture_storage(&self, texture: TextureId, config: &TextureConfig, data: Option<&[u8]>) {
        self.record(Command::TextureStorage {
            texture,
            config: *config,
            uploaded: data.is_some(),
        });
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(Command::DeleteTexture(texture));
    }

    fn create_framebuffer(&self) -> Result<FramebufferId, String> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.framebuffer_failure {
            return Err(reason.clone());
        }
        let id = FramebufferId(state.next_id());
        state.commands.push(Command::CreateFramebuffer(id));
        Ok(id)
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        let mut state = self.state.borrow_mut();
        state.bound_framebuffer = framebuffer;
        state.commands.push(Command::BindFramebuffer(framebuffer));
    }

    fn attach_color_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound_framebuffer;
        state
            .commands
            .push(Command::AttachColorTexture { framebuffer, texture });
    }

    fn draw_color_attachment_only(&self) {
        self.record(Command::DrawColorAttachmentOnly);
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        match self.state.borrow().forced_status {
            Some(status) => FramebufferStatus::Incomplete(status),
            None => FramebufferStatus::Complete,
        }
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        self.record(Command::DeleteFramebuffer(framebuffer));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(Command::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        let mut state = self.state.borrow_mut();
        state.lookups.push(name.to_string());
        let declared = state
            .programs
            .get(&program)
            .is_some_and(|uniforms| uniforms.contains(name));
        declared.then(|| UniformSlot {
            program,
            name: name.to_string(),
        })
    }

    fn uniform_i32(&self, location: &UniformSlot, value: i32) {
        self.record(Command::UniformI32 {
            name: location.name.clone(),
            value,
        });
    }

    fn uniform_f32(&self, location: &UniformSlot, value: f32) {
        self.record(Command::UniformF32 {
            name: location.name.clone(),
            value,
        });
    }

    fn uniform_vec3(&self, location: &UniformSlot, value: Vec3) {
        self.record(Command::UniformVec3 {
            name: location.name.clone(),
            value: value.to_array(),
        });
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Command::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.record(Command::SetCapability {
            capability,
            enabled,
        });
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(Command::ClearColor(rgba));
    }

    fn clear(&self) {
        self.record(Command::Clear);
    }

    fn active_texture(&self, unit: u32) {
        self.record(Command::ActiveTexture(unit));
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        self.record(Command::BindTexture(texture));
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound_framebuffer;
        state.commands.push(Command::DrawTriangles {
            first,
            count,
            framebuffer,
        });
    }
}
