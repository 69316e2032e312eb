//! The watercolor pass chain.
//!
//! ```text
//! G-buffer --> diffuse --> texture --> lighting --> screen
//!    |            |           ^            ^
//!    |            +-----------|------------+  (originalTex)
//!    +------------------------|------------+  (gAlbedo, gSpecular, gNormal, gPosition)
//!                 paper ------+------------+  (paperTex)
//! ```
//!
//! `diffuse` writes the watercolor base layer from the G-buffer, `texture`
//! lays that layer onto paper, and `lighting` composites everything on the
//! screen. The order is fixed in [`WatercolorPipeline::render`]; the
//! [`StagePlan`] only documents and checks it.

use aquarelle_core::{
    DrawFn, FrameTracker, GBuffer, GraphicsDevice, InputSlot, Pass, PassInputs, PipelineError,
    StageDescriptor, StagePlan, TextureUnitAllocator, UniformCache,
};

use crate::config::WatercolorConfig;
use crate::lights::upload_lights;
use crate::paper::upload_paper;

pub const STAGE_DIFFUSE: &str = "diffuse";
pub const STAGE_TEXTURE: &str = "texture";
pub const STAGE_LIGHTING: &str = "lighting";

/// Per-frame source produced by the geometry pass.
pub const SOURCE_GBUFFER: &str = "gbuffer";
/// Paper texture generated at build time.
pub const SOURCE_PAPER: &str = "paper";

/// Programs for the three stages, compiled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatercolorPrograms<P> {
    pub diffuse: P,
    pub texture: P,
    pub lighting: P,
}

/// Declared shape of the watercolor chain.
pub fn watercolor_plan() -> Result<StagePlan, PipelineError> {
    StagePlan::new(
        &[SOURCE_GBUFFER, SOURCE_PAPER],
        vec![
            StageDescriptor::texture(STAGE_DIFFUSE, &[SOURCE_GBUFFER]),
            StageDescriptor::texture(STAGE_TEXTURE, &[STAGE_DIFFUSE, SOURCE_PAPER]),
            StageDescriptor::screen(
                STAGE_LIGHTING,
                &[SOURCE_GBUFFER, STAGE_TEXTURE, STAGE_DIFFUSE, SOURCE_PAPER],
            ),
        ],
    )
}

/// Owns every pass, target, and texture of the watercolor chain.
pub struct WatercolorPipeline<D: GraphicsDevice> {
    config: WatercolorConfig,
    programs: WatercolorPrograms<D::Program>,
    draw: DrawFn<D>,
    plan: StagePlan,
    tracker: FrameTracker,
    diffuse: Pass<D>,
    texture: Pass<D>,
    lighting: Pass<D>,
    paper: Option<D::Texture>,
}

impl<D: GraphicsDevice> WatercolorPipeline<D> {
    /// Validates `config`, allocates both offscreen layers and the paper
    /// texture, and wires the three passes.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or GPU setup error. Objects created
    /// before the failure are released.
    pub fn new(
        device: &D,
        programs: WatercolorPrograms<D::Program>,
        draw: DrawFn<D>,
        config: WatercolorConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let plan = watercolor_plan()?;
        let clear = config.clear_color;

        let diffuse = Pass::offscreen(
            device,
            STAGE_DIFFUSE,
            programs.diffuse,
            config.width,
            config.height,
            draw.clone(),
        )?
        .with_clear_color(clear);

        let texture = match Pass::offscreen(
            device,
            STAGE_TEXTURE,
            programs.texture,
            config.width,
            config.height,
            draw.clone(),
        ) {
            Ok(pass) => pass.with_clear_color(clear),
            Err(e) => {
                diffuse.destroy(device);
                return Err(e);
            }
        };

        let paper = if config.paper {
            match upload_paper(device, config.paper_size, config.paper_seed, config.paper_scale) {
                Ok(tex) => Some(tex),
                Err(e) => {
                    diffuse.destroy(device);
                    texture.destroy(device);
                    return Err(e);
                }
            }
        } else {
            None
        };

        let lighting = Pass::to_screen(STAGE_LIGHTING, programs.lighting, draw.clone())
            .with_clear_color(clear);

        if config.lights.is_empty() {
            log::warn!("watercolor pipeline built without lights; lighting will render unlit");
        }
        log::info!(
            "watercolor pipeline ready: {}x{} layers, stylize={}, paper={}",
            config.width,
            config.height,
            config.stylize,
            paper.is_some()
        );

        Ok(Self {
            config,
            programs,
            draw,
            plan,
            tracker: FrameTracker::new(),
            diffuse,
            texture,
            lighting,
            paper,
        })
    }

    pub fn config(&self) -> &WatercolorConfig {
        &self.config
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn paper(&self) -> Option<D::Texture> {
        self.paper
    }

    /// The diffuse layer texture (valid after the first stylized frame).
    pub fn diffuse_layer(&self) -> Option<D::Texture> {
        self.diffuse.output()
    }

    /// The paper-textured layer texture (valid after the first stylized frame).
    pub fn texture_layer(&self) -> Option<D::Texture> {
        self.texture.output()
    }

    /// Renders one frame to the default framebuffer at `screen_width` x `screen_height`.
    ///
    /// # Errors
    ///
    /// In debug builds, returns a `FrameTracker` error if the executed
    /// order diverges from the plan. Release builds never fail here.
    pub fn render(
        &mut self,
        device: &D,
        gbuffer: &GBuffer<D::Texture>,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<(), PipelineError> {
        let track = cfg!(debug_assertions);
        if track {
            self.tracker.begin_frame();
        }

        let config = &self.config;
        let paper = self.paper;
        let common = |device: &D,
                      _program: D::Program,
                      uniforms: &mut UniformCache<D>,
                      _units: &mut TextureUnitAllocator| {
            upload_lights(device, uniforms, &config.lights);
            uniforms.set_bool(device, "useWatercolor", config.stylize);
            uniforms.set_bool(device, "usePaper", paper.is_some());
            uniforms.set_bool(device, "useEdgeDarkening", config.edge_darkening);
            uniforms.set_f32(device, "paperScale", config.paper_scale);
            uniforms.set_f32(device, "pigmentDensity", config.pigment_density);
        };

        let mut diffuse_layer = None;
        let mut texture_layer = None;

        if config.stylize {
            if track {
                self.tracker
                    .record(&self.plan, STAGE_DIFFUSE, &[SOURCE_GBUFFER])?;
            }
            let inputs = PassInputs::new(gbuffer.width, gbuffer.height)
                .with_gbuffer(gbuffer)
                .with_common_uniforms(&common);
            diffuse_layer = self.diffuse.execute(device, &inputs);

            if track {
                let consumed: &[&str] = if paper.is_some() {
                    &[STAGE_DIFFUSE, SOURCE_PAPER]
                } else {
                    &[STAGE_DIFFUSE]
                };
                self.tracker.record(&self.plan, STAGE_TEXTURE, consumed)?;
            }
            let inputs = PassInputs::new(config.width, config.height)
                .with_optional(InputSlot::Previous, diffuse_layer)
                .with_optional(InputSlot::Paper, paper)
                .with_common_uniforms(&common);
            texture_layer = self.texture.execute(device, &inputs);
        }

        if track {
            let mut consumed = vec![SOURCE_GBUFFER];
            if texture_layer.is_some() {
                consumed.extend([STAGE_TEXTURE, STAGE_DIFFUSE]);
            }
            if paper.is_some() {
                consumed.push(SOURCE_PAPER);
            }
            self.tracker
                .record(&self.plan, STAGE_LIGHTING, &consumed)?;
        }
        let inputs = PassInputs::new(screen_width, screen_height)
            .with_gbuffer(gbuffer)
            .with_optional(InputSlot::Previous, texture_layer)
            .with_optional(InputSlot::Original, diffuse_layer)
            .with_optional(InputSlot::Paper, paper)
            .with_common_uniforms(&common);
        self.lighting.execute(device, &inputs);

        log::debug!(
            "watercolor frame rendered ({screen_width}x{screen_height}, stylize={})",
            config.stylize
        );
        Ok(())
    }

    /// Tears the pipeline down and builds it again with `config`, keeping
    /// the same programs and draw callback. This is how layer size changes
    /// are applied; render targets are never resized in place.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new). The old pipeline is released either way.
    pub fn rebuild(self, device: &D, config: WatercolorConfig) -> Result<Self, PipelineError> {
        let programs = self.programs;
        let draw = self.draw.clone();
        self.destroy(device);
        Self::new(device, programs, draw, config)
    }

    /// Releases both render targets and the paper texture.
    pub fn destroy(self, device: &D) {
        self.diffuse.destroy(device);
        self.texture.destroy(device);
        self.lighting.destroy(device);
        if let Some(paper) = self.paper {
            device.delete_texture(paper);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquarelle_core::plan::StageOutput;

    #[test]
    fn plan_orders_diffuse_texture_lighting() {
        let plan = watercolor_plan().unwrap();
        assert_eq!(
            plan.order().collect::<Vec<_>>(),
            vec![STAGE_DIFFUSE, STAGE_TEXTURE, STAGE_LIGHTING]
        );
        assert_eq!(
            plan.stage(STAGE_LIGHTING).unwrap().output,
            StageOutput::Screen
        );
    }

    #[test]
    fn plan_sources_are_external() {
        let plan = watercolor_plan().unwrap();
        assert!(plan.is_external(SOURCE_GBUFFER));
        assert!(plan.is_external(SOURCE_PAPER));
    }
}
