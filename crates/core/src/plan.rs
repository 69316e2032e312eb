//! Stage descriptors for a fixed, hand-ordered pass sequence.
//!
//! A [`StagePlan`] is the declared shape of a pipeline: which stages exist,
//! in what order, what each reads and whether it writes a texture or the
//! screen. It is validated once when the pipeline is built. It does not
//! schedule anything; the composer still calls passes itself, in order.
//!
//! [`FrameTracker`] checks one frame's actual execution against the plan.
//! Composers run it in debug builds to catch out-of-order execution and a
//! target written twice in one frame.

use std::collections::HashSet;

use crate::error::PipelineError;

/// Where a stage's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutput {
    /// An owned offscreen texture later stages may read.
    Texture,
    /// The default framebuffer.
    Screen,
}

/// Declared name, inputs and output of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub name: String,
    /// Earlier stage names or external sources this stage may read.
    pub inputs: Vec<String>,
    pub output: StageOutput,
}

impl StageDescriptor {
    pub fn texture(name: &str, inputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            output: StageOutput::Texture,
        }
    }

    pub fn screen(name: &str, inputs: &[&str]) -> Self {
        Self {
            output: StageOutput::Screen,
            ..Self::texture(name, inputs)
        }
    }
}

/// A validated, ordered list of stages.
#[derive(Debug, Clone)]
pub struct StagePlan {
    externals: Vec<String>,
    stages: Vec<StageDescriptor>,
}

impl StagePlan {
    /// Validates `stages` against each other and the `externals` available
    /// every frame (e.g. `"gbuffer"`, `"paper"`).
    ///
    /// # Errors
    ///
    /// - `EmptyPlan` if there are no stages.
    /// - `DuplicateStage` if a name repeats (externals included).
    /// - `ReadsScreenStage` if an input names a screen stage.
    /// - `UnknownInput` if an input is neither external nor an earlier stage.
    /// - `ScreenStageNotLast` if a screen stage is followed by anything.
    ///
    /// Input checks run over every stage before the screen-placement check.
    pub fn new(externals: &[&str], stages: Vec<StageDescriptor>) -> Result<Self, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::EmptyPlan);
        }

        let mut known: HashSet<&str> = HashSet::new();
        for &external in externals {
            if !known.insert(external) {
                return Err(PipelineError::DuplicateStage(external.to_string()));
            }
        }

        let screens: HashSet<&str> = stages
            .iter()
            .filter(|s| s.output == StageOutput::Screen)
            .map(|s| s.name.as_str())
            .collect();

        for stage in &stages {
            for input in &stage.inputs {
                if screens.contains(input.as_str()) {
                    return Err(PipelineError::ReadsScreenStage {
                        stage: stage.name.clone(),
                        input: input.clone(),
                    });
                }
                if !known.contains(input.as_str()) {
                    return Err(PipelineError::UnknownInput {
                        stage: stage.name.clone(),
                        input: input.clone(),
                    });
                }
            }

            if !known.insert(stage.name.as_str()) {
                return Err(PipelineError::DuplicateStage(stage.name.clone()));
            }
        }

        // Reads are checked first so a stage consuming the screen gets the
        // more specific error.
        let last = stages.len() - 1;
        if let Some(screen) = stages[..last]
            .iter()
            .find(|s| s.output == StageOutput::Screen)
        {
            return Err(PipelineError::ScreenStageNotLast(screen.name.clone()));
        }

        Ok(Self {
            externals: externals.iter().map(|s| (*s).to_string()).collect(),
            stages,
        })
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn is_external(&self, name: &str) -> bool {
        self.externals.iter().any(|e| e == name)
    }

    /// Stage names in execution order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }
}

/// Records which stages ran in the current frame and checks each new one
/// against the plan.
#[derive(Debug, Default, Clone)]
pub struct FrameTracker {
    executed: Vec<String>,
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous frame.
    pub fn begin_frame(&mut self) {
        self.executed.clear();
    }

    /// Stages executed so far this frame, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Records that `stage` is about to execute reading `consumed`.
    ///
    /// `consumed` may be a subset of the declared inputs (a composer can
    /// skip optional stages), but every entry must be declared, and every
    /// non-external entry must already have executed this frame.
    ///
    /// # Errors
    ///
    /// `UnknownStage`, `StageRepeated`, `UnknownInput` (not declared by the
    /// stage) or `InputNotProduced`.
    pub fn record(
        &mut self,
        plan: &StagePlan,
        stage: &str,
        consumed: &[&str],
    ) -> Result<(), PipelineError> {
        let descriptor = plan
            .stage(stage)
            .ok_or_else(|| PipelineError::UnknownStage(stage.to_string()))?;

        if self.executed.iter().any(|s| s == stage) {
            return Err(PipelineError::StageRepeated(stage.to_string()));
        }

        for input in consumed {
            if !descriptor.inputs.iter().any(|i| i == input) {
                return Err(PipelineError::UnknownInput {
                    stage: stage.to_string(),
                    input: (*input).to_string(),
                });
            }
            if !plan.is_external(input) && !self.executed.iter().any(|s| s == input) {
                return Err(PipelineError::InputNotProduced {
                    stage: stage.to_string(),
                    input: (*input).to_string(),
                });
            }
        }

        self.executed.push(stage.to_string());
        Ok(())
    }
}
