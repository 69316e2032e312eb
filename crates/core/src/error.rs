//! Error types for the aquarelle render-pass core.

use thiserror::Error;

/// Errors produced while building or sequencing a pass pipeline.
///
/// Everything here is a setup-time or contract failure. Per-frame binding
/// misses (a shader without a given sampler) are never errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Width or height was zero or above the maximum texture size.
    #[error("invalid dimensions for '{label}': {width}x{height} is empty or exceeds the maximum texture size")]
    InvalidDimensions {
        label: String,
        width: u32,
        height: u32,
    },

    /// The device refused to create a GPU object.
    #[error("failed to create {what}: {reason}")]
    ResourceCreation { what: String, reason: String },

    /// A render target's framebuffer did not report completeness.
    #[error("framebuffer for '{label}' is incomplete: status 0x{status:04X}")]
    IncompleteFramebuffer { label: String, status: u32 },

    /// A required GL extension is not available on this context.
    #[error("required extension {0} is not supported")]
    MissingExtension(String),

    /// A stage plan contained no stages.
    #[error("stage plan is empty")]
    EmptyPlan,

    /// Two stages (or a stage and an external source) share a name.
    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),

    /// A stage declared an input that is neither external nor an earlier stage.
    #[error("stage '{stage}' reads unknown input '{input}'")]
    UnknownInput { stage: String, input: String },

    /// A screen stage was followed by further stages.
    #[error("screen stage '{0}' must be the last stage in the plan")]
    ScreenStageNotLast(String),

    /// A stage tried to read the output of a stage that renders to the screen.
    #[error("stage '{stage}' reads screen stage '{input}', which produces no texture")]
    ReadsScreenStage { stage: String, input: String },

    /// The frame tracker saw a stage that is not part of the plan.
    #[error("stage '{0}' is not part of the plan")]
    UnknownStage(String),

    /// A stage executed before one of the inputs it consumed was produced this frame.
    #[error("stage '{stage}' consumed '{input}' before it was produced this frame")]
    InputNotProduced { stage: String, input: String },

    /// A stage executed twice in one frame, writing its target twice.
    #[error("stage '{0}' executed more than once in a single frame")]
    StageRepeated(String),

    /// A pipeline configuration value was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_includes_label_and_size() {
        let err = PipelineError::InvalidDimensions {
            label: "diffuse".into(),
            width: 0,
            height: 600,
        };
        let msg = format!("{err}");
        assert!(msg.contains("diffuse"), "missing label in: {msg}");
        assert!(msg.contains("0x600"), "missing size in: {msg}");
    }

    #[test]
    fn incomplete_framebuffer_formats_status_as_hex() {
        let err = PipelineError::IncompleteFramebuffer {
            label: "texture".into(),
            status: 0x8CD6,
        };
        let msg = format!("{err}");
        assert!(msg.contains("texture"), "missing label in: {msg}");
        assert!(msg.contains("0x8CD6"), "missing status in: {msg}");
    }

    #[test]
    fn unknown_input_names_stage_and_input() {
        let err = PipelineError::UnknownInput {
            stage: "lighting".into(),
            input: "bloom".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("lighting"), "missing stage in: {msg}");
        assert!(msg.contains("bloom"), "missing input in: {msg}");
    }

    #[test]
    fn input_not_produced_names_stage_and_input() {
        let err = PipelineError::InputNotProduced {
            stage: "texture".into(),
            input: "diffuse".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("texture") && msg.contains("diffuse"), "got: {msg}");
    }

    #[test]
    fn pipeline_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
    }

    #[test]
    fn pipeline_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<PipelineError>();
    }
}
