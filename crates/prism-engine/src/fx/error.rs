use thiserror::Error;

use super::pass::PassSlot;

/// Pipeline configuration errors. All of them are detected before the first frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("pipeline has no passes")]
    Empty,

    #[error("pipeline must start with the scene pass, got {got:?}")]
    SceneNotFirst { got: PassSlot },

    #[error("pass {pass:?} was added twice")]
    DuplicatePass { pass: PassSlot },

    #[error("pass {pass:?} cannot follow {after:?}")]
    OutOfOrder { pass: PassSlot, after: PassSlot },

    #[error("pass {pass:?} is required but was not configured")]
    MissingPass { pass: PassSlot },

    #[error("pass {pass:?} has no value for uniform '{uniform}'")]
    MissingUniform { pass: PassSlot, uniform: &'static str },

    #[error("both a multisampled target and an antialias pass are configured")]
    DoubleAntialias,
}
