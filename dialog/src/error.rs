//! Dialog engine errors.

use thiserror::Error;

/// Errors raised by the dialog engine and by dialog steps.
#[derive(Error, Debug)]
pub enum DialogError {
    /// A dialog was begun or replaced to that is not registered.
    #[error("unknown dialog: {0}")]
    UnknownDialog(String),

    /// A step prompted with a prompt that is not registered.
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),

    /// A dialog was registered without steps.
    #[error("dialog {0} has no steps")]
    EmptyDialog(String),

    /// A dialog name was registered twice.
    #[error("dialog {0} registered twice")]
    DuplicateDialog(String),

    /// A prompt name was registered twice.
    #[error("prompt {0} registered twice")]
    DuplicatePrompt(String),

    /// A step failed.
    #[error("step {step} of {dialog} failed: {message}")]
    Step {
        dialog: String,
        step: usize,
        message: String,
    },

    /// Step failure before the engine attached its position.
    #[error("{0}")]
    Failed(String),
}

impl DialogError {
    /// Creates a step failure from any displayable error.
    pub fn failed(err: impl std::fmt::Display) -> Self {
        DialogError::Failed(err.to_string())
    }

    /// Returns true for registration and wiring mistakes, as opposed to
    /// failures of a running step.
    pub fn is_programming_error(&self) -> bool {
        !matches!(self, DialogError::Step { .. } | DialogError::Failed(_))
    }
}

/// Result type alias for dialog operations.
pub type Result<T> = std::result::Result<T, DialogError>;
