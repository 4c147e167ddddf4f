//! Typed errors for window activation
//!
//! Uses thiserror for derive macros that make error types that:
//! 1. Implement std::error::Error automatically
//! 2. Provide consistent, structured error messages
//! 3. Keep bus errors apart from "script ran but found nothing"

use thiserror::Error;

/// Main error type for activation attempts and their collaborators
#[derive(Error, Debug)]
pub enum ActivationError {
    /// Neither a window title nor a window class was supplied
    #[error("Must provide window_title or window_class")]
    MissingCriteria,

    /// Registering the callback service on the session bus failed
    #[error("Failed to publish D-Bus service: {0}")]
    PublishFailed(String),

    /// Writing the generated script to disk failed
    #[error("Failed to write script file: {0}")]
    ScriptWrite(#[from] std::io::Error),

    /// KWin refused the script or returned an unusable script id
    #[error("Failed to load script: {0}")]
    LoadFailed(String),

    /// Any session bus failure while talking to KWin
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// The activation flow panicked; teardown still ran
    #[error("Activation panicked: {0}")]
    Panicked(String),

    /// Configuration file error
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Dictation service call failed
    #[error("Dictation error: {0}")]
    Dictation(String),

    /// Editor command failed to spawn or exited non-zero
    #[error("Editor command failed: {0}")]
    EditorCommand(String),
}

/// Convert ActivationError to String for CLI display
impl From<ActivationError> for String {
    fn from(err: ActivationError) -> Self {
        err.to_string()
    }
}

/// Helper trait for converting Result<T, E> to Result<T, ActivationError>
pub trait ResultExt<T> {
    fn map_activation_err<F: FnOnce(String) -> ActivationError>(
        self,
        f: F,
    ) -> Result<T, ActivationError>;
}

impl<T, E: ToString> ResultExt<T> for Result<T, E> {
    fn map_activation_err<F: FnOnce(String) -> ActivationError>(
        self,
        f: F,
    ) -> Result<T, ActivationError> {
        self.map_err(|e| f(e.to_string()))
    }
}
