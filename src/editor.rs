//! Emacs command runner
//!
//! Evaluates an elisp expression through `emacsclient -e` and hands back
//! whatever the server printed.

use std::path::PathBuf;

use tokio::process::Command;

use crate::debug_log::debug_log;
use crate::error::{ActivationError, ResultExt};

pub const EMACSCLIENT: &str = "emacsclient";

/// Find a binary by checking common locations
/// Desktop launchers often start us without the user's shell PATH
fn find_binary(name: &str) -> Option<PathBuf> {
    let home = dirs::home_dir()?;

    let candidates = [
        home.join(".local/bin").join(name),
        PathBuf::from("/usr/local/bin").join(name),
        PathBuf::from("/usr/bin").join(name),
        PathBuf::from("/run/current-system/sw/bin").join(name),
    ];

    candidates.into_iter().find(|path| path.exists())
}

/// Resolve the program path - use absolute path if found, otherwise try as-is
pub fn resolve_program(program: &str) -> String {
    if program.starts_with('/') {
        return program.to_string();
    }

    if let Some(path) = find_binary(program) {
        return path.to_string_lossy().to_string();
    }

    // Fall back to the program name (will rely on PATH)
    program.to_string()
}

#[derive(Debug, Clone)]
pub struct EditorClient {
    program: String,
}

impl Default for EditorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorClient {
    pub fn new() -> Self {
        Self::with_program(&resolve_program(EMACSCLIENT))
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Run `<program> -e <command>` and return its stdout
    pub async fn eval(&self, command: &str) -> Result<String, ActivationError> {
        debug_log("EDITOR", &format!("Running: {} -e {}", self.program, command));

        let output = Command::new(&self.program)
            .arg("-e")
            .arg(command)
            .output()
            .await
            .map_activation_err(ActivationError::EditorCommand)?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug_log(
                "EDITOR",
                &format!("Error sending Emacs command: {:?} {}", output.status, stderr),
            );
            return Err(ActivationError::EditorCommand(if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(stdout)
    }
}
