//! Command handlers for the `summon` CLI
//!
//! Commands are organized into feature-based modules:
//! - `activate_cmd` - One activation attempt with human or JSON output
//! - `script_cmd` - Print the generated KWin script without touching the bus
//! - `workflow_cmd` - Start dictation in the editor, capture a note

pub mod activate_cmd;
pub mod script_cmd;
pub mod workflow_cmd;

use std::process::ExitCode;
use std::time::Duration;

use crate::config::Config;
use crate::debug_log::debug_log;
use crate::timeouts::clamp_signal_timeout;

/// Config plus the CLI overrides that apply to every command
pub struct CommandContext {
    pub config: Config,
    pub timeout_override: Option<Duration>,
}

impl CommandContext {
    pub fn load(timeout_ms: Option<u64>) -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            debug_log("CONFIG", &format!("{}; using defaults", e));
            Config::default()
        });
        Self {
            config,
            timeout_override: timeout_ms.map(clamp_signal_timeout),
        }
    }

    pub fn signal_timeout(&self) -> Duration {
        self.timeout_override
            .unwrap_or_else(|| self.config.signal_timeout())
    }
}

pub(crate) fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
