use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ActivationError, ResultExt};
use crate::script::KwinApi;
use crate::script_file::default_script_dir;
use crate::timeouts::{clamp_signal_timeout, SIGNAL_TIMEOUT_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_signal_timeout_ms")]
    pub signal_timeout_ms: u64,
    #[serde(default)]
    pub script_dir: Option<String>,
    /// Overrides detection from KDE_SESSION_VERSION
    #[serde(default)]
    pub kwin_api: Option<KwinApi>,
    #[serde(default = "default_editor_title")]
    pub editor_title: String,
    #[serde(default = "default_dictation_action")]
    pub dictation_action: String,
    #[serde(default = "default_note_command")]
    pub note_command: String,
}

fn default_signal_timeout_ms() -> u64 {
    SIGNAL_TIMEOUT_MS
}

fn default_editor_title() -> String {
    "emacs".to_string()
}

fn default_dictation_action() -> String {
    "start-listening-active-window".to_string()
}

fn default_note_command() -> String {
    "(org-roam-capture)".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signal_timeout_ms: default_signal_timeout_ms(),
            script_dir: None,
            kwin_api: None,
            editor_title: default_editor_title(),
            dictation_action: default_dictation_action(),
            note_command: default_note_command(),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("summon")
            .join("config.json")
    }

    pub fn load() -> Result<Self, ActivationError> {
        Self::load_from(&Self::path())
    }

    /// Read a config file. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ActivationError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_activation_err(|e| {
            ActivationError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_activation_err(|e| {
            ActivationError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn signal_timeout(&self) -> Duration {
        clamp_signal_timeout(self.signal_timeout_ms)
    }

    pub fn kwin_api(&self) -> KwinApi {
        self.kwin_api.unwrap_or_else(KwinApi::detect)
    }

    pub fn script_dir(&self) -> PathBuf {
        self.script_dir
            .as_ref()
            .map(|s| {
                if let Some(rest) = s.strip_prefix("~/") {
                    dirs::home_dir().unwrap_or_default().join(rest)
                } else {
                    PathBuf::from(s)
                }
            })
            .unwrap_or_else(default_script_dir)
    }
}
