use serde::Serialize;

use crate::activation_state::ActivationState;

/// Summary of one activation attempt, printed by `summon activate --json`
#[derive(Clone, Debug, Serialize)]
pub struct ActivationReport {
    pub criteria: String,
    pub found: bool,
    /// False when the deadline passed before the script called back
    pub signal_arrived: bool,
    pub states: Vec<ActivationState>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivationReport {
    pub fn failed(criteria: String, error: String) -> Self {
        Self {
            criteria,
            found: false,
            signal_arrived: false,
            states: Vec::new(),
            elapsed_ms: 0,
            error: Some(error),
        }
    }
}

/// Result of a composed workflow, with the message shown to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// The editor window could not be activated
    ActivationFailed { target: String },
    /// Dictation was started in the active window
    TranscriptionStarted,
    /// The dictation service call failed
    TranscriptionFailed { reason: String },
    /// The editor ran the note command
    NoteCreated { output: String },
    /// The editor command failed
    NoteFailed { reason: String },
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            WorkflowOutcome::TranscriptionStarted | WorkflowOutcome::NoteCreated { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            WorkflowOutcome::ActivationFailed { target } => {
                format!("Failed to activate {}", target)
            }
            WorkflowOutcome::TranscriptionStarted => "Transcription complete".to_string(),
            WorkflowOutcome::TranscriptionFailed { .. } => "Transcription failed".to_string(),
            WorkflowOutcome::NoteCreated { .. } => "Note created".to_string(),
            WorkflowOutcome::NoteFailed { .. } => "Failed to create note".to_string(),
        }
    }
}
