//! Composite actions: dictate into the editor, capture a note

use crate::activation::Activator;
use crate::debug_log::debug_log;
use crate::dictation::DictationService;
use crate::editor::EditorClient;
use crate::events::WorkflowOutcome;
use crate::kwin::ScriptingEngine;
use crate::receiver::SignalBus;
use crate::script::MatchCriteria;

/// Bring the editor to the front, then start dictation into the active window.
///
/// `editor_title` is a case-insensitive title pattern, so `"emacs"` finds
/// `"init.el - GNU Emacs"`.
pub async fn start_listening<B, E, D>(
    activator: &Activator<B, E>,
    dictation: &D,
    editor_title: &str,
    action: &str,
) -> WorkflowOutcome
where
    B: SignalBus,
    E: ScriptingEngine,
    D: DictationService,
{
    let target = editor_title.to_string();
    let activated = match MatchCriteria::by_title(editor_title) {
        Ok(criteria) => activator.activate(&criteria).await,
        Err(_) => false,
    };
    if !activated {
        return WorkflowOutcome::ActivationFailed { target };
    }

    match dictation.invoke_action(action, "").await {
        Ok(()) => WorkflowOutcome::TranscriptionStarted,
        Err(e) => WorkflowOutcome::TranscriptionFailed {
            reason: e.to_string(),
        },
    }
}

/// Run the note capture command in the editor
pub async fn create_note(editor: &EditorClient, command: &str) -> WorkflowOutcome {
    match editor.eval(command).await {
        Ok(output) => WorkflowOutcome::NoteCreated { output },
        Err(e) => {
            debug_log("EDITOR", &format!("Note command failed: {}", e));
            WorkflowOutcome::NoteFailed {
                reason: e.to_string(),
            }
        }
    }
}
