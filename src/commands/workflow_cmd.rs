//! `summon listen` and `summon note`

use std::process::ExitCode;

use zbus::Connection;

use super::{exit_code, CommandContext};
use crate::activation::{ActivationOptions, Activator};
use crate::debug_log::debug_log;
use crate::dictation::SpeechNote;
use crate::editor::EditorClient;
use crate::events::WorkflowOutcome;
use crate::kwin::KWinScripting;
use crate::receiver::ZbusSignalBus;
use crate::workflow;

fn report(outcome: &WorkflowOutcome) -> ExitCode {
    if outcome.is_success() {
        println!("{}", outcome.message());
    } else {
        eprintln!("{}", outcome.message());
    }
    exit_code(outcome.is_success())
}

pub async fn listen(ctx: &CommandContext) -> ExitCode {
    let connection = match Connection::session().await {
        Ok(connection) => connection,
        Err(e) => {
            debug_log("ACTIVATE", &format!("Failed to connect to session bus: {}", e));
            return report(&WorkflowOutcome::ActivationFailed {
                target: ctx.config.editor_title.clone(),
            });
        }
    };

    let options = ActivationOptions {
        signal_timeout: ctx.signal_timeout(),
        ..ActivationOptions::from_config(&ctx.config)
    };
    let activator = Activator::new(
        ZbusSignalBus::new(connection.clone()),
        KWinScripting::new(connection.clone(), options.api),
        options,
    );
    let dictation = SpeechNote::new(connection);

    let outcome = workflow::start_listening(
        &activator,
        &dictation,
        &ctx.config.editor_title,
        &ctx.config.dictation_action,
    )
    .await;
    report(&outcome)
}

pub async fn note(ctx: &CommandContext, command: Option<&str>) -> ExitCode {
    let command = command.unwrap_or(ctx.config.note_command.as_str());
    let outcome = workflow::create_note(&EditorClient::new(), command).await;
    if let WorkflowOutcome::NoteCreated { output } = &outcome {
        let output = output.trim();
        if !output.is_empty() {
            debug_log("EDITOR", output);
        }
    }
    report(&outcome)
}
