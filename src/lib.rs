pub mod activation;
pub mod activation_state;
mod commands;
pub mod config;
pub mod debug_log;
pub mod dictation;
pub mod editor;
pub mod error;
pub mod events;
pub mod kwin;
pub mod receiver;
pub mod script;
pub mod script_file;
pub mod timeouts;
pub mod workflow;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::CommandContext;

pub use activation::{activate_window, Activator};
pub use error::ActivationError;
pub use script::MatchCriteria;

#[derive(Parser)]
#[command(name = "summon")]
#[command(about = "Activate a desktop window by title or class through KWin scripting")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Activate the first window matching a class or title pattern
    Activate {
        /// Case-insensitive regular expression matched against window titles
        #[arg(short, long)]
        title: Option<String>,
        /// Exact window class; takes precedence over --title
        #[arg(short, long)]
        class: Option<String>,
        /// How long to wait for the script's callback
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print a JSON report instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Print the KWin script that `activate` would load
    Script {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        class: Option<String>,
        /// Target the Plasma 6 scripting API
        #[arg(long)]
        plasma6: bool,
    },
    /// Activate the editor and start dictation into it
    Listen {
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Capture a note in the editor
    Note {
        /// Elisp to evaluate instead of the configured note command
        #[arg(long)]
        command: Option<String>,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Activate {
            title,
            class,
            timeout_ms,
            json,
        } => {
            let ctx = CommandContext::load(timeout_ms);
            commands::activate_cmd::activate(&ctx, title.as_deref(), class.as_deref(), json).await
        }
        CliCommand::Script {
            title,
            class,
            plasma6,
        } => {
            let ctx = CommandContext::load(None);
            commands::script_cmd::print_script(&ctx, title.as_deref(), class.as_deref(), plasma6)
        }
        CliCommand::Listen { timeout_ms } => {
            let ctx = CommandContext::load(timeout_ms);
            commands::workflow_cmd::listen(&ctx).await
        }
        CliCommand::Note { command } => {
            let ctx = CommandContext::load(None);
            commands::workflow_cmd::note(&ctx, command.as_deref()).await
        }
    }
}
