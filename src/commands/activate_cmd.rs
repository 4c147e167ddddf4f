//! `summon activate`

use std::process::ExitCode;

use super::{exit_code, CommandContext};
use crate::activation::{connect_activator, ActivationOptions};
use crate::events::ActivationReport;
use crate::script::MatchCriteria;

pub async fn activate(
    ctx: &CommandContext,
    title: Option<&str>,
    class: Option<&str>,
    json: bool,
) -> ExitCode {
    let report = run_attempt(ctx, title, class).await;

    if json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Failed to serialize report: {}", e),
        }
    } else if let Some(error) = &report.error {
        eprintln!("Activation failed: {}", error);
    } else if report.found {
        println!("Activation successful");
    } else {
        println!("Activation failed");
    }

    exit_code(report.found)
}

async fn run_attempt(
    ctx: &CommandContext,
    title: Option<&str>,
    class: Option<&str>,
) -> ActivationReport {
    let describe = || format!("title={:?} class={:?}", title, class);

    let criteria = match MatchCriteria::new(title, class) {
        Ok(criteria) => criteria,
        Err(e) => return ActivationReport::failed(describe(), e.to_string()),
    };

    let options = ActivationOptions {
        signal_timeout: ctx.signal_timeout(),
        ..ActivationOptions::from_config(&ctx.config)
    };
    let activator = match connect_activator(options).await {
        Ok(activator) => activator,
        Err(e) => return ActivationReport::failed(criteria.to_string(), e.to_string()),
    };

    activator
        .try_activate(&criteria)
        .await
        .unwrap_or_else(|e| ActivationReport::failed(criteria.to_string(), e.to_string()))
}
