//! `summon script`

use std::process::ExitCode;

use super::CommandContext;
use crate::script::{KwinApi, MatchCriteria};

pub fn print_script(
    ctx: &CommandContext,
    title: Option<&str>,
    class: Option<&str>,
    plasma6: bool,
) -> ExitCode {
    match render(ctx, title, class, plasma6) {
        Ok(script) => {
            print!("{}", script);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn render(
    ctx: &CommandContext,
    title: Option<&str>,
    class: Option<&str>,
    plasma6: bool,
) -> Result<String, String> {
    let criteria = MatchCriteria::new(title, class)?;
    let api = if plasma6 {
        KwinApi::Plasma6
    } else {
        ctx.config.kwin_api()
    };
    Ok(criteria.script(api))
}
