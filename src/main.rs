use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    summon_lib::run().await
}
