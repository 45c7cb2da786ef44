// src/main.rs

use std::process::ExitCode;

use taskwatch::engine::TaskOutcome;
use taskwatch::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("taskwatch error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<ExitCode> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let code = match run(args).await? {
        // Watch sessions and dry runs end on request.
        None => ExitCode::SUCCESS,
        Some(TaskOutcome::Success) => ExitCode::SUCCESS,
        Some(TaskOutcome::Failed(code)) => match u8::try_from(code) {
            Ok(c) if c != 0 => ExitCode::from(c),
            _ => ExitCode::FAILURE,
        },
        Some(TaskOutcome::Cancelled) => ExitCode::FAILURE,
    };
    Ok(code)
}
