use clap::Parser;
use dirsort::cli::{Cli, LinePrompt, run_cli};
use dirsort::logging::init_logger;
use dirsort::output::OutputFormatter;
use dirsort::{CompletionStatus, Config, WorkflowOutcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::from(1);
        }
    };

    let _guard = init_logger(cli.verbose, config.organize.log_file.as_deref());

    // Keep stdout clean for the report in JSON mode.
    let result = if cli.json {
        run_cli(&cli, &config, &mut LinePrompt::stdin_to_stderr())
    } else {
        run_cli(&cli, &config, &mut LinePrompt::stdin())
    };

    match result {
        Ok(WorkflowOutcome::Completed(result)) => match result.status() {
            CompletionStatus::CompletedWithFailures { .. } | CompletionStatus::Aborted { .. } => {
                ExitCode::from(2)
            }
            _ => ExitCode::SUCCESS,
        },
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
