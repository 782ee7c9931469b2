//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Rendering the preview and asking for confirmation
//! - Driving execution with a progress bar
//! - The JSON report

use crate::config::Config;
use crate::file_organizer::ExecutionResult;
use crate::output::OutputFormatter;
use crate::planner::MovePlan;
use crate::workflow::{AutoConfirm, Confirmation, WorkflowController, WorkflowOutcome};
use clap::{ArgAction, Parser};
use indicatif::ProgressBar;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

/// Sort the files of a directory into category subfolders by extension.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Directory to organize (defaults to the configured path, then ~/Downloads)
    pub path: Option<PathBuf>,

    /// Only show the planned moves; change nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Execute without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print a JSON report instead of the human-readable listing
    #[arg(long)]
    pub json: bool,

    /// Configuration file to use instead of the default lookup
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Asks for confirmation on a line-based reader.
///
/// Only `yes`, in any case and surrounded by any whitespace, confirms.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt reading stdin and writing to stdout.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt reading stdin and writing to stderr.
    pub fn stdin_to_stderr() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmation for LinePrompt<R, W> {
    fn confirm(&mut self, plan: &MovePlan) -> bool {
        let _ = write!(
            self.output,
            "\nMove {} file(s) as shown above? Type 'yes' to proceed: ",
            plan.total_files()
        );
        let _ = self.output.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Runs one organization session for the parsed command line.
///
/// `confirmation` is consulted only when the plan has moves and neither
/// `--dry-run` nor `--yes` was given.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{Cli, LinePrompt, run_cli};
/// use dirsort::config::Config;
///
/// let cli = Cli { path: Some("/path/to/directory".into()), dry_run: true, ..Cli::default() };
/// match run_cli(&cli, &Config::default(), &mut LinePrompt::stdin()) {
///     Ok(outcome) => println!("{:?}", outcome),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    cli: &Cli,
    config: &Config,
    confirmation: &mut dyn Confirmation,
) -> Result<WorkflowOutcome, String> {
    let root = cli
        .path
        .clone()
        .or_else(|| config.default_root())
        .ok_or_else(|| "No directory given and no home directory found".to_string())?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let mut controller = WorkflowController::with_filters(root, filters);
    if !cli.json {
        OutputFormatter::info(&format!(
            "Previewing files in: {}",
            controller.root().display()
        ));
    }

    let mut auto = AutoConfirm;
    let gate: &mut dyn Confirmation = if cli.yes { &mut auto } else { confirmation };

    let mut plan_value = None;
    let mut progress: Option<ProgressBar> = None;
    let outcome = controller
        .run_with(
            cli.dry_run,
            gate,
            |plan| {
                if cli.json {
                    plan_value = Some(OutputFormatter::plan_json(plan));
                } else {
                    OutputFormatter::preview(plan);
                }
            },
            |event| {
                if !cli.json {
                    let pb = progress.get_or_insert_with(OutputFormatter::create_progress_bar);
                    OutputFormatter::track_progress(pb, event);
                }
            },
        )
        .map_err(|e| e.to_string())?;

    let result = match &outcome {
        WorkflowOutcome::NothingToDo => {
            if !cli.json {
                OutputFormatter::info("No files found to organize.");
            }
            None
        }
        WorkflowOutcome::Previewed { .. } => {
            if !cli.json {
                OutputFormatter::preview_notice("No files were modified.");
            }
            None
        }
        WorkflowOutcome::Cancelled => {
            if !cli.json {
                OutputFormatter::warning("Cancelled. No files were moved.");
            }
            None
        }
        WorkflowOutcome::Completed(result) => {
            info!(moved = result.moved_count(), failed = result.failed_count(), "run finished");
            if !cli.json {
                OutputFormatter::summary(result);
            }
            Some(result)
        }
    };
    print_report(plan_value, result)?;

    Ok(outcome)
}

fn print_report(
    plan_value: Option<Value>,
    result: Option<&ExecutionResult>,
) -> Result<(), String> {
    let Some(plan_value) = plan_value else {
        return Ok(());
    };
    let report = OutputFormatter::report_json(plan_value, result);
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Error serializing report: {}", e))?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn cli_for(path: &std::path::Path) -> Cli {
        Cli {
            path: Some(path.to_path_buf()),
            ..Cli::default()
        }
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["dirsort", "/tmp/x", "--dry-run", "--json", "-vv"]);
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/x")));
        assert!(cli.dry_run);
        assert!(cli.json);
        assert!(!cli.yes);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["dirsort", "-y", "-c", "conf.toml"]);
        assert!(cli.path.is_none());
        assert!(cli.yes);
        assert_eq!(cli.config, Some(PathBuf::from("conf.toml")));
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("yes\n"));
        assert!(is_yes("  YES \r\n"));
        assert!(is_yes("Yes"));
        assert!(!is_yes("y\n"));
        assert!(!is_yes("no\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("yes please"));
    }

    #[test]
    fn test_line_prompt() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.png"), "x").expect("Failed to write file");
        let mut controller = WorkflowController::new(temp_dir.path());
        let plan = controller.plan().expect("planning should succeed");

        let mut written = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("yes\n"), &mut written);
        assert!(prompt.confirm(plan));
        let text = String::from_utf8(written).expect("prompt should be utf-8");
        assert!(text.contains("Move 1 file(s)"));

        let mut prompt = LinePrompt::new(Cursor::new("nope\n"), Vec::new());
        assert!(!prompt.confirm(plan));

        // End of input cancels.
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        assert!(!prompt.confirm(plan));
    }

    #[test]
    fn test_run_cli_dry_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.png"), "x").expect("Failed to write file");
        let cli = Cli {
            dry_run: true,
            ..cli_for(temp_dir.path())
        };

        let mut never = |_: &MovePlan| -> bool { panic!("dry run must not ask") };
        let outcome = run_cli(&cli, &Config::default(), &mut never).expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::Previewed { total_files: 1 }));
        assert!(temp_dir.path().join("a.png").is_file());
    }

    #[test]
    fn test_run_cli_yes_skips_prompt() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.png"), "x").expect("Failed to write file");
        let cli = Cli {
            yes: true,
            ..cli_for(temp_dir.path())
        };

        let mut never = |_: &MovePlan| -> bool { panic!("--yes must not ask") };
        let outcome = run_cli(&cli, &Config::default(), &mut never).expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::Completed(_)));
        assert!(temp_dir.path().join("Images/a.png").is_file());
    }

    #[test]
    fn test_run_cli_declined() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.png"), "x").expect("Failed to write file");
        let cli = cli_for(temp_dir.path());

        let mut prompt = LinePrompt::new(Cursor::new("no\n"), Vec::new());
        let outcome = run_cli(&cli, &Config::default(), &mut prompt).expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::Cancelled));
        assert!(temp_dir.path().join("a.png").is_file());
        assert!(!temp_dir.path().join("Images").exists());
    }

    #[test]
    fn test_run_cli_shows_plan_before_asking() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.png"), "x").expect("Failed to write file");
        fs::write(temp_dir.path().join("b.zip"), "x").expect("Failed to write file");
        let cli = Cli {
            json: true,
            ..cli_for(temp_dir.path())
        };

        let mut asked = 0;
        let mut count_files = |plan: &MovePlan| {
            asked += 1;
            assert_eq!(plan.total_files(), 2);
            false
        };
        let outcome =
            run_cli(&cli, &Config::default(), &mut count_files).expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::Cancelled));
        assert_eq!(asked, 1);
        assert!(temp_dir.path().join("b.zip").is_file());
    }

    #[test]
    fn test_run_cli_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cli = cli_for(&temp_dir.path().join("missing"));

        let mut prompt = LinePrompt::new(Cursor::new("yes\n"), Vec::new());
        let err = run_cli(&cli, &Config::default(), &mut prompt).unwrap_err();
        assert!(err.contains("does not exist"), "{}", err);
    }

    #[test]
    fn test_run_cli_uses_configured_default_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("notes.txt"), "x").expect("Failed to write file");
        let config = Config::from_toml(&format!(
            "[organize]\ndefault_path = {:?}\n",
            temp_dir.path().to_string_lossy()
        ))
        .expect("config should parse");
        let cli = Cli {
            yes: true,
            ..Cli::default()
        };

        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        run_cli(&cli, &config, &mut prompt).expect("run should succeed");
        assert!(temp_dir.path().join("Documents/notes.txt").is_file());
    }
}
