//! Output formatting and styling module.
//!
//! Everything the terminal front end prints goes through here: colored status
//! lines, the plan preview, the progress bar, the final summary and the JSON
//! report.

use crate::error::FailureRecord;
use crate::file_organizer::{CompletionStatus, ExecutionEvent, ExecutionResult};
use crate::planner::{MovePlan, display_name};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a preview notice.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }

    /// Creates a progress bar measured in percent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar();
    /// pb.set_position(50);
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Feeds one execution event into the progress bar.
    pub fn track_progress(pb: &ProgressBar, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::Moved {
                final_name,
                percent,
                ..
            } => {
                pb.set_position(percent.round() as u64);
                pb.set_message(display_name(final_name));
            }
            ExecutionEvent::Failed { failure, .. } => {
                pb.println(format!("{} {}", "✗".red(), failure));
            }
            ExecutionEvent::FolderFailed { failure, .. } => {
                pb.println(format!("{} {}", "✗".red(), failure.reason));
            }
            ExecutionEvent::Aborted { failure } => {
                pb.println(format!("{} {}", "⚠".yellow(), failure.reason));
            }
            ExecutionEvent::FolderReady { .. } => {}
            ExecutionEvent::Finished(_) => pb.finish_and_clear(),
        }
    }

    /// Prints the planned moves, category by category.
    ///
    /// Renamed files are shown as `original -> new`.
    pub fn preview(plan: &MovePlan) {
        Self::header("Planned File Organization:");
        println!("Total files to be organized: {}", plan.total_files());

        for group in plan.categories() {
            let count = group.moves.len();
            println!(
                "\n{} ({} {}):",
                group.category.dir_name().bold(),
                count,
                if count == 1 { "file" } else { "files" }
            );
            for planned in &group.moves {
                if planned.is_renamed() {
                    println!(
                        "  - {} -> {}",
                        display_name(&planned.entry.name),
                        display_name(&planned.final_name).yellow()
                    );
                } else {
                    println!("  - {}", display_name(&planned.entry.name));
                }
            }
        }

        if !plan.failures().is_empty() {
            Self::header("Cannot be organized:");
            Self::failure_list(plan.failures());
        }
        if plan.excluded() > 0 {
            println!("\n{} file(s) excluded by filters.", plan.excluded());
        }
    }

    /// Prints the outcome of an execution.
    pub fn summary(result: &ExecutionResult) {
        Self::header("SUMMARY");
        println!("Attempted: {}", result.attempted());
        println!("Succeeded: {}", result.moved_count().to_string().green());
        println!("Failed:    {}", result.failed_count().to_string().red());

        if !result.failures.is_empty() {
            Self::failure_list(&result.failures);
        }
        if let Some(aborted) = &result.aborted {
            Self::warning(&format!("Stopped early: {}", aborted.reason));
        }

        match result.status() {
            CompletionStatus::NothingToDo => Self::info("Nothing to do."),
            CompletionStatus::Completed { moved } => {
                Self::success(&format!("Organized {} file(s).", moved))
            }
            CompletionStatus::CompletedWithFailures { moved, failed } => Self::warning(&format!(
                "Organized {} file(s); {} could not be organized.",
                moved, failed
            )),
            CompletionStatus::Aborted { moved, failed } => Self::warning(&format!(
                "Stopped after organizing {} file(s); {} could not be organized.",
                moved, failed
            )),
        }
    }

    fn failure_list(failures: &[FailureRecord]) {
        for failure in failures {
            eprintln!("  {} {}", "✗".red(), failure);
        }
    }

    /// Builds the JSON description of a plan.
    pub fn plan_json(plan: &MovePlan) -> Value {
        json!({
            "root": plan.root().to_string_lossy(),
            "total_files": plan.total_files(),
            "excluded": plan.excluded(),
            "categories": plan.categories().iter().map(|group| {
                json!({
                    "category": group.category.dir_name(),
                    "files": group.moves.iter().map(|planned| {
                        json!({
                            "original_name": display_name(&planned.entry.name),
                            "final_name": display_name(&planned.final_name),
                        })
                    }).collect::<Vec<_>>(),
                })
            }).collect::<Vec<_>>(),
            "failures": plan.failures(),
        })
    }

    /// Builds the JSON description of an execution result.
    pub fn result_json(result: &ExecutionResult) -> Value {
        let status = match result.status() {
            CompletionStatus::NothingToDo => "nothing_to_do",
            CompletionStatus::Completed { .. } => "completed",
            CompletionStatus::CompletedWithFailures { .. } => "completed_with_failures",
            CompletionStatus::Aborted { .. } => "aborted",
        };
        json!({
            "status": status,
            "summary": result.summary(),
            "moved": result.moved.iter().map(|done| {
                json!({
                    "category": done.category.dir_name(),
                    "original_name": display_name(&done.original_name),
                    "final_name": display_name(&done.final_name),
                })
            }).collect::<Vec<_>>(),
            "failures": result.failures,
            "aborted": result.aborted,
        })
    }

    /// Combines a plan and an optional result into a timestamped report.
    pub fn report_json(plan: Value, result: Option<&ExecutionResult>) -> Value {
        json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "plan": plan,
            "result": result.map(Self::result_json),
        })
    }
}
