//! Preview-then-commit workflow.
//!
//! The [`WorkflowController`] holds the state of one organization session:
//!
//! ```text
//! Idle -> Planning -> Previewed -> Executing -> Done
//!                         \-> Cancelled
//! ```
//!
//! Execution always consumes the plan produced by the last planning step, so
//! the moves performed are exactly the moves that were previewed.

use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::CategoryMap;
use crate::file_organizer::{ExecutionEvent, ExecutionResult, FileOrganizer};
use crate::planner::{self, MovePlan};
use std::path::{Path, PathBuf};
use tracing::info;

/// The yes/no channel that gates execution after a preview.
pub trait Confirmation {
    /// Returns true to execute `plan`, false to cancel.
    fn confirm(&mut self, plan: &MovePlan) -> bool;
}

impl<F> Confirmation for F
where
    F: FnMut(&MovePlan) -> bool,
{
    fn confirm(&mut self, plan: &MovePlan) -> bool {
        self(plan)
    }
}

/// Confirms every plan without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&mut self, _plan: &MovePlan) -> bool {
        true
    }
}

/// State of a [`WorkflowController`].
#[derive(Debug)]
pub enum WorkflowState {
    Idle,
    Planning,
    Previewed(MovePlan),
    Executing,
    Done(ExecutionResult),
    Cancelled,
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Planning => "planning",
            WorkflowState::Previewed(_) => "previewed",
            WorkflowState::Executing => "executing",
            WorkflowState::Done(_) => "done",
            WorkflowState::Cancelled => "cancelled",
        }
    }
}

/// What a full [`WorkflowController::run`] ended with.
#[derive(Debug, Clone)]
pub enum WorkflowOutcome {
    /// The directory has no files to organize.
    NothingToDo,
    /// Preview only; nothing was changed.
    Previewed { total_files: usize },
    /// The user declined; nothing was changed.
    Cancelled,
    /// The plan was executed.
    Completed(ExecutionResult),
}

/// Drives planning, preview, confirmation and execution for one root.
#[derive(Debug)]
pub struct WorkflowController {
    root: PathBuf,
    map: CategoryMap,
    filters: CompiledFilters,
    state: WorkflowState,
}

impl WorkflowController {
    /// Creates an idle controller for `root` with the standard category map
    /// and no filters.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_filters(root, CompiledFilters::default())
    }

    /// Creates an idle controller that applies `filters` while planning.
    pub fn with_filters(root: impl Into<PathBuf>, filters: CompiledFilters) -> Self {
        Self {
            root: root.into(),
            map: CategoryMap::default(),
            filters,
            state: WorkflowState::Idle,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The plan awaiting confirmation, if any.
    pub fn preview(&self) -> Option<&MovePlan> {
        match &self.state {
            WorkflowState::Previewed(plan) => Some(plan),
            _ => None,
        }
    }

    /// The result of the last execution, if any.
    pub fn result(&self) -> Option<&ExecutionResult> {
        match &self.state {
            WorkflowState::Done(result) => Some(result),
            _ => None,
        }
    }

    /// Plans the root directory and moves to `Previewed`.
    ///
    /// Any earlier plan or result is discarded. On failure the controller
    /// returns to `Idle`.
    pub fn plan(&mut self) -> OrganizeResult<&MovePlan> {
        self.state = WorkflowState::Planning;

        let plan = match planner::plan(&self.root, &self.map, &self.filters) {
            Ok(plan) => plan,
            Err(e) => {
                self.state = WorkflowState::Idle;
                return Err(e);
            }
        };
        self.state = WorkflowState::Previewed(plan);

        self.preview().ok_or(OrganizeError::InvalidState {
            action: "plan",
            state: self.state.name(),
        })
    }

    /// Executes the previewed plan.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::InvalidState`] unless a plan is previewed.
    pub fn execute(&mut self) -> OrganizeResult<&ExecutionResult> {
        self.execute_with(|_| {})
    }

    /// Executes the previewed plan, passing every progress event to
    /// `on_event`.
    pub fn execute_with<F>(&mut self, on_event: F) -> OrganizeResult<&ExecutionResult>
    where
        F: FnMut(&ExecutionEvent),
    {
        let plan = self.take_preview("execute")?;
        self.state = WorkflowState::Executing;

        let result = FileOrganizer::execute_with(plan, &self.root, on_event);
        self.state = WorkflowState::Done(result);

        self.result().ok_or(OrganizeError::InvalidState {
            action: "execute",
            state: self.state.name(),
        })
    }

    /// Discards the previewed plan without touching the filesystem.
    pub fn decline(&mut self) -> OrganizeResult<()> {
        let plan = self.take_preview("cancel")?;
        info!(
            root = %self.root.display(),
            files = plan.total_files(),
            "organization cancelled"
        );
        self.state = WorkflowState::Cancelled;
        Ok(())
    }

    /// Runs the whole workflow: plan, then stop if `preview_only`, otherwise
    /// ask `confirmation` and execute or cancel.
    ///
    /// A directory with nothing to move and nothing failed ends as
    /// [`WorkflowOutcome::NothingToDo`] before `confirmation` is consulted.
    pub fn run<C, F>(
        &mut self,
        preview_only: bool,
        confirmation: &mut C,
        on_event: F,
    ) -> OrganizeResult<WorkflowOutcome>
    where
        C: Confirmation + ?Sized,
        F: FnMut(&ExecutionEvent),
    {
        self.run_with(preview_only, confirmation, |_| {}, on_event)
    }

    /// Like [`run`](Self::run), handing the fresh plan to `on_preview`
    /// before anything else happens with it.
    pub fn run_with<C, P, F>(
        &mut self,
        preview_only: bool,
        confirmation: &mut C,
        mut on_preview: P,
        on_event: F,
    ) -> OrganizeResult<WorkflowOutcome>
    where
        C: Confirmation + ?Sized,
        P: FnMut(&MovePlan),
        F: FnMut(&ExecutionEvent),
    {
        let plan = self.plan()?;
        on_preview(plan);

        if plan.is_empty() && plan.failures().is_empty() {
            return Ok(WorkflowOutcome::NothingToDo);
        }
        if preview_only {
            return Ok(WorkflowOutcome::Previewed {
                total_files: plan.total_files(),
            });
        }
        // Plans holding only failures are reported without asking.
        if !plan.is_empty() && !confirmation.confirm(plan) {
            self.decline()?;
            return Ok(WorkflowOutcome::Cancelled);
        }

        let result = self.execute_with(on_event)?;
        Ok(WorkflowOutcome::Completed(result.clone()))
    }

    fn take_preview(&mut self, action: &'static str) -> OrganizeResult<MovePlan> {
        match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Previewed(plan) => Ok(plan),
            other => {
                let state = other.name();
                self.state = other;
                Err(OrganizeError::InvalidState { action, state })
            }
        }
    }
}

/// Organizes `root` with default settings.
///
/// With `preview_only` the directory is only planned. Otherwise the plan is
/// confirmed automatically and executed.
///
/// # Examples
///
/// ```no_run
/// use dirsort::{WorkflowOutcome, organize_directory};
/// use std::path::Path;
///
/// match organize_directory(Path::new("/home/user/Downloads"), false)? {
///     WorkflowOutcome::Completed(result) => println!("moved {}", result.moved_count()),
///     other => println!("{:?}", other),
/// }
/// # Ok::<(), dirsort::OrganizeError>(())
/// ```
pub fn organize_directory(root: &Path, preview_only: bool) -> OrganizeResult<WorkflowOutcome> {
    WorkflowController::new(root).run(preview_only, &mut AutoConfirm, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::file_category::Category;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str) {
        fs::write(root.join(name), name).expect("Failed to write file");
    }

    #[test]
    fn test_starts_idle() {
        let controller = WorkflowController::new("/tmp/whatever");
        assert!(matches!(controller.state(), WorkflowState::Idle));
        assert!(controller.preview().is_none());
    }

    #[test]
    fn test_plan_failure_returns_to_idle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut controller = WorkflowController::new(temp_dir.path().join("missing"));

        let result = controller.plan();
        assert!(matches!(result, Err(OrganizeError::PathNotFound { .. })));
        assert!(matches!(controller.state(), WorkflowState::Idle));
    }

    #[test]
    fn test_execute_requires_preview() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut controller = WorkflowController::new(temp_dir.path());

        let result = controller.execute();
        assert!(matches!(
            result,
            Err(OrganizeError::InvalidState {
                action: "execute",
                state: "idle"
            })
        ));
        assert!(matches!(controller.decline(), Err(OrganizeError::InvalidState { .. })));
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.png");
        write(root, "b.txt");

        let mut controller = WorkflowController::new(root);
        let plan = controller.plan().expect("planning should succeed");
        assert_eq!(plan.total_files(), 2);

        assert!(matches!(controller.state(), WorkflowState::Previewed(_)));
        assert!(root.join("a.png").is_file());
        assert!(!root.join("Images").exists());
    }

    #[test]
    fn test_plan_and_execute_return_stored_state() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.png");

        let mut controller = WorkflowController::new(root);
        let planned: *const MovePlan = controller.plan().expect("planning should succeed");
        assert!(std::ptr::eq(planned, controller.preview().expect("plan is stored")));

        let executed: *const ExecutionResult =
            controller.execute().expect("execute should succeed");
        assert!(std::ptr::eq(executed, controller.result().expect("result is stored")));
        assert_eq!(controller.preview().map(MovePlan::total_files), None);
    }

    #[test]
    fn test_decline_cancels_without_mutation() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.png");

        let mut controller = WorkflowController::new(root);
        controller.plan().expect("planning should succeed");
        controller.decline().expect("decline should succeed");

        assert!(matches!(controller.state(), WorkflowState::Cancelled));
        assert!(root.join("a.png").is_file());
        assert!(!root.join("Images").exists());
        // Nothing left to execute after cancelling.
        assert!(controller.execute().is_err());
    }

    #[test]
    fn test_executes_exactly_the_previewed_plan() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Documents")).expect("Failed to create dir");
        write(root, "Documents/a.txt");
        write(root, "a.txt");
        write(root, "song.wav");
        write(root, "page.html");

        let mut controller = WorkflowController::new(root);
        let previewed: Vec<(Category, OsString, OsString)> = controller
            .plan()
            .expect("planning should succeed")
            .moves()
            .map(|m| (m.category, m.entry.name.clone(), m.final_name.clone()))
            .collect();

        let result = controller.execute().expect("execute should succeed");
        let executed: Vec<(Category, OsString, OsString)> = result
            .moved
            .iter()
            .map(|m| (m.category, m.original_name.clone(), m.final_name.clone()))
            .collect();

        assert_eq!(previewed, executed);
        assert!(root.join("Documents/a_1.txt").is_file());
        assert!(root.join("Code/page.html").is_file());
        assert!(matches!(controller.state(), WorkflowState::Done(_)));
        assert!(controller.result().is_some());
    }

    #[test]
    fn test_stale_plan_is_not_replanned() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.txt");

        let mut controller = WorkflowController::new(root);
        controller.plan().expect("planning should succeed");
        // A file appears after the preview; it must not be picked up.
        write(root, "late.txt");

        let result = controller.execute().expect("execute should succeed");
        assert_eq!(result.moved_count(), 1);
        assert!(root.join("late.txt").is_file());
    }

    #[test]
    fn test_run_preview_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.mp4");

        let outcome = organize_directory(root, true).expect("run should succeed");
        assert!(matches!(outcome, WorkflowOutcome::Previewed { total_files: 1 }));
        assert!(root.join("a.mp4").is_file());
    }

    #[test]
    fn test_run_nothing_to_do() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create dir");

        let outcome = organize_directory(temp_dir.path(), false).expect("run should succeed");
        assert!(matches!(outcome, WorkflowOutcome::NothingToDo));
    }

    #[test]
    fn test_run_declining_confirmation() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.rar");

        let mut asked = 0;
        let mut decline = |plan: &MovePlan| {
            asked += 1;
            assert_eq!(plan.total_files(), 1);
            false
        };
        let mut controller = WorkflowController::new(root);
        let outcome = controller
            .run(false, &mut decline, |_| {})
            .expect("run should succeed");

        assert_eq!(asked, 1);
        assert!(matches!(outcome, WorkflowOutcome::Cancelled));
        assert!(root.join("a.rar").is_file());
    }

    #[test]
    fn test_run_with_previews_before_confirming() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "a.mkv");
        write(root, "b.mkv");

        let steps = std::cell::RefCell::new(Vec::new());
        let mut confirm = |_: &MovePlan| {
            steps.borrow_mut().push("confirm".to_string());
            true
        };
        let mut controller = WorkflowController::new(root);
        let outcome = controller
            .run_with(
                false,
                &mut confirm,
                |plan| steps.borrow_mut().push(format!("preview {}", plan.total_files())),
                |event| {
                    if matches!(event, ExecutionEvent::Finished(_)) {
                        steps.borrow_mut().push("finished".to_string());
                    }
                },
            )
            .expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::Completed(_)));
        assert_eq!(steps.into_inner(), vec!["preview 2", "confirm", "finished"]);
    }

    #[test]
    fn test_run_with_previews_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut previewed = None;
        let outcome = WorkflowController::new(temp_dir.path())
            .run_with(
                false,
                &mut AutoConfirm,
                |plan| previewed = Some(plan.total_files()),
                |_| {},
            )
            .expect("run should succeed");

        assert!(matches!(outcome, WorkflowOutcome::NothingToDo));
        assert_eq!(previewed, Some(0));
    }

    #[test]
    fn test_run_confirmed_reports_failures() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(root, "keep.py");
        write(root, "gone.py");

        let mut confirm = |_: &MovePlan| {
            fs::remove_file(root.join("gone.py")).expect("Failed to delete file");
            true
        };
        let mut controller = WorkflowController::new(root);
        let outcome = controller
            .run(false, &mut confirm, |_| {})
            .expect("run should succeed");

        let WorkflowOutcome::Completed(result) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(result.moved_count(), 1);
        assert_eq!(result.failures[0].kind, FailureKind::SourceVanished);
        assert!(root.join("Code/keep.py").is_file());
    }
}
