//! Execution of move plans.
//!
//! This module turns a [`MovePlan`] into filesystem changes: it creates the
//! category folders and moves each planned file to its resolved name. Failures
//! are isolated per file (and per category for folder creation), so one bad
//! file never aborts the batch.
//!
//! Execution is exposed as an iterator of [`ExecutionEvent`]s. Each call to
//! `next` performs at most one move, which gives callers a natural point to
//! render progress or stop between files.

use crate::error::{FailureRecord, OrganizeError};
use crate::file_category::Category;
use crate::planner::{CategoryPlan, MovePlan, PlannedMove};
use serde::Serialize;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file that was moved successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMove {
    pub category: Category,
    pub original_name: OsString,
    pub final_name: OsString,
}

/// Progress and outcome events emitted while executing a plan.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// A category folder is ready; `created` is false if it already existed.
    FolderReady {
        category: Category,
        path: PathBuf,
        created: bool,
    },
    /// A category folder could not be created; its files follow as failures.
    FolderFailed {
        category: Category,
        failure: FailureRecord,
    },
    /// A file was moved.
    Moved {
        category: Category,
        original_name: OsString,
        final_name: OsString,
        moved: usize,
        total: usize,
        /// `moved / total * 100`
        percent: f64,
    },
    /// A file could not be moved.
    Failed {
        category: Category,
        failure: FailureRecord,
    },
    /// Execution stopped early because the root directory vanished.
    Aborted { failure: FailureRecord },
    /// Always the last event.
    Finished(ExecutionSummary),
}

/// Counts reported with [`ExecutionEvent::Finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    pub total_planned: usize,
    pub moved: usize,
    pub failed: usize,
    pub aborted: bool,
}

/// How an execution ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The plan was empty.
    NothingToDo,
    /// Every file was moved.
    Completed { moved: usize },
    /// Some files could not be moved.
    CompletedWithFailures { moved: usize, failed: usize },
    /// The root vanished; files after the last attempt were left alone.
    Aborted { moved: usize, failed: usize },
}

/// The outcome of executing a plan.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Number of moves in the plan.
    pub total_planned: usize,
    /// Moves that succeeded, in execution order.
    pub moved: Vec<CompletedMove>,
    /// Per-file failures, including entries that could not be planned.
    pub failures: Vec<FailureRecord>,
    /// Set when execution stopped early.
    pub aborted: Option<FailureRecord>,
}

impl ExecutionResult {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Files that were attempted, successfully or not.
    pub fn attempted(&self) -> usize {
        self.moved_count() + self.failed_count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    pub fn status(&self) -> CompletionStatus {
        if self.total_planned == 0 && self.failures.is_empty() && self.aborted.is_none() {
            CompletionStatus::NothingToDo
        } else if self.aborted.is_some() {
            CompletionStatus::Aborted {
                moved: self.moved_count(),
                failed: self.failed_count(),
            }
        } else if self.failures.is_empty() {
            CompletionStatus::Completed {
                moved: self.moved_count(),
            }
        } else {
            CompletionStatus::CompletedWithFailures {
                moved: self.moved_count(),
                failed: self.failed_count(),
            }
        }
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            total_planned: self.total_planned,
            moved: self.moved_count(),
            failed: self.failed_count(),
            aborted: self.aborted.is_some(),
        }
    }
}

/// Executes move plans.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Starts executing `plan` under `root`, one event at a time.
    ///
    /// `root` must be the directory the plan was computed for.
    pub fn run(plan: MovePlan, root: &Path) -> ExecutionRun {
        ExecutionRun::new(plan, root)
    }

    /// Executes `plan` to completion.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::config::CompiledFilters;
    /// use dirsort::file_category::CategoryMap;
    /// use dirsort::file_organizer::FileOrganizer;
    /// use dirsort::planner::plan;
    /// use std::path::Path;
    ///
    /// let root = Path::new("/home/user/Downloads");
    /// let plan = plan(root, &CategoryMap::default(), &CompiledFilters::default())?;
    /// let result = FileOrganizer::execute(plan, root);
    /// println!("moved {} files", result.moved_count());
    /// # Ok::<(), dirsort::OrganizeError>(())
    /// ```
    pub fn execute(plan: MovePlan, root: &Path) -> ExecutionResult {
        Self::run(plan, root).into_result()
    }

    /// Executes `plan` to completion, passing every event to `on_event`.
    pub fn execute_with<F>(plan: MovePlan, root: &Path, mut on_event: F) -> ExecutionResult
    where
        F: FnMut(&ExecutionEvent),
    {
        let mut run = Self::run(plan, root);
        for event in run.by_ref() {
            on_event(&event);
        }
        run.result
    }
}

struct Cursor {
    category: Category,
    folder: PathBuf,
    moves: std::vec::IntoIter<PlannedMove>,
}

/// An in-progress execution. See [`FileOrganizer::run`].
pub struct ExecutionRun {
    root: PathBuf,
    groups: std::vec::IntoIter<CategoryPlan>,
    current: Option<Cursor>,
    pending: VecDeque<ExecutionEvent>,
    result: ExecutionResult,
    finished: bool,
}

impl ExecutionRun {
    fn new(plan: MovePlan, root: &Path) -> Self {
        let total_planned = plan.total_files();
        let (groups, failures) = plan.into_parts();

        info!(root = %root.display(), total = total_planned, "executing plan");

        Self {
            root: root.to_path_buf(),
            groups: groups.into_iter(),
            current: None,
            pending: VecDeque::new(),
            result: ExecutionResult {
                total_planned,
                failures,
                ..Default::default()
            },
            finished: false,
        }
    }

    /// Results so far.
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Runs the remaining moves and returns the final result.
    pub fn into_result(mut self) -> ExecutionResult {
        for _ in self.by_ref() {}
        self.result
    }

    /// Stops without performing any further moves.
    pub fn into_partial_result(self) -> ExecutionResult {
        self.result
    }

    fn open_category(&mut self, group: CategoryPlan) {
        if !self.root.is_dir() {
            let event = self.abort();
            self.pending.push_back(event);
            return;
        }

        let category = group.category;
        let folder = self.root.join(category.dir_name());
        let existed = folder.is_dir();

        match fs::create_dir_all(&folder) {
            Ok(()) => {
                if existed {
                    debug!(folder = %folder.display(), "category folder exists");
                } else {
                    info!(folder = %folder.display(), "created category folder");
                }
                self.pending.push_back(ExecutionEvent::FolderReady {
                    category,
                    path: folder.clone(),
                    created: !existed,
                });
                self.current = Some(Cursor {
                    category,
                    folder,
                    moves: group.moves.into_iter(),
                });
            }
            Err(e) => {
                let error = OrganizeError::FolderCreationFailed {
                    path: folder.clone(),
                    source: e,
                };
                warn!(error = %error, files = group.moves.len(), "skipping category");
                self.pending.push_back(ExecutionEvent::FolderFailed {
                    category,
                    failure: FailureRecord::new(folder.as_os_str(), &error),
                });
                for planned in group.moves {
                    let failure = FailureRecord::new(&planned.entry.name, &error);
                    self.result.failures.push(failure.clone());
                    self.pending
                        .push_back(ExecutionEvent::Failed { category, failure });
                }
            }
        }
    }

    fn abort(&mut self) -> ExecutionEvent {
        let error = OrganizeError::RootVanished {
            path: self.root.clone(),
        };
        warn!(error = %error, "stopping execution");
        self.groups = Vec::new().into_iter();
        self.current = None;

        let failure = FailureRecord::new(self.root.as_os_str(), &error);
        self.result.aborted = Some(failure.clone());
        ExecutionEvent::Aborted { failure }
    }

    fn process(
        &mut self,
        category: Category,
        planned: PlannedMove,
        destination: PathBuf,
    ) -> ExecutionEvent {
        let source = &planned.entry.path;
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "attempting move"
        );

        match move_planned(source, &destination) {
            Ok(()) => {
                self.result.moved.push(CompletedMove {
                    category,
                    original_name: planned.entry.name.clone(),
                    final_name: planned.final_name.clone(),
                });
                let moved = self.result.moved_count();
                let total = self.result.total_planned;
                let percent = moved as f64 / total as f64 * 100.0;
                info!(
                    source = %source.display(),
                    destination = %destination.display(),
                    progress = %format!("{:.1}%", percent),
                    "moved file"
                );
                ExecutionEvent::Moved {
                    category,
                    original_name: planned.entry.name,
                    final_name: planned.final_name,
                    moved,
                    total,
                    percent,
                }
            }
            // A vanished source may mean the whole root is gone.
            Err(OrganizeError::SourceVanished { .. }) if !self.root.is_dir() => self.abort(),
            Err(error) => {
                warn!(error = %error, "move failed");
                let failure = FailureRecord::new(&planned.entry.name, &error);
                self.result.failures.push(failure.clone());
                ExecutionEvent::Failed { category, failure }
            }
        }
    }
}

impl Iterator for ExecutionRun {
    type Item = ExecutionEvent;

    fn next(&mut self) -> Option<ExecutionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }

            if let Some(cursor) = self.current.as_mut() {
                match cursor.moves.next() {
                    Some(planned) => {
                        let category = cursor.category;
                        let destination = cursor.folder.join(&planned.final_name);
                        return Some(self.process(category, planned, destination));
                    }
                    None => {
                        self.current = None;
                        continue;
                    }
                }
            }

            match self.groups.next() {
                Some(group) => self.open_category(group),
                None => {
                    self.finished = true;
                    let summary = self.result.summary();
                    info!(
                        total = summary.total_planned,
                        moved = summary.moved,
                        failed = summary.failed,
                        aborted = summary.aborted,
                        "execution finished"
                    );
                    return Some(ExecutionEvent::Finished(summary));
                }
            }
        }
    }
}

/// Moves one file, refusing to overwrite.
///
/// The source is re-checked right before the move since the directory may
/// have changed after planning.
fn move_planned(source: &Path, destination: &Path) -> Result<(), OrganizeError> {
    match source.symlink_metadata() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OrganizeError::SourceVanished {
                path: source.to_path_buf(),
            });
        }
        _ => {}
    }

    let move_failed = |source_error: io::Error| OrganizeError::MoveFailed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error,
    };

    if destination.symlink_metadata().is_ok() {
        return Err(move_failed(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        )));
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(error = %e, "rename crosses devices, falling back to copy and remove");
            copy_then_remove(source, destination)
        }
        Err(e) => Err(move_failed(e)),
    }
}

/// Moves a regular file by copying it and removing the source.
///
/// Symlinks are refused since copying would replace the link with its
/// target. A failed copy removes whatever part of the destination was
/// written.
fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), OrganizeError> {
    let move_failed = |source_error: io::Error| OrganizeError::MoveFailed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error,
    };

    let metadata = source.symlink_metadata().map_err(move_failed)?;
    if metadata.file_type().is_symlink() {
        return Err(move_failed(io::Error::new(
            io::ErrorKind::CrossesDevices,
            "symbolic links are not copied across devices",
        )));
    }

    if let Err(e) = fs::copy(source, destination) {
        if let Err(cleanup) = fs::remove_file(destination)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(
                destination = %destination.display(),
                error = %cleanup,
                "could not remove partial copy"
            );
        }
        return Err(move_failed(e));
    }

    fs::remove_file(source).map_err(|e| {
        move_failed(io::Error::new(
            e.kind(),
            format!(
                "copied to {} but the source could not be removed, so the file now exists twice: {}",
                destination.display(),
                e
            ),
        ))
    })
}
