//! dirsort - sort the files of a directory into category subfolders
//!
//! This library classifies the regular files directly inside one directory by
//! extension, plans collision-free destination names in category folders
//! (`Images`, `Documents`, `Audio`, `Video`, `Archives`, `Code`, `Others`),
//! previews the plan and executes it once confirmed. Failures on single files
//! are recorded and reported without stopping the rest of the run.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod planner;
pub mod resolver;
pub mod workflow;

pub use config::{CompiledFilters, Config, ConfigError, Exclusion, FilterConfig};
pub use error::{FailureKind, FailureRecord, OrganizeError, OrganizeResult};
pub use file_category::{Category, CategoryMap};
pub use file_organizer::{
    CompletionStatus, ExecutionEvent, ExecutionResult, ExecutionSummary, FileOrganizer,
};
pub use planner::{MovePlan, plan};
pub use workflow::{
    AutoConfirm, Confirmation, WorkflowController, WorkflowOutcome, WorkflowState,
    organize_directory,
};
