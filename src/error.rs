//! Error types for planning and executing file moves.
//!
//! Errors fall into two groups. Fatal errors (`PathNotFound`, `NotADirectory`,
//! `ReadDirFailed`, `RootVanished`) invalidate the whole operation. The rest
//! describe a single file or category and are recorded as [`FailureRecord`]s
//! while the batch carries on.

use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while planning or executing an organization run.
#[derive(Debug)]
pub enum OrganizeError {
    /// The root directory does not exist.
    PathNotFound { path: PathBuf },
    /// The root path exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// Listing the root directory failed.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Metadata for a single directory entry could not be read.
    EntryUnreadable {
        name: String,
        source: std::io::Error,
    },
    /// No free `{stem}_{counter}{ext}` name was found below the retry cap.
    DestinationExhausted { name: String, attempts: u32 },
    /// A category folder could not be created.
    FolderCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The source file disappeared between planning and execution.
    SourceVanished { path: PathBuf },
    /// The move primitive itself failed.
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The root directory disappeared while executing.
    RootVanished { path: PathBuf },
    /// A workflow step was requested from a state that does not allow it.
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

impl fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathNotFound { path } => {
                write!(f, "The path {} does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "The path {} is not a directory", path.display())
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::EntryUnreadable { name, source } => {
                write!(f, "Failed to read metadata of {}: {}", name, source)
            }
            Self::DestinationExhausted { name, attempts } => {
                write!(
                    f,
                    "No free destination name for {} after {} attempts",
                    name, attempts
                )
            }
            Self::FolderCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::SourceVanished { path } => {
                write!(f, "Source file {} no longer exists", path.display())
            }
            Self::MoveFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::RootVanished { path } => {
                write!(f, "Root directory {} vanished", path.display())
            }
            Self::InvalidState { action, state } => {
                write!(f, "Cannot {} while the workflow is {}", action, state)
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadDirFailed { source, .. }
            | Self::EntryUnreadable { source, .. }
            | Self::FolderCreationFailed { source, .. } => Some(source),
            Self::MoveFailed { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

impl OrganizeError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::PathNotFound { .. } => FailureKind::PathNotFound,
            Self::NotADirectory { .. } => FailureKind::NotADirectory,
            Self::ReadDirFailed { .. } => FailureKind::ReadDirFailed,
            Self::EntryUnreadable { .. } => FailureKind::EntryUnreadable,
            Self::DestinationExhausted { .. } => FailureKind::DestinationExhausted,
            Self::FolderCreationFailed { .. } => FailureKind::FolderCreationFailed,
            Self::SourceVanished { .. } => FailureKind::SourceVanished,
            Self::MoveFailed { .. } => FailureKind::MoveFailed,
            Self::RootVanished { .. } => FailureKind::RootVanished,
            Self::InvalidState { .. } => FailureKind::InvalidState,
        }
    }

    /// Returns true for errors that invalidate the whole operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound { .. }
                | Self::NotADirectory { .. }
                | Self::ReadDirFailed { .. }
                | Self::RootVanished { .. }
                | Self::InvalidState { .. }
        )
    }
}

/// Result type for organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Discriminant of [`OrganizeError`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    PathNotFound,
    NotADirectory,
    ReadDirFailed,
    EntryUnreadable,
    DestinationExhausted,
    FolderCreationFailed,
    SourceVanished,
    MoveFailed,
    RootVanished,
    InvalidState,
}

/// A recoverable failure attached to one file (or folder).
///
/// Carries the offending name and the cause string so a caller can render it
/// without holding on to the original `io::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Name of the file or folder that failed.
    pub name: String,
    pub kind: FailureKind,
    /// Human readable cause.
    pub reason: String,
}

impl FailureRecord {
    pub fn new(name: &OsStr, error: &OrganizeError) -> Self {
        Self {
            name: name.to_string_lossy().into_owned(),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}
