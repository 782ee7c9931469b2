//! Move planning.
//!
//! Scans the immediate entries of a root directory, classifies every plain
//! file and resolves a collision-free destination for it. Planning never
//! touches the filesystem beyond reading it.

use crate::config::CompiledFilters;
use crate::error::{FailureRecord, OrganizeError, OrganizeResult};
use crate::file_category::{Category, CategoryMap, split_name};
use crate::resolver::{DestinationResolver, PathProbe, RealFs};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One plain file found in the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name as found on disk.
    pub name: OsString,
    /// Name without its extension.
    pub stem: OsString,
    /// Extension including the leading dot, or empty.
    pub extension: OsString,
    /// Full path of the file.
    pub path: PathBuf,
}

impl FileEntry {
    /// Builds an entry from a path inside the root directory.
    ///
    /// Returns `None` for paths without a file name component.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_os_string();
        let (stem, extension) = split_name(&name);
        Some(Self {
            name,
            stem,
            extension,
            path,
        })
    }
}

/// A file and where it will go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub entry: FileEntry,
    pub category: Category,
    /// Collision-free name inside the category folder.
    pub final_name: OsString,
}

impl PlannedMove {
    /// Returns true if the file gets a suffixed name.
    pub fn is_renamed(&self) -> bool {
        self.entry.name != self.final_name
    }

    /// Full destination path under `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(self.category.dir_name()).join(&self.final_name)
    }
}

/// Planned moves for one category, in scan order.
#[derive(Debug, PartialEq, Eq)]
pub struct CategoryPlan {
    pub category: Category,
    pub moves: Vec<PlannedMove>,
}

/// The result of one planning pass.
///
/// A plan is produced fresh by [`plan`] and consumed once by the executor.
/// It deliberately does not implement `Clone`: running the same plan twice
/// would act on a stale view of the directory.
#[derive(Debug)]
pub struct MovePlan {
    root: PathBuf,
    categories: Vec<CategoryPlan>,
    failures: Vec<FailureRecord>,
    excluded: usize,
}

impl MovePlan {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            categories: Vec::new(),
            failures: Vec::new(),
            excluded: 0,
        }
    }

    /// Appends a move to its category, creating the category on first sight.
    fn push(&mut self, planned: PlannedMove) {
        match self
            .categories
            .iter_mut()
            .find(|group| group.category == planned.category)
        {
            Some(group) => group.moves.push(planned),
            None => self.categories.push(CategoryPlan {
                category: planned.category,
                moves: vec![planned],
            }),
        }
    }

    /// The directory this plan was computed for.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> &[CategoryPlan] {
        &self.categories
    }

    /// All planned moves, category by category.
    pub fn moves(&self) -> impl Iterator<Item = &PlannedMove> {
        self.categories.iter().flat_map(|group| group.moves.iter())
    }

    /// Total number of planned moves.
    pub fn total_files(&self) -> usize {
        self.categories.iter().map(|group| group.moves.len()).sum()
    }

    /// True if nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Entries that could not be planned.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Number of files skipped by configured filters.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    pub(crate) fn into_parts(self) -> (Vec<CategoryPlan>, Vec<FailureRecord>) {
        (self.categories, self.failures)
    }
}

/// Plans the organization of `root` using the real filesystem.
///
/// # Errors
///
/// Returns [`OrganizeError::PathNotFound`] or [`OrganizeError::NotADirectory`]
/// if the root is unusable, and [`OrganizeError::ReadDirFailed`] if it cannot
/// be listed. Problems with single entries are recorded in the plan instead.
///
/// # Examples
///
/// ```no_run
/// use dirsort::config::CompiledFilters;
/// use dirsort::file_category::CategoryMap;
/// use dirsort::planner::plan;
/// use std::path::Path;
///
/// let plan = plan(
///     Path::new("/home/user/Downloads"),
///     &CategoryMap::default(),
///     &CompiledFilters::default(),
/// )?;
/// println!("{} files to organize", plan.total_files());
/// # Ok::<(), dirsort::OrganizeError>(())
/// ```
pub fn plan(
    root: &Path,
    map: &CategoryMap,
    filters: &CompiledFilters,
) -> OrganizeResult<MovePlan> {
    plan_with_probe(root, map, filters, RealFs)
}

/// Plans the organization of `root`, checking destination occupancy through
/// `probe`.
pub fn plan_with_probe<P: PathProbe>(
    root: &Path,
    map: &CategoryMap,
    filters: &CompiledFilters,
    probe: P,
) -> OrganizeResult<MovePlan> {
    validate_root(root)?;

    let entries = fs::read_dir(root).map_err(|e| OrganizeError::ReadDirFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut resolver = DestinationResolver::new(probe);
    let mut plan = MovePlan::new(root.to_path_buf());

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let error = OrganizeError::EntryUnreadable {
                    name: root.display().to_string(),
                    source: e,
                };
                warn!(error = %error, "skipping unreadable directory entry");
                plan.failures
                    .push(FailureRecord::new(root.as_os_str(), &error));
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name();

        match is_plain_file(&path) {
            Ok(true) => {}
            Ok(false) => {
                debug!(name = %name.to_string_lossy(), "skipping non-file entry");
                continue;
            }
            Err(e) => {
                let error = OrganizeError::EntryUnreadable {
                    name: name.to_string_lossy().into_owned(),
                    source: e,
                };
                warn!(error = %error, "skipping unreadable entry");
                plan.failures.push(FailureRecord::new(&name, &error));
                continue;
            }
        }

        if let Some(reason) = filters.exclusion(&name) {
            debug!(name = %name.to_string_lossy(), %reason, "excluded by filters");
            plan.excluded += 1;
            continue;
        }

        let Some(file) = FileEntry::from_path(path) else {
            continue;
        };

        match plan_entry(root, map, &mut resolver, file) {
            Ok(planned) => {
                debug!(
                    name = %planned.entry.name.to_string_lossy(),
                    category = %planned.category,
                    final_name = %planned.final_name.to_string_lossy(),
                    "planned move"
                );
                plan.push(planned);
            }
            Err(error) => {
                warn!(name = %name.to_string_lossy(), error = %error, "could not plan move");
                plan.failures.push(FailureRecord::new(&name, &error));
            }
        }
    }

    info!(
        root = %root.display(),
        files = plan.total_files(),
        categories = plan.categories.len(),
        failures = plan.failures.len(),
        excluded = plan.excluded,
        "planning complete"
    );

    Ok(plan)
}

/// Checks that `root` exists and is a directory.
pub fn validate_root(root: &Path) -> OrganizeResult<()> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(OrganizeError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OrganizeError::PathNotFound {
            path: root.to_path_buf(),
        }),
        Err(e) => Err(OrganizeError::ReadDirFailed {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}

/// Symlinks count when they resolve to a plain file; dangling links don't.
fn is_plain_file(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound && path.symlink_metadata().is_ok() => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn plan_entry<P: PathProbe>(
    root: &Path,
    map: &CategoryMap,
    resolver: &mut DestinationResolver<P>,
    entry: FileEntry,
) -> OrganizeResult<PlannedMove> {
    let category = map.classify(&entry.extension.to_string_lossy());
    let category_folder = root.join(category.dir_name());
    if let Some(source) = folder_blocked(&category_folder) {
        return Err(OrganizeError::FolderCreationFailed {
            path: category_folder,
            source,
        });
    }
    let final_name = resolver.resolve(
        category,
        &category_folder,
        &entry.name,
        &entry.stem,
        &entry.extension,
    )?;

    Ok(PlannedMove {
        entry,
        category,
        final_name,
    })
}

/// Something other than a directory already sits at a category folder's path.
fn folder_blocked(folder: &Path) -> Option<io::Error> {
    match fs::metadata(folder) {
        Ok(metadata) if !metadata.is_dir() => Some(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a file with the category folder's name is in the way",
        )),
        _ => None,
    }
}

/// Convenience used in reports: name of a planned move as displayed.
pub fn display_name(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}
