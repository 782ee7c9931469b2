//! Collision-free destination names.
//!
//! A destination is free when no file with that name exists in the category
//! folder and no earlier planned move of the same pass has claimed it. Taken
//! names get a `_{counter}` suffix before the extension.

use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::Category;
use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Upper bound on suffix attempts before giving up on a file.
pub const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

/// Answers whether a path is already occupied.
///
/// The planner uses [`RealFs`]; tests substitute an in-memory set.
pub trait PathProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl PathProbe for RealFs {
    fn exists(&self, path: &Path) -> bool {
        // Broken symlinks still occupy the name.
        path.symlink_metadata().is_ok()
    }
}

/// Resolves destination names for one planning pass.
///
/// Names handed out by [`DestinationResolver::resolve`] stay claimed for the
/// lifetime of the resolver, so two sources never land on the same target.
#[derive(Debug)]
pub struct DestinationResolver<P> {
    probe: P,
    claimed: HashMap<Category, HashSet<OsString>>,
}

impl<P: PathProbe> DestinationResolver<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            claimed: HashMap::new(),
        }
    }

    /// Returns a name inside `category_folder` that is neither on disk nor
    /// claimed earlier in this pass, and claims it.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::DestinationExhausted`] when no free name is
    /// found within [`MAX_SUFFIX_ATTEMPTS`] suffixes.
    pub fn resolve(
        &mut self,
        category: Category,
        category_folder: &Path,
        original_name: &OsStr,
        stem: &OsStr,
        extension: &OsStr,
    ) -> OrganizeResult<OsString> {
        let claimed = self.claimed.entry(category).or_default();
        let is_taken = |name: &OsStr| {
            claimed.contains(name) || self.probe.exists(&category_folder.join(name))
        };

        let mut final_name = original_name.to_os_string();
        let mut counter: u32 = 1;
        while is_taken(&final_name) {
            if counter > MAX_SUFFIX_ATTEMPTS {
                return Err(OrganizeError::DestinationExhausted {
                    name: original_name.to_string_lossy().into_owned(),
                    attempts: MAX_SUFFIX_ATTEMPTS,
                });
            }
            final_name = suffixed_name(stem, counter, extension);
            counter += 1;
        }

        claimed.insert(final_name.clone());
        Ok(final_name)
    }
}

/// Builds `{stem}_{counter}{extension}`.
pub fn suffixed_name(stem: &OsStr, counter: u32, extension: &OsStr) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}", counter));
    name.push(extension);
    name
}
