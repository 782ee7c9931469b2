/// File categorization by extension.
///
/// This module maps lowercase file extensions (with their leading dot) to the
/// category folders files are sorted into. Lookup is total: anything not in the
/// table lands in [`Category::Others`].
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, CategoryMap};
///
/// let map = CategoryMap::default();
/// assert_eq!(map.classify(".png"), Category::Images);
/// assert_eq!(map.classify(".MP3"), Category::Audio);
/// assert_eq!(map.classify(".xyz"), Category::Others);
/// ```
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// Represents a file category and the folder it is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Image files (JPG, PNG, GIF)
    Images,
    /// Document files (PDF, DOC, TXT, RTF)
    Documents,
    /// Audio files (MP3, WAV, FLAC)
    Audio,
    /// Video files (MP4, AVI, MKV)
    Video,
    /// Archive files (ZIP, RAR, 7Z)
    Archives,
    /// Source and web files (PY, JAVA, CPP, HTML, CSS, JS)
    Code,
    /// Everything else
    Others,
}

impl Category {
    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Immutable extension to category lookup.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    extension_map: HashMap<&'static str, Category>,
}

impl CategoryMap {
    /// Creates a `CategoryMap` holding the standard extension table.
    pub fn new() -> Self {
        let table: [(&'static str, Category); 24] = [
            (".jpg", Category::Images),
            (".jpeg", Category::Images),
            (".png", Category::Images),
            (".gif", Category::Images),
            (".pdf", Category::Documents),
            (".doc", Category::Documents),
            (".docx", Category::Documents),
            (".txt", Category::Documents),
            (".rtf", Category::Documents),
            (".mp3", Category::Audio),
            (".wav", Category::Audio),
            (".flac", Category::Audio),
            (".mp4", Category::Video),
            (".avi", Category::Video),
            (".mkv", Category::Video),
            (".zip", Category::Archives),
            (".rar", Category::Archives),
            (".7z", Category::Archives),
            (".py", Category::Code),
            (".java", Category::Code),
            (".cpp", Category::Code),
            (".html", Category::Code),
            (".css", Category::Code),
            (".js", Category::Code),
        ];

        Self {
            extension_map: table.into_iter().collect(),
        }
    }

    /// Maps an extension (including its leading dot) to a category.
    ///
    /// The extension is lowercased before lookup. Unknown or empty
    /// extensions map to [`Category::Others`].
    pub fn classify(&self, extension: &str) -> Category {
        self.extension_map
            .get(extension.to_lowercase().as_str())
            .copied()
            .unwrap_or(Category::Others)
    }

    /// Classifies a file by its name.
    ///
    /// ```
    /// use dirsort::file_category::{Category, CategoryMap};
    ///
    /// let map = CategoryMap::default();
    /// assert_eq!(map.classify_name("Report.PDF".as_ref()), Category::Documents);
    /// assert_eq!(map.classify_name(".bashrc".as_ref()), Category::Others);
    /// ```
    pub fn classify_name(&self, file_name: &OsStr) -> Category {
        let (_, extension) = split_name(file_name);
        self.classify(&extension.to_string_lossy())
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a file name into its stem and extension (with leading dot).
///
/// Dot-files such as `.bashrc` and names ending in a dot have no extension;
/// the stem is then the whole name.
pub fn split_name(file_name: &OsStr) -> (OsString, OsString) {
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => {
            let mut extension = OsString::from(".");
            extension.push(ext);
            (stem.to_os_string(), extension)
        }
        _ => (file_name.to_os_string(), OsString::new()),
    }
}
