//! Configuration file support.
//!
//! Configuration is stored in TOML and is entirely optional. It can set the
//! directory sorted when no path is given, a log file, and exclusion rules for
//! files that should stay where they are.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! default_path = "/home/me/Downloads"
//! log_file = "/home/me/.local/state/dirsort.log"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["desktop.ini", "Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["crdownload", "tmp"]
//! regex = []
//! ```

use crate::file_category::split_name;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    NotFound(PathBuf),
    Read { path: PathBuf, source: io::Error },
    /// The TOML is malformed or has the wrong shape.
    Parse { path: Option<PathBuf>, reason: String },
    InvalidGlob { pattern: String, reason: String },
    InvalidRegex { pattern: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::Read { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path: Some(path), reason } => {
                write!(f, "Invalid configuration in {}: {}", path.display(), reason)
            }
            ConfigError::Parse { path: None, reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            ConfigError::InvalidGlob { pattern, reason } => {
                write!(f, "Invalid exclude pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidRegex { pattern, reason } => {
                write!(f, "Invalid exclude regex '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Directory sorted when none is given on the command line.
    #[serde(default)]
    pub default_path: Option<PathBuf>,
    /// File that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Filter section on its own, for callers that only need filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub filters: FilterRules,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to sort hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for leaving files out of the plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot (e.g., "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".config").join("dirsort").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                reason,
            },
            other => other,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            reason: e.to_string(),
        })
    }

    /// Directory to sort when the caller gives none: the configured
    /// `default_path`, else `~/Downloads`.
    pub fn default_root(&self) -> Option<PathBuf> {
        self.organize
            .default_path
            .clone()
            .or_else(|| home_dir().map(|home| home.join("Downloads")))
    }

    /// Compile the filter section.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters.clone())
    }
}

impl FilterConfig {
    /// Compile configuration into optimized filter structures for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Compiled filter structures for matching file names.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    /// Filters that exclude nothing.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Returns the rule that keeps `file_name` out of the plan, if any.
    pub fn exclusion(&self, file_name: &OsStr) -> Option<Exclusion> {
        let name = file_name.to_string_lossy();

        if !self.enable_hidden_files && name.starts_with('.') {
            return Some(Exclusion::Hidden);
        }
        if self.exclude_filenames.contains(name.as_ref()) {
            return Some(Exclusion::Filename);
        }

        let (_, extension) = split_name(file_name);
        let extension = extension.to_string_lossy();
        let extension = extension.trim_start_matches('.').to_lowercase();
        if !extension.is_empty() && self.exclude_extensions.contains(&extension) {
            return Some(Exclusion::Extension(extension));
        }

        if let Some(pattern) = self.exclude_patterns.iter().find(|p| p.matches(&name)) {
            return Some(Exclusion::Pattern(pattern.as_str().to_string()));
        }
        self.exclude_regexes
            .iter()
            .find(|re| re.is_match(&name))
            .map(|re| Exclusion::Regex(re.as_str().to_string()))
    }

    /// Check if a file should be planned.
    ///
    /// Only the file name is matched; the root directory's own path never
    /// influences the result.
    pub fn should_include(&self, file_path: &Path) -> bool {
        file_path
            .file_name()
            .is_none_or(|name| self.exclusion(name).is_none())
    }
}

/// Why a file was left out of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Hidden,
    Filename,
    Extension(String),
    Pattern(String),
    Regex(String),
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclusion::Hidden => f.write_str("hidden file"),
            Exclusion::Filename => f.write_str("excluded file name"),
            Exclusion::Extension(ext) => write!(f, "excluded extension .{}", ext),
            Exclusion::Pattern(pattern) => write!(f, "matches pattern {}", pattern),
            Exclusion::Regex(regex) => write!(f, "matches regex {}", regex),
        }
    }
}
