use crate::io::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Source discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesConfig {
    /// Extensions scanned for source files, matched without a leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns excluded from the walk
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: Vec::new(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["f90".to_string()]
}

/// Extraction settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Callable names removed from the valid set before the call-site pass
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Depth cap for branch expansion; unset means unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Format used when --format is not given
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
}

/// Project configuration loaded from .callmap.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CallmapConfig {
    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Cache the configuration
static CONFIG: OnceLock<CallmapConfig> = OnceLock::new();

/// Pure function to parse config from a TOML string
#[cfg(test)]
pub(crate) fn parse_config(contents: &str) -> Result<CallmapConfig, String> {
    parse_config_impl(contents)
}

fn parse_config_impl(contents: &str) -> Result<CallmapConfig, String> {
    toml::from_str::<CallmapConfig>(contents)
        .map_err(|e| format!("Failed to parse .callmap.toml: {e}"))
}

/// A missing file is the normal case while walking ancestors; anything
/// else that prevents loading is reported and treated as absent.
fn try_load_config_from_path(config_path: &Path) -> Option<CallmapConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Cannot read {}: {e}", config_path.display());
            return None;
        }
    };

    match parse_config_impl(&contents) {
        Ok(config) => {
            log::debug!("Loaded configuration from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            eprintln!("Warning: {e}. Using defaults.");
            None
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
#[cfg(test)]
pub(crate) fn directory_ancestors(
    start: PathBuf,
    max_depth: usize,
) -> impl Iterator<Item = PathBuf> {
    directory_ancestors_impl(start, max_depth)
}

fn directory_ancestors_impl(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| dir.parent().map(Path::to_path_buf)).take(max_depth)
}

/// Load configuration from the nearest .callmap.toml, walking up from the
/// current directory
pub fn load_config() -> CallmapConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let Ok(current) = std::env::current_dir() else {
        log::warn!("Working directory is unavailable, using default config");
        return CallmapConfig::default();
    };

    directory_ancestors_impl(current, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(".callmap.toml"))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!("No .callmap.toml within {MAX_TRAVERSAL_DEPTH} directories, using defaults");
            CallmapConfig::default()
        })
}

/// Get the cached configuration
pub fn get_config() -> &'static CallmapConfig {
    CONFIG.get_or_init(load_config)
}
