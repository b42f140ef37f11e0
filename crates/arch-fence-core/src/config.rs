//! Configuration file types for arch-fence.
//!
//! These are plain serde DTOs mirroring `arch-fence.toml`. They are turned
//! into validated domain values by [`crate::loader::load`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// How the project's root module is resolved.
    #[serde(default)]
    pub module: ModuleConfig,

    /// Incremental cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Boundary rules, in declaration order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze, relative to the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Number of worker threads (default: CPU count).
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Abort the run after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
            parallelism: None,
            timeout_secs: None,
        }
    }
}

/// Module root resolution.
///
/// `root` wins over `manifest`. With neither, a `Cargo.toml` at the
/// analysis root is used when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Cargo manifest declaring the package name.
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Explicit module root identifier.
    #[serde(default)]
    pub root: Option<String>,

    /// Separator between the root and relative names.
    #[serde(default)]
    pub separator: Option<String>,
}

/// Incremental cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether incremental mode is on.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory, relative to the config file.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Payload format: `binary` or `json`.
    #[serde(default = "default_cache_format")]
    pub format: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            format: default_cache_format(),
        }
    }
}

/// One `[[rules]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Directory the rule applies to.
    pub scope: String,

    /// Whitelist of import identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,

    /// Blacklisted import identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prohibit: Vec<ProhibitConfig>,
}

/// One prohibited identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProhibitConfig {
    /// Import identifier.
    pub name: String,

    /// Reason shown with the violation.
    #[serde(default)]
    pub cause: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["**/target/**".to_string(), "**/vendor/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".arch-fence/cache")
}

fn default_cache_format() -> String {
    "binary".to_string()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
