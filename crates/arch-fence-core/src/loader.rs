//! Config DTO → validated project settings.
//!
//! Every check that can fail before analysis lives here, so a [`Project`]
//! handed to the analyzer is known to be well-formed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::{Config, ModuleConfig, RuleConfig};
use crate::context::{ContextError, ModuleContext};
use crate::rule::Rule;

/// Errors during DTO → domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A rule has an empty scope.
    #[error("{context}: scope must not be empty")]
    EmptyScope {
        /// Where the error occurred (e.g., "rules[0].scope").
        context: String,
    },

    /// A prohibition has an empty name.
    #[error("{context}: prohibited name must not be empty")]
    EmptyProhibitedName {
        /// Where the error occurred (e.g., "rules[1].prohibit[0].name").
        context: String,
    },

    /// Unknown cache payload format.
    #[error("cache.format: unknown format `{value}`, expected: binary, json")]
    UnknownCacheFormat {
        /// The invalid value.
        value: String,
    },

    /// Worker count of zero.
    #[error("analyzer.parallelism: must be at least 1")]
    ZeroParallelism,

    /// The module manifest is missing or unusable.
    #[error("module.manifest: {0}")]
    Manifest(#[from] ContextError),
}

/// Cache payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheFormat {
    /// [`crate::codec::BinaryCodec`].
    #[default]
    Binary,
    /// [`crate::codec::JsonCodec`].
    Json,
}

impl CacheFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "binary" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Validated incremental cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Absolute cache directory.
    pub dir: PathBuf,
    /// Payload format.
    pub format: CacheFormat,
}

/// Validated settings for one analysis.
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute analysis root.
    pub root: PathBuf,
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
    /// Module root used to qualify bare names.
    pub module: ModuleContext,
    /// Exclude globs.
    pub exclude: Vec<String>,
    /// Whether to honor `.gitignore`.
    pub respect_gitignore: bool,
    /// Worker count, when fixed by configuration.
    pub parallelism: Option<usize>,
    /// Run deadline.
    pub timeout: Option<Duration>,
    /// Incremental cache settings; `None` when disabled.
    pub cache: Option<CacheSettings>,
}

/// Converts a parsed config into validated project settings.
///
/// Relative paths in the config are resolved against `base_dir`, normally
/// the directory holding the config file.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(config: Config, base_dir: &Path) -> Result<Project, LoadError> {
    let rules = config
        .rules
        .iter()
        .enumerate()
        .map(|(i, r)| convert_rule(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    if config.analyzer.parallelism == Some(0) {
        return Err(LoadError::ZeroParallelism);
    }

    let cache = if config.cache.enabled {
        let format = CacheFormat::parse(&config.cache.format).ok_or_else(|| {
            LoadError::UnknownCacheFormat {
                value: config.cache.format.clone(),
            }
        })?;
        Some(CacheSettings {
            dir: base_dir.join(&config.cache.dir),
            format,
        })
    } else {
        None
    };

    let root = base_dir.join(&config.analyzer.root);
    let module = resolve_module(&config.module, base_dir, &root)?;

    Ok(Project {
        root,
        rules,
        module,
        exclude: config.analyzer.exclude,
        respect_gitignore: config.analyzer.respect_gitignore,
        parallelism: config.analyzer.parallelism,
        timeout: config.analyzer.timeout_secs.map(Duration::from_secs),
        cache,
    })
}

fn convert_rule(dto: &RuleConfig, index: usize) -> Result<Rule, LoadError> {
    let ctx = format!("rules[{index}]");
    if dto.scope.trim().is_empty() {
        return Err(LoadError::EmptyScope {
            context: format!("{ctx}.scope"),
        });
    }

    let mut rule = Rule::new(&dto.scope);
    if let Some(allow) = &dto.allow {
        rule = rule.allow(allow.iter().cloned());
    }

    for (j, p) in dto.prohibit.iter().enumerate() {
        if p.name.trim().is_empty() {
            return Err(LoadError::EmptyProhibitedName {
                context: format!("{ctx}.prohibit[{j}].name"),
            });
        }
        rule = rule.prohibit(p.name.clone(), p.cause.clone());
    }

    Ok(rule)
}

fn resolve_module(
    dto: &ModuleConfig,
    base_dir: &Path,
    root: &Path,
) -> Result<ModuleContext, LoadError> {
    if let Some(name) = &dto.root {
        let separator = dto
            .separator
            .as_deref()
            .unwrap_or(ModuleContext::RUST_SEPARATOR);
        return Ok(ModuleContext::with_separator(name.clone(), separator));
    }

    let manifest = if let Some(manifest) = &dto.manifest {
        ModuleContext::from_cargo_manifest(&base_dir.join(manifest))?
    } else {
        let implicit = root.join("Cargo.toml");
        if !implicit.is_file() {
            return Ok(unnamed_crate());
        }
        match ModuleContext::from_cargo_manifest(&implicit) {
            Ok(module) => module,
            Err(e) => {
                debug!("Ignoring {}: {e}", implicit.display());
                return Ok(unnamed_crate());
            }
        }
    };

    Ok(match &dto.separator {
        Some(separator) => ModuleContext::with_separator(manifest.root(), separator.clone()),
        None => manifest,
    })
}

/// Module context for sources whose crate name is unknown; `crate::` paths
/// are reported against it.
fn unnamed_crate() -> ModuleContext {
    ModuleContext::with_separator("crate", ModuleContext::RUST_SEPARATOR)
}
