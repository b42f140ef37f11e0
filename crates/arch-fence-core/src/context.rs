//! Context types shared by the parser, the matchers and the analyzer.

use std::path::{Path, PathBuf};

use crate::path;

/// Errors resolving the module context from a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The manifest could not be read.
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML.
    #[error("Failed to parse manifest {path}: {message}")]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// The manifest has no `[package] name`.
    #[error("Manifest {path} does not declare a package name")]
    MissingName {
        /// Manifest path.
        path: PathBuf,
    },
}

/// The project's root module identifier.
///
/// Used to qualify bare names in allow and prohibit lists, so that `infra`
/// and `my_crate::infra` (or `example.com/app/infra` with the default `/`
/// separator) name the same dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleContext {
    root: String,
    separator: String,
}

impl ModuleContext {
    /// Default separator between the module root and a relative name.
    pub const DEFAULT_SEPARATOR: &'static str = "/";

    /// Separator used for Rust paths.
    pub const RUST_SEPARATOR: &'static str = "::";

    /// Creates a context with the default `/` separator.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_separator(root, Self::DEFAULT_SEPARATOR)
    }

    /// Creates a context with an explicit separator.
    #[must_use]
    pub fn with_separator(root: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            separator: separator.into(),
        }
    }

    /// Resolves the context from a Cargo manifest.
    ///
    /// The package name becomes the root (`-` mapped to `_`, as rustc does)
    /// and the separator is `::`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read, is not valid TOML,
    /// or has no package name.
    pub fn from_cargo_manifest(manifest: &Path) -> Result<Self, ContextError> {
        let content = std::fs::read_to_string(manifest).map_err(|e| ContextError::Io {
            path: manifest.to_path_buf(),
            source: e,
        })?;
        let table = content
            .parse::<toml::Table>()
            .map_err(|e| ContextError::Parse {
                path: manifest.to_path_buf(),
                message: e.to_string(),
            })?;

        let name = table
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(toml::Value::as_str)
            .ok_or_else(|| ContextError::MissingName {
                path: manifest.to_path_buf(),
            })?;

        Ok(Self::with_separator(
            name.replace('-', "_"),
            Self::RUST_SEPARATOR,
        ))
    }

    /// Returns the root module identifier.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the separator placed between root and relative names.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns the fully-qualified spelling of a bare `entry`.
    ///
    /// Returns `None` when there is no root or when `entry` is already
    /// qualified.
    #[must_use]
    pub fn qualify(&self, entry: &str) -> Option<String> {
        if self.root.is_empty() || entry.is_empty() || !self.is_bare(entry) {
            return None;
        }
        Some(format!("{}{}{}", self.root, self.separator, entry))
    }

    /// Tests whether `entry` is not already rooted at this module.
    #[must_use]
    pub fn is_bare(&self, entry: &str) -> bool {
        if entry == self.root {
            return false;
        }
        entry
            .strip_prefix(self.root.as_str())
            .map_or(true, |rest| !rest.starts_with(self.separator.as_str()))
    }
}

/// Per-file information derived once when the job is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// Path as produced by the directory walk.
    pub path: PathBuf,
    /// Canonical path relative to the analysis root; also the cache key.
    pub relative_path: String,
    /// Canonical containing directory of `relative_path`.
    pub dir: String,
}

impl FileContext {
    /// Creates a file context for `path` under `root`.
    #[must_use]
    pub fn new(path: &Path, root: &Path) -> Self {
        let relative_path = path::relative_to(root, path);
        let dir = path::parent_dir(&relative_path);
        Self {
            path: path.to_path_buf(),
            relative_path,
            dir,
        }
    }

    /// Module path of this file below the crate's `src` directory.
    ///
    /// `src/foo/bar.rs` yields `["foo", "bar"]`; `src/foo/mod.rs` and
    /// `src/lib.rs` collapse to their directory.
    #[must_use]
    pub fn module_path(&self) -> Vec<String> {
        compute_module_path(&self.relative_path)
    }
}

fn compute_module_path(relative_path: &str) -> Vec<String> {
    let without_ext = Path::new(relative_path).with_extension("");
    let mut parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| {
            if let std::path::Component::Normal(s) = c {
                s.to_str().map(String::from)
            } else {
                None
            }
        })
        .collect();

    if let Some(src) = parts.iter().position(|p| p == "src") {
        parts.drain(..=src);
    }

    if let Some(last) = parts.last() {
        if last == "mod" || last == "lib" || last == "main" {
            parts.pop();
        }
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_bare_entries() {
        let ctx = ModuleContext::new("example.com/app");
        assert_eq!(
            ctx.qualify("internal/database").as_deref(),
            Some("example.com/app/internal/database")
        );
    }

    #[test]
    fn does_not_requalify() {
        let ctx = ModuleContext::new("example.com/app");
        assert_eq!(ctx.qualify("example.com/app/internal/database"), None);
        assert_eq!(ctx.qualify("example.com/app"), None);
        assert!(ctx.is_bare("example.com/application"));
    }

    #[test]
    fn empty_root_qualifies_nothing() {
        let ctx = ModuleContext::default();
        assert_eq!(ctx.qualify("fmt"), None);
    }

    #[test]
    fn rust_separator() {
        let ctx = ModuleContext::with_separator("my_app", "::");
        assert_eq!(ctx.qualify("infra::db").as_deref(), Some("my_app::infra::db"));
        assert_eq!(ctx.qualify("my_app::infra"), None);
    }

    #[test]
    fn reads_cargo_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("Cargo.toml");
        std::fs::write(&manifest, "[package]\nname = \"my-app\"\nversion = \"0.1.0\"\n").unwrap();

        let ctx = ModuleContext::from_cargo_manifest(&manifest).unwrap();
        assert_eq!(ctx.root(), "my_app");
        assert_eq!(ctx.separator(), "::");
    }

    #[test]
    fn manifest_without_package_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("Cargo.toml");
        std::fs::write(&manifest, "[workspace]\nmembers = []\n").unwrap();

        let err = ModuleContext::from_cargo_manifest(&manifest).unwrap_err();
        assert!(matches!(err, ContextError::MissingName { .. }));
    }

    #[test]
    fn file_context_derives_dir() {
        let ctx = FileContext::new(Path::new("/p/src/domain/user.rs"), Path::new("/p"));
        assert_eq!(ctx.relative_path, "src/domain/user.rs");
        assert_eq!(ctx.dir, "src/domain");
    }

    #[test]
    fn module_path() {
        assert_eq!(compute_module_path("src/foo/bar.rs"), vec!["foo", "bar"]);
        assert_eq!(compute_module_path("src/foo/mod.rs"), vec!["foo"]);
        assert!(compute_module_path("src/lib.rs").is_empty());
        assert_eq!(
            compute_module_path("crates/x/src/a/b.rs"),
            vec!["a", "b"]
        );
    }
}
