//! Locating and loading `arch-fence.toml`.
//!
//! Lookup order:
//!
//! 1. `--config` flag (or `$ARCH_FENCE_CONFIG`)
//! 2. `{project}/arch-fence.toml`, then `{project}/.arch-fence.toml`
//! 3. `$ARCH_FENCE_CONFIG_DIR/config.toml`, else `~/.arch-fence/config.toml`
//!
//! Without rules there is nothing to enforce, so finding no file at all is
//! a configuration error rather than a silent default.

use arch_fence_core::{AnalyzerError, Config, Project};
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// No config file anywhere.
    Missing,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Missing => None,
        }
    }

    /// Directory that relative paths in the config are resolved against.
    ///
    /// A global config is shared between projects, so its paths are taken
    /// relative to the project being checked.
    #[must_use]
    pub fn base_dir(&self, project_dir: &Path) -> PathBuf {
        match self {
            Self::Explicit(p) | Self::Project(p) => p
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            Self::Global(_) | Self::Missing => project_dir.to_path_buf(),
        }
    }
}

const PROJECT_CONFIG_NAMES: &[&str] = &["arch-fence.toml", ".arch-fence.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file path.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(candidate) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|c| c.is_file())
    {
        tracing::debug!("Found project config: {}", candidate.display());
        return ConfigSource::Project(candidate);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|c| c.is_file())
        .map_or(ConfigSource::Missing, |candidate| {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        })
}

/// Returns the global config directory path.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ARCH_FENCE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".arch-fence"))
}

/// Reads the config file named by `source`.
///
/// # Errors
///
/// Returns a configuration error when no file was found or it cannot be
/// read or parsed.
pub fn read_config(source: &ConfigSource) -> Result<Config, AnalyzerError> {
    let Some(path) = source.path() else {
        return Err(AnalyzerError::Configuration(
            "no arch-fence.toml found; run `arch-fence init` to create one".to_string(),
        ));
    };
    if let ConfigSource::Global(p) = source {
        tracing::info!("Using global config: {}", p.display());
    }
    Ok(Config::from_file(path)?)
}

/// Reads and validates the config for `project_dir`.
///
/// # Errors
///
/// Returns a configuration error if the config is missing or invalid.
pub fn load_project(project_dir: &Path, source: &ConfigSource) -> Result<Project, AnalyzerError> {
    let config = read_config(source)?;
    Ok(arch_fence_core::load(config, &source.base_dir(project_dir))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("arch-fence.toml"), "").unwrap();

        let result = resolve_inner(project.path(), Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn project_names_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".arch-fence.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(tmp.path(), None, None),
            ConfigSource::Project(tmp.path().join(".arch-fence.toml"))
        );

        fs::write(tmp.path().join("arch-fence.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(tmp.path(), None, None),
            ConfigSource::Project(tmp.path().join("arch-fence.toml"))
        );
    }

    #[test]
    fn directory_named_like_config_is_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("arch-fence.toml")).unwrap();
        assert_eq!(resolve_inner(tmp.path(), None, None), ConfigSource::Missing);
    }

    #[test]
    fn global_only_as_fallback() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.toml"), "").unwrap();

        let result = resolve_inner(project.path(), None, Some(global.path().to_path_buf()));
        assert_eq!(result, ConfigSource::Global(global.path().join("config.toml")));

        fs::write(project.path().join("arch-fence.toml"), "").unwrap();
        let result = resolve_inner(project.path(), None, Some(global.path().to_path_buf()));
        assert!(matches!(result, ConfigSource::Project(_)));
    }

    #[test]
    fn empty_global_dir_is_missing() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let result = resolve_inner(project.path(), None, Some(global.path().to_path_buf()));
        assert_eq!(result, ConfigSource::Missing);
    }

    #[test]
    fn base_dir_per_source() {
        let project = Path::new("/work/app");
        assert_eq!(
            ConfigSource::Project(PathBuf::from("/work/app/arch-fence.toml")).base_dir(project),
            PathBuf::from("/work/app")
        );
        assert_eq!(
            ConfigSource::Explicit(PathBuf::from("fence.toml")).base_dir(project),
            PathBuf::from(".")
        );
        assert_eq!(
            ConfigSource::Global(PathBuf::from("/home/u/.arch-fence/config.toml")).base_dir(project),
            PathBuf::from("/work/app")
        );
    }

    #[test]
    fn missing_config_is_configuration_error() {
        let err = read_config(&ConfigSource::Missing).unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
    }

    #[test]
    fn load_project_resolves_paths_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("arch-fence.toml");
        fs::write(
            &config,
            "[analyzer]\nroot = \"src\"\n[[rules]]\nscope = \"domain\"\nprohibit = [{ name = \"infra\" }]\n",
        )
        .unwrap();

        let project = load_project(Path::new("."), &ConfigSource::Project(config)).unwrap();
        assert_eq!(project.root, tmp.path().join("src"));
        assert_eq!(project.rules.len(), 1);
    }

    #[test]
    fn invalid_rule_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("arch-fence.toml");
        fs::write(&config, "[[rules]]\nscope = \"\"\n").unwrap();

        let err = load_project(tmp.path(), &ConfigSource::Explicit(config)).unwrap_err();
        assert!(err.to_string().contains("rules[0].scope"));
    }
}
