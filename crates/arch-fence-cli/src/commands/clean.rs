//! Clean command implementation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config_resolver::{self, ConfigSource};

/// Runs the clean command.
pub fn run(path: &Path, source: &ConfigSource) -> Result<()> {
    let dir = cache_dir(path, source)?;

    if remove_cache(&dir)? {
        println!("Removed {}", dir.display());
    } else {
        println!("No cache at {}", dir.display());
    }
    Ok(())
}

/// The configured cache directory, whether or not the cache is enabled.
fn cache_dir(path: &Path, source: &ConfigSource) -> Result<PathBuf> {
    let config = config_resolver::read_config(source)?;
    Ok(source.base_dir(path).join(config.cache.dir))
}

/// Deletes `dir`; returns whether there was anything to delete.
fn remove_cache(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(dir)
        .with_context(|| format!("Failed to remove {}", dir.display()))?;
    tracing::debug!("Removed cache directory {}", dir.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_configured_cache_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("arch-fence.toml");
        std::fs::write(&config, "[cache]\nenabled = false\ndir = \"build/fence\"\n").unwrap();
        std::fs::create_dir_all(tmp.path().join("build/fence/0123")).unwrap();

        let source = ConfigSource::Project(config);
        let dir = cache_dir(tmp.path(), &source).unwrap();
        assert_eq!(dir, tmp.path().join("build/fence"));

        assert!(remove_cache(&dir).unwrap());
        assert!(!dir.exists());
        assert!(!remove_cache(&dir).unwrap());
    }
}
