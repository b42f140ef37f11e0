//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_FILE: &str = "arch-fence.toml";

const DEFAULT_CONFIG: &str = r#"# arch-fence configuration

[analyzer]
# Root directory to analyze, relative to this file
root = "."

# Glob patterns to exclude from analysis
exclude = [
    "**/target/**",
    "**/vendor/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: CPU count)
# parallelism = 8

# Abort the check after this many seconds
# timeout_secs = 120

[module]
# Crate name used to qualify bare names in rules; read from Cargo.toml
# when omitted
# manifest = "Cargo.toml"
# root = "my_crate"
# separator = "::"   # default

[cache]
# Skip files whose content has not changed since the last check
enabled = true
dir = ".arch-fence/cache"
# "binary" or "json"
format = "binary"

# Each rule applies to files under `scope`.
# `allow` turns the rule into a whitelist; `prohibit` always wins.
# A name covers every path beneath it: `infra` also matches
# `my_crate::infra::db::Pool`.

[[rules]]
scope = "src/domain"
prohibit = [
    { name = "infra", cause = "domain must not depend on infrastructure" },
]

# [[rules]]
# scope = "src/api"
# allow = ["domain", "std::sync::Arc"]
"#;

/// Runs the init command, writing the config into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to describe your layers");
    println!("  2. Run: arch-fence check");

    Ok(())
}
