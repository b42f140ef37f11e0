//! Rules command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config_resolver::{self, ConfigSource};

/// Runs the rules command.
pub fn run(path: &Path, source: &ConfigSource) -> Result<()> {
    let project = config_resolver::load_project(path, source)?;

    if let Some(config) = source.path() {
        println!("Rules from {}\n", config.display());
    }
    match project.module.root() {
        "" => println!("Module root: (none)"),
        root => println!(
            "Module root: {root} (separator `{}`)",
            project.module.separator()
        ),
    }
    println!("{}", "-".repeat(80));

    if project.rules.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    for rule in &project.rules {
        println!("{}", rule.scope());
        if rule.allowed().is_empty() {
            println!("  allow:    (any)");
        } else {
            println!("  allow:    {}", rule.allowed().join(", "));
        }
        for p in rule.prohibited() {
            if p.cause.is_empty() {
                println!("  prohibit: {}", p.name);
            } else {
                println!("  prohibit: {} ({})", p.name, p.cause);
            }
        }
        println!();
    }

    Ok(())
}
