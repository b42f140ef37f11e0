//! Check command implementation.

use anyhow::Result;
use arch_fence_core::{Analyzer, TracingProgress};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::config_resolver::{self, ConfigSource};
use crate::CheckOptions;

/// Runs the check command.
///
/// Returns exit code 1 when violations were found.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<ExitCode> {
    let project = config_resolver::load_project(path, source)?;

    let mut builder = Analyzer::builder()
        .project(&project)
        .excludes(options.exclude.iter().cloned())
        .progress(TracingProgress);

    if let Some(jobs) = options.jobs {
        builder = builder.workers(jobs);
    }
    if let Some(secs) = options.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if options.no_cache {
        builder = builder.incremental(None);
    }

    let analyzer = builder.build()?;

    tracing::info!(
        "Checking {} with {} rules on {} workers",
        analyzer.root().display(),
        analyzer.rule_count(),
        analyzer.workers()
    );

    let report = analyzer.run()?;

    super::output::print(&report, options.format)?;

    if report.has_violations() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
