//! Output formatting for check results.
//!
//! Violations are collected in discovery order, which varies between runs;
//! every format sorts them by file, then rule, then import first.

use anyhow::Result;
use arch_fence_core::{AnalysisReport, RunStats, Violation, ViolationKind};
use serde::Serialize;

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => {
            for violation in report.violations.sorted() {
                println!("{}", compact_line(violation));
            }
        }
    }
    Ok(())
}

fn print_text(report: &AnalysisReport) {
    let mut current_file = None;
    for violation in report.violations.sorted() {
        if current_file != Some(violation.file.as_str()) {
            if current_file.is_some() {
                println!();
            }
            println!("\x1b[1m{}\x1b[0m", violation.file);
            current_file = Some(violation.file.as_str());
        }

        let label = match violation.kind() {
            Some(ViolationKind::Prohibited) => "\x1b[31mprohibited\x1b[0m",
            Some(ViolationKind::NotAllowed) => "\x1b[33mnot allowed\x1b[0m",
            None => "violation",
        };
        let cached = if violation.cached { " (cached)" } else { "" };
        println!("  {label} `{}` [rule: {}]{cached}", violation.import, violation.rule);
        if !violation.cause.is_empty() {
            println!("    = cause: {}", violation.cause);
        }
    }

    if current_file.is_some() {
        println!();
    }
    println!("{}", summary(&report.stats));
}

fn summary(stats: &RunStats) -> String {
    let color = if stats.violations > 0 {
        "\x1b[31m"
    } else {
        "\x1b[32m"
    };
    format!(
        "{color}Found {} violation(s) in {} file(s) ({} cached, {} skipped) in {:.2?}\x1b[0m",
        stats.violations,
        stats.files_processed(),
        stats.files_cached,
        stats.files_skipped,
        stats.elapsed
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    violations: Vec<&'a Violation>,
    stats: &'a RunStats,
}

fn print_json(report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport {
        violations: report.violations.sorted(),
        stats: &report.stats,
    })?;
    println!("{json}");
    Ok(())
}

fn compact_line(violation: &Violation) -> String {
    let kind = violation
        .kind()
        .map_or_else(|| "violation".to_string(), |k| k.to_string());
    let mut line = format!(
        "{}: {kind} [{}] {}",
        violation.file, violation.rule, violation.import
    );
    if !violation.cause.is_empty() {
        line.push_str(" - ");
        line.push_str(&violation.cause);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn compact_line_with_and_without_cause() {
        let prohibited = Violation::new(
            "internal/api/handler.go",
            "internal/database",
            "internal/api",
            ViolationKind::Prohibited,
            "no direct db",
        );
        assert_eq!(
            compact_line(&prohibited),
            "internal/api/handler.go: prohibited [internal/api] internal/database - no direct db"
        );

        let not_allowed =
            Violation::new("a/b.go", "os", "a", ViolationKind::NotAllowed, "");
        assert_eq!(compact_line(&not_allowed), "a/b.go: not-allowed [a] os");
    }

    #[test]
    fn summary_counts() {
        let stats = RunStats {
            files_total: 3,
            files_analyzed: 2,
            files_cached: 1,
            files_skipped: 0,
            violations: 0,
            elapsed: Duration::from_millis(5),
        };
        let line = summary(&stats);
        assert!(line.contains("Found 0 violation(s) in 3 file(s) (1 cached, 0 skipped)"));
    }
}
