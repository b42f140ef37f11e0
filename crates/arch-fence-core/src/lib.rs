//! # arch-fence-core
//!
//! Engine for enforcing import boundaries between the directories of a
//! codebase.
//!
//! Each [`Rule`] names a directory scope and lists which imports files in
//! that scope may (allow list) or may not (prohibit list) declare. The
//! [`Analyzer`] walks a source tree, extracts every file's imports through an
//! [`ImportParser`], checks them against each covering rule on a pool of
//! worker threads, and returns the merged [`ViolationSet`]. With incremental
//! mode on, per-file results are kept in a content-addressed cache and
//! unchanged files are not parsed again.
//!
//! ## Example
//!
//! ```no_run
//! use arch_fence_core::{Analyzer, ModuleContext, Rule};
//!
//! let analyzer = Analyzer::builder()
//!     .root(".")
//!     .module(ModuleContext::with_separator("my_app", "::"))
//!     .rule(Rule::new("src/domain").prohibit("infra", "domain must not reach infrastructure"))
//!     .build()?;
//!
//! let report = analyzer.run()?;
//! for violation in report.violations.sorted() {
//!     println!("{violation}");
//! }
//! # Ok::<(), arch_fence_core::AnalyzerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod cancel;
mod config;
mod context;
mod loader;
mod parser;
mod progress;
mod rule;
mod types;
mod walk;

pub mod cache;
pub mod codec;
pub mod path;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use cancel::CancellationToken;
pub use config::{
    AnalyzerConfig, CacheConfig, Config, ConfigError, ModuleConfig, ProhibitConfig, RuleConfig,
};
pub use context::{ContextError, FileContext, ModuleContext};
pub use loader::{load, CacheFormat, CacheSettings, LoadError, Project};
pub use parser::{ImportParser, ParseError, RustImportParser};
pub use progress::{NoProgress, ProgressReporter, TracingProgress};
pub use rule::{Prohibition, Rule, RuleMatcher};
pub use types::{
    AnalysisReport, RunStats, Violation, ViolationKind, ViolationSet, DETAIL_NOT_ALLOWED,
    DETAIL_PROHIBITED,
};
pub use walk::{DirectoryWalker, GitignoreWalker, WalkEntry, WalkError, WalkIter, WalkdirWalker};
