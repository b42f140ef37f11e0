//! The concurrent analysis engine.
//!
//! A run walks the tree on the calling thread, then fans the file jobs out
//! to a pool of scoped worker threads through a bounded queue. Workers send
//! their per-file batches back over a channel, and the calling thread, the
//! only owner of the result set, appends them one at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::cache::{CacheError, FsContentStore, NullCache, ResultCache, StoreCache};
use crate::cancel::CancellationToken;
use crate::codec::{BinaryCodec, JsonCodec};
use crate::config::ConfigError;
use crate::context::{FileContext, ModuleContext};
use crate::loader::{CacheFormat, CacheSettings, LoadError, Project};
use crate::parser::{ImportParser, ParseError, RustImportParser};
use crate::progress::{NoProgress, ProgressReporter};
use crate::rule::{Rule, RuleMatcher};
use crate::types::{AnalysisReport, RunStats, Violation, ViolationSet};
use crate::walk::{DirectoryWalker, GitignoreWalker, WalkdirWalker};

/// Errors that can end an analysis run.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AnalyzerError {
    /// Bad or missing configuration. Raised before any file is read.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(arch_fence::configuration), help("check arch-fence.toml"))]
    Configuration(String),

    /// The analysis root cannot be read.
    #[error("Cannot read {path}: {source}")]
    #[diagnostic(code(arch_fence::file_system))]
    FileSystem {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A file could not be parsed and parse errors are fatal.
    #[error(transparent)]
    #[diagnostic(code(arch_fence::parse))]
    Parse(#[from] ParseError),

    /// The result cache failed.
    #[error("Cache error: {0}")]
    #[diagnostic(code(arch_fence::cache))]
    Cache(#[from] CacheError),

    /// The run was cancelled or timed out before finishing.
    #[error("Analysis cancelled after {processed} of {total} files")]
    #[diagnostic(code(arch_fence::cancelled))]
    Cancelled {
        /// Files aggregated before cancellation.
        processed: usize,
        /// Files selected for analysis.
        total: usize,
    },
}

impl From<ConfigError> for AnalyzerError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<LoadError> for AnalyzerError {
    fn from(e: LoadError) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<Rule>,
    module: ModuleContext,
    parser: Option<Arc<dyn ImportParser>>,
    walker: Option<Arc<dyn DirectoryWalker>>,
    cache: Option<Arc<dyn ResultCache>>,
    cache_settings: Option<CacheSettings>,
    workers: Option<usize>,
    exclude_patterns: Vec<String>,
    token: Option<CancellationToken>,
    timeout: Option<Duration>,
    progress: Option<Arc<dyn ProgressReporter>>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies validated project settings.
    ///
    /// Explicit builder calls made afterwards override these.
    #[must_use]
    pub fn project(mut self, project: &Project) -> Self {
        self.root = Some(project.root.clone());
        self.rules.extend(project.rules.iter().cloned());
        self.module = project.module.clone();
        self.exclude_patterns.extend(project.exclude.iter().cloned());
        self.walker = Some(if project.respect_gitignore {
            Arc::new(GitignoreWalker::new())
        } else {
            Arc::new(WalkdirWalker::new())
        });
        self.workers = project.parallelism.or(self.workers);
        self.timeout = project.timeout.or(self.timeout);
        self.cache_settings = project.cache.clone();
        self
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the module context used to qualify rule entries.
    #[must_use]
    pub fn module(mut self, module: ModuleContext) -> Self {
        self.module = module;
        self
    }

    /// Sets the import parser (default: [`RustImportParser`]).
    #[must_use]
    pub fn parser<P: ImportParser + 'static>(self, parser: P) -> Self {
        self.parser_arc(Arc::new(parser))
    }

    /// Sets a shared import parser.
    #[must_use]
    pub fn parser_arc(mut self, parser: Arc<dyn ImportParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the directory walker (default: [`WalkdirWalker`]).
    #[must_use]
    pub fn walker<W: DirectoryWalker + 'static>(mut self, walker: W) -> Self {
        self.walker = Some(Arc::new(walker));
        self
    }

    /// Sets the result cache, overriding any incremental settings.
    #[must_use]
    pub fn cache<C: ResultCache + 'static>(self, cache: C) -> Self {
        self.cache_arc(Arc::new(cache))
    }

    /// Sets a shared result cache.
    #[must_use]
    pub fn cache_arc(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Turns incremental mode on (`Some`) or off (`None`).
    #[must_use]
    pub fn incremental(mut self, settings: Option<CacheSettings>) -> Self {
        self.cache_settings = settings;
        self
    }

    /// Sets the number of worker threads (default: CPU count).
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the cancellation token observed by the run.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Cancels the run once `timeout` has elapsed since it started.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the progress reporter (default: [`NoProgress`]).
    #[must_use]
    pub fn progress<P: ProgressReporter + 'static>(self, progress: P) -> Self {
        self.progress_arc(Arc::new(progress))
    }

    /// Sets a shared progress reporter.
    #[must_use]
    pub fn progress_arc(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined or an
    /// exclude pattern is not a valid glob.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let root = self.root.unwrap_or_else(|| PathBuf::from("."));
        let root = if root.is_absolute() {
            root
        } else {
            let cwd = std::env::current_dir().map_err(|e| AnalyzerError::FileSystem {
                path: root.clone(),
                source: e,
            })?;
            cwd.join(&root)
        };

        let exclude = self
            .exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| {
                    AnalyzerError::Configuration(format!("invalid exclude pattern `{p}`: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let anchor = crate::path::normalize(&root.to_string_lossy());
        let matchers = self
            .rules
            .iter()
            .map(|r| RuleMatcher::new(r, &self.module).anchored_at(anchor.as_str()))
            .collect();

        let cache = match (self.cache, self.cache_settings) {
            (Some(cache), _) => cache,
            (None, Some(settings)) => open_store_cache(&settings, &root, &self.rules, &self.module),
            (None, None) => Arc::new(NullCache),
        };

        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(RustImportParser::new(self.module.clone())));

        Ok(Analyzer {
            root,
            matchers,
            module: self.module,
            parser,
            walker: self.walker.unwrap_or_else(|| Arc::new(WalkdirWalker::new())),
            cache,
            workers: self.workers.unwrap_or_else(num_cpus::get).max(1),
            exclude,
            token: self.token.unwrap_or_default(),
            timeout: self.timeout,
            progress: self.progress.unwrap_or_else(|| Arc::new(NoProgress)),
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// Opens the on-disk cache, degrading to [`NullCache`] if it is unavailable.
///
/// Entries live in a subdirectory named after the rule set, so editing the
/// rules never serves results computed under the old ones.
fn open_store_cache(
    settings: &CacheSettings,
    root: &Path,
    rules: &[Rule],
    module: &ModuleContext,
) -> Arc<dyn ResultCache> {
    let dir = settings.dir.join(ruleset_digest(rules, module));
    match FsContentStore::open(&dir, root) {
        Ok(store) => {
            debug!("Using cache at {}", dir.display());
            match settings.format {
                CacheFormat::Binary => Arc::new(StoreCache::new(store, BinaryCodec::new())),
                CacheFormat::Json => Arc::new(StoreCache::new(store, JsonCodec::new())),
            }
        }
        Err(e) => {
            warn!("{}; running without incremental cache", AnalyzerError::from(CacheError::from(e)));
            Arc::new(NullCache)
        }
    }
}

fn ruleset_digest(rules: &[Rule], module: &ModuleContext) -> String {
    let mut hasher = Sha256::new();
    hasher.update(module.root().as_bytes());
    hasher.update([0]);
    hasher.update(module.separator().as_bytes());
    for rule in rules {
        hasher.update([1]);
        hasher.update(rule.scope().as_bytes());
        for name in rule.allowed() {
            hasher.update([2]);
            hasher.update(name.as_bytes());
        }
        for p in rule.prohibited() {
            hasher.update([3]);
            hasher.update(p.name.as_bytes());
            hasher.update([0]);
            hasher.update(p.cause.as_bytes());
        }
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Enumerating,
    Dispatching,
    Aggregating,
    Done,
    Cancelled,
    Failed,
}

struct Lifecycle(RunState);

impl Lifecycle {
    fn advance(&mut self, next: RunState) {
        debug!("Analyzer state: {:?} -> {:?}", self.0, next);
        self.0 = next;
    }
}

/// What a worker produced for one file.
enum Outcome {
    Analyzed(Vec<Violation>),
    Cached(ViolationSet),
    Skipped(ParseError),
}

struct Batch {
    path: String,
    outcome: Outcome,
}

/// Stop signal checked by the feeder and the workers.
#[derive(Clone, Copy)]
struct Stop<'a> {
    token: &'a CancellationToken,
    abort: &'a AtomicBool,
}

impl Stop<'_> {
    fn is_set(self) -> bool {
        self.token.is_cancelled() || self.abort.load(Ordering::SeqCst)
    }
}

/// The analysis engine.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    matchers: Vec<RuleMatcher>,
    module: ModuleContext,
    parser: Arc<dyn ImportParser>,
    walker: Arc<dyn DirectoryWalker>,
    cache: Arc<dyn ResultCache>,
    workers: usize,
    exclude: Vec<glob::Pattern>,
    token: CancellationToken,
    timeout: Option<Duration>,
    progress: Arc<dyn ProgressReporter>,
    fail_on_parse_error: bool,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("root", &self.root)
            .field("rules", &self.matchers.len())
            .field("module", &self.module)
            .field("workers", &self.workers)
            .field("incremental", &self.cache.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.matchers.len()
    }

    /// Returns the worker thread count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns true if results are read from and written to a cache.
    #[must_use]
    pub fn is_incremental(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Analyzes every selected file under the root.
    ///
    /// A run that finds violations is a successful run. The progress
    /// reporter's `complete` hook fires once whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::FileSystem`] if the root cannot be read,
    /// [`AnalyzerError::Cancelled`] if the token fired (or the timeout
    /// passed) before the run finished, and [`AnalyzerError::Parse`] for an
    /// unparsable file when parse errors are fatal.
    pub fn run(&self) -> Result<AnalysisReport, AnalyzerError> {
        let started = Instant::now();
        let token = match self.timeout {
            Some(timeout) => self.token.with_timeout(timeout),
            None => self.token.clone(),
        };

        info!("Starting analysis at {}", self.root.display());
        let mut state = Lifecycle(RunState::Idle);
        let mut stats = RunStats::default();
        let result = self.execute(&token, &mut state, &mut stats);
        stats.elapsed = started.elapsed();

        state.advance(match &result {
            Ok(_) => RunState::Done,
            Err(AnalyzerError::Cancelled { .. }) => RunState::Cancelled,
            Err(_) => RunState::Failed,
        });
        self.progress.complete(&stats);

        let violations = result?;
        info!(
            "Analysis complete: {} violations in {} files",
            violations.len(),
            stats.files_processed()
        );
        Ok(AnalysisReport { violations, stats })
    }

    fn execute(
        &self,
        token: &CancellationToken,
        state: &mut Lifecycle,
        stats: &mut RunStats,
    ) -> Result<ViolationSet, AnalyzerError> {
        state.advance(RunState::Enumerating);
        let jobs = self.enumerate(token)?;
        let total = jobs.len();
        stats.files_total = total;
        info!("Found {total} files to analyze");

        let abort = AtomicBool::new(false);
        let stop = Stop {
            token,
            abort: &abort,
        };
        let mut violations = ViolationSet::new();
        let mut fatal: Option<ParseError> = None;

        if total > 0 {
            let workers = self.workers.min(total);
            let (job_tx, job_rx) = mpsc::sync_channel::<FileContext>(workers * 2);
            let job_rx = Mutex::new(job_rx);
            let (batch_tx, batch_rx) = mpsc::channel::<Batch>();

            state.advance(RunState::Dispatching);
            thread::scope(|s| {
                s.spawn(move || {
                    for job in jobs {
                        if stop.is_set() || job_tx.send(job).is_err() {
                            break;
                        }
                    }
                });

                for id in 0..workers {
                    let batch_tx = batch_tx.clone();
                    let job_rx = &job_rx;
                    s.spawn(move || self.work(id, job_rx, &batch_tx, stop));
                }
                drop(batch_tx);

                state.advance(RunState::Aggregating);
                for batch in batch_rx {
                    if stop.is_set() {
                        debug!("Discarding result for {} after cancellation", batch.path);
                        continue;
                    }
                    match batch.outcome {
                        Outcome::Analyzed(found) => {
                            stats.files_analyzed += 1;
                            stats.violations += found.len();
                            violations.append(found);
                        }
                        Outcome::Cached(found) => {
                            stats.files_cached += 1;
                            stats.violations += found.len();
                            violations.append(found.into_vec());
                        }
                        Outcome::Skipped(e) => {
                            stats.files_skipped += 1;
                            if self.fail_on_parse_error {
                                fatal.get_or_insert(e);
                                abort.store(true, Ordering::SeqCst);
                            } else {
                                warn!("Skipping {}: {e}", batch.path);
                            }
                        }
                    }
                    self.progress
                        .update_progress(stats.files_processed(), total);
                }
            });
        }

        if let Some(e) = fatal {
            return Err(AnalyzerError::Parse(e));
        }
        if token.is_cancelled() {
            return Err(AnalyzerError::Cancelled {
                processed: stats.files_processed(),
                total,
            });
        }
        Ok(violations)
    }

    /// Walks the root and returns the sorted list of file jobs.
    fn enumerate(&self, token: &CancellationToken) -> Result<Vec<FileContext>, AnalyzerError> {
        std::fs::read_dir(&self.root).map_err(|e| AnalyzerError::FileSystem {
            path: self.root.clone(),
            source: e,
        })?;

        let mut jobs = Vec::new();
        for entry in self.walker.walk(&self.root) {
            if token.is_cancelled() {
                return Err(AnalyzerError::Cancelled {
                    processed: 0,
                    total: jobs.len(),
                });
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };
            if entry.is_dir || !self.parser.accepts(&entry.path) {
                continue;
            }

            let job = FileContext::new(&entry.path, &self.root);
            if self.should_exclude(&job.relative_path) {
                debug!("Excluding: {}", job.relative_path);
                continue;
            }
            jobs.push(job);
        }

        jobs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(jobs)
    }

    /// Checks if a root-relative path matches an exclude pattern.
    fn should_exclude(&self, relative: &str) -> bool {
        let rooted = format!("/{relative}");
        self.exclude
            .iter()
            .any(|p| p.matches(relative) || p.matches(&rooted))
    }

    fn work(
        &self,
        id: usize,
        jobs: &Mutex<mpsc::Receiver<FileContext>>,
        batches: &mpsc::Sender<Batch>,
        stop: Stop<'_>,
    ) {
        debug!("Worker {id} started");
        loop {
            // The guard is released at the end of this statement.
            let Ok(job) = jobs.lock().recv() else {
                break;
            };
            // Keep draining so the feeder never blocks on a full queue.
            if stop.is_set() {
                continue;
            }

            self.progress.start_file(&job.relative_path);
            let outcome = self.process(&job);
            let count = match &outcome {
                Outcome::Analyzed(v) => v.len(),
                Outcome::Cached(v) => v.len(),
                Outcome::Skipped(_) => 0,
            };
            self.progress.complete_file(&job.relative_path, count);

            let batch = Batch {
                path: job.relative_path,
                outcome,
            };
            if batches.send(batch).is_err() {
                break;
            }
        }
        debug!("Worker {id} finished");
    }

    fn process(&self, job: &FileContext) -> Outcome {
        match self.cache.has_entry(&job.relative_path) {
            Ok(Some(cached)) => return Outcome::Cached(cached),
            Ok(None) => {}
            Err(e) => warn!(
                "{}; re-analyzing {}",
                AnalyzerError::from(e),
                job.relative_path
            ),
        }

        let imports = match self.parser.parse_imports(job) {
            Ok(imports) => imports,
            Err(e) => return Outcome::Skipped(e),
        };

        let violations: Vec<Violation> = self
            .matchers
            .iter()
            .filter(|m| m.applies_to(&job.dir))
            .flat_map(|m| m.check_imports(&job.relative_path, &imports))
            .collect();

        if let Err(e) = self
            .cache
            .add_file_with_violations(&job.relative_path, &violations)
        {
            warn!("{}", AnalyzerError::from(e));
        }

        Outcome::Analyzed(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .rule(Rule::new("src"))
            .workers(3)
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().is_absolute());
        assert_eq!(analyzer.rule_count(), 1);
        assert_eq!(analyzer.workers(), 3);
        assert!(!analyzer.is_incremental());
    }

    #[test]
    fn test_zero_workers_means_one() {
        let analyzer = Analyzer::builder().workers(0).build().unwrap();
        assert_eq!(analyzer.workers(), 1);
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/target/**")
            .exclude("**/vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude("target/debug/main.rs"));
        assert!(analyzer.should_exclude("crates/x/target/gen.rs"));
        assert!(analyzer.should_exclude("vendor/lib.rs"));
        assert!(!analyzer.should_exclude("src/lib.rs"));
    }

    #[test]
    fn test_invalid_exclude_is_configuration_error() {
        let err = Analyzer::builder().exclude("[").build().unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
    }

    #[test]
    fn test_explicit_cache_wins() {
        let analyzer = Analyzer::builder()
            .cache(StoreCache::new(MemoryStore::new(), BinaryCodec::new()))
            .build()
            .unwrap();
        assert!(analyzer.is_incremental());
    }

    #[test]
    fn test_unavailable_cache_degrades() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let analyzer = Analyzer::builder()
            .root(tmp.path())
            .incremental(Some(CacheSettings {
                dir: blocker.join("cache"),
                format: CacheFormat::Binary,
            }))
            .build()
            .unwrap();
        assert!(!analyzer.is_incremental());
    }

    #[test]
    fn test_ruleset_digest_tracks_rules() {
        let module = ModuleContext::new("app");
        let a = ruleset_digest(&[Rule::new("src").prohibit("db", "x")], &module);
        let b = ruleset_digest(&[Rule::new("src").prohibit("db", "y")], &module);
        let c = ruleset_digest(&[Rule::new("src").prohibit("db", "x")], &module);
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::builder()
            .root(tmp.path().join("missing"))
            .build()
            .unwrap();
        assert!(matches!(
            analyzer.run(),
            Err(AnalyzerError::FileSystem { .. })
        ));
    }

    #[test]
    fn test_empty_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let report = Analyzer::builder().root(tmp.path()).build().unwrap().run().unwrap();
        assert!(!report.has_violations());
        assert_eq!(report.stats.files_total, 0);
    }

    #[test]
    fn test_rust_sources_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("src/domain")).unwrap();
        std::fs::write(tmp.path().join("src/lib.rs"), "pub mod domain;").unwrap();
        std::fs::write(
            tmp.path().join("src/domain/user.rs"),
            "use crate::infra::Db;\nuse std::fmt;\n",
        )
        .unwrap();

        let report = Analyzer::builder()
            .root(tmp.path())
            .module(ModuleContext::with_separator("app", "::"))
            .rule(Rule::new("src/domain").prohibit("infra::Db", "domain must not touch infra"))
            .workers(2)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.violations.len(), 1);
        let v = &report.violations.as_slice()[0];
        assert_eq!(v.file, "src/domain/user.rs");
        assert_eq!(v.import, "app::infra::Db");
        assert_eq!(report.stats.files_analyzed, 2);
    }

    #[test]
    fn test_parse_errors_fatal_on_request() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bad.rs"), "fn {").unwrap();

        let lenient = Analyzer::builder().root(tmp.path()).build().unwrap();
        let report = lenient.run().unwrap();
        assert_eq!(report.stats.files_skipped, 1);

        let strict = Analyzer::builder()
            .root(tmp.path())
            .fail_on_parse_error(true)
            .build()
            .unwrap();
        assert!(matches!(strict.run(), Err(AnalyzerError::Parse(_))));
    }
}
