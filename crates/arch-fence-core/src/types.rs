//! Core types for boundary violations and run results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Detail text carried by a prohibition violation.
pub const DETAIL_PROHIBITED: &str = "import is prohibited";

/// Detail text carried by a whitelist violation.
pub const DETAIL_NOT_ALLOWED: &str = "import is not in allowed list";

/// Which rule clause an import broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// The import is listed in the rule's prohibitions.
    Prohibited,
    /// The rule has an allow list and the import is not on it.
    NotAllowed,
}

impl ViolationKind {
    /// Returns the fixed detail text for this kind.
    #[must_use]
    pub fn detail(self) -> &'static str {
        match self {
            Self::Prohibited => DETAIL_PROHIBITED,
            Self::NotAllowed => DETAIL_NOT_ALLOWED,
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prohibited => write!(f, "prohibited"),
            Self::NotAllowed => write!(f, "not-allowed"),
        }
    }
}

/// A single import that breaks a boundary rule.
///
/// Violations are immutable once created. The only field ever rewritten is
/// `cached`, and only by the cache when it rehydrates stored results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// Source file, relative to the analysis root.
    pub file: String,
    /// The offending import identifier as the parser reported it.
    pub import: String,
    /// Scope of the rule that was broken.
    pub rule: String,
    /// User-supplied cause (empty for whitelist violations).
    pub cause: String,
    /// Fixed detail text; see [`ViolationKind::detail`].
    pub details: String,
    /// `true` when this violation was replayed from the incremental cache.
    pub cached: bool,
}

impl Violation {
    /// Creates a freshly computed violation.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        import: impl Into<String>,
        rule: impl Into<String>,
        kind: ViolationKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            import: import.into(),
            rule: rule.into(),
            cause: cause.into(),
            details: kind.detail().to_string(),
            cached: false,
        }
    }

    /// Returns which rule clause was broken, if `details` is recognized.
    #[must_use]
    pub fn kind(&self) -> Option<ViolationKind> {
        match self.details.as_str() {
            DETAIL_PROHIBITED => Some(ViolationKind::Prohibited),
            DETAIL_NOT_ALLOWED => Some(ViolationKind::NotAllowed),
            _ => None,
        }
    }

    /// Returns a copy marked as replayed from the cache.
    #[must_use]
    pub fn into_cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: `{}` {}", self.file, self.import, self.details)?;
        if !self.cause.is_empty() {
            write!(f, ": {}", self.cause)?;
        }
        write!(f, " (rule: {})", self.rule)?;
        if self.cached {
            write!(f, " [cached]")?;
        }
        Ok(())
    }
}

/// The aggregate result of one analysis run.
///
/// Insertion order is discovery order, which depends on worker scheduling.
/// Callers that need stable output should use [`ViolationSet::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationSet {
    violations: Vec<Violation>,
}

impl ViolationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no violations were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Returns the violations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the set, returning the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Violation> {
        self.violations
    }

    /// Groups violations by source file.
    #[must_use]
    pub fn by_file(&self) -> BTreeMap<&str, Vec<&Violation>> {
        let mut groups: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for v in &self.violations {
            groups.entry(v.file.as_str()).or_default().push(v);
        }
        groups
    }

    /// Groups violations by rule scope.
    #[must_use]
    pub fn by_rule(&self) -> BTreeMap<&str, Vec<&Violation>> {
        let mut groups: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for v in &self.violations {
            groups.entry(v.rule.as_str()).or_default().push(v);
        }
        groups
    }

    /// Returns the violations ordered by file, then rule, then import.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Violation> {
        let mut out: Vec<&Violation> = self.violations.iter().collect();
        out.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.rule.cmp(&b.rule))
                .then_with(|| a.import.cmp(&b.import))
        });
        out
    }

    /// Compares contents ignoring order and the `cached` flag.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        fn key(v: &Violation) -> (&str, &str, &str, &str, &str) {
            (
                v.file.as_str(),
                v.rule.as_str(),
                v.import.as_str(),
                v.cause.as_str(),
                v.details.as_str(),
            )
        }
        let mut left: Vec<_> = self.violations.iter().map(key).collect();
        let mut right: Vec<_> = other.violations.iter().map(key).collect();
        left.sort_unstable();
        right.sort_unstable();
        left == right
    }

    pub(crate) fn append(&mut self, batch: Vec<Violation>) {
        self.violations.extend(batch);
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Violation>> for ViolationSet {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Files selected for analysis.
    pub files_total: usize,
    /// Files evaluated from source.
    pub files_analyzed: usize,
    /// Files answered by the incremental cache.
    pub files_cached: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_skipped: usize,
    /// Violations merged into the aggregate.
    pub violations: usize,
    /// Wall-clock duration of the run.
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

impl RunStats {
    /// Files whose batch reached the aggregator.
    #[must_use]
    pub fn files_processed(&self) -> usize {
        self.files_analyzed + self.files_cached + self.files_skipped
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// Successful outcome of an analysis run.
///
/// A report with violations is still a successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Every violation found.
    pub violations: ViolationSet,
    /// Run counters.
    pub stats: RunStats,
}

impl AnalysisReport {
    /// Returns true if any violation was found.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}
