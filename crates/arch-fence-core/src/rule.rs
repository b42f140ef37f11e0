//! Boundary rules and their precomputed matchers.

use std::collections::{HashMap, HashSet};

use crate::context::ModuleContext;
use crate::path;
use crate::types::{Violation, ViolationKind};

/// A prohibited import and the reason it is prohibited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prohibition {
    /// Import identifier, bare or fully qualified.
    pub name: String,
    /// Human-readable cause reported with the violation.
    pub cause: String,
}

impl Prohibition {
    /// Creates a new prohibition.
    #[must_use]
    pub fn new(name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cause: cause.into(),
        }
    }
}

/// A path-scoped import policy.
///
/// When `allowed` is non-empty the rule runs in whitelist mode. Entries in
/// `prohibited` always win over `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    scope: String,
    allowed: Vec<String>,
    prohibited: Vec<Prohibition>,
}

impl Rule {
    /// Creates a default-allow rule for `scope`.
    #[must_use]
    pub fn new(scope: &str) -> Self {
        Self {
            scope: path::normalize(scope),
            allowed: Vec::new(),
            prohibited: Vec::new(),
        }
    }

    /// Adds identifiers to the allow list.
    #[must_use]
    pub fn allow<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a prohibited identifier with its cause.
    #[must_use]
    pub fn prohibit(mut self, name: impl Into<String>, cause: impl Into<String>) -> Self {
        self.prohibited.push(Prohibition::new(name, cause));
        self
    }

    /// Returns the normalized scope path.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the allow list (empty means default-allow).
    #[must_use]
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Returns the prohibitions in declaration order.
    #[must_use]
    pub fn prohibited(&self) -> &[Prohibition] {
        &self.prohibited
    }
}

/// Lookup structures for one rule, built once and shared across workers.
///
/// Identifiers are compared exactly. Under a `::` module context an entry
/// also covers every path beneath it, so `infra` matches
/// `my_app::infra::db::Pool`.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    scope: String,
    root: String,
    nested: Option<String>,
    allow: Option<HashSet<String>>,
    prohibit: HashMap<String, String>,
}

impl RuleMatcher {
    /// Precomputes the allow set and prohibit map for `rule`.
    ///
    /// Every bare entry is registered under both its bare and its
    /// module-qualified spelling.
    #[must_use]
    pub fn new(rule: &Rule, module: &ModuleContext) -> Self {
        let allow = if rule.allowed.is_empty() {
            None
        } else {
            let mut set = HashSet::with_capacity(rule.allowed.len() * 2);
            for name in &rule.allowed {
                if let Some(qualified) = module.qualify(name) {
                    set.insert(qualified);
                }
                set.insert(name.clone());
            }
            Some(set)
        };

        let mut prohibit = HashMap::with_capacity(rule.prohibited.len() * 2);
        for p in &rule.prohibited {
            if let Some(qualified) = module.qualify(&p.name) {
                prohibit
                    .entry(qualified)
                    .or_insert_with(|| p.cause.clone());
            }
            prohibit
                .entry(p.name.clone())
                .or_insert_with(|| p.cause.clone());
        }

        Self {
            scope: rule.scope.clone(),
            root: String::new(),
            nested: (module.separator() == ModuleContext::RUST_SEPARATOR)
                .then(|| module.separator().to_string()),
            allow,
            prohibit,
        }
    }

    /// Anchors the scope at the analysis root.
    ///
    /// Absolute directories are then compared against `root/scope`.
    #[must_use]
    pub fn anchored_at(mut self, root: impl Into<String>) -> Self {
        self.root = path::normalize(&root.into());
        self
    }

    /// Returns the scope this matcher was built for.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Tests whether this rule applies to files in `dir`.
    #[must_use]
    pub fn applies_to(&self, dir: &str) -> bool {
        path::scope_covers(&self.root, &self.scope, dir)
    }

    /// Evaluates one import of `file`.
    #[must_use]
    pub fn check_import(&self, file: &str, import: &str) -> Option<Violation> {
        if let Some(cause) = self.candidates(import).find_map(|c| self.prohibit.get(c)) {
            return Some(Violation::new(
                file,
                import,
                &self.scope,
                ViolationKind::Prohibited,
                cause.as_str(),
            ));
        }

        match &self.allow {
            Some(allow) if !self.candidates(import).any(|c| allow.contains(c)) => Some(Violation::new(
                file,
                import,
                &self.scope,
                ViolationKind::NotAllowed,
                "",
            )),
            _ => None,
        }
    }

    /// The identifier itself, then its enclosing paths when nesting applies.
    fn candidates<'a>(&'a self, import: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(import), move |&current: &&'a str| {
            let separator = self.nested.as_deref()?;
            current.rsplit_once(separator).map(|(parent, _)| parent)
        })
    }

    /// Evaluates every import of `file` in order.
    #[must_use]
    pub fn check_imports(&self, file: &str, imports: &[String]) -> Vec<Violation> {
        imports
            .iter()
            .filter_map(|import| self.check_import(file, import))
            .collect()
    }
}
