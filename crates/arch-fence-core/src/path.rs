//! Path normalization and scope comparison.
//!
//! All paths handled by the engine are compared in a canonical string form:
//! forward slashes, no `.` segments, `..` folded into its parent, and no
//! trailing separator. Rule scopes and file directories are both reduced to
//! this form before any prefix test.

use std::path::Path;

/// Returns the canonical form of `path`.
///
/// An empty input stays empty. A non-empty path that reduces to nothing
/// becomes `"."` (or `"/"` when absolute).
///
/// # Example
///
/// ```
/// use arch_fence_core::path::normalize;
///
/// assert_eq!(normalize("./src//domain/../infra/"), "src/infra");
/// assert_eq!(normalize("a\\b"), "a/b");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `/..` is `/`
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    match (absolute, segments.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", segments.join("/")),
        (false, true) => ".".to_string(),
        (false, false) => segments.join("/"),
    }
}

/// Concatenates `parts` with `/` and normalizes the result.
///
/// Empty parts are ignored.
#[must_use]
pub fn join(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Tests whether `child` is `parent` or lies underneath it.
///
/// An empty or `"."` parent matches everything.
///
/// # Example
///
/// ```
/// use arch_fence_core::path::is_sub_path;
///
/// assert!(is_sub_path("internal/domain", "internal/domain/x/y"));
/// assert!(!is_sub_path("internal/domain", "internal/domains"));
/// assert!(is_sub_path("", "anything"));
/// ```
#[must_use]
pub fn is_sub_path(parent: &str, child: &str) -> bool {
    let parent = normalize(parent);
    if parent.is_empty() || parent == "." {
        return true;
    }

    let child = normalize(child);
    if child == parent {
        return true;
    }
    if parent == "/" {
        return child.starts_with('/');
    }

    child
        .strip_prefix(parent.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Decides whether a rule `scope` covers the directory `dir`.
///
/// The plain comparison runs first. When it fails and exactly one side is
/// absolute, the relative side is resolved against the analysis `root` and
/// the two absolute forms are compared again. An empty `root` disables the
/// retry.
///
/// # Example
///
/// ```
/// use arch_fence_core::path::scope_covers;
///
/// assert!(scope_covers("/work/app", "src", "/work/app/src/domain"));
/// assert!(!scope_covers("/work/app", "src", "tools/gen/src"));
/// ```
#[must_use]
pub fn scope_covers(root: &str, scope: &str, dir: &str) -> bool {
    if is_sub_path(scope, dir) {
        return true;
    }
    if root.is_empty() || is_absolute(scope) == is_absolute(dir) {
        return false;
    }
    is_sub_path(&resolve(root, scope), &resolve(root, dir))
}

/// Resolves `path` against `root` unless it is already absolute.
#[must_use]
pub fn resolve(root: &str, path: &str) -> String {
    if is_absolute(path) {
        normalize(path)
    } else {
        join(&[root, path])
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute()
}

/// Returns the containing directory of a file path, in canonical form.
///
/// A file at the top level yields `"."`.
#[must_use]
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
        None => ".".to_string(),
    }
}

/// Expresses `path` relative to `root` in canonical form.
///
/// Paths outside `root` are returned normalized but otherwise unchanged.
#[must_use]
pub fn relative_to(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    normalize(&rel.to_string_lossy())
}
