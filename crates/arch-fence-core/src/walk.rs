//! Directory traversal.

use std::path::{Path, PathBuf};

/// One entry produced by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Entry path, rooted at the walk root.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// A per-entry walk failure. The analyzer logs these and keeps going.
#[derive(Debug, thiserror::Error)]
#[error("walk error: {message}")]
pub struct WalkError {
    /// Path involved, when known.
    pub path: Option<PathBuf>,
    /// Failure description.
    pub message: String,
}

/// Iterator type returned by [`DirectoryWalker::walk`].
pub type WalkIter<'a> = Box<dyn Iterator<Item = Result<WalkEntry, WalkError>> + 'a>;

/// Enumerates the entries below a root directory.
pub trait DirectoryWalker: Send + Sync {
    /// Walks `root` recursively.
    fn walk<'a>(&'a self, root: &'a Path) -> WalkIter<'a>;
}

/// Plain recursive walk with `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirWalker {
    follow_links: bool,
}

impl WalkdirWalker {
    /// Creates a walker that does not follow symlinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether symlinks are followed.
    #[must_use]
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

impl DirectoryWalker for WalkdirWalker {
    fn walk<'a>(&'a self, root: &'a Path) -> WalkIter<'a> {
        let iter = walkdir::WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .map(|entry| match entry {
                Ok(entry) => Ok(WalkEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                }),
                Err(e) => Err(WalkError {
                    path: e.path().map(Path::to_path_buf),
                    message: e.to_string(),
                }),
            });
        Box::new(iter)
    }
}

/// Walk honoring `.gitignore`, `.ignore` and git excludes via `ignore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitignoreWalker {
    hidden: bool,
}

impl GitignoreWalker {
    /// Creates a walker that still visits hidden files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether hidden files are skipped.
    #[must_use]
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.hidden = skip;
        self
    }
}

impl DirectoryWalker for GitignoreWalker {
    fn walk<'a>(&'a self, root: &'a Path) -> WalkIter<'a> {
        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .hidden(self.hidden)
            .git_ignore(true)
            .require_git(false);

        let iter = builder.build().map(|entry| match entry {
            Ok(entry) => Ok(WalkEntry {
                is_dir: entry.file_type().is_some_and(|t| t.is_dir()),
                path: entry.into_path(),
            }),
            Err(e) => Err(WalkError {
                path: None,
                message: e.to_string(),
            }),
        });
        Box::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/domain")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("src/domain/user.rs"), "").unwrap();
        fs::write(dir.path().join("target/gen.rs"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        dir
    }

    fn files(walker: &dyn DirectoryWalker, root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walker
            .walk(root)
            .filter_map(Result::ok)
            .filter(|e| !e.is_dir)
            .map(|e| crate::path::relative_to(root, &e.path))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn walkdir_sees_everything() {
        let dir = fixture();
        assert_eq!(
            files(&WalkdirWalker::new(), dir.path()),
            vec![".gitignore", "src/domain/user.rs", "src/lib.rs", "target/gen.rs"]
        );
    }

    #[test]
    fn gitignore_walker_skips_ignored() {
        let dir = fixture();
        assert_eq!(
            files(&GitignoreWalker::new(), dir.path()),
            vec![".gitignore", "src/domain/user.rs", "src/lib.rs"]
        );
    }

    #[test]
    fn missing_root_yields_error_entry() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let walker = WalkdirWalker::new();
        let entries: Vec<_> = walker.walk(&missing).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_err());
    }
}
