//! Import extraction.
//!
//! The analyzer only needs an ordered list of import identifiers per file.
//! [`ImportParser`] is that seam; [`RustImportParser`] implements it for Rust
//! sources with `syn`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

use crate::context::{FileContext, ModuleContext};

/// Errors extracting imports from one file.
///
/// A parse error only skips the file it belongs to.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid source for this parser.
    #[error("Parse error in {path}: {message}")]
    Syntax {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Extracts import identifiers from source files.
pub trait ImportParser: Send + Sync {
    /// File extensions this parser handles, without the dot.
    fn extensions(&self) -> &[&str];

    /// Whether the enumerator should keep `path`.
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }

    /// Returns the file's imports in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn parse_imports(&self, file: &FileContext) -> Result<Vec<String>, ParseError>;
}

/// Extracts `use` and `extern crate` paths from Rust files.
///
/// Paths are reported with `::` separators. Leading `crate`, `self` and
/// `super` segments are resolved against the module root and the file's
/// module path, so `use super::infra::Db` in `src/domain/user.rs` becomes
/// `my_app::infra::Db`. Globs and `self` leaves report the module itself.
#[derive(Debug, Clone)]
pub struct RustImportParser {
    module: ModuleContext,
}

impl RustImportParser {
    /// Creates a parser resolving `crate` to `module`'s root.
    #[must_use]
    pub fn new(module: ModuleContext) -> Self {
        Self { module }
    }

    fn root(&self) -> &str {
        match self.module.root() {
            "" => "crate",
            root => root,
        }
    }

    /// Extracts imports from already-loaded source text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] if `source` is not valid Rust.
    pub fn parse_source(&self, file: &FileContext, source: &str) -> Result<Vec<String>, ParseError> {
        let ast = syn::parse_file(source).map_err(|e| ParseError::Syntax {
            path: file.path.clone(),
            message: e.to_string(),
        })?;

        let mut collector = UseCollector {
            module_path: file.module_path(),
            raw: Vec::new(),
        };
        collector.visit_file(&ast);

        let mut seen = HashSet::new();
        Ok(collector
            .raw
            .into_iter()
            .map(|(segments, scope)| self.resolve(&segments, &scope))
            .filter(|import| seen.insert(import.clone()))
            .collect())
    }

    fn resolve(&self, segments: &[String], module_path: &[String]) -> String {
        let Some(first) = segments.first() else {
            return self.root().to_string();
        };

        let (base, rest): (Vec<&str>, &[String]) = match first.as_str() {
            "crate" => (vec![self.root()], &segments[1..]),
            "self" => {
                let mut base = vec![self.root()];
                base.extend(module_path.iter().map(String::as_str));
                (base, &segments[1..])
            }
            "super" => {
                let supers = segments.iter().take_while(|s| *s == "super").count();
                let keep = module_path.len().saturating_sub(supers);
                let mut base = vec![self.root()];
                base.extend(module_path[..keep].iter().map(String::as_str));
                (base, &segments[supers..])
            }
            _ => (Vec::new(), segments),
        };

        base.into_iter()
            .chain(rest.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::")
    }
}

impl ImportParser for RustImportParser {
    fn extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn parse_imports(&self, file: &FileContext) -> Result<Vec<String>, ParseError> {
        let source = std::fs::read_to_string(&file.path).map_err(|e| ParseError::Io {
            path: file.path.clone(),
            source: e,
        })?;
        self.parse_source(file, &source)
    }
}

/// Collects raw use paths along with the module they were written in.
struct UseCollector {
    module_path: Vec<String>,
    raw: Vec<(Vec<String>, Vec<String>)>,
}

impl<'ast> Visit<'ast> for UseCollector {
    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        for segments in expand_use_tree(&node.tree, &[]) {
            self.raw.push((segments, self.module_path.clone()));
        }
    }

    fn visit_item_extern_crate(&mut self, node: &'ast syn::ItemExternCrate) {
        if node.ident != "self" {
            self.raw
                .push((vec![node.ident.to_string()], self.module_path.clone()));
        }
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_some() {
            self.module_path.push(node.ident.to_string());
            syn::visit::visit_item_mod(self, node);
            self.module_path.pop();
        }
    }
}

/// Flattens a use tree into segment lists.
///
/// `use std::collections::{HashMap, hash_map::{self, Entry}};` yields
/// `std::collections::HashMap`, `std::collections::hash_map` and
/// `std::collections::hash_map::Entry`.
fn expand_use_tree(tree: &syn::UseTree, prefix: &[String]) -> Vec<Vec<String>> {
    let extend = |ident: &syn::Ident| {
        let mut path = prefix.to_vec();
        path.push(ident.to_string());
        path
    };

    match tree {
        syn::UseTree::Path(p) => expand_use_tree(&p.tree, &extend(&p.ident)),
        syn::UseTree::Name(n) if n.ident == "self" => vec![prefix.to_vec()],
        syn::UseTree::Name(n) => vec![extend(&n.ident)],
        syn::UseTree::Rename(r) if r.ident == "self" => vec![prefix.to_vec()],
        syn::UseTree::Rename(r) => vec![extend(&r.ident)],
        syn::UseTree::Glob(_) => {
            if prefix.is_empty() {
                Vec::new()
            } else {
                vec![prefix.to_vec()]
            }
        }
        syn::UseTree::Group(g) => g
            .items
            .iter()
            .flat_map(|item| expand_use_tree(item, prefix))
            .collect(),
    }
}
