//! Resolves the selection model into a concrete, ordered file list.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::core::{ResolvedFile, WalkOutcome};
use crate::store::{Selection, SelectionKind};

/// Directory names skipped during recursive traversal, at any depth.
pub const DEFAULT_PRUNE_NAMES: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    "target",
    "build",
    ".venv",
    "venv",
    "dist",
];

/// Walks a project's selections and produces the deterministic file list
/// that feeds the context assembler.
pub struct TreeWalker {
    prune_names: HashSet<String>,
    context_filename: String,
}

impl TreeWalker {
    pub fn new(prune_names: &[String], context_filename: &str) -> Self {
        Self {
            prune_names: prune_names.iter().cloned().collect(),
            context_filename: context_filename.to_string(),
        }
    }

    /// Resolves `selections` against the file system under `root`.
    ///
    /// File selections are included verbatim; directory selections are
    /// walked recursively with their filter set applied. Missing paths
    /// produce warnings, never errors. The returned list is deduplicated
    /// (first selection wins) and ordered depth-first with subdirectories
    /// before files, alphabetically within each group, so repeated runs
    /// over an unchanged tree yield byte-identical output downstream.
    pub fn resolve(&self, root: &Path, selections: &[Selection]) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for selection in selections {
            match selection.kind {
                SelectionKind::File => {
                    self.resolve_file(root, selection, &mut seen, &mut outcome)
                }
                SelectionKind::Directory => {
                    self.resolve_directory(root, selection, &mut seen, &mut outcome)
                }
            }
        }

        outcome
            .files
            .sort_by(|a, b| compare_tree_order(&relative(root, &a.path), &relative(root, &b.path)));
        outcome
    }

    fn resolve_file(
        &self,
        root: &Path,
        selection: &Selection,
        seen: &mut HashSet<PathBuf>,
        outcome: &mut WalkOutcome,
    ) {
        if !selection.path.is_file() {
            outcome
                .warnings
                .push(format!("Selected path not found: {}", display_rel(root, &selection.path)));
            return;
        }
        if self.is_context_file(&selection.path) {
            return;
        }
        if seen.insert(selection.path.clone()) {
            outcome.files.push(ResolvedFile {
                path: selection.path.clone(),
                selection_id: selection.id,
            });
        }
    }

    fn resolve_directory(
        &self,
        root: &Path,
        selection: &Selection,
        seen: &mut HashSet<PathBuf>,
        outcome: &mut WalkOutcome,
    ) {
        if !selection.path.is_dir() {
            outcome
                .warnings
                .push(format!("Selected path not found: {}", display_rel(root, &selection.path)));
            return;
        }

        let filters = FilterSet::parse(&selection.extension_filters);
        if filters.is_empty() {
            debug!(path = %selection.path.display(), "directory selection has no filters, skipping");
            return;
        }

        let walker = WalkDir::new(&selection.path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !name.starts_with('.') && !self.prune_names.contains(name.as_ref())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    outcome.warnings.push(format!("Walk error: {e}"));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if self.is_context_file(entry.path()) {
                continue;
            }
            if !filters.matches(entry.path()) {
                continue;
            }
            let path = entry.path().to_path_buf();
            if seen.insert(path.clone()) {
                outcome.files.push(ResolvedFile {
                    path,
                    selection_id: selection.id,
                });
            }
        }
    }

    fn is_context_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy() == self.context_filename)
            .unwrap_or(false)
    }
}

/// The parsed filter set of a directory selection.
///
/// Each raw entry is either an extension (leading dot optional, matched
/// case-insensitively) or, when it contains an interior dot, an exact
/// filename such as `CMakeLists.txt`. An empty set matches nothing.
struct FilterSet {
    extensions: HashSet<String>,
    filenames: HashSet<String>,
}

impl FilterSet {
    fn parse(raw: &[String]) -> Self {
        let mut extensions = HashSet::new();
        let mut filenames = HashSet::new();
        for entry in raw {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let stripped = entry.strip_prefix('.').unwrap_or(entry);
            if stripped.contains('.') {
                filenames.insert(entry.to_lowercase());
            } else {
                extensions.insert(stripped.to_lowercase());
            }
        }
        Self {
            extensions,
            filenames,
        }
    }

    fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.filenames.is_empty()
    }

    fn matches(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name() {
            if self.filenames.contains(&name.to_string_lossy().to_lowercase()) {
                return true;
            }
        }
        if let Some(ext) = path.extension() {
            if self.extensions.contains(&ext.to_string_lossy().to_lowercase()) {
                return true;
            }
        }
        false
    }
}

/// Orders relative paths depth-first with subdirectories before files at
/// each level, alphabetically within each group.
pub fn compare_tree_order(a: &Path, b: &Path) -> Ordering {
    let a_parts: Vec<&str> = components(a);
    let b_parts: Vec<&str> = components(b);

    let mut i = 0;
    loop {
        match (a_parts.get(i), b_parts.get(i)) {
            (Some(ac), Some(bc)) => {
                let a_is_leaf = i + 1 == a_parts.len();
                let b_is_leaf = i + 1 == b_parts.len();
                if ac == bc {
                    if a_is_leaf != b_is_leaf {
                        // A file and a directory sharing a name at the same
                        // level; the directory's contents come first.
                        return if a_is_leaf {
                            Ordering::Greater
                        } else {
                            Ordering::Less
                        };
                    }
                    i += 1;
                    continue;
                }
                return match (a_is_leaf, b_is_leaf) {
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    _ => ac.cmp(bc),
                };
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

fn components(path: &Path) -> Vec<&str> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect()
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Renders a path relative to the project root with forward slashes, for
/// warnings and UI display. Paths outside the root stay absolute.
pub fn display_rel(root: &Path, path: &Path) -> String {
    let rel = relative(root, path);
    let parts: Vec<&str> = components(&rel);
    if parts.is_empty() {
        rel.to_string_lossy().into_owned()
    } else {
        parts.join("/")
    }
}
