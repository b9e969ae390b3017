//! Builds the concatenated context artifact from a resolved file list.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::core::WalkOutcome;
use crate::utils::file_detection::is_binary;

const STRUCTURE_HEADER: &str =
    "----- Project Structure (Files included in context file indicated with *) -----";
const STRUCTURE_FOOTER: &str = "----- End Project Structure -----";

/// The fully rendered context artifact plus everything that went wrong
/// while producing it.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub warnings: Vec<String>,
    /// Number of files whose content made it into the artifact.
    pub file_count: usize,
}

/// Renders the structure summary followed by one block per resolved file.
///
/// Binary and unreadable files yield a placeholder block and a warning;
/// assembly never fails outright. With no resolved files the output is the
/// summary alone.
pub fn assemble(root: &Path, outcome: &WalkOutcome) -> AssembledContext {
    let mut warnings = outcome.warnings.clone();
    let mut text = String::new();

    text.push_str(STRUCTURE_HEADER);
    text.push('\n');
    text.push_str(&render_structure(root, outcome));
    text.push_str(STRUCTURE_FOOTER);
    text.push_str("\n\n");

    for warning in &outcome.warnings {
        text.push_str(&format!("----- Warning: {warning} -----\n"));
    }
    if !outcome.warnings.is_empty() {
        text.push('\n');
    }

    let mut file_count = 0;
    for file in &outcome.files {
        let rel = super::walker::display_rel(root, &file.path);

        if is_binary(&file.path) {
            warn!(path = %rel, "skipping binary file");
            warnings.push(format!("Skipped binary file: {rel}"));
            text.push_str(&format!("----- File: {rel} (Skipped Binary File) -----\n"));
            text.push_str(&format!("----- End File: {rel} -----\n\n"));
            continue;
        }

        match fs::read(&file.path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                text.push_str(&format!("----- File: {rel} -----\n"));
                text.push_str(content.trim_end());
                text.push('\n');
                text.push_str(&format!("----- End File: {rel} -----\n\n"));
                file_count += 1;
            }
            Err(e) => {
                warn!(path = %rel, error = %e, "failed to read file");
                warnings.push(format!("Error reading file {rel}: {e}"));
                text.push_str(&format!("----- Error reading file: {rel} -----\n"));
                text.push_str(&format!("Error: {e}\n"));
                text.push_str(&format!("----- End Error: {rel} -----\n\n"));
            }
        }
    }

    AssembledContext {
        text,
        warnings,
        file_count,
    }
}

/// One level of the summary tree. Directories recurse, files are leaves.
#[derive(Default)]
struct SummaryNode {
    dirs: BTreeMap<String, SummaryNode>,
    files: BTreeSet<String>,
}

impl SummaryNode {
    fn insert(&mut self, parts: &[&str]) {
        match parts {
            [] => {}
            [file] => {
                self.files.insert((*file).to_string());
            }
            [dir, rest @ ..] => {
                self.dirs.entry((*dir).to_string()).or_default().insert(rest);
            }
        }
    }

    fn render(&self, prefix: &str, out: &mut String) {
        let total = self.dirs.len() + self.files.len();
        let mut index = 0;

        for (name, child) in &self.dirs {
            index += 1;
            let is_last = index == total;
            let connector = if is_last { "└── " } else { "├── " };
            out.push_str(&format!("{prefix}{connector}{name}/\n"));
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            child.render(&child_prefix, out);
        }
        for name in &self.files {
            index += 1;
            let connector = if index == total { "└── " } else { "├── " };
            out.push_str(&format!("{prefix}{connector}{name} [*]\n"));
        }
    }
}

fn render_structure(root: &Path, outcome: &WalkOutcome) -> String {
    let mut tree = SummaryNode::default();
    for file in &outcome.files {
        let rel = super::walker::display_rel(root, &file.path);
        let parts: Vec<&str> = rel.split('/').collect();
        tree.insert(&parts);
    }

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned());

    let mut out = format!("{root_name}/\n");
    tree.render("  ", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResolvedFile;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn outcome_for(paths: Vec<PathBuf>) -> WalkOutcome {
        WalkOutcome {
            files: paths
                .into_iter()
                .map(|path| ResolvedFile {
                    path,
                    selection_id: 1,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn single_file_block_format() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let path = write(root, "src/app.py", "x=1");

        let assembled = assemble(root, &outcome_for(vec![path]));
        assert!(assembled.text.contains(
            "----- File: src/app.py -----\nx=1\n----- End File: src/app.py -----\n"
        ));
        assert_eq!(assembled.file_count, 1);
        assert!(assembled.warnings.is_empty());
    }

    #[test]
    fn trailing_whitespace_is_trimmed_to_one_newline() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let path = write(root, "a.txt", "hello\n\n\n   \n");

        let assembled = assemble(root, &outcome_for(vec![path]));
        assert!(assembled
            .text
            .contains("----- File: a.txt -----\nhello\n----- End File: a.txt -----\n"));
    }

    #[test]
    fn empty_resolution_yields_summary_only() {
        let tmp = TempDir::new().unwrap();
        let assembled = assemble(tmp.path(), &WalkOutcome::default());

        assert!(assembled.text.starts_with(STRUCTURE_HEADER));
        assert!(assembled.text.contains(STRUCTURE_FOOTER));
        assert!(!assembled.text.contains("----- File:"));
        assert_eq!(assembled.file_count, 0);
    }

    #[test]
    fn binary_file_is_skipped_with_placeholder() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let bin = root.join("blob.dat");
        fs::write(&bin, b"\x00\x01\x02").unwrap();
        let text = write(root, "ok.txt", "fine");

        let assembled = assemble(root, &outcome_for(vec![bin, text]));
        assert!(assembled
            .text
            .contains("----- File: blob.dat (Skipped Binary File) -----"));
        assert!(assembled.text.contains("----- File: ok.txt -----"));
        assert_eq!(assembled.file_count, 1);
        assert_eq!(assembled.warnings, vec!["Skipped binary file: blob.dat"]);
    }

    #[test]
    fn walker_warnings_are_rendered_before_file_blocks() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let path = write(root, "a.txt", "x");

        let mut outcome = outcome_for(vec![path]);
        outcome
            .warnings
            .push("Selected path not found: gone.py".to_string());

        let assembled = assemble(root, &outcome);
        let warning_pos = assembled
            .text
            .find("----- Warning: Selected path not found: gone.py -----")
            .unwrap();
        let file_pos = assembled.text.find("----- File: a.txt -----").unwrap();
        assert!(warning_pos < file_pos);
        assert!(assembled
            .warnings
            .contains(&"Selected path not found: gone.py".to_string()));
    }

    #[test]
    fn structure_tree_marks_files_and_nests_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let a = write(root, "src/deep/util.py", "u");
        let b = write(root, "src/main.py", "m");
        let c = write(root, "top.py", "t");

        let assembled = assemble(root, &outcome_for(vec![a, b, c]));
        let text = &assembled.text;
        assert!(text.contains("├── src/\n") || text.contains("└── src/\n"));
        assert!(text.contains("deep/"));
        assert!(text.contains("util.py [*]"));
        assert!(text.contains("main.py [*]"));
        assert!(text.contains("top.py [*]"));
    }
}
