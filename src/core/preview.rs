//! Read-only file preview with a size cap and binary guard.

use std::fs;
use std::path::Path;

use crate::core::error::CoreError;
use crate::utils::file_detection::is_binary;

#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub content: String,
    /// True when `content` is a placeholder instead of the file's text.
    pub is_placeholder: bool,
}

/// Loads a file's content for display in the preview pane.
///
/// Binary files and files above `max_bytes` get a short placeholder
/// instead of their content; only a failed metadata/read call is an error.
pub fn load_preview(path: &Path, max_bytes: u64) -> Result<Preview, CoreError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let size = fs::metadata(path)
        .map_err(|e| CoreError::Io(e, path.to_path_buf()))?
        .len();

    if is_binary(path) {
        return Ok(Preview {
            content: format!("File: {name}\n\n(Binary file, content not displayed)"),
            is_placeholder: true,
        });
    }
    if size > max_bytes {
        return Ok(Preview {
            content: format!(
                "File: {name}\n\n(File is too large for preview: {} MB.\nMax preview size: {} MB)",
                size / (1024 * 1024),
                max_bytes / (1024 * 1024)
            ),
            is_placeholder: true,
        });
    }

    let bytes = fs::read(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
    Ok(Preview {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        is_placeholder: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ONE_MB: u64 = 1024 * 1024;

    #[test]
    fn returns_text_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.py");
        fs::write(&path, "x = 1\n").unwrap();

        let preview = load_preview(&path, ONE_MB).unwrap();
        assert_eq!(preview.content, "x = 1\n");
        assert!(!preview.is_placeholder);
    }

    #[test]
    fn binary_file_gets_placeholder() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.png");
        fs::write(&path, b"\x89PNG").unwrap();

        let preview = load_preview(&path, ONE_MB).unwrap();
        assert!(preview.is_placeholder);
        assert!(preview.content.contains("Binary file"));
    }

    #[test]
    fn oversized_file_gets_placeholder() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.txt");
        fs::write(&path, "a".repeat(2048)).unwrap();

        let preview = load_preview(&path, 1024).unwrap();
        assert!(preview.is_placeholder);
        assert!(preview.content.contains("too large"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_preview(&tmp.path().join("gone.txt"), ONE_MB);
        assert!(err.is_err());
    }
}
