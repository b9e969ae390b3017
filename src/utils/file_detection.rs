//! Heuristics for telling text files apart from binary ones.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// File extensions treated as binary without inspecting content.
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "jar", "class", "pyc", "o", "a", "lib", "zip", "gz", "tar",
    "rar", "7z", "pkg", "dmg", "jpg", "jpeg", "png", "gif", "bmp", "tiff", "ico", "pdf", "doc",
    "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "mp3", "wav", "ogg", "mp4",
    "avi", "mkv", "mov", "webm", "db", "sqlite", "sqlite3", "mdb", "accdb", "wasm", "woff",
    "woff2", "ttf", "otf", "eot", "ds_store",
];

const SNIFF_LEN: usize = 1024;

/// Returns true if the file should be treated as binary.
///
/// Known binary extensions short-circuit; otherwise the first 1024 bytes
/// are sniffed for a NUL byte. An unreadable file is reported as binary
/// so callers skip its content rather than fail.
pub fn is_binary(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    let mut buf = [0u8; SNIFF_LEN];
    match File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(n) => buf[..n].contains(&0),
        Err(_) => true,
    }
}
