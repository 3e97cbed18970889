//! File I/O primitives shared by the parsers and the migration engine.
//!
//! All reads are BOM-tolerant: solution and project files written by Visual
//! Studio frequently carry a UTF-8 byte-order marker.

use crate::core::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Directories never descended into when walking a workspace.
const SKIP_DIRS: &[&str] = &["bin", "obj", ".git", ".svn", "node_modules", "packages"];

/// Strip a leading UTF-8 byte-order marker, if present.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Read file contents, stripping a leading BOM.
pub fn read_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)?;
    Ok(strip_bom(&content).to_string())
}

/// Read file contents, returning `None` on any read error instead of failing.
pub fn read_file_lossy(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(strip_bom(&content).to_string()),
        Err(_) => {
            // Fall back to lossy decoding for files with stray non-UTF-8 bytes.
            let bytes = fs::read(path).ok()?;
            let content = String::from_utf8_lossy(&bytes).to_string();
            Some(strip_bom(&content).to_string())
        }
    }
}

/// Write content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    ensure_directory(path.parent().unwrap_or(Path::new(".")))?;
    fs::write(path, content)?;
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Find all files with the given extension under `directory`.
///
/// Skips dependency/VCS/build directories (`bin`, `obj`, `.git`, ...) at any
/// depth. Unreadable directories are silently ignored.
pub fn find_files(directory: &Path, extension: &str, recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(directory, extension, recursive, &mut files);
    files.sort();
    files
}

fn walk(dir: &Path, extension: &str, recursive: bool, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            if recursive {
                walk(&path, extension, recursive, files);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn strip_bom_removes_marker() {
        assert_eq!(strip_bom("\u{feff}hello"), "hello");
        assert_eq!(strip_bom("hello"), "hello");
    }

    #[test]
    fn find_files_skips_build_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("src/A.cs"), "// a").unwrap();
        fs::write(dir.path().join("bin/B.cs"), "// b").unwrap();

        let found = find_files(dir.path(), "cs", true);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("A.cs"));
    }

    #[test]
    fn find_files_non_recursive_stays_shallow() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("Top.cs"), "// t").unwrap();
        fs::write(dir.path().join("nested/Deep.cs"), "// d").unwrap();

        let found = find_files(dir.path(), "cs", false);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("Top.cs"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Upper.CS"), "// u").unwrap();

        let found = find_files(dir.path(), "cs", true);
        assert_eq!(found.len(), 1);
    }
}
