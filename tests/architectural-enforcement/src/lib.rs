//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No blocking I/O once the runtime is running
//! - No sleep() outside retry backoff
//! - The core crate stays free of terminal code
//!
//! The helpers below scan workspace sources line by line. They are heuristics,
//! not a parser: good enough to catch a violation early in review.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["core/src", "tui/src"];

/// Workspace root (two levels above this crate)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// A scanned source file
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// File contents
    pub content: String,
}

impl SourceFile {
    /// Lines of the file
    pub fn lines(&self) -> Vec<&str> {
        self.content.lines().collect()
    }

    /// Whether the path ends with `suffix` (e.g. `"core/src/config.rs"`)
    pub fn is(&self, suffix: &str) -> bool {
        self.path.ends_with(suffix)
    }
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    assert!(base.exists(), "source directory missing: {}", base.display());

    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| {
            let content = fs::read_to_string(e.path()).ok()?;
            let path = e
                .path()
                .strip_prefix(&root)
                .unwrap_or(e.path())
                .to_path_buf();
            Some(SourceFile { path, content })
        })
        .collect()
}

/// The code part of a line, comments stripped
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Signature of the function a line is declared in, if any
///
/// Scans backwards for the nearest `fn` declaration, stopping at module or
/// impl boundaries.
pub fn enclosing_fn<'a>(lines: &[&'a str], current_idx: usize) -> Option<&'a str> {
    for i in (0..=current_idx).rev() {
        let line = lines[i].trim();
        if is_fn_declaration(line) {
            return Some(line);
        }
        if line.starts_with("mod ") || (line.starts_with("impl") && line.ends_with('{')) {
            return None;
        }
    }
    None
}

fn is_fn_declaration(line: &str) -> bool {
    let mut rest = line;
    for prefix in ["pub(crate) ", "pub ", "async ", "unsafe "] {
        rest = rest.strip_prefix(prefix).unwrap_or(rest);
    }
    rest.starts_with("fn ")
}

/// Whether the line sits inside an `async fn`
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_fn(lines, current_idx).is_some_and(|sig| sig.contains("async fn "))
}

/// Whether the line sits inside a `#[cfg(test)]` module or a test function
pub fn is_in_test_code(lines: &[&str], current_idx: usize) -> bool {
    lines[..=current_idx].iter().any(|l| l.trim() == "#[cfg(test)]")
        || enclosing_test_attribute(lines, current_idx)
}

fn enclosing_test_attribute(lines: &[&str], current_idx: usize) -> bool {
    let Some(fn_idx) = (0..=current_idx)
        .rev()
        .find(|&i| is_fn_declaration(lines[i].trim()))
    else {
        return false;
    };

    for i in (0..fn_idx).rev() {
        let line = lines[i].trim();
        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }
        if !line.starts_with("#[") && !line.starts_with("///") {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = [
            "pub async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
        ];
        assert!(is_in_async_function(&code, 1));
    }

    #[test]
    fn test_sync_function_detection() {
        let code = [
            "pub fn load_config() {",
            "    let contents = std::fs::read_to_string(\"config.toml\")?;",
            "}",
        ];
        assert!(!is_in_async_function(&code, 1));
        assert_eq!(enclosing_fn(&code, 1), Some("pub fn load_config() {"));
    }

    #[test]
    fn test_test_code_detection() {
        let code = [
            "#[tokio::test]",
            "async fn test_something() {",
            "    tokio::time::sleep(d).await;",
            "}",
        ];
        assert!(is_in_test_code(&code, 2));

        let module = ["#[cfg(test)]", "mod tests {", "    fn helper() { sleep(); }"];
        assert!(is_in_test_code(&module, 2));
    }

    #[test]
    fn test_comments_stripped() {
        assert_eq!(code_part("let x = 1; // std::fs::read"), "let x = 1; ");
    }
}
