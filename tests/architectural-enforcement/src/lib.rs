//! Architectural Enforcement Integration Tests
//!
//! Source scanners shared by the tests in `tests/`. They enforce:
//! - No thread sleeps, and timed waits only where a fixed delay is the behavior
//! - Async I/O inside async code
//! - A UI-free conductor core
//!
//! The scan is line based. Everything from a `#[cfg(test)]` marker to the end
//! of a file counts as test code, which matches how modules here are laid out.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "tui/src"];

/// A line of production code
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// File the line is in
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Line with any trailing `//` comment removed
    pub code: String,
    /// Whether the nearest enclosing function is `async`
    pub in_async_fn: bool,
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}",
            self.path.display(),
            self.number,
            self.code.trim()
        )
    }
}

/// Workspace root (two levels above this crate)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Every `.rs` file under `dir`
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of every file in the production trees
pub fn production_lines() -> Vec<SourceLine> {
    let root = workspace_root();
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_files(&root.join(dir)))
        .flat_map(|path| {
            let content = fs::read_to_string(&path).unwrap_or_default();
            scan_source(&path, &content)
        })
        .collect()
}

/// Production lines of one file's content
pub fn scan_source(path: &Path, content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut in_async_fn = false;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }

        if let Some(is_async) = fn_declaration(trimmed) {
            in_async_fn = is_async;
        }

        let code = strip_comment(line);
        if code.trim().is_empty() {
            continue;
        }

        lines.push(SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code: code.to_string(),
            in_async_fn,
        });
    }

    lines
}

/// `Some(is_async)` when the line declares a function
pub fn fn_declaration(trimmed: &str) -> Option<bool> {
    let mut rest = trimmed;
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    if rest.starts_with("async fn ") {
        Some(true)
    } else if rest.starts_with("fn ") || rest.starts_with("const fn ") {
        Some(false)
    } else {
        None
    }
}

/// Drop a trailing `//` comment (doc comments become empty)
pub fn strip_comment(line: &str) -> &str {
    // "//" inside a string literal (URLs) is not a comment
    let mut in_string = false;
    let bytes = line.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' if i == 0 || bytes[i - 1] != b'\\' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_declaration() {
        assert_eq!(fn_declaration("pub async fn run(&mut self) {"), Some(true));
        assert_eq!(fn_declaration("pub fn load_config() {"), Some(false));
        assert_eq!(fn_declaration("fn helper() {"), Some(false));
        assert_eq!(fn_declaration("let f = foo();"), None);
    }

    #[test]
    fn test_strip_comment_keeps_urls() {
        assert_eq!(
            strip_comment(r#"let u = "http://localhost"; // note"#),
            r#"let u = "http://localhost"; "#
        );
        assert_eq!(strip_comment("/// docs").trim(), "");
    }

    #[test]
    fn test_scan_stops_at_test_module() {
        let source = "fn a() {\n    x();\n}\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        let lines = scan_source(Path::new("a.rs"), source);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| !l.in_async_fn));
    }

    #[test]
    fn test_async_tracking() {
        let source = "async fn a() {\n    y().await;\n}\nfn b() {\n    z();\n}\n";
        let lines = scan_source(Path::new("a.rs"), source);
        assert!(lines[1].in_async_fn);
        assert!(!lines[4].in_async_fn);
    }

    #[test]
    fn test_production_trees_exist() {
        let root = workspace_root();
        for dir in PRODUCTION_DIRS {
            assert!(root.join(dir).is_dir(), "missing {dir}");
        }
    }
}
