//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The engine never sleeps or blocks; time only moves through its scheduler
//! - No `unwrap()`/`expect()` in production code
//! - stdout belongs to the host protocol, so nothing prints to it
//!
//! These tests are designed to catch violations early in the development cycle.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file under `dir`
#[must_use]
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Production lines of a source file: everything before the first
/// `#[cfg(test)]`, minus comment lines
#[must_use]
pub fn production_lines(source: &str) -> Vec<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with("//"))
        .collect()
}

/// Lines in the production code under `dir` containing any of `patterns`
#[must_use]
pub fn find_violations(dir: &Path, patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in rust_sources(dir) {
        let Ok(source) = fs::read_to_string(&path) else {
            continue;
        };
        for (line, text) in production_lines(&source) {
            if patterns.iter().any(|p| text.contains(p)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: text.to_string(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_tests() {
        let source = "fn a() {}\n// note\nfn b() {}\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "fn a() {}"), (3, "fn b() {}")]);
    }
}
