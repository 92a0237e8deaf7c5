//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code (timers run on `tokio::time::interval`)
//! - No `unwrap()`/`expect()` in production code (errors are propagated or logged)
//!
//! The helpers here find production source files and strip the parts that
//! are not production code: comments and trailing `#[cfg(test)]` modules.

use std::fs;
use std::path::{Path, PathBuf};

/// Crate source directories checked, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["session/core/src", "tui/src"];

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A production line with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Line text with any `//` comment removed
    pub code: String,
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// Lines of production code in `content`
///
/// Everything from the first `#[cfg(test)]` onwards is treated as test code.
#[must_use]
pub fn production_lines(path: &Path, content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line).to_string(),
        })
        .filter(|line| !line.code.trim().is_empty())
        .collect()
}

/// Production lines of every `.rs` file under the checked directories
#[must_use]
pub fn production_sources() -> Vec<SourceLine> {
    let root = workspace_root();
    let mut lines = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }

        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(entry.path()) {
                lines.extend(production_lines(entry.path(), &content));
            }
        }
    }

    lines
}

/// Production lines matching any of `patterns`
#[must_use]
pub fn find_violations(patterns: &[&str]) -> Vec<SourceLine> {
    production_sources()
        .into_iter()
        .filter(|line| patterns.iter().any(|p| line.code.contains(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_are_stripped() {
        let content = "let x = 1; // .unwrap() here is fine\n/// docs mention sleep()\n";
        let lines = production_lines(Path::new("a.rs"), content);

        assert_eq!(lines.len(), 1);
        assert!(!lines[0].code.contains("unwrap"));
    }

    #[test]
    fn test_test_module_is_skipped() {
        let content = "fn real() {}\n\n#[cfg(test)]\nmod tests {\n    fn t() { x.unwrap(); }\n}\n";
        let lines = production_lines(Path::new("a.rs"), content);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
    }

    #[test]
    fn test_workspace_sources_found() {
        let sources = production_sources();
        assert!(
            sources
                .iter()
                .any(|l| l.path.ends_with("session/core/src/lib.rs")),
            "session-core sources should be scanned"
        );
    }
}
