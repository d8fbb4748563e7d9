//! Search tool - regex search across files
//!
//! Walks a directory tree (honoring ignore files) and reports every line
//! matching a regex pattern.
//! - Glob include filter or a default text-file extension list
//! - Result cap with a truncated flag
//! - Skips oversized and unreadable files

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use ignore::WalkBuilder;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use moon_foundation::{Error, Result, Tool, ToolContext, ToolResult, ToolSchema};

/// Search tool input
#[derive(Debug, Deserialize)]
pub struct SearchInput {
    /// Regular expression pattern
    pub pattern: String,

    /// Directory or file path to search in (default: working dir)
    #[serde(default)]
    pub path: Option<String>,

    /// Glob pattern to filter files (e.g. "*.rs", "*.py")
    #[serde(default)]
    pub include: Option<String>,

    /// Maximum number of results
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    100
}

/// Search tool
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }

    /// Tool name
    pub const NAME: &'static str = "search_tool";

    /// Files larger than this are skipped (50MB)
    const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Extensions searched when no include pattern is given
    const DEFAULT_EXTENSIONS: &'static [&'static str] = &[
        "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "rs", "go", "md", "txt", "json",
        "xml", "yaml", "yml", "toml", "html", "css", "scss",
    ];

    fn matches_filter(path: &Path, include: Option<&glob::Pattern>) -> bool {
        if let Some(pattern) = include {
            return path
                .file_name()
                .map(|n| pattern.matches(&n.to_string_lossy()))
                .unwrap_or(false);
        }

        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                Self::DEFAULT_EXTENSIONS.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    fn search_file(path: &Path, regex: &Regex, out: &mut Vec<serde_json::Value>, cap: usize) {
        if let Ok(metadata) = fs::metadata(path) {
            if metadata.len() > Self::MAX_FILE_SIZE {
                return;
            }
        }

        // Unreadable or binary files are skipped silently
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };

        for (i, line) in content.lines().enumerate() {
            if let Some(m) = regex.find(line) {
                out.push(json!({
                    "file": path.display().to_string(),
                    "line_number": i + 1,
                    "line_content": line.trim(),
                    "match": m.as_str(),
                }));
                if out.len() >= cap {
                    return;
                }
            }
        }
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(Self::NAME, "Search for patterns across files and directories")
            .with_string_param("pattern", "Regular expression pattern to search for", true)
            .with_string_param("path", "Directory or file path to search in", false)
            .with_string_param(
                "include",
                "Glob pattern to filter files (e.g., '*.py', '*.rs')",
                false,
            )
            .with_integer_param("max_results", "Maximum number of results to return", false)
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let parsed: SearchInput = serde_json::from_value(args)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        let regex = match Regex::new(&parsed.pattern) {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolResult::err(format!("Invalid regex pattern: {}", e)));
            }
        };

        let include = match parsed.include.as_deref() {
            Some(p) => match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    return Ok(ToolResult::err(format!("Invalid include pattern: {}", e)));
                }
            },
            None => None,
        };

        let root = match parsed.path.as_deref() {
            Some(p) => ctx.resolve(p),
            None => ctx.working_dir.clone(),
        };

        // Collect up to max_results + 1 so truncation is observable
        let cap = parsed.max_results.saturating_add(1);
        let mut results = Vec::new();

        if root.is_file() {
            Self::search_file(&root, &regex, &mut results, cap);
        } else if root.is_dir() {
            let walker = WalkBuilder::new(&root).hidden(true).build();

            for entry in walker.flatten() {
                if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    continue;
                }
                let path = entry.path();
                if !Self::matches_filter(path, include.as_ref()) {
                    continue;
                }

                Self::search_file(path, &regex, &mut results, cap);
                if results.len() >= cap {
                    break;
                }
            }
        } else {
            return Ok(ToolResult::err(format!(
                "Path not found: {}",
                root.display()
            )));
        }

        let truncated = results.len() > parsed.max_results;
        results.truncate(parsed.max_results);

        let files_with_matches: std::collections::HashSet<&str> = results
            .iter()
            .filter_map(|r| r["file"].as_str())
            .collect();
        let files_with_matches = files_with_matches.len();

        let total = results.len();
        Ok(ToolResult::ok(json!({
            "pattern": parsed.pattern,
            "path": root.display().to_string(),
            "results": results,
            "total_matches": total,
            "truncated": truncated,
        }))
        .with_metadata("pattern", json!(parsed.pattern))
        .with_metadata("files_with_matches", json!(files_with_matches)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_regex_search_in_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def alpha():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("c.bin"), "alpha").unwrap();

        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool
            .execute(json!({"pattern": "alpha"}), &ctx)
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.as_ref().unwrap();
        // .bin is not in the default extension list
        assert_eq!(data["total_matches"], 2);
        assert_eq!(data["truncated"], false);
    }

    #[tokio::test]
    async fn test_include_glob_filters_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "needle\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "needle\n").unwrap();

        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool
            .execute(json!({"pattern": "needle", "include": "*.rs"}), &ctx)
            .await
            .unwrap();

        let data = result.data.as_ref().unwrap();
        assert_eq!(data["total_matches"], 1);
        assert!(data["results"][0]["file"].as_str().unwrap().ends_with("a.rs"));
    }

    #[tokio::test]
    async fn test_metadata_counts_distinct_matched_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "needle\nneedle\nneedle\n").unwrap();
        std::fs::write(dir.path().join("b.rs"), "needle\n").unwrap();
        std::fs::write(dir.path().join("c.rs"), "nothing here\n").unwrap();

        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool
            .execute(json!({"pattern": "needle"}), &ctx)
            .await
            .unwrap();

        // Four matching lines across two files; c.rs has no matches and
        // does not count.
        assert_eq!(result.data.as_ref().unwrap()["total_matches"], 4);
        let meta = result.metadata.as_ref().unwrap();
        assert_eq!(meta["files_with_matches"], 2);
    }

    #[tokio::test]
    async fn test_max_results_sets_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let body = "hit\n".repeat(10);
        std::fs::write(dir.path().join("many.txt"), body).unwrap();

        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool
            .execute(json!({"pattern": "hit", "max_results": 3}), &ctx)
            .await
            .unwrap();

        let data = result.data.as_ref().unwrap();
        assert_eq!(data["total_matches"], 3);
        assert_eq!(data["truncated"], true);
    }

    #[tokio::test]
    async fn test_invalid_regex_is_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool.execute(json!({"pattern": "("}), &ctx).await.unwrap();
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("Invalid regex"));
    }

    #[tokio::test]
    async fn test_missing_path_is_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SearchTool::new();
        let ctx = ToolContext::new(dir.path());
        let result = tool
            .execute(json!({"pattern": "x", "path": "nope/nothing"}), &ctx)
            .await
            .unwrap();
        assert!(!result.success);
    }
}
