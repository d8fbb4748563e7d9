//! File tool - read, write, search, list
//!
//! One tool, four actions, dispatched on the `action` argument. Filesystem
//! failures come back as failed results so the model can react to them.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use moon_foundation::{Error, Result, Tool, ToolContext, ToolResult, ToolSchema};

/// File tool input
#[derive(Debug, Deserialize)]
pub struct FileInput {
    /// Operation to perform
    pub action: FileAction,

    /// Path to the file or directory
    pub file_path: String,

    /// Content to write (write action)
    #[serde(default)]
    pub content: Option<String>,

    /// Substring to look for (search action)
    #[serde(default)]
    pub pattern: Option<String>,

    /// Limit for search results or read lines
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Read,
    Write,
    Search,
    List,
}

/// File tool
pub struct FileTool;

impl FileTool {
    pub fn new() -> Self {
        Self
    }

    /// Tool name
    pub const NAME: &'static str = "file_tool";

    async fn read_file(path: &Path, limit: Option<usize>) -> ToolResult {
        if !path.exists() {
            return ToolResult::err(format!("File not found: {}", path.display()));
        }
        if !path.is_file() {
            return ToolResult::err(format!("Not a file: {}", path.display()));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => return ToolResult::err(format!("Failed to read file: {}", e)),
        };

        let content = match limit {
            Some(n) => {
                let mut taken: String = content
                    .lines()
                    .take(n)
                    .collect::<Vec<_>>()
                    .join("\n");
                if content.lines().count() > n {
                    taken.push('\n');
                }
                taken
            }
            None => content,
        };

        ToolResult::ok(json!({
            "content": content,
            "file_path": path.display().to_string(),
            "size": content.len(),
        }))
        .with_metadata("action", json!("read"))
        .with_metadata("file_path", json!(path.display().to_string()))
    }

    async fn write_file(path: &Path, content: &str) -> ToolResult {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return ToolResult::err(format!("Failed to write file: {}", e));
                }
            }
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => ToolResult::ok(json!({
                "file_path": path.display().to_string(),
                "size": content.len(),
                "message": format!("Successfully wrote to {}", path.display()),
            }))
            .with_metadata("action", json!("write"))
            .with_metadata("file_path", json!(path.display().to_string())),
            Err(e) => ToolResult::err(format!("Failed to write file: {}", e)),
        }
    }

    async fn search_in_file(path: &Path, pattern: &str, limit: Option<usize>) -> ToolResult {
        if !path.exists() {
            return ToolResult::err(format!("File not found: {}", path.display()));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => return ToolResult::err(format!("Failed to search file: {}", e)),
        };

        let mut matches = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.contains(pattern) {
                matches.push(json!({
                    "line_number": i + 1,
                    "content": line.trim(),
                }));
                if let Some(n) = limit {
                    if matches.len() >= n {
                        break;
                    }
                }
            }
        }

        let total = matches.len();
        ToolResult::ok(json!({
            "matches": matches,
            "total_matches": total,
            "pattern": pattern,
            "file_path": path.display().to_string(),
        }))
        .with_metadata("action", json!("search"))
        .with_metadata("pattern", json!(pattern))
    }

    async fn list_directory(path: &Path) -> ToolResult {
        if !path.exists() {
            return ToolResult::err(format!("Directory not found: {}", path.display()));
        }
        if !path.is_dir() {
            return ToolResult::err(format!("Not a directory: {}", path.display()));
        }

        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(e) => e,
            Err(e) => return ToolResult::err(format!("Failed to list directory: {}", e)),
        };

        let mut items = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let meta = entry.metadata().await.ok();
                    let is_dir = meta.as_ref().map(|m| m.is_dir()).unwrap_or(false);
                    let size = meta
                        .as_ref()
                        .filter(|m| m.is_file())
                        .map(|m| m.len())
                        .unwrap_or(0);
                    items.push(json!({
                        "name": entry.file_name().to_string_lossy(),
                        "type": if is_dir { "directory" } else { "file" },
                        "size": size,
                    }));
                }
                Ok(None) => break,
                Err(e) => return ToolResult::err(format!("Failed to list directory: {}", e)),
            }
        }

        let total = items.len();
        ToolResult::ok(json!({
            "directory": path.display().to_string(),
            "items": items,
            "total_items": total,
        }))
        .with_metadata("action", json!("list"))
        .with_metadata("directory", json!(path.display().to_string()))
    }
}

impl Default for FileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(Self::NAME, "Read, write, and search files in the filesystem")
            .with_enum_param(
                "action",
                "File operation to perform",
                vec!["read", "write", "search", "list"],
                true,
            )
            .with_string_param("file_path", "Path to the file or directory", true)
            .with_string_param("content", "Content to write (for write action)", false)
            .with_string_param("pattern", "Search pattern (for search action)", false)
            .with_integer_param("limit", "Limit for results or lines", false)
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let parsed: FileInput = serde_json::from_value(args)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        let path = ctx.resolve(&parsed.file_path);

        let result = match parsed.action {
            FileAction::Read => Self::read_file(&path, parsed.limit).await,
            FileAction::Write => {
                Self::write_file(&path, parsed.content.as_deref().unwrap_or("")).await
            }
            FileAction::Search => {
                Self::search_in_file(&path, parsed.pattern.as_deref().unwrap_or(""), parsed.limit)
                    .await
            }
            FileAction::List => Self::list_directory(&path).await,
        };

        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
