//! `file_read`: reads a file rooted under `root_dir`, rejecting path
//! traversal outside it, truncating long content.

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};
use tracing::debug;

use crate::tool::Tool;

const MAX_READ_CHARS: usize = 16_000;

pub struct FileReadTool {
    root_dir: std::path::PathBuf,
}

impl FileReadTool {
    pub fn new(root_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { root_dir: root_dir.into() }
    }

    fn safe_resolve(&self, raw_path: &str) -> Result<std::path::PathBuf> {
        let candidate = if std::path::Path::new(raw_path).is_absolute() {
            std::path::PathBuf::from(raw_path)
        } else {
            self.root_dir.join(raw_path)
        };
        let normalized = normalize_path(&candidate);
        let canon_root = self.root_dir.canonicalize().unwrap_or_else(|_| self.root_dir.clone());

        if !normalized.starts_with(&canon_root) {
            return Err(CoreError::tool(
                "file_read",
                format!("path `{raw_path}` resolves outside the root directory `{}`", canon_root.display()),
            ));
        }
        Ok(normalized)
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "file_read",
            "Reads a text file and returns its content, truncated if very long.",
            json!({
                "type": "object",
                "properties": {"file_path": {"type": "string"}},
                "required": ["file_path"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let params: Value = serde_json::from_str(arguments).unwrap_or(json!({}));
        let raw_path = params
            .get("file_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::tool("file_read", "missing required field `file_path`"))?;

        let full_path = self.safe_resolve(raw_path)?;
        debug!(path = %full_path.display(), "reading file");

        let raw = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| CoreError::tool("file_read", format!("failed to read `{raw_path}`: {e}")))?;

        if raw.chars().count() <= MAX_READ_CHARS {
            return Ok(raw);
        }
        let mut end = MAX_READ_CHARS;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        Ok(format!("{}\n...[truncated]", &raw[..end]))
    }
}

fn normalize_path(path: &std::path::Path) -> std::path::PathBuf {
    let mut out = std::path::PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_a_file_inside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("note.txt"), "hello").unwrap();
        let tool = FileReadTool::new(dir.path());
        let content = tool.call(r#"{"file_path": "note.txt"}"#).await.unwrap();
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn rejects_path_traversal_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReadTool::new(dir.path());
        let result = tool.call(r#"{"file_path": "../../etc/passwd"}"#).await;
        assert!(result.is_err());
    }
}
