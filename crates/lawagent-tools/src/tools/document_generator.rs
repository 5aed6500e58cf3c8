//! `document_generator`: persists `content` to a file under `output_dir`
//! and reports the path with the literal `"文件已生成: "` prefix callers
//! key off of.

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::tool::Tool;

pub struct DocumentGeneratorTool {
    output_dir: std::path::PathBuf,
}

impl DocumentGeneratorTool {
    pub fn new(output_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }
}

#[async_trait]
impl Tool for DocumentGeneratorTool {
    fn name(&self) -> &str {
        "document_generator"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "document_generator",
            "Generates a document file from title and content, returning its saved path.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "content": {"type": "string"},
                    "format": {"type": "string", "enum": ["docx", "md"]}
                },
                "required": ["title", "content", "format"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let params: Value = serde_json::from_str(arguments).map_err(|e| CoreError::tool("document_generator", e.to_string()))?;

        let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("untitled");
        let content = params
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::tool("document_generator", "missing required field `content`"))?;
        let format = params.get("format").and_then(|v| v.as_str()).unwrap_or("md");

        if format != "docx" && format != "md" {
            return Err(CoreError::tool("document_generator", format!("unsupported format `{format}`, expected docx or md")));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| CoreError::tool("document_generator", format!("failed to create output directory: {e}")))?;

        let safe_title = sanitize_filename(title);
        let file_name = format!("{safe_title}-{}.{format}", Uuid::now_v7());
        let path = self.output_dir.join(&file_name);

        let body = render(title, content, format);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CoreError::tool("document_generator", format!("failed to write `{}`: {e}", path.display())))?;

        let absolute = path
            .canonicalize()
            .unwrap_or(path)
            .display()
            .to_string();

        debug!(path = %absolute, "document generated");
        Ok(format!("文件已生成: {absolute}"))
    }
}

/// Markdown is written as-is; docx gets a minimal Office Open XML wrapper so
/// the file opens correctly, with `content` escaped into a single paragraph
/// run per line.
fn render(title: &str, content: &str, format: &str) -> String {
    if format == "md" {
        return format!("# {title}\n\n{content}\n");
    }

    let paragraphs: String = content
        .lines()
        .map(|line| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", xml_escape(line)))
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\n\
         <w:body>\n<w:p><w:r><w:t>{}</w:t></w:r></w:p>\n{paragraphs}\n</w:body>\n</w:document>",
        xml_escape(title)
    )
}

fn xml_escape(input: &str) -> String {
    input.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || "-_".contains(c) { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_a_docx_with_the_expected_path_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let tool = DocumentGeneratorTool::new(dir.path());
        let result = tool
            .call(r#"{"title": "离婚协议书", "content": "双方自愿离婚。", "format": "docx"}"#)
            .await
            .unwrap();
        assert!(result.starts_with("文件已生成: "));
        assert!(result.trim_end().ends_with(".docx"));
    }

    #[tokio::test]
    async fn rejects_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let tool = DocumentGeneratorTool::new(dir.path());
        let result = tool.call(r#"{"title": "x", "content": "y", "format": "pdf"}"#).await;
        assert!(result.is_err());
    }
}
