//! `web_crawler`: fetches a URL and returns its text stripped of markup,
//! capped to a safe size.

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};
use tracing::debug;

use crate::registry::extract_primary_arg;
use crate::tool::Tool;

const MAX_BODY_BYTES: usize = 200 * 1024;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; lawagent/0.1)";

pub struct WebCrawlerTool {
    client: reqwest::Client,
}

impl WebCrawlerTool {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl Tool for WebCrawlerTool {
    fn name(&self) -> &str {
        "web_crawler"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "web_crawler",
            "Fetches a URL and returns its visible text, with HTML markup stripped.",
            json!({
                "type": "object",
                "properties": {"url": {"type": "string"}},
                "required": ["url"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let url = extract_primary_arg(arguments);
        let parsed = url::Url::parse(&url).map_err(|e| CoreError::tool("web_crawler", format!("invalid url `{url}`: {e}")))?;
        debug!(url = %parsed, "crawling url");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Timeout {
                        seconds: 0,
                        detail: format!("fetching `{url}` timed out"),
                    }
                } else {
                    CoreError::provider(format!("fetching `{url}` failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(CoreError::tool("web_crawler", format!("`{url}` returned status {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::provider(format!("failed to read response body: {e}")))?;

        let html = if bytes.len() > MAX_BODY_BYTES {
            String::from_utf8_lossy(&bytes[..MAX_BODY_BYTES]).into_owned()
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        Ok(strip_html(&html))
    }
}

/// Strips tags, script/style bodies, and collapses whitespace.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut in_tag = false;
    let mut skip_until: Option<&str> = None;
    let lower = html.to_lowercase();

    let mut i = 0;
    let bytes = html.as_bytes();
    while i < bytes.len() {
        if let Some(tag) = skip_until {
            let closer = format!("</{tag}>");
            if let Some(pos) = lower[i..].find(&closer) {
                i += pos + closer.len();
                skip_until = None;
                continue;
            } else {
                break;
            }
        }

        let c = html[i..].chars().next().unwrap();
        if c == '<' {
            if lower[i..].starts_with("<script") {
                skip_until = Some("script");
            } else if lower[i..].starts_with("<style") {
                skip_until = Some("style");
            }
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            out.push(c);
        }
        i += c.len_utf8();
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_collapses_whitespace_and_removes_tags() {
        let html = "<html><body><h1>Title</h1>\n\n  <p>Body text.</p></body></html>";
        assert_eq!(strip_html(html), "Title Body text.");
    }

    #[test]
    fn strip_html_drops_script_and_style_bodies() {
        let html = "<style>.a{color:red}</style><p>visible</p><script>evil()</script>";
        assert_eq!(strip_html(html), "visible");
    }
}
