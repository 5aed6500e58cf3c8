//! `web_search`: ranked hits (title/url/snippet) for a query, via the Bocha
//! web-search API when a key is configured, falling back to DuckDuckGo HTML
//! scraping when it is not.

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::tool::Tool;

const BOCHA_SEARCH_URL: &str = "https://api.bochaai.com/v1/web-search";
const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_MAX_RESULTS: usize = 10;
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub struct WebSearchTool {
    client: reqwest::Client,
    bocha_api_key: Option<String>,
    timeout: std::time::Duration,
}

impl WebSearchTool {
    pub fn new(bocha_api_key: Option<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            bocha_api_key,
            timeout,
        }
    }

    async fn search_bocha(&self, query: &str, max_results: usize, api_key: &str) -> Result<Vec<Value>> {
        let response = self
            .client
            .post(BOCHA_SEARCH_URL)
            .bearer_auth(api_key)
            .json(&json!({"query": query, "count": max_results, "summary": true}))
            .send()
            .await
            .map_err(|e| CoreError::provider(format!("bocha search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::provider(format!("bocha search returned status {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::parse(format!("failed to parse bocha response: {e}")))?;

        let mut results = Vec::new();
        if let Some(hits) = body.pointer("/data/webPages/value").and_then(|v| v.as_array()) {
            for item in hits.iter().take(max_results) {
                let title = item.get("name").and_then(|v| v.as_str()).unwrap_or("");
                let url = item.get("url").and_then(|v| v.as_str()).unwrap_or("");
                let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
                if !title.is_empty() || !url.is_empty() {
                    results.push(json!({"title": title, "url": url, "snippet": snippet}));
                }
            }
        }
        Ok(results)
    }

    async fn search_duckduckgo(&self, query: &str, max_results: usize) -> Result<Vec<Value>> {
        let response = self
            .client
            .post(DUCKDUCKGO_HTML_URL)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Timeout {
                        seconds: self.timeout.as_secs(),
                        detail: format!("duckduckgo search for `{query}` timed out"),
                    }
                } else {
                    CoreError::provider(format!("duckduckgo request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(CoreError::provider(format!("duckduckgo returned status {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| CoreError::provider(format!("failed to read duckduckgo response: {e}")))?;

        Ok(parse_duckduckgo_results(&html, max_results))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "web_search",
            "Searches the web and returns ranked hits with title, url, and snippet.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "max_results": {"type": "integer", "description": "default 10"}
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let params: Value = serde_json::from_str(arguments).unwrap_or(json!({}));
        let query = params
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::tool("web_search", "missing required field `query`"))?;
        let max_results = params
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        debug!(query, max_results, "performing web search");

        if let Some(ref key) = self.bocha_api_key {
            match self.search_bocha(query, max_results, key).await {
                Ok(results) if !results.is_empty() => {
                    return Ok(serde_json::to_string(&json!({"engine": "bocha", "results": results})).unwrap());
                }
                Ok(_) => debug!("bocha returned no results, falling back to duckduckgo"),
                Err(e) => warn!(error = %e, "bocha search failed, falling back"),
            }
        }

        let results = self.search_duckduckgo(query, max_results).await?;
        Ok(serde_json::to_string(&json!({"engine": "duckduckgo", "results": results})).unwrap())
    }
}

fn parse_duckduckgo_results(html: &str, max_results: usize) -> Vec<Value> {
    let mut results = Vec::new();
    for block in html.split("result__body").skip(1) {
        if results.len() >= max_results {
            break;
        }
        let title = extract_between(block, "result__a", ">", "</a>").unwrap_or_default();
        let url = extract_attr(block, "result__a", "href=\"").unwrap_or_default();
        let snippet = extract_between(block, "result__snippet", ">", "</a>").unwrap_or_default();
        if !title.is_empty() {
            results.push(json!({
                "title": strip_html_tags(&title),
                "url": url,
                "snippet": strip_html_tags(&snippet),
            }));
        }
    }
    results
}

fn extract_between(block: &str, marker: &str, after: &str, until: &str) -> Option<String> {
    let start = block.find(marker)?;
    let rest = &block[start..];
    let open = rest.find(after)? + after.len();
    let rest = &rest[open..];
    let close = rest.find(until)?;
    Some(rest[..close].to_string())
}

fn extract_attr(block: &str, marker: &str, attr_prefix: &str) -> Option<String> {
    let start = block.find(marker)?;
    let rest = &block[start..];
    let attr_start = rest.find(attr_prefix)? + attr_prefix.len();
    let rest = &rest[attr_start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn strip_html_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_tags_removes_markup() {
        assert_eq!(strip_html_tags("<b>hello</b> world"), "hello world");
    }

    #[test]
    fn parse_duckduckgo_results_is_empty_on_unrecognized_html() {
        assert!(parse_duckduckgo_results("<html></html>", 5).is_empty());
    }
}
