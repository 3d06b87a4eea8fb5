use super::Tool;
use aria_core::{AriaError, AriaResult};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org";

/// Academic publication search for the researcher role.
///
/// Queries the Semantic Scholar paper-search API, which needs no key, and
/// renders the top three hits as `title (year) - authors` lines.
pub struct ScholarTool {
    base_url: String,
    http: reqwest::Client,
}

impl ScholarTool {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Points the tool at a different server. Tests use this with a mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ScholarTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScholarTool {
    fn name(&self) -> &'static str {
        "scholar_search"
    }

    async fn run(&self, input: &str) -> AriaResult<String> {
        let url = format!("{}/graph/v1/paper/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query", input),
                ("limit", "3"),
                ("fields", "title,year,authors"),
            ])
            .send()
            .await
            .map_err(|e| AriaError::Api(e.to_string()))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AriaError::Api(e.to_string()))?;
        if !status.is_success() {
            return Err(AriaError::Api(format!(
                "scholar API error {status}: {body}"
            )));
        }

        let results: Vec<String> = body["data"]
            .as_array()
            .map(|papers| papers.iter().take(3).map(format_paper).collect())
            .unwrap_or_default();

        if results.is_empty() {
            return Ok("No results found for the query.".to_string());
        }
        Ok(format!("Top results:\n• {}", results.join("\n• ")))
    }
}

fn format_paper(paper: &serde_json::Value) -> String {
    let title = paper["title"].as_str().unwrap_or("No title");
    let year = paper["year"]
        .as_u64()
        .map_or_else(|| "N/A".to_string(), |y| y.to_string());
    let authors = paper["authors"]
        .as_array()
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| a["name"].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| "Unknown authors".to_string());
    format!("{title} ({year}) - {authors}")
}
