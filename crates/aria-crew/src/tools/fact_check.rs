use super::Tool;
use aria_core::{AriaError, AriaResult};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://bing-news-search1.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "bing-news-search1.p.rapidapi.com";

/// News-source verification for the fact-checker role.
///
/// Queries Bing News through RapidAPI and lists the top three sources that
/// cover the statement. Without a key the statement passes through with a
/// note instead of failing the pipeline.
pub struct FactCheckTool {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl FactCheckTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
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

#[async_trait]
impl Tool for FactCheckTool {
    fn name(&self) -> &'static str {
        "fact_check"
    }

    async fn run(&self, input: &str) -> AriaResult<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(format!(
                "{input}\n\n_Note: fact-check skipped, RAPIDAPI_KEY not set._"
            ));
        };

        let url = format!("{}/news/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("x-bingapis-sdk", "true")
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .header("x-rapidapi-key", api_key)
            .query(&[("q", input), ("safeSearch", "Off"), ("textFormat", "Raw")])
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
                "news API error {status}: {body}"
            )));
        }

        let sources: Vec<String> = body["value"]
            .as_array()
            .map(|items| items.iter().take(3).map(format_source).collect())
            .unwrap_or_default();

        if sources.is_empty() {
            return Ok(format!("No reliable news sources found for: {input}"));
        }
        Ok(format!(
            "Fact-check results for '{input}':\n{}",
            sources.join("\n")
        ))
    }
}

fn format_source(item: &serde_json::Value) -> String {
    let name = item["name"].as_str().unwrap_or("Untitled");
    let provider = item["provider"][0]["name"].as_str().unwrap_or("Unknown");
    let url = item["url"].as_str().unwrap_or("");
    format!("- {name} ({provider}): {url}")
}
