use super::Tool;
use aria_core::{AriaError, AriaResult};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";
const PROMPT: &str = "Turn the following structured notes into a professional markdown report:";

/// Expands structured notes into a full markdown report for the writer role.
pub struct WriterTool {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl WriterTool {
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
impl Tool for WriterTool {
    fn name(&self) -> &'static str {
        "report_writer"
    }

    async fn run(&self, input: &str) -> AriaResult<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(format!(
                "{input}\n\n_Note: report generation skipped, HF_API_KEY not set._"
            ));
        };

        let url = format!("{}/models/{MODEL}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&serde_json::json!({ "inputs": format!("{PROMPT}\n\n{input}") }))
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
                "writer API error {status}: {body}"
            )));
        }

        let report = body[0]["generated_text"].as_str().ok_or_else(|| {
            AriaError::Api(format!("unexpected response shape from {MODEL}"))
        })?;
        Ok(format!(
            "# Research Report\n\n{report}\n\n---\n_End of Report_"
        ))
    }
}
