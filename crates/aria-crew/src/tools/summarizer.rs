use super::Tool;
use aria_core::{AriaError, AriaResult};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const MODEL: &str = "facebook/bart-large-cnn";

/// Condenses long text via Hugging Face inference for the summarizer role.
pub struct SummarizerTool {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl SummarizerTool {
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
impl Tool for SummarizerTool {
    fn name(&self) -> &'static str {
        "summarizer"
    }

    async fn run(&self, input: &str) -> AriaResult<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(format!(
                "{input}\n\n_Note: summarization skipped, HF_API_KEY not set._"
            ));
        };

        let url = format!("{}/models/{MODEL}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&serde_json::json!({ "inputs": input }))
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
                "summarizer API error {status}: {body}"
            )));
        }

        let summary = body[0]["summary_text"].as_str().ok_or_else(|| {
            AriaError::Api(format!("unexpected response shape from {MODEL}"))
        })?;
        Ok(format!("Summary:\n{summary}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_prefixed_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}")))
            .and(header("Authorization", "Bearer hf-key"))
            .and(body_json(serde_json::json!({"inputs": "long text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"summary_text": "short text"}
            ])))
            .mount(&server)
            .await;

        let tool = SummarizerTool::new(Some("hf-key".to_string())).with_base_url(server.uri());
        let out = tool.run("long text").await.unwrap();
        assert_eq!(out, "Summary:\nshort text");
    }

    #[tokio::test]
    async fn missing_key_passes_input_through() {
        let tool = SummarizerTool::new(None);
        let out = tool.run("raw findings").await.unwrap();
        assert!(out.starts_with("raw findings"));
        assert!(out.contains("HF_API_KEY not set"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "loading"})),
            )
            .mount(&server)
            .await;

        let tool = SummarizerTool::new(Some("k".to_string())).with_base_url(server.uri());
        let err = tool.run("text").await.unwrap_err();
        assert!(err.to_string().contains("unexpected response shape"));
    }

    #[tokio::test]
    async fn upstream_error_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({"error": "model loading"})),
            )
            .mount(&server)
            .await;

        let tool = SummarizerTool::new(Some("k".to_string())).with_base_url(server.uri());
        let err = tool.run("text").await.unwrap_err();
        assert!(matches!(err, AriaError::Api(_)));
        assert!(err.to_string().contains("503"));
    }
}
