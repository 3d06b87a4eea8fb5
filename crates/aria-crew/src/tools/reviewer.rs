use super::Tool;
use aria_core::{AriaError, AriaResult};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.languagetool.org";
const MAX_SUGGESTIONS: usize = 5;

/// Grammar and clarity pass for the reviewer role.
///
/// Sends the report to a LanguageTool-compatible `/v2/check` endpoint,
/// applies the first suggested replacement of every match, and appends the
/// top rule hits as a suggestions section.
pub struct ReviewerTool {
    base_url: String,
    http: reqwest::Client,
}

impl ReviewerTool {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Points the tool at a different server, e.g. a self-hosted
    /// LanguageTool or a test mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ReviewerTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReviewerTool {
    fn name(&self) -> &'static str {
        "report_reviewer"
    }

    async fn run(&self, input: &str) -> AriaResult<String> {
        let url = format!("{}/v2/check", self.base_url);
        let resp = self
            .http
            .post(&url)
            .form(&[("text", input), ("language", "en-US")])
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
                "grammar API error {status}: {body}"
            )));
        }

        let matches = body["matches"].as_array().cloned().unwrap_or_default();
        let corrected = apply_corrections(input, &matches);

        let suggestions: Vec<String> = matches
            .iter()
            .take(MAX_SUGGESTIONS)
            .filter_map(|m| {
                let rule = m["rule"]["id"].as_str()?;
                let message = m["message"].as_str()?;
                Some(format!("- {rule}: {message}"))
            })
            .collect();
        let suggestions_text = if suggestions.is_empty() {
            "No major issues found.".to_string()
        } else {
            suggestions.join("\n")
        };

        Ok(format!(
            "Reviewed Report:\n\n{corrected}\n\n---\n**Suggestions:**\n{suggestions_text}"
        ))
    }
}

/// Applies each match's first replacement. Corrections are applied from the
/// end of the text towards the start so earlier offsets stay valid.
/// Offsets are interpreted as character positions.
fn apply_corrections(text: &str, matches: &[serde_json::Value]) -> String {
    let mut corrections: Vec<(usize, usize, String)> = matches
        .iter()
        .filter_map(|m| {
            let offset = m["offset"].as_u64()? as usize;
            let length = m["length"].as_u64()? as usize;
            let replacement = m["replacements"][0]["value"].as_str()?.to_string();
            Some((offset, length, replacement))
        })
        .collect();
    corrections.sort_by(|a, b| b.0.cmp(&a.0));

    let mut chars: Vec<char> = text.chars().collect();
    for (offset, length, replacement) in corrections {
        if offset + length <= chars.len() {
            chars.splice(offset..offset + length, replacement.chars());
        }
    }
    chars.into_iter().collect()
}
