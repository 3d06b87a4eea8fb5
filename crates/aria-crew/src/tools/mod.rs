//! The capability behind each crew role.
//!
//! Every tool is a thin `reqwest` client over one external service. Tools
//! that need an API key degrade to a pass-through with an explanatory note
//! when the key is absent, so a partially configured environment still
//! produces a report instead of a hard failure.

pub mod fact_check;
pub mod reviewer;
pub mod scholar;
pub mod summarizer;
pub mod writer;

pub use fact_check::FactCheckTool;
pub use reviewer::ReviewerTool;
pub use scholar::ScholarTool;
pub use summarizer::SummarizerTool;
pub use writer::WriterTool;

use aria_core::AriaResult;
use async_trait::async_trait;

/// A single capability bound to a crew role.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Runs the tool on one step's payload and returns its text output.
    async fn run(&self, input: &str) -> AriaResult<String>;
}

/// Builds the production toolset in pipeline order, reading API keys from
/// the environment. `HF_TOKEN` is accepted as an alias for `HF_API_KEY`.
pub fn default_toolset() -> [Box<dyn Tool>; 5] {
    let hf_key = env_key("HF_API_KEY").or_else(|| env_key("HF_TOKEN"));
    [
        Box::new(ScholarTool::new()),
        Box::new(FactCheckTool::new(env_key("RAPIDAPI_KEY"))),
        Box::new(SummarizerTool::new(hf_key.clone())),
        Box::new(WriterTool::new(hf_key)),
        Box::new(ReviewerTool::new()),
    ]
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
