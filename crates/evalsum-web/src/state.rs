use std::sync::Arc;

use evalsum_core::{AnthropicClient, Config, Summarizer};
use evalsum_pdf::ExtractionPipeline;

/// Shared application state accessible from all handlers.
///
/// Immutable after startup; requests never write to it.
pub struct AppState {
    pub config: Config,
    pub summarizer: Arc<dyn Summarizer>,
    pub pipeline: Arc<ExtractionPipeline>,
}

impl AppState {
    /// Build state that talks to the real Anthropic API.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let summarizer = Arc::new(AnthropicClient::from_config(&config)?);
        Self::with_summarizer(config, summarizer)
    }

    pub fn with_summarizer(
        config: Config,
        summarizer: Arc<dyn Summarizer>,
    ) -> anyhow::Result<Self> {
        let pipeline = ExtractionPipeline::from_config(&config)?;
        Ok(Self {
            config,
            summarizer,
            pipeline: Arc::new(pipeline),
        })
    }
}
