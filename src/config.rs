//! Configuration for the statement-formatting pipeline.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Keeping the whole surface in one struct makes it
//! trivial to share a config across a batch, log it, and diff two runs to
//! understand why their outputs differ.

use crate::error::ExtratoError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a statement-formatting run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use extrato2ledger::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .poll_interval_secs(10)
///     .poll_timeout_secs(300)
///     .model("gpt-4o")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Base URL of the document-parsing service. Default:
    /// `https://api.cloud.llamaindex.ai`.
    pub base_url: String,

    /// Page cap sent with each upload. Default: 10.
    ///
    /// Personal-account statements rarely exceed ten pages; the cap keeps
    /// parsing cost bounded when a user uploads a year-to-date export by
    /// mistake.
    pub max_pages: u32,

    /// Request the service's premium parsing mode. Default: false.
    pub premium_mode: bool,

    /// Request the service's fast parsing mode. Default: true.
    pub fast_mode: bool,

    /// Seconds to sleep between poll attempts while a parse job is still
    /// processing. Default: 10.
    ///
    /// The service reports "not found" until the job completes; ten seconds
    /// matches its typical turnaround for a statement-sized document without
    /// hammering the endpoint.
    pub poll_interval_secs: u64,

    /// Ceiling on total poll wait per job, in seconds. Default: 600.
    ///
    /// A job that never completes would otherwise pin the batch forever.
    /// Exceeding the ceiling surfaces [`ExtratoError::PollTimeout`].
    pub poll_timeout_secs: u64,

    /// Minimum score a bank candidate must *exceed* to be accepted without
    /// the page-image vote. Default: 0.8.
    pub confidence_threshold: f64,

    /// Maximum page images classified during bank disambiguation. Default: 3.
    ///
    /// Each image is a separate vision-model call; three votes are enough for
    /// a meaningful plurality while keeping the fallback's cost near one text
    /// extraction.
    pub max_vote_images: usize,

    /// LLM model identifier, e.g. "gpt-4o". If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for classification calls. Default: 0.0.
    ///
    /// Extraction is transcription, not generation — the model should be as
    /// deterministic as the API allows.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per classification. Default: 4096.
    ///
    /// A dense statement month can run past a hundred transactions; setting
    /// this too low truncates the JSON payload mid-array and the whole
    /// extraction fails to parse.
    pub max_tokens: usize,

    /// Timeout for each HTTP call to the parsing service, in seconds.
    /// Default: 120 (uploads carry whole PDFs).
    pub http_timeout_secs: u64,

    /// Custom statement-extraction system prompt. If None, uses the built-in
    /// default from [`crate::prompts`].
    pub statement_prompt: Option<String>,

    /// Custom bank-logo classification prompt. If None, uses the built-in
    /// default from [`crate::prompts`].
    pub logo_prompt: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloud.llamaindex.ai".to_string(),
            max_pages: 10,
            premium_mode: false,
            fast_mode: true,
            poll_interval_secs: 10,
            poll_timeout_secs: 600,
            confidence_threshold: 0.8,
            max_vote_images: 3,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            http_timeout_secs: 120,
            statement_prompt: None,
            logo_prompt: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("base_url", &self.base_url)
            .field("max_pages", &self.max_pages)
            .field("premium_mode", &self.premium_mode)
            .field("fast_mode", &self.fast_mode)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("max_vote_images", &self.max_vote_images)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.config.base_url = url;
        self
    }

    pub fn max_pages(mut self, n: u32) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn premium_mode(mut self, v: bool) -> Self {
        self.config.premium_mode = v;
        self
    }

    pub fn fast_mode(mut self, v: bool) -> Self {
        self.config.fast_mode = v;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs.max(1);
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = secs;
        self
    }

    pub fn confidence_threshold(mut self, t: f64) -> Self {
        self.config.confidence_threshold = t;
        self
    }

    pub fn max_vote_images(mut self, n: usize) -> Self {
        self.config.max_vote_images = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    pub fn statement_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.statement_prompt = Some(prompt.into());
        self
    }

    pub fn logo_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.logo_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ExtratoError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.confidence_threshold) {
            return Err(ExtratoError::InvalidConfig(format!(
                "confidence_threshold must be within 0.0–1.0, got {}",
                c.confidence_threshold
            )));
        }
        if c.poll_timeout_secs < c.poll_interval_secs {
            return Err(ExtratoError::InvalidConfig(format!(
                "poll_timeout_secs ({}) must be at least poll_interval_secs ({})",
                c.poll_timeout_secs, c.poll_interval_secs
            )));
        }
        if c.base_url.is_empty() {
            return Err(ExtratoError::InvalidConfig("base_url must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_pages, 10);
        assert!(!c.premium_mode);
        assert!(c.fast_mode);
        assert_eq!(c.poll_interval_secs, 10);
        assert_eq!(c.confidence_threshold, 0.8);
        assert_eq!(c.max_vote_images, 3);
    }

    #[test]
    fn builder_rejects_bad_threshold() {
        let err = PipelineConfig::builder()
            .confidence_threshold(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtratoError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_timeout_below_interval() {
        let err = PipelineConfig::builder()
            .poll_interval_secs(30)
            .poll_timeout_secs(5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtratoError::InvalidConfig(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let c = PipelineConfig::builder()
            .base_url("https://parser.internal/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "https://parser.internal");
    }
}
