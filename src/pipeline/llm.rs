//! LLM classification: statement text → [`Statement`], page image →
//! [`BankCandidate`].
//!
//! The model is an opaque external capability, so this module keeps two
//! seams:
//!
//! * [`Classifier`] — the trait the rest of the pipeline programs against;
//!   tests substitute an in-memory fake and never touch the network.
//! * [`LlmClassifier`] — the real implementation on top of the provider
//!   abstraction, which handles the per-vendor API differences.
//!
//! All prompt engineering lives in [`crate::prompts`]; this module only
//! assembles messages, sends them, and parses the JSON payload that comes
//! back. Models occasionally wrap the payload in markdown fences despite the
//! prompt saying not to, so parsing strips an outer fence first — a cheap
//! deterministic fix beats a retry.

use crate::config::PipelineConfig;
use crate::error::ExtratoError;
use crate::prompts::{BANK_LOGO_SYSTEM_PROMPT, STATEMENT_SYSTEM_PROMPT};
use crate::schema::{BankCandidate, Statement};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Classifies statement content through a language model.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Turn parsed statement text into a typed [`Statement`].
    async fn classify_text(&self, text: &str) -> Result<Statement, ExtratoError>;

    /// Classify one page image into a bank candidate.
    async fn classify_image(
        &self,
        image: &[u8],
        mime: &str,
    ) -> Result<BankCandidate, ExtratoError>;
}

/// [`Classifier`] backed by an [`LLMProvider`].
pub struct LlmClassifier {
    provider: Arc<dyn LLMProvider>,
    statement_prompt: String,
    logo_prompt: String,
    temperature: f32,
    max_tokens: usize,
}

impl LlmClassifier {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            statement_prompt: config
                .statement_prompt
                .clone()
                .unwrap_or_else(|| STATEMENT_SYSTEM_PROMPT.to_string()),
            logo_prompt: config
                .logo_prompt
                .clone()
                .unwrap_or_else(|| BANK_LOGO_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve a provider from the config, from most- to least-specific.
    ///
    /// 1. **Pre-built provider** (`config.provider`) — used as-is; the hook
    ///    for custom middleware or a stub.
    /// 2. **Named provider + model** (`config.provider_name`) — the factory
    ///    reads the matching API key from the environment.
    /// 3. **`OPENAI_API_KEY`** — users with several keys set still get the
    ///    vendor whose models the prompts were tuned on.
    /// 4. **Full auto-detection** — first provider with a usable key.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ExtratoError> {
        if let Some(ref provider) = config.provider {
            return Ok(Self::new(Arc::clone(provider), config));
        }

        let model = config.model.as_deref().unwrap_or("gpt-4o");

        if let Some(ref name) = config.provider_name {
            let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
                ExtratoError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: format!("{e}"),
                }
            })?;
            return Ok(Self::new(provider, config));
        }

        if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
            if !openai_key.is_empty() {
                let provider =
                    ProviderFactory::create_llm_provider("openai", model).map_err(|e| {
                        ExtratoError::ProviderNotConfigured {
                            provider: "openai".to_string(),
                            hint: format!("{e}"),
                        }
                    })?;
                return Ok(Self::new(provider, config));
            }
        }

        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| ExtratoError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                     Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                     Error: {e}"
                ),
            })?;

        Ok(Self::new(provider, config))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ExtratoError> {
        let options = self.options();
        let response = self
            .provider
            .chat(messages, Some(&options))
            .await
            .map_err(|e| ExtratoError::Extraction {
                detail: format!("{e}"),
            })?;
        debug!(
            "Classification call: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify_text(&self, text: &str) -> Result<Statement, ExtratoError> {
        let messages = vec![
            ChatMessage::system(self.statement_prompt.as_str()),
            ChatMessage::user(text),
        ];
        let content = self.chat(&messages).await?;
        parse_payload(&content)
    }

    async fn classify_image(
        &self,
        image: &[u8],
        mime: &str,
    ) -> Result<BankCandidate, ExtratoError> {
        let b64 = STANDARD.encode(image);
        debug!("Encoded page image → {} bytes base64", b64.len());
        // detail "high": logos are small crops; the overview tile loses them.
        let attachment = ImageData::new(b64, mime).with_detail("high");

        // The empty user text is intentional — the API needs a user turn to
        // answer, and the image carries all the content.
        let messages = vec![
            ChatMessage::system(self.logo_prompt.as_str()),
            ChatMessage::user_with_images("", vec![attachment]),
        ];
        let content = self.chat(&messages).await?;
        parse_payload(&content)
    }
}

// ── Payload parsing ──────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

/// Strip one outer markdown fence, if the model disobeyed the prompt.
fn strip_json_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(input),
        None => input.trim(),
    }
}

/// Parse a model reply into `T`, surfacing a snippet of the offending
/// payload on mismatch.
fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, ExtratoError> {
    let cleaned = strip_json_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| ExtratoError::Extraction {
        detail: format!(
            "reply did not match the expected schema: {e}; payload started with: {:?}",
            cleaned.chars().take(120).collect::<String>()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Bank;

    #[test]
    fn fences_are_stripped() {
        let fenced = "```json\n{\"bank\": \"ITAU\", \"score\": 0.9}\n```";
        assert_eq!(strip_json_fences(fenced), "{\"bank\": \"ITAU\", \"score\": 0.9}");

        let bare = "{\"bank\": \"ITAU\", \"score\": 0.9}";
        assert_eq!(strip_json_fences(bare), bare);
    }

    #[test]
    fn payload_parses_fenced_candidate() {
        let candidate: BankCandidate =
            parse_payload("```json\n{\"bank\": \"NUBANK\", \"score\": 0.85}\n```").unwrap();
        assert_eq!(candidate.bank, Bank::Nubank);
        assert_eq!(candidate.score, 0.85);
    }

    #[test]
    fn schema_mismatch_is_an_extraction_error() {
        let err = parse_payload::<BankCandidate>("the statement is from Itaú").unwrap_err();
        match err {
            ExtratoError::Extraction { detail } => {
                assert!(detail.contains("payload started with"), "got: {detail}")
            }
            other => panic!("expected Extraction, got {other:?}"),
        }
    }

    #[test]
    fn full_statement_payload_parses() {
        let payload = r#"{
            "bank": {"bank": "INTER", "score": 0.4},
            "transactions": [
                {"amount": -80.0, "date": "2024-05-02", "channel": "PIX", "category": "FOOD"}
            ],
            "statement_month": "2024-05-01"
        }"#;
        let statement: Statement = parse_payload(payload).unwrap();
        assert_eq!(statement.bank.bank, Bank::Inter);
        assert_eq!(statement.transactions.len(), 1);
    }
}
