use anyhow::{Context, Result};
use common::LlmConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod anthropic;
pub mod remote;
pub mod summarizer;

/// Core trait for text-generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:11434/v1/chat/completions";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";

/// Build the provider selected by `llm.adapter`.
///
/// Returns `Ok(None)` for `"none"`; an error when the adapter is unknown or
/// its API key variable is missing.
pub fn provider_from_config(llm_config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    let adapter = llm_config.adapter.as_deref().unwrap_or("none");
    let remote_config = llm_config.remote.clone().unwrap_or_default();

    let api_key = |default_env: &str| -> Result<String> {
        let api_key_env = remote_config.api_key_env.as_deref().unwrap_or(default_env);
        std::env::var(api_key_env)
            .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))
    };
    let timeout_secs = remote_config.timeout_seconds.unwrap_or(30);
    let max_tokens = remote_config.max_tokens.unwrap_or(300);

    match adapter {
        "none" => Ok(None),
        "anthropic" => {
            let provider = anthropic::AnthropicProvider::new(
                remote_config
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.to_string()),
                api_key("ANTHROPIC_API_KEY")?,
                remote_config
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            )
            .with_defaults(timeout_secs, max_tokens);
            Ok(Some(Arc::new(provider)))
        }
        "remote" => {
            let provider = remote::RemoteLlmProvider::new(
                remote_config
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string()),
                api_key("OPENAI_API_KEY")?,
                remote_config
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REMOTE_MODEL.to_string()),
            )
            .with_defaults(timeout_secs, max_tokens, 0.7);
            Ok(Some(Arc::new(provider)))
        }
        _ => anyhow::bail!("Unknown LLM adapter type: {}", adapter),
    }
}
