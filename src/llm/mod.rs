//! LLM integration for the analyst agent.
//!
//! The agent drives one provider through the [`LlmProvider`] trait. The only
//! backend today is OpenAI's chat-completions API, spoken directly over
//! reqwest; everything above this module stays provider-agnostic.

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Override for the provider endpoint, mostly for tests and proxies.
    pub base_url: Option<String>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::OpenAi => {
            let mut provider = OpenAiProvider::new(config.api_key.clone(), &config.model)?;
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            tracing::info!("Using OpenAI (model: {})", config.model);
            Ok(Arc::new(provider))
        }
    }
}
