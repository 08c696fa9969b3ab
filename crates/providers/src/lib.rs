//! Chat backend implementations for Sous.
//!
//! All providers implement the `sous_core::Provider` trait. Local servers
//! (Ollama, LM Studio, vLLM) and hosted APIs all speak the OpenAI
//! `/chat/completions` dialect, so one implementation covers them.

pub mod openai_compat;

use std::sync::Arc;

use sous_config::AppConfig;
use sous_core::provider::Provider;

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let name = if config.base_url.contains("11434") {
        "ollama"
    } else {
        "openai-compatible"
    };

    Arc::new(
        OpenAiCompatProvider::new(
            name,
            &config.base_url,
            config.api_key.clone().unwrap_or_default(),
        )
        .with_timeout(std::time::Duration::from_secs(config.request_timeout_secs)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_ollama() {
        let provider = build_from_config(&AppConfig::default());
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn hosted_url_builds_generic_provider() {
        let config = AppConfig {
            base_url: "https://api.openai.com/v1".into(),
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        assert_eq!(build_from_config(&config).name(), "openai-compatible");
    }
}
