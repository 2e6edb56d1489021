use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use common::{error::RagError, utils::config::AppConfig};

mod chat_wire;
pub mod claude;
pub mod huggingface;
pub mod mistral;
pub mod openai;

pub use claude::ClaudeClient;
pub use huggingface::HuggingFaceClient;
pub use mistral::MistralClient;
pub use openai::OpenAiClient;

/// Sampling parameters shared by every backend. The defaults match the
/// generation settings the evaluation runs were calibrated with.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
            stop: None,
        }
    }
}

/// A chat model that turns one prompt into one answer. Implementations do
/// not retry; callers decide whether a failure is fatal.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short stable name used in log lines and results file names.
    fn label(&self) -> &'static str;

    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RagError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackendKind {
    OpenAi,
    Claude,
    Mistral,
    DeepSeek,
    Llama,
}

impl Default for LlmBackendKind {
    fn default() -> Self {
        Self::OpenAi
    }
}

impl std::fmt::Display for LlmBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl LlmBackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Mistral => "mistral",
            Self::DeepSeek => "deepseek",
            Self::Llama => "llama",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Claude => "claude-3-sonnet-20240229",
            Self::Mistral => "mistral-small-latest",
            Self::DeepSeek => "deepseek-ai/DeepSeek-V3",
            Self::Llama => "meta-llama/Meta-Llama-3-8B-Instruct",
        }
    }
}

impl FromStr for LlmBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "mistral" => Ok(Self::Mistral),
            "deepseek" => Ok(Self::DeepSeek),
            "llama" => Ok(Self::Llama),
            other => Err(anyhow!(
                "unknown LLM backend '{other}'. Expected 'openai', 'claude', 'mistral', 'deepseek', or 'llama'."
            )),
        }
    }
}

/// Builds the requested backend, failing with a configuration error naming
/// the missing credential before any request is made.
pub fn build_backend(
    kind: LlmBackendKind,
    config: &AppConfig,
    model_override: Option<String>,
) -> Result<Box<dyn LlmClient>, RagError> {
    let model = model_override.unwrap_or_else(|| kind.default_model().to_string());
    let timeout = std::time::Duration::from_secs(config.llm_request_timeout_secs);

    match kind {
        LlmBackendKind::OpenAi => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                missing_credential("openai_api_key", "OPENAI_API_KEY", kind)
            })?;
            Ok(Box::new(OpenAiClient::new(
                api_key,
                &config.openai_base_url,
                model,
            )))
        }
        LlmBackendKind::Claude => {
            let api_key = config.anthropic_api_key.as_deref().ok_or_else(|| {
                missing_credential("anthropic_api_key", "ANTHROPIC_API_KEY", kind)
            })?;
            Ok(Box::new(ClaudeClient::new(api_key, model, timeout)?))
        }
        LlmBackendKind::Mistral => {
            let api_key = config.mistral_api_key.as_deref().ok_or_else(|| {
                missing_credential("mistral_api_key", "MISTRAL_API_KEY", kind)
            })?;
            Ok(Box::new(MistralClient::new(api_key, model, timeout)?))
        }
        LlmBackendKind::DeepSeek | LlmBackendKind::Llama => {
            let token = config
                .hf_token
                .as_deref()
                .ok_or_else(|| missing_credential("hf_token", "HF_TOKEN", kind))?;
            Ok(Box::new(HuggingFaceClient::new(
                token,
                model,
                kind.label(),
                timeout,
            )?))
        }
    }
}

fn missing_credential(key: &str, env_var: &str, kind: LlmBackendKind) -> RagError {
    RagError::Configuration(format!(
        "{key} is required for the '{}' backend. Set it in config.toml or via the {env_var} environment variable.",
        kind.label()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> AppConfig {
        serde_json::from_value(serde_json::json!({})).expect("defaults should deserialize")
    }

    #[test]
    fn generation_defaults_match_the_calibrated_settings() {
        let options = GenerationOptions::default();
        assert_eq!(options.max_tokens, 512);
        assert!((options.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(options.stop, None);
    }

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!(
            "OpenAI".parse::<LlmBackendKind>().expect("should parse"),
            LlmBackendKind::OpenAi
        );
        assert_eq!(
            "anthropic".parse::<LlmBackendKind>().expect("should parse"),
            LlmBackendKind::Claude
        );
        assert_eq!(
            "deepseek".parse::<LlmBackendKind>().expect("should parse"),
            LlmBackendKind::DeepSeek
        );
        assert!("gemini".parse::<LlmBackendKind>().is_err());
    }

    #[test]
    fn every_backend_has_a_default_model() {
        for kind in [
            LlmBackendKind::OpenAi,
            LlmBackendKind::Claude,
            LlmBackendKind::Mistral,
            LlmBackendKind::DeepSeek,
            LlmBackendKind::Llama,
        ] {
            assert!(!kind.default_model().is_empty());
            assert!(!kind.label().is_empty());
        }
    }

    #[test]
    fn missing_credentials_fail_before_any_request() {
        let config = empty_config();

        for kind in [
            LlmBackendKind::OpenAi,
            LlmBackendKind::Claude,
            LlmBackendKind::Mistral,
            LlmBackendKind::DeepSeek,
            LlmBackendKind::Llama,
        ] {
            let error = build_backend(kind, &config, None)
                .err()
                .unwrap_or_else(|| panic!("backend {} must require a credential", kind.label()));
            assert!(
                matches!(error, RagError::Configuration(_)),
                "expected a configuration error for {}, got {error:?}",
                kind.label()
            );
        }
    }

    #[test]
    fn configured_backends_report_their_identity() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "anthropic_api_key": "test-key",
        }))
        .expect("test config should deserialize");

        let backend = build_backend(LlmBackendKind::Claude, &config, None)
            .expect("claude backend should build with a key present");
        assert_eq!(backend.label(), "claude");
        assert_eq!(backend.model_name(), "claude-3-sonnet-20240229");

        let overridden = build_backend(
            LlmBackendKind::Claude,
            &config,
            Some("claude-3-opus-20240229".to_string()),
        )
        .expect("claude backend should accept a model override");
        assert_eq!(overridden.model_name(), "claude-3-opus-20240229");
    }
}
