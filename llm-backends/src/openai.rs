use anyhow::anyhow;
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs, Stop},
    Client,
};
use async_trait::async_trait;
use common::error::RagError;
use tracing::debug;

use crate::{GenerationOptions, LlmClient};

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn label(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RagError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
            .max_tokens(options.max_tokens)
            .temperature(options.temperature);
        if let Some(stop) = &options.stop {
            builder.stop(Stop::StringArray(stop.clone()));
        }
        let request = builder
            .build()
            .map_err(|err| RagError::Generation(err.into()))?;

        debug!(model = %self.model, "sending OpenAI chat completion request");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|err| RagError::Generation(err.into()))?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                RagError::Generation(anyhow!("chat completion contained no message content"))
            })?;

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_client_reports_its_identity() {
        let client = OpenAiClient::new(
            "test-key",
            "https://api.openai.com/v1",
            "gpt-4o-mini".to_string(),
        );
        assert_eq!(client.label(), "openai");
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }
}
