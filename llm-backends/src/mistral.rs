use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use common::error::RagError;
use tracing::debug;

use crate::{
    chat_wire::{self, ChatCompletionResponse},
    GenerationOptions, LlmClient,
};

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

pub struct MistralClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl MistralClient {
    pub fn new(api_key: &str, model: String, timeout: Duration) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                RagError::Configuration(format!("failed to build the Mistral HTTP client: {err}"))
            })?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            model,
            client,
        })
    }
}

#[async_trait]
impl LlmClient for MistralClient {
    fn label(&self) -> &'static str {
        "mistral"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RagError> {
        let body = chat_wire::user_request(&self.model, prompt, options);

        debug!(model = %self.model, "sending Mistral chat completion request");
        let response = self
            .client
            .post(MISTRAL_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("calling the Mistral chat completions API")
            .map_err(RagError::Generation)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(anyhow!(
                "Mistral returned {status}: {body}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("parsing the Mistral response")
            .map_err(RagError::Generation)?;

        let answer = chat_wire::first_content(parsed).ok_or_else(|| {
            RagError::Generation(anyhow!("Mistral response contained no message content"))
        })?;

        Ok(answer.trim().to_string())
    }
}
