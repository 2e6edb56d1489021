use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use common::error::RagError;
use tracing::debug;

use crate::{
    chat_wire::{self, ChatCompletionResponse},
    GenerationOptions, LlmClient,
};

const HF_ROUTER_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Serverless inference through the Hugging Face router. Serves both the
/// DeepSeek and Llama backends, which differ only in model id and label.
pub struct HuggingFaceClient {
    token: String,
    model: String,
    label: &'static str,
    client: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new(
        token: &str,
        model: String,
        label: &'static str,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                RagError::Configuration(format!(
                    "failed to build the Hugging Face HTTP client: {err}"
                ))
            })?;

        Ok(Self {
            token: token.trim().to_string(),
            model,
            label,
            client,
        })
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    fn label(&self) -> &'static str {
        self.label
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

        debug!(model = %self.model, "sending Hugging Face chat completion request");
        let response = self
            .client
            .post(HF_ROUTER_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("calling the Hugging Face router")
            .map_err(RagError::Generation)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(anyhow!(
                "Hugging Face router returned {status}: {body}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("parsing the Hugging Face response")
            .map_err(RagError::Generation)?;

        let answer = chat_wire::first_content(parsed).ok_or_else(|| {
            RagError::Generation(anyhow!("Hugging Face response contained no message content"))
        })?;

        Ok(answer.trim().to_string())
    }
}
