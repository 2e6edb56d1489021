use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use common::error::RagError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GenerationOptions, LlmClient};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

pub struct ClaudeClient {
    headers: HeaderMap,
    model: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: String, timeout: Duration) -> Result<Self, RagError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key.trim()).map_err(|_| {
                RagError::Configuration(
                    "anthropic_api_key contains characters that cannot appear in a header"
                        .to_string(),
                )
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                RagError::Configuration(format!("failed to build the Anthropic HTTP client: {err}"))
            })?;

        Ok(Self {
            headers,
            model,
            client,
        })
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    fn label(&self) -> &'static str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RagError> {
        let body = ClaudeRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop_sequences: options.stop.as_deref(),
            messages: vec![ClaudeMessage {
                role: "user",
                content: vec![ClaudeContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        debug!(model = %self.model, "sending Anthropic messages request");
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .context("calling the Anthropic messages API")
            .map_err(RagError::Generation)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(anyhow!(
                "Anthropic returned {status}: {body}"
            )));
        }

        let parsed: ClaudeResponse = response
            .json()
            .await
            .context("parsing the Anthropic response")
            .map_err(RagError::Generation)?;

        let answer = parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ClaudeResponseBlock::Text { text } => Some(text),
                ClaudeResponseBlock::Other => None,
            })
            .ok_or_else(|| {
                RagError::Generation(anyhow!("Anthropic response contained no text block"))
            })?;

        Ok(answer.trim().to_string())
    }
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: Vec<ClaudeContentBlock<'a>>,
}

#[derive(Serialize)]
struct ClaudeContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
