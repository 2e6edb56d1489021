use serde::{Deserialize, Serialize};

use crate::GenerationOptions;

// Request and response shapes shared by the OpenAI-compatible chat APIs
// (Mistral and the Hugging Face router).

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

pub(crate) fn user_request<'a>(
    model: &'a str,
    prompt: &'a str,
    options: &'a GenerationOptions,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        stop: options.stop.as_deref(),
    }
}

pub(crate) fn first_content(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
}
