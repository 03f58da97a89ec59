use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agent::conversation::ChatMessage;

/// Config for an OpenAI-style `POST /v1/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Full endpoint URL, e.g. `https://api.openai.com/v1/chat/completions`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Sends a conversation to a chat-completions endpoint and returns the raw
/// reply text of the first choice.
pub async fn query_chat_completion(
    messages: &[ChatMessage],
    cfg: &ChatConfig,
) -> anyhow::Result<String> {
    let client = Client::new();
    let request = ChatRequest {
        model: &cfg.model,
        messages,
        temperature: cfg.temperature,
    };

    let mut builder = client.post(&cfg.endpoint).json(&request);
    if let Some(key) = cfg.api_key.as_deref() {
        builder = builder.bearer_auth(key);
    }

    let res = builder
        .send()
        .await
        .context("chat completion request failed")?
        .error_for_status()
        .context("chat completion non-2xx response")?
        .json::<ChatResponse>()
        .await
        .context("chat completion decode failed")?;

    let choice = res
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("chat completion returned no choices"))?;
    Ok(choice.message.content)
}
