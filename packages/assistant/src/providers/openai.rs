//! `OpenAI`-compatible chat completions provider.
//!
//! Works against `OpenAI` itself and any server exposing the same
//! `/chat/completions` endpoint (Ollama, vLLM, llama.cpp, LM Studio).
//! Search-grounded endpoints that return a top-level `citations` array are
//! picked up as well.

use serde::{Deserialize, Serialize};

use crate::{Assistant, AssistantError, AssistantReply, AssistantRequest};

/// Model used when `ASSISTANT_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_TOKENS: u32 = 1024;

/// `OpenAI`-compatible assistant.
pub struct OpenAiAssistant {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl OpenAiAssistant {
    /// Creates a new assistant. `base_url` defaults to the `OpenAI` API.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        model: String,
        base_url: Option<String>,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client,
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn into_reply(response: OpenAiResponse) -> Result<AssistantReply, AssistantError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::Provider {
            message: "response has no choices".to_string(),
        })?;

    Ok(AssistantReply {
        text: choice.message.content.unwrap_or_default().trim().to_string(),
        citations: response.citations,
    })
}

#[async_trait::async_trait]
impl Assistant for OpenAiAssistant {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
        if request.grounded {
            log::debug!("OpenAI-compatible provider has no search tool; answering ungrounded");
        }

        let mut messages = vec![OpenAiMessage {
            role: "system",
            content: &request.system_instruction,
        }];
        messages.extend(request.history.iter().map(|turn| OpenAiMessage {
            role: turn.role.as_str(),
            content: &turn.text,
        }));
        messages.push(OpenAiMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = OpenAiRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err: OpenAiError = serde_json::from_str(&text).unwrap_or_else(|_| OpenAiError {
                error: OpenAiErrorDetail {
                    message: format!("HTTP {status}: {text}"),
                },
            });
            return Err(AssistantError::Provider {
                message: err.error.message,
            });
        }

        into_reply(serde_json::from_str(&text)?)
    }
}
