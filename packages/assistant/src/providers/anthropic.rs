//! Anthropic Claude provider.

use serde::{Deserialize, Serialize};

use crate::{Assistant, AssistantError, AssistantReply, AssistantRequest};

/// Model used when `ASSISTANT_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_TOKENS: u32 = 1024;
const MAX_SEARCHES: u32 = 3;

/// Anthropic Messages API assistant.
pub struct AnthropicAssistant {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicAssistant {
    /// Creates a new Anthropic assistant.
    #[must_use]
    pub const fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
        #[serde(default)]
        citations: Option<Vec<AnthropicCitation>>,
    },
    /// Search calls and results; only the text blocks are answered with.
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicCitation {
    url: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Joins the text blocks and collects cited URLs, first occurrence first.
fn into_reply(response: AnthropicResponse) -> AssistantReply {
    let mut reply = AssistantReply::default();

    for block in response.content {
        if let AnthropicContentBlock::Text { text, citations } = block {
            reply.text.push_str(&text);
            for url in citations.into_iter().flatten().filter_map(|c| c.url) {
                if !reply.citations.contains(&url) {
                    reply.citations.push(url);
                }
            }
        }
    }

    reply.text = reply.text.trim().to_string();
    reply
}

#[async_trait::async_trait]
impl Assistant for AnthropicAssistant {
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
        let mut messages: Vec<AnthropicMessage<'_>> = request
            .history
            .iter()
            .map(|turn| AnthropicMessage {
                role: turn.role.as_str(),
                content: &turn.text,
            })
            .collect();
        messages.push(AnthropicMessage {
            role: "user",
            content: &request.prompt,
        });

        let tools = if request.grounded {
            vec![serde_json::json!({
                "type": "web_search_20250305",
                "name": "web_search",
                "max_uses": MAX_SEARCHES,
            })]
        } else {
            Vec::new()
        };

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: &request.system_instruction,
            messages,
            tools,
        };

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err: AnthropicError =
                serde_json::from_str(&text).unwrap_or_else(|_| AnthropicError {
                    error: AnthropicErrorDetail {
                        message: format!("HTTP {status}: {text}"),
                    },
                });
            return Err(AssistantError::Provider {
                message: err.error.message,
            });
        }

        let response: AnthropicResponse = serde_json::from_str(&text)?;
        Ok(into_reply(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_joins_text_and_dedups_citations() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "server_tool_use", "id": "srvtoolu_1", "name": "web_search", "input": {"query": "Aba crime"}},
                    {"type": "web_search_tool_result", "tool_use_id": "srvtoolu_1", "content": []},
                    {"type": "text", "text": "Ariaria market is busiest ", "citations": [
                        {"type": "web_search_result_location", "url": "https://news.example/a", "title": "A", "cited_text": "..."}
                    ]},
                    {"type": "text", "text": "on Wednesdays.", "citations": [
                        {"type": "web_search_result_location", "url": "https://news.example/a", "title": "A", "cited_text": "..."},
                        {"type": "web_search_result_location", "url": "https://news.example/b", "title": "B", "cited_text": "..."}
                    ]},
                    {"type": "text", "text": "\n", "citations": null}
                ],
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();

        let reply = into_reply(response);
        assert_eq!(reply.text, "Ariaria market is busiest on Wednesdays.");
        assert_eq!(
            reply.citations,
            ["https://news.example/a", "https://news.example/b"]
        );
    }
}
