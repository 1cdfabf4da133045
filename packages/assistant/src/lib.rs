#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chat assistant for the crime oracle dashboard.
//!
//! A remote [`Assistant`] (Anthropic Claude or any `OpenAI`-compatible
//! endpoint, see [`providers`]) answers free-text questions about the
//! current hotspots and prediction. When no provider is configured, or the
//! provider fails, [`answer_or_fallback`] answers from a [`Briefing`] with
//! keyword-matched [`canned_reply`] text instead. Callers always get an
//! answer back.
//!
//! Nothing here keeps conversation state: history and the date being
//! discussed travel in every request.

pub mod briefing;
pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use briefing::{Briefing, canned_reply, system_instruction};

/// Errors that can occur while asking a remote assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// HTTP request to the provider failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider's response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider returned an error response.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider is not configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Who said a [`ChatTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The dashboard user.
    User,
    /// The assistant.
    Assistant,
}

impl Role {
    /// Wire name used by chat APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One earlier message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker.
    pub role: Role,
    /// Message text.
    pub text: String,
}

/// A single question to an assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantRequest {
    /// Standing instructions and context (see [`system_instruction`]).
    pub system_instruction: String,
    /// The user's question.
    pub prompt: String,
    /// Earlier turns, oldest first.
    pub history: Vec<ChatTurn>,
    /// Whether the provider may ground its answer in a web search.
    pub grounded: bool,
}

/// An assistant's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    /// Answer text.
    pub text: String,
    /// Source URLs the answer cites, in order of first appearance.
    pub citations: Vec<String>,
}

/// A question-answering capability.
#[async_trait::async_trait]
pub trait Assistant: Send + Sync {
    /// Answers one question.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError`] if the answer could not be produced.
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError>;
}

/// Asks `assistant` and falls back to the canned reply for `briefing` when
/// there is no assistant, the call fails, or the answer is blank.
pub async fn answer_or_fallback(
    assistant: Option<&dyn Assistant>,
    request: &AssistantRequest,
    briefing: &Briefing,
) -> AssistantReply {
    if let Some(assistant) = assistant {
        match assistant.ask(request).await {
            Ok(reply) if !reply.text.trim().is_empty() => return reply,
            Ok(_) => log::warn!("Assistant returned an empty answer; using canned reply"),
            Err(e) => log::warn!("Assistant request failed: {e}; using canned reply"),
        }
    }

    AssistantReply {
        text: canned_reply(&request.prompt, briefing),
        citations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_oracle_hotspot_models::{Centroid, Hotspot, HotspotTier};

    struct FailingAssistant;

    #[async_trait::async_trait]
    impl Assistant for FailingAssistant {
        async fn ask(&self, _: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
            Err(AssistantError::Provider {
                message: "quota exceeded".to_string(),
            })
        }
    }

    struct EchoAssistant;

    #[async_trait::async_trait]
    impl Assistant for EchoAssistant {
        async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
            Ok(AssistantReply {
                text: format!("echo: {}", request.prompt),
                citations: vec!["https://example.org".to_string()],
            })
        }
    }

    struct BlankAssistant;

    #[async_trait::async_trait]
    impl Assistant for BlankAssistant {
        async fn ask(&self, _: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
            Ok(AssistantReply::default())
        }
    }

    fn briefing() -> Briefing {
        Briefing {
            hotspots: vec![Hotspot {
                index: 0,
                name: "Ariaria".to_string(),
                centroid: Centroid {
                    latitude: 5.1,
                    longitude: 7.3,
                },
                member_count: 25,
                tier: HotspotTier::High,
            }],
            report: None,
        }
    }

    fn request(prompt: &str) -> AssistantRequest {
        AssistantRequest {
            prompt: prompt.to_string(),
            ..AssistantRequest::default()
        }
    }

    #[tokio::test]
    async fn failing_provider_falls_back_to_canned_reply() {
        let briefing = briefing();
        let request = request("Which hotspots are worst?");
        let reply = answer_or_fallback(Some(&FailingAssistant), &request, &briefing).await;
        assert_eq!(reply.text, canned_reply(&request.prompt, &briefing));
        assert!(reply.citations.is_empty());
    }

    #[tokio::test]
    async fn blank_answer_falls_back_to_canned_reply() {
        let briefing = briefing();
        let request = request("hotspots?");
        let reply = answer_or_fallback(Some(&BlankAssistant), &request, &briefing).await;
        assert!(reply.text.contains("Ariaria"));
    }

    #[tokio::test]
    async fn no_provider_uses_canned_reply() {
        let briefing = briefing();
        let reply = answer_or_fallback(None, &request("hotspots?"), &briefing).await;
        assert!(reply.text.contains("Ariaria"));
    }

    #[tokio::test]
    async fn working_provider_answer_is_returned() {
        let reply = answer_or_fallback(Some(&EchoAssistant), &request("hello"), &briefing()).await;
        assert_eq!(reply.text, "echo: hello");
        assert_eq!(reply.citations, ["https://example.org"]);
    }

    #[test]
    fn role_serde_is_lowercase() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"assistant","text":"hi"}"#).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(Role::User.as_str(), "user");
    }
}
