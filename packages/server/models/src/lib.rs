#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime oracle server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types so the API contract can evolve independently.
//! Hotspots, stations, and projection reports are returned as their
//! pipeline types directly.

use chrono::NaiveDate;
use crime_oracle_hotspot_models::Centroid;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Dataset totals for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Historical incidents loaded.
    pub incidents: usize,
    /// Hotspots computed.
    pub hotspots: usize,
    /// Hotspots in the `HIGH` tier.
    pub high_risk_hotspots: usize,
    /// Police stations loaded.
    pub stations: usize,
    /// Mean incident position, for centering the map.
    pub center: Option<Centroid>,
}

/// Query parameters for `GET /api/predict`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictQueryParams {
    /// Date to predict (`YYYY-MM-DD`). Defaults to tomorrow.
    pub date: Option<NaiveDate>,
}

/// Query parameters for `GET /api/overlay`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayQueryParams {
    /// Date to draw predicted-risk rings for. No rings when absent.
    pub date: Option<NaiveDate>,
}

/// Speaker of an [`ApiChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiChatRole {
    /// The dashboard user.
    User,
    /// The assistant.
    Assistant,
}

/// One earlier message in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChatMessage {
    /// Speaker.
    pub role: ApiChatRole,
    /// Message text.
    pub text: String,
}

/// Request body for `POST /api/assistant/ask`.
///
/// The client owns the conversation: it sends the prior messages and the
/// date it is asking about with every question.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The user's question.
    pub question: String,
    /// Prediction date the question refers to, if any.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Earlier messages, oldest first.
    #[serde(default)]
    pub history: Vec<ApiChatMessage>,
}

/// Response body for `POST /api/assistant/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    /// Answer text.
    pub answer: String,
    /// Cited source URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_defaults() {
        let request: AskRequest = serde_json::from_str(r#"{"question":"hotspots?"}"#).unwrap();
        assert_eq!(request.question, "hotspots?");
        assert_eq!(request.date, None);
        assert!(request.history.is_empty());
    }

    #[test]
    fn ask_request_with_history_and_date() {
        let request: AskRequest = serde_json::from_str(
            r#"{
                "question": "and the day after?",
                "date": "2025-06-30",
                "history": [
                    {"role": "user", "text": "predict monday"},
                    {"role": "assistant", "text": "x3.0"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 6, 30));
        assert_eq!(request.history[1].role, ApiChatRole::Assistant);
    }

    #[test]
    fn empty_citations_are_omitted() {
        let json = serde_json::to_string(&AskResponse {
            answer: "ok".to_string(),
            citations: Vec::new(),
        })
        .unwrap();
        assert_eq!(json, r#"{"answer":"ok"}"#);
    }
}
