//! Remote assistant providers.
//!
//! Supports Anthropic Claude and any `OpenAI`-compatible chat completions
//! endpoint (`OpenAI` itself, or a local/self-hosted server via
//! `ASSISTANT_BASE_URL`).

pub mod anthropic;
pub mod openai;

use std::time::Duration;

use crate::{Assistant, AssistantError};

/// Request timeout when `ASSISTANT_TIMEOUT_SECS` is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which remote provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Anthropic,
    /// `OpenAI`-compatible chat completions API.
    OpenAi,
}

/// Provider settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Selected provider.
    pub kind: ProviderKind,
    /// API key. Optional for self-hosted `OpenAI`-compatible servers.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Base URL override for `OpenAI`-compatible servers.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Resolves settings through `lookup`, which maps an environment
    /// variable name to its value.
    ///
    /// `ASSISTANT_PROVIDER` picks the provider explicitly. Otherwise
    /// `ANTHROPIC_API_KEY` selects Anthropic, then `OPENAI_API_KEY` or
    /// `ASSISTANT_BASE_URL` selects the `OpenAI`-compatible provider.
    /// Returns `Ok(None)` when nothing is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the provider name is unknown,
    /// its API key is missing, or the timeout is not a whole number of
    /// seconds.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, AssistantError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let kind = match var("ASSISTANT_PROVIDER") {
            Some(name) => match name.to_lowercase().as_str() {
                "anthropic" | "claude" => ProviderKind::Anthropic,
                "openai" | "gpt" | "openai-compatible" => ProviderKind::OpenAi,
                "none" | "canned" => return Ok(None),
                other => {
                    return Err(AssistantError::Config {
                        message: format!(
                            "Unknown assistant provider: {other}. Use 'anthropic', 'openai', or 'none'."
                        ),
                    });
                }
            },
            None => {
                if var("ANTHROPIC_API_KEY").is_some() {
                    ProviderKind::Anthropic
                } else if var("OPENAI_API_KEY").is_some() || var("ASSISTANT_BASE_URL").is_some() {
                    ProviderKind::OpenAi
                } else {
                    return Ok(None);
                }
            }
        };

        let api_key = match kind {
            ProviderKind::Anthropic => Some(var("ANTHROPIC_API_KEY").ok_or_else(|| {
                AssistantError::Config {
                    message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
                }
            })?),
            ProviderKind::OpenAi => {
                let key = var("OPENAI_API_KEY");
                if key.is_none() && var("ASSISTANT_BASE_URL").is_none() {
                    return Err(AssistantError::Config {
                        message: "OPENAI_API_KEY environment variable not set".to_string(),
                    });
                }
                key
            }
        };

        let model = var("ASSISTANT_MODEL").unwrap_or_else(|| {
            match kind {
                ProviderKind::Anthropic => anthropic::DEFAULT_MODEL,
                ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            }
            .to_string()
        });

        let timeout = match var("ASSISTANT_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.trim().parse().map_err(|e| {
                AssistantError::Config {
                    message: format!("ASSISTANT_TIMEOUT_SECS '{secs}': {e}"),
                }
            })?),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Some(Self {
            kind,
            api_key,
            model,
            base_url: var("ASSISTANT_BASE_URL"),
            timeout,
        }))
    }

    /// Builds the provider these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<Box<dyn Assistant>, AssistantError> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(match self.kind {
            ProviderKind::Anthropic => Box::new(anthropic::AnthropicAssistant::new(
                client,
                self.api_key.unwrap_or_default(),
                self.model,
            )),
            ProviderKind::OpenAi => Box::new(openai::OpenAiAssistant::new(
                client,
                self.api_key,
                self.model,
                self.base_url,
            )),
        })
    }
}

/// Creates the remote assistant configured by environment variables, or
/// `None` when no provider is configured.
///
/// # Errors
///
/// Returns [`AssistantError::Config`] if a provider is requested but not
/// usable.
pub fn create_assistant_from_env() -> Result<Option<Box<dyn Assistant>>, AssistantError> {
    let Some(settings) = ProviderSettings::resolve(|name| std::env::var(name).ok())? else {
        log::info!("No assistant provider configured; using canned replies");
        return Ok(None);
    };

    log::info!(
        "Using {:?} assistant provider with model {} (timeout {}s)",
        settings.kind,
        settings.model,
        settings.timeout.as_secs()
    );
    settings.build().map(Some)
}
