//! Inbound chat request as posted by the browser client

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use crate::search::SearchSettings;
use crate::{Error, ErrorContext, Result};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: String,
    #[serde(flatten)]
    pub sampling: SamplingParams,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub reasoning: bool,
    #[serde(default)]
    pub enable_auto_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,
    #[serde(default)]
    pub search_settings: SearchSettings,
}

/// Generation parameters forwarded to the model backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

impl ChatRequest {
    /// Reject requests that cannot be forwarded at all.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation_with_context(
                "Model is required",
                ErrorContext::new().with_field_path("model"),
            ));
        }
        if self.messages.is_empty() {
            return Err(Error::validation_with_context(
                "Messages array is required",
                ErrorContext::new().with_field_path("messages"),
            ));
        }
        Ok(())
    }

    /// Search key supplied by the client, if non-blank.
    pub fn search_key(&self) -> Option<&str> {
        self.search_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
