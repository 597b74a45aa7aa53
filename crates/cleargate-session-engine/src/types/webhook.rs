//! Webhook call records cached on runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An outgoing webhook request built by the `call_webhook` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// The outcome of a webhook call, as returned by a
/// [`WebhookService`](crate::traits::WebhookService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookCall {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// `0` when no response was received.
    pub status_code: u16,
    /// Raw request trace.
    #[serde(default)]
    pub request: String,
    /// Raw response body.
    #[serde(default)]
    pub response: String,
    /// Parsed response body, when it was valid JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json: Option<serde_json::Value>,
    #[serde(default)]
    pub elapsed_ms: u64,
    pub created_on: DateTime<Utc>,
}

fn default_method() -> String {
    "GET".into()
}

impl WebhookCall {
    /// Whether the call got a 2xx response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
