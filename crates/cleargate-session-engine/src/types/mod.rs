//! Foundational types for the session execution model.
//!
//! Every persisted type here is `Serialize + Deserialize + Debug + Clone`.
//! Map fields use `BTreeMap` so marshaled sessions are byte-for-byte
//! reproducible.

pub mod contact;
pub mod ids;
pub mod results;
pub mod webhook;

pub use contact::*;
pub use ids::*;
pub use results::*;
pub use webhook::*;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Waiting,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Waiting,
    Completed,
    Expired,
    Failed,
}

impl RunStatus {
    /// Whether the run has left its flow for good.
    pub fn is_exited(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Channel classification of a flow, copied onto the session at start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    #[default]
    Messaging,
    MessagingBackground,
    MessagingOffline,
    Voice,
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// A by-UUID pointer to a flow asset, kept even when the asset is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReference {
    pub uuid: FlowUuid,
    #[serde(default)]
    pub name: String,
}

impl FlowReference {
    pub fn new(uuid: FlowUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for FlowReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flow[uuid={},name={}]", self.uuid, self.name)
    }
}

/// Any asset that a read path may fail to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssetReference {
    Flow(FlowReference),
}

impl std::fmt::Display for AssetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flow(flow) => flow.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_exited() {
        assert!(!RunStatus::Active.is_exited());
        assert!(!RunStatus::Waiting.is_exited());
        assert!(RunStatus::Completed.is_exited());
        assert!(RunStatus::Expired.is_exited());
        assert!(RunStatus::Failed.is_exited());
    }

    #[test]
    fn statuses_use_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&FlowType::MessagingBackground).unwrap(),
            "\"messaging_background\""
        );
        let status: RunStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(status, RunStatus::Expired);
    }

    #[test]
    fn flow_reference_name_defaults_to_empty() {
        let flow: FlowReference =
            serde_json::from_str(r#"{"uuid": "50c3706e-fedb-42c0-8eab-dda3335714b7"}"#).unwrap();
        assert_eq!(flow.name, "");
    }
}
