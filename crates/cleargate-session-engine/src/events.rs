//! Domain events produced while a session executes.
//!
//! Events are the authoritative record of what a sprint did. Every event is
//! appended to the sprint in emission order and, when it was produced on
//! behalf of a run, attached to that run stamped with the step it happened
//! at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Contact, Environment, FlowReference, MsgIn, MsgOut, RunUuid, StepUuid};

/// An event with its creation time and, when run-scoped, its step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub created_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_uuid: Option<StepUuid>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(kind: EventKind, created_on: DateTime<Utc>, step_uuid: Option<StepUuid>) -> Self {
        Self {
            created_on,
            step_uuid,
            kind,
        }
    }

    /// The `type` tag this event serializes with.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// All event variants. Unknown `type` tags fail to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum EventKind {
    /// A non-fatal problem, e.g. a rejected resume.
    Error { text: String },
    /// A problem that failed the run it was logged on.
    Failure { text: String },
    FlowEntered {
        flow: FlowReference,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_run_uuid: Option<RunUuid>,
        #[serde(default)]
        terminal: bool,
    },
    MsgReceived { msg: MsgIn },
    MsgCreated { msg: MsgOut },
    MsgWait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u32>,
    },
    WaitTimedOut {},
    RunExpired { run_uuid: RunUuid },
    RunResultChanged {
        name: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra: Option<serde_json::Value>,
    },
    ContactNameChanged { name: String },
    ContactLanguageChanged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    ContactFieldChanged {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    ContactRefreshed { contact: Contact },
    EnvironmentRefreshed { environment: Environment },
    WebhookCalled {
        url: String,
        status_code: u16,
        #[serde(default)]
        elapsed_ms: u64,
        #[serde(default)]
        request: String,
        #[serde(default)]
        response: String,
    },
    SessionTriggered {
        flow: FlowReference,
        run_summary: serde_json::Value,
    },
}

impl EventKind {
    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::Error {
            text: err.to_string(),
        }
    }

    pub fn failure(err: impl std::fmt::Display) -> Self {
        Self::Failure {
            text: err.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::Failure { .. } => "failure",
            Self::FlowEntered { .. } => "flow_entered",
            Self::MsgReceived { .. } => "msg_received",
            Self::MsgCreated { .. } => "msg_created",
            Self::MsgWait { .. } => "msg_wait",
            Self::WaitTimedOut {} => "wait_timed_out",
            Self::RunExpired { .. } => "run_expired",
            Self::RunResultChanged { .. } => "run_result_changed",
            Self::ContactNameChanged { .. } => "contact_name_changed",
            Self::ContactLanguageChanged { .. } => "contact_language_changed",
            Self::ContactFieldChanged { .. } => "contact_field_changed",
            Self::ContactRefreshed { .. } => "contact_refreshed",
            Self::EnvironmentRefreshed { .. } => "environment_refreshed",
            Self::WebhookCalled { .. } => "webhook_called",
            Self::SessionTriggered { .. } => "session_triggered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn event_serializes_flat_with_type_tag() {
        let event = Event::new(
            EventKind::Failure {
                text: "boom".into(),
            },
            ts(),
            Some(StepUuid(Uuid::nil())),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "failure",
                "created_on": "2026-03-01T10:00:00Z",
                "step_uuid": "00000000-0000-0000-0000-000000000000",
                "text": "boom"
            })
        );
    }

    #[test]
    fn type_name_matches_serialized_tag() {
        let kinds = [
            EventKind::WaitTimedOut {},
            EventKind::MsgWait {
                timeout_seconds: Some(60),
            },
            EventKind::error("nope"),
        ];
        for kind in kinds {
            let event = Event::new(kind, ts(), None);
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.type_name());
            let back: Event = serde_json::from_value(value).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let result = serde_json::from_value::<Event>(json!({
            "type": "teleported",
            "created_on": "2026-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
