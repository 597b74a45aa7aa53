//! Resumes: the external input that ends a session's active wait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RunError;
use crate::events::EventKind;
use crate::runtime::RunCtx;
use crate::traits::EventSink;
use crate::types::{Contact, Environment, Input, MsgIn, RunStatus, RunUuid};

/// Input resuming a waiting session. Any contact or environment carried
/// along replaces the session's copy before the resume is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub resumed_on: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ResumeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum ResumeKind {
    /// The contact replied.
    Msg { msg: MsgIn },
    /// The wait's timeout elapsed.
    WaitTimeout {},
    /// The waiting run expired.
    RunExpiration { run_uuid: RunUuid },
}

impl Resume {
    fn new(kind: ResumeKind, resumed_on: DateTime<Utc>) -> Self {
        Self {
            contact: None,
            environment: None,
            resumed_on,
            kind,
        }
    }

    pub fn msg(msg: MsgIn, resumed_on: DateTime<Utc>) -> Self {
        Self::new(ResumeKind::Msg { msg }, resumed_on)
    }

    pub fn wait_timeout(resumed_on: DateTime<Utc>) -> Self {
        Self::new(ResumeKind::WaitTimeout {}, resumed_on)
    }

    pub fn run_expiration(run_uuid: RunUuid, resumed_on: DateTime<Utc>) -> Self {
        Self::new(ResumeKind::RunExpiration { run_uuid }, resumed_on)
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ResumeKind::Msg { .. } => "msg",
            ResumeKind::WaitTimeout {} => "wait_timeout",
            ResumeKind::RunExpiration { .. } => "run_expiration",
        }
    }

    /// Whether routing should take the wait's timeout path.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ResumeKind::WaitTimeout {})
    }

    /// Apply to the run that was waiting.
    pub fn apply(&self, ctx: &mut RunCtx<'_>) -> Result<(), RunError> {
        if let Some(environment) = &self.environment {
            ctx.refresh_environment(environment.clone());
        }
        if let Some(contact) = &self.contact {
            ctx.refresh_contact(contact.clone());
        }

        match &self.kind {
            ResumeKind::Msg { msg } => {
                ctx.set_input(Input::Msg {
                    msg: msg.clone(),
                    created_on: self.resumed_on,
                });
                ctx.log_event(EventKind::MsgReceived { msg: msg.clone() });
            }
            ResumeKind::WaitTimeout {} => {
                ctx.log_event(EventKind::WaitTimedOut {});
            }
            ResumeKind::RunExpiration { run_uuid } => {
                if *run_uuid != ctx.run_uuid() {
                    return Err(RunError::Resume {
                        message: format!(
                            "expiration is for run {run_uuid} but waiting run is {}",
                            ctx.run_uuid()
                        ),
                    });
                }
                ctx.log_event(EventKind::RunExpired {
                    run_uuid: *run_uuid,
                });
                ctx.exit_run(RunStatus::Expired);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_resumes_by_type() {
        let resume: Resume = serde_json::from_value(json!({
            "type": "wait_timeout",
            "resumed_on": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert!(resume.is_timeout());
        assert_eq!(resume.type_name(), "wait_timeout");

        let resume: Resume = serde_json::from_value(json!({
            "type": "run_expiration",
            "run_uuid": "2a4a0b0a-25e4-4a2d-8b28-5d1b9a6c7e10",
            "resumed_on": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert!(!resume.is_timeout());
        assert_eq!(resume.type_name(), "run_expiration");
    }

    #[test]
    fn unknown_resume_type_is_rejected() {
        let result = serde_json::from_value::<Resume>(json!({
            "type": "dial",
            "resumed_on": "2026-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
