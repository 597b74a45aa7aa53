//! Waits and the state they leave on a suspended session.

use serde::{Deserialize, Serialize};

use crate::errors::WaitError;
use crate::events::EventKind;
use crate::resumes::{Resume, ResumeKind};
use crate::runtime::RunCtx;
use crate::traits::{EventSink, Wait};
use crate::types::{CategoryUuid, FlowType};

/// Persisted state of a wait that suspended the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum ActivatedWait {
    Msg {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u32>,
    },
}

/// Timeout of a wait and the category to route to when it elapses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WaitTimeout {
    pub seconds: u32,
    pub category_uuid: CategoryUuid,
}

/// Waits for the contact to send a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MsgWait {
    #[serde(default)]
    pub timeout: Option<WaitTimeout>,
}

impl Wait for MsgWait {
    fn type_name(&self) -> &'static str {
        "msg"
    }

    fn begin(&self, ctx: &mut RunCtx<'_>) -> Option<ActivatedWait> {
        // background sessions can't receive messages so never suspend
        if ctx.session_type() == FlowType::MessagingBackground {
            tracing::debug!(run_uuid = %ctx.run_uuid(), "skipping msg wait in background session");
            return None;
        }

        let timeout_seconds = self.timeout.as_ref().map(|t| t.seconds);
        ctx.log_event(EventKind::MsgWait { timeout_seconds });
        Some(ActivatedWait::Msg { timeout_seconds })
    }

    fn end(&self, resume: &Resume) -> Result<(), WaitError> {
        match resume.kind {
            ResumeKind::Msg { .. } | ResumeKind::RunExpiration { .. } => Ok(()),
            ResumeKind::WaitTimeout {} if self.timeout.is_some() => Ok(()),
            ResumeKind::WaitTimeout {} => Err(WaitError::Rejected {
                resume_type: resume.type_name(),
                wait_type: self.type_name(),
            }),
        }
    }
}

/// The waits a router can declare, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub(crate) enum RouterWait {
    Msg(MsgWait),
}

impl RouterWait {
    pub(crate) fn as_wait(&self) -> &dyn Wait {
        match self {
            Self::Msg(wait) => wait,
        }
    }

    pub(crate) fn timeout(&self) -> Option<&WaitTimeout> {
        match self {
            Self::Msg(wait) => wait.timeout.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MsgIn;
    use chrono::Utc;
    use uuid::Uuid;

    fn msg_resume() -> Resume {
        Resume::msg(
            MsgIn {
                uuid: Uuid::nil().into(),
                urn: None,
                text: "hi".into(),
                attachments: vec![],
            },
            Utc::now(),
        )
    }

    #[test]
    fn msg_wait_without_timeout_rejects_timeouts() {
        let wait = MsgWait::default();
        assert!(wait.end(&msg_resume()).is_ok());
        assert!(wait
            .end(&Resume::run_expiration(Uuid::nil().into(), Utc::now()))
            .is_ok());

        let err = wait.end(&Resume::wait_timeout(Utc::now())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resume of type wait_timeout not accepted by wait of type msg"
        );
    }

    #[test]
    fn msg_wait_with_timeout_accepts_timeouts() {
        let wait = MsgWait {
            timeout: Some(WaitTimeout {
                seconds: 300,
                category_uuid: CategoryUuid(Uuid::nil()),
            }),
        };
        assert!(wait.end(&Resume::wait_timeout(Utc::now())).is_ok());
    }

    #[test]
    fn router_wait_requires_known_type() {
        let wait: RouterWait =
            serde_json::from_str(r#"{"type": "msg", "timeout": {"seconds": 60, "category_uuid": "00000000-0000-0000-0000-000000000000"}}"#)
                .unwrap();
        assert_eq!(wait.timeout().map(|t| t.seconds), Some(60));
        assert!(serde_json::from_str::<RouterWait>(r#"{"type": "dial"}"#).is_err());
    }

    #[test]
    fn activated_wait_serializes_tagged() {
        let wait = ActivatedWait::Msg {
            timeout_seconds: None,
        };
        assert_eq!(serde_json::to_string(&wait).unwrap(), r#"{"type":"msg"}"#);
    }
}
