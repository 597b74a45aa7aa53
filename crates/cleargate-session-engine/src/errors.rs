//! Error types for sessions, runs and their collaborators.
//!
//! Only structural problems surface as `Err` from [`Session`](crate::runtime::Session)
//! operations. Failures inside user-authored flow logic become `failure`
//! events on the run instead.

use thiserror::Error;

use crate::types::{ExitUuid, FlowReference, FlowUuid, NodeUuid, RunUuid, SessionStatus};

/// Errors from [`SessionAssets`](crate::traits::SessionAssets).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetError {
    /// No flow with this UUID exists in the asset source.
    #[error("no such flow: {uuid}")]
    FlowNotFound { uuid: FlowUuid },
    /// The underlying source (file, store) failed.
    #[error("asset source error: {message}")]
    Source { message: String },
    /// An asset was found but couldn't be decoded.
    #[error("unable to read assets: {0}")]
    Read(#[from] ReadError),
}

/// Errors from [`Action`](crate::traits::Action) execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActionError {
    /// The action couldn't complete.
    #[error("action failed: {message}")]
    Failed { message: String },
    /// An injected service is missing or returned an error.
    #[error("service error: {message}")]
    Service { message: String },
}

/// Errors from [`Router`](crate::traits::Router) evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouterError {
    /// The router couldn't evaluate its cases.
    #[error("routing failed: {message}")]
    Failed { message: String },
    /// A timeout resume reached a router without a timeout category.
    #[error("router has no timeout category")]
    NoTimeoutCategory,
}

/// A resume rejected by the wait it was offered to.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WaitError {
    /// The wait doesn't accept this kind of resume.
    #[error("resume of type {resume_type} not accepted by wait of type {wait_type}")]
    Rejected {
        resume_type: &'static str,
        wait_type: &'static str,
    },
}

/// Errors that fail a single run. Logged as a `failure` event, never
/// returned to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// A node referenced by an exit or step isn't in the flow.
    #[error("unable to find destination node {node_uuid} in {flow}")]
    NodeNotFound {
        node_uuid: NodeUuid,
        flow: FlowReference,
    },
    /// The run has an empty path.
    #[error("run has no location to resume from")]
    NoPath,
    /// The run's flow couldn't be resolved.
    #[error("{flow} is missing")]
    FlowMissing { flow: FlowReference },
    /// An action returned an error.
    #[error("error executing action: {0}")]
    Action(#[from] ActionError),
    /// A router returned an error.
    #[error("error routing from node {node_uuid}: {source}")]
    Router {
        node_uuid: NodeUuid,
        #[source]
        source: RouterError,
    },
    /// A router matched no category and has no default.
    #[error("router on node {node_uuid} didn't pick an exit")]
    NoExit { node_uuid: NodeUuid },
    /// A router picked an exit the node doesn't have.
    #[error("exit {exit_uuid} doesn't exist on node {node_uuid}")]
    ExitNotFound {
        exit_uuid: ExitUuid,
        node_uuid: NodeUuid,
    },
    /// The sprint visited more nodes than `max_steps_per_sprint`.
    #[error("exceeded maximum number of steps ({max}) in a single sprint")]
    StepLimit { max: usize },
    /// The resume doesn't fit the waiting run.
    #[error("unable to apply resume: {message}")]
    Resume { message: String },
}

/// Errors reading flows, sessions or runs from JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The input isn't valid JSON for the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// No decoder is registered for a `type` tag.
    #[error("unknown {kind} type: {type_name}")]
    UnknownType {
        kind: &'static str,
        type_name: String,
    },
    /// The JSON is well-formed but violates a structural rule.
    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
    /// A child run appears before its parent.
    #[error("run {run_uuid} references parent {parent_uuid} which hasn't been read")]
    ParentNotFound {
        run_uuid: RunUuid,
        parent_uuid: RunUuid,
    },
}

impl ReadError {
    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            what,
            message: message.into(),
        }
    }
}

/// Errors returned from [`Session`](crate::runtime::Session) and
/// [`Engine`](crate::engine::Engine) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// `resume` was called on a session that isn't waiting.
    #[error("only waiting sessions can be resumed, session is {status}")]
    NotWaiting { status: SessionStatus },
    /// The session is waiting but none of its runs are.
    #[error("session has no waiting run")]
    NoWaitingRun,
    /// `start` was called on a session that already has a trigger.
    #[error("session has already been started")]
    AlreadyStarted,
    /// The trigger's flow couldn't be loaded.
    #[error("unable to load {flow}: {source}")]
    FlowNotFound {
        flow: FlowReference,
        #[source]
        source: AssetError,
    },
    /// Following parent UUIDs leads back to the starting run.
    #[error("run ancestry of {run_uuid} contains a cycle")]
    AncestryCycle { run_uuid: RunUuid },
    /// A persisted session or trigger payload couldn't be read.
    #[error("read error: {0}")]
    Read(#[from] ReadError),
    /// The session couldn't be marshaled.
    #[error("serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn run_errors_render_for_failure_events() {
        let err = RunError::Router {
            node_uuid: NodeUuid(Uuid::nil()),
            source: RouterError::NoTimeoutCategory,
        };
        assert_eq!(
            err.to_string(),
            "error routing from node 00000000-0000-0000-0000-000000000000: router has no timeout category"
        );

        let err = RunError::StepLimit { max: 100 };
        assert!(err.to_string().contains("(100)"));
    }

    #[test]
    fn wait_rejection_names_both_types() {
        let err = WaitError::Rejected {
            resume_type: "wait_timeout",
            wait_type: "msg",
        };
        assert_eq!(
            err.to_string(),
            "resume of type wait_timeout not accepted by wait of type msg"
        );
    }
}
