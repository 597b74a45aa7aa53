//! JSON envelopes for sessions and runs.
//!
//! A marshaled session holds everything needed to resume it in another
//! process: runs with their paths and results, the active wait and the last
//! input. Flows are stored by reference and resolved again against the
//! caller's assets on read. Run events belong to sprints and aren't
//! written; older documents that embed them are upgraded on read.

mod legacy;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::errors::{AssetError, ReadError, SessionError};
use crate::events::Event;
use crate::routers::ActivatedWait;
use crate::runtime::{Run, Session, SessionState, Step};
use crate::traits::SessionAssets;
use crate::triggers::Trigger;
use crate::types::{
    AssetReference, Contact, Environment, FlowReference, FlowType, Input, Locals, Results,
    RunStatus, RunUuid, SessionStatus, SessionUuid, WebhookCall,
};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    uuid: SessionUuid,
    #[serde(rename = "type", default)]
    session_type: FlowType,
    #[serde(default)]
    environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<Trigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact: Option<Contact>,
    #[serde(default)]
    runs: Vec<RunEnvelope>,
    status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait: Option<ActivatedWait>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<Input>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RunEnvelope {
    uuid: RunUuid,
    flow: FlowReference,
    #[serde(default)]
    path: Vec<Step>,
    #[serde(default, skip_serializing_if = "Locals::is_empty")]
    locals: Locals,
    #[serde(default, skip_serializing_if = "Results::is_empty")]
    results: Results,
    status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    had_input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_uuid: Option<RunUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook: Option<WebhookCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait_count: Option<u32>,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exited_on: Option<DateTime<Utc>>,
    /// Only present in documents written before the first-class fields
    /// above existed. Read for upgrading, never written.
    #[serde(default, skip_serializing)]
    events: Vec<Event>,
}

impl RunEnvelope {
    fn from_run(run: &Run, max_webhook_body: usize) -> Self {
        let webhook = run
            .webhook
            .as_ref()
            .filter(|w| w.response.len() < max_webhook_body)
            .cloned();
        let mut results = run.results.clone();
        results.drop_large_extras(max_webhook_body);

        Self {
            uuid: run.uuid,
            flow: run.flow_ref.clone(),
            path: run.path.clone(),
            locals: run.locals.clone(),
            results,
            status: run.status,
            had_input: run.had_input.then_some(true),
            parent_uuid: run.parent_uuid,
            webhook,
            wait_count: (run.wait_count > 0).then_some(run.wait_count),
            created_on: run.created_on,
            modified_on: run.modified_on,
            exited_on: run.exited_on,
            events: Vec::new(),
        }
    }

    fn into_run(
        self,
        assets: &dyn SessionAssets,
        missing: &mut dyn FnMut(AssetReference, &AssetError),
    ) -> Run {
        let flow = match assets.flow(&self.flow.uuid) {
            Ok(flow) => Some(flow),
            Err(err) => {
                tracing::warn!(run_uuid = %self.uuid, flow = %self.flow, error = %err, "run flow is missing");
                missing(AssetReference::Flow(self.flow.clone()), &err);
                None
            }
        };

        Run {
            uuid: self.uuid,
            flow_ref: self.flow,
            flow,
            parent_uuid: self.parent_uuid,
            path: self.path,
            events: self.events,
            results: self.results,
            locals: self.locals,
            status: self.status,
            had_input: self.had_input.unwrap_or(false),
            webhook: self.webhook,
            wait_count: self.wait_count.unwrap_or(0),
            created_on: self.created_on,
            modified_on: self.modified_on,
            exited_on: self.exited_on,
        }
    }
}

// ---------------------------------------------------------------------------
// Marshal
// ---------------------------------------------------------------------------

impl Session {
    /// Marshal this session to JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, SessionError> {
        let max_body = self.engine.config().max_persisted_webhook_body;
        let envelope = SessionEnvelope {
            uuid: self.state.uuid,
            session_type: self.state.session_type,
            environment: self.state.environment.clone(),
            trigger: self.state.trigger.clone(),
            contact: self.state.contact.clone(),
            runs: self
                .runs
                .iter()
                .map(|r| RunEnvelope::from_run(r, max_body))
                .collect(),
            status: self.state.status,
            wait: self.state.wait.clone(),
            input: self.state.input.clone(),
        };
        serde_json::to_vec(&envelope).map_err(SessionError::Serialize)
    }
}

// ---------------------------------------------------------------------------
// Unmarshal
// ---------------------------------------------------------------------------

pub(crate) fn read_session(
    engine: Arc<Engine>,
    assets: Arc<dyn SessionAssets>,
    data: &[u8],
    missing: &mut dyn FnMut(AssetReference, &AssetError),
) -> Result<Session, ReadError> {
    let envelope: SessionEnvelope = serde_json::from_slice(data)?;
    validate(&envelope)?;

    let mut runs = Vec::with_capacity(envelope.runs.len());
    let mut runs_by_uuid = HashMap::with_capacity(envelope.runs.len());
    for mut run in envelope.runs {
        if let Some(parent_uuid) = run.parent_uuid {
            if !runs_by_uuid.contains_key(&parent_uuid) {
                return Err(ReadError::ParentNotFound {
                    run_uuid: run.uuid,
                    parent_uuid,
                });
            }
        }
        if !run.events.is_empty() {
            legacy::upgrade(&mut run);
        }

        let run = run.into_run(assets.as_ref(), missing);
        if runs_by_uuid.insert(run.uuid, runs.len()).is_some() {
            return Err(ReadError::invalid(
                "session",
                format!("duplicate run {}", run.uuid),
            ));
        }
        runs.push(run);
    }

    let mut state = SessionState::new(envelope.uuid);
    state.session_type = envelope.session_type;
    state.environment = envelope.environment;
    state.contact = envelope.contact;
    state.trigger = envelope.trigger;
    state.status = envelope.status;
    state.wait = envelope.wait;
    state.input = envelope.input;

    Ok(Session {
        engine,
        assets,
        runs,
        runs_by_uuid,
        state,
    })
}

fn validate(envelope: &SessionEnvelope) -> Result<(), ReadError> {
    let waiting = envelope.status == SessionStatus::Waiting;
    match (waiting, envelope.wait.is_some()) {
        (true, false) => {
            return Err(ReadError::invalid("session", "waiting session has no wait"));
        }
        (false, true) => {
            return Err(ReadError::invalid(
                "session",
                format!("{} session can't have a wait", envelope.status),
            ));
        }
        _ => {}
    }

    let waiting_runs = envelope
        .runs
        .iter()
        .filter(|r| r.status == RunStatus::Waiting)
        .count();
    if waiting_runs > 1 || (waiting_runs == 1 && !waiting) {
        return Err(ReadError::invalid(
            "session",
            format!(
                "{waiting_runs} waiting runs in {} session",
                envelope.status
            ),
        ));
    }
    Ok(())
}
