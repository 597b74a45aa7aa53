//! Runs and the steps of their paths.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::flow::Flow;
use crate::types::{
    Contact, ExitUuid, FlowReference, Locals, NodeUuid, Results, RunStatus, RunUuid, StepUuid,
    WebhookCall,
};

/// One visit to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub(crate) uuid: StepUuid,
    pub(crate) node_uuid: NodeUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) exit_uuid: Option<ExitUuid>,
    pub(crate) arrived_on: DateTime<Utc>,
}

impl Step {
    pub fn uuid(&self) -> StepUuid {
        self.uuid
    }

    pub fn node_uuid(&self) -> NodeUuid {
        self.node_uuid
    }

    /// The exit taken, once the run has left the node.
    pub fn exit_uuid(&self) -> Option<ExitUuid> {
        self.exit_uuid
    }

    pub fn arrived_on(&self) -> DateTime<Utc> {
        self.arrived_on
    }
}

/// One flow invocation within a session.
#[derive(Debug, Clone)]
pub struct Run {
    pub(crate) uuid: RunUuid,
    pub(crate) flow_ref: FlowReference,
    /// `None` when the flow couldn't be resolved on read.
    pub(crate) flow: Option<Arc<Flow>>,
    pub(crate) parent_uuid: Option<RunUuid>,
    pub(crate) path: Vec<Step>,
    pub(crate) events: Vec<Event>,
    pub(crate) results: Results,
    pub(crate) locals: Locals,
    pub(crate) status: RunStatus,
    pub(crate) had_input: bool,
    pub(crate) webhook: Option<WebhookCall>,
    pub(crate) wait_count: u32,
    pub(crate) created_on: DateTime<Utc>,
    pub(crate) modified_on: DateTime<Utc>,
    pub(crate) exited_on: Option<DateTime<Utc>>,
}

impl Run {
    pub(crate) fn new(
        uuid: RunUuid,
        flow: Arc<Flow>,
        parent_uuid: Option<RunUuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid,
            flow_ref: flow.reference(),
            flow: Some(flow),
            parent_uuid,
            path: Vec::new(),
            events: Vec::new(),
            results: Results::new(),
            locals: Locals::default(),
            status: RunStatus::Active,
            had_input: false,
            webhook: None,
            wait_count: 0,
            created_on: now,
            modified_on: now,
            exited_on: None,
        }
    }

    pub fn uuid(&self) -> RunUuid {
        self.uuid
    }

    pub fn flow_reference(&self) -> &FlowReference {
        &self.flow_ref
    }

    pub fn flow(&self) -> Option<&Arc<Flow>> {
        self.flow.as_ref()
    }

    pub fn parent_uuid(&self) -> Option<RunUuid> {
        self.parent_uuid
    }

    pub fn path(&self) -> &[Step] {
        &self.path
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn had_input(&self) -> bool {
        self.had_input
    }

    pub fn webhook(&self) -> Option<&WebhookCall> {
        self.webhook.as_ref()
    }

    pub fn wait_count(&self) -> u32 {
        self.wait_count
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    pub fn modified_on(&self) -> DateTime<Utc> {
        self.modified_on
    }

    pub fn exited_on(&self) -> Option<DateTime<Utc>> {
        self.exited_on
    }

    pub(crate) fn create_step(
        &mut self,
        uuid: StepUuid,
        node_uuid: NodeUuid,
        now: DateTime<Utc>,
    ) -> StepUuid {
        self.path.push(Step {
            uuid,
            node_uuid,
            exit_uuid: None,
            arrived_on: now,
        });
        self.modified_on = now;
        uuid
    }

    /// Record the exit taken from the current node. A step's exit is only
    /// ever set once.
    pub(crate) fn leave_step(&mut self, exit_uuid: ExitUuid) {
        match self.path.last_mut() {
            Some(step) if step.exit_uuid.is_none() => step.exit_uuid = Some(exit_uuid),
            Some(step) => tracing::warn!(
                run_uuid = %self.uuid,
                step_uuid = %step.uuid,
                "step already has an exit, ignoring"
            ),
            None => tracing::warn!(run_uuid = %self.uuid, "leaving a node with an empty path"),
        }
    }

    pub(crate) fn set_status(&mut self, status: RunStatus, now: DateTime<Utc>) {
        self.status = status;
        self.modified_on = now;
    }

    pub(crate) fn exit(&mut self, status: RunStatus, now: DateTime<Utc>) {
        self.set_status(status, now);
        self.exited_on = Some(now);
    }

    pub(crate) fn summary(&self, contact: Option<&Contact>) -> RunSummary {
        RunSummary {
            uuid: self.uuid,
            flow: self.flow_ref.clone(),
            contact: contact.cloned(),
            status: self.status,
            results: self.results.clone(),
        }
    }
}

/// Snapshot of a run handed to another session, e.g. by `start_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub uuid: RunUuid,
    pub flow: FlowReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    pub status: RunStatus,
    #[serde(default)]
    pub results: Results,
}
