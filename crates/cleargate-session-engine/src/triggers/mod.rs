//! Triggers answer "why did this session start?".
//!
//! A trigger names the flow to start and carries whatever initial state
//! the session should begin with: a contact, an environment, an incoming
//! message or a summary of the run in another session that spawned it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::EventKind;
use crate::runtime::{RunCtx, SessionCtx};
use crate::traits::EventSink;
use crate::types::{Contact, Environment, FlowReference, Input, MsgIn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub flow: FlowReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub triggered_on: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum TriggerKind {
    /// Started by a user or an API call.
    Manual {},
    /// Started by an incoming message.
    Msg { msg: MsgIn },
    /// Started by a `start_session` action in another session.
    FlowAction { run_summary: Value },
}

impl Trigger {
    fn new(flow: FlowReference, kind: TriggerKind, triggered_on: DateTime<Utc>) -> Self {
        Self {
            flow,
            contact: None,
            environment: None,
            params: None,
            triggered_on,
            kind,
        }
    }

    pub fn manual(flow: FlowReference, triggered_on: DateTime<Utc>) -> Self {
        Self::new(flow, TriggerKind::Manual {}, triggered_on)
    }

    pub fn msg(flow: FlowReference, msg: MsgIn, triggered_on: DateTime<Utc>) -> Self {
        Self::new(flow, TriggerKind::Msg { msg }, triggered_on)
    }

    pub fn flow_action(flow: FlowReference, run_summary: Value, triggered_on: DateTime<Utc>) -> Self {
        Self::new(flow, TriggerKind::FlowAction { run_summary }, triggered_on)
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            TriggerKind::Manual {} => "manual",
            TriggerKind::Msg { .. } => "msg",
            TriggerKind::FlowAction { .. } => "flow_action",
        }
    }

    /// The spawning run's summary, for `flow_action` triggers.
    pub fn run_summary(&self) -> Option<&Value> {
        match &self.kind {
            TriggerKind::FlowAction { run_summary } => Some(run_summary),
            _ => None,
        }
    }

    /// A string trigger parameter, e.g. for routing on `@trigger.params.key`.
    pub fn param(&self, key: &str) -> Option<String> {
        let value = self.params.as_ref()?.get(key)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Seed the session before its first run exists.
    pub fn initialize(&self, ctx: &mut SessionCtx<'_>) {
        if let Some(environment) = &self.environment {
            ctx.set_environment(environment.clone());
        }
        if let Some(contact) = &self.contact {
            ctx.set_contact(contact.clone());
        }
        if let TriggerKind::Msg { msg } = &self.kind {
            ctx.set_input(Input::Msg {
                msg: msg.clone(),
                created_on: self.triggered_on,
            });
        }
    }

    /// Seed the first run at its first node.
    pub fn initialize_run(&self, ctx: &mut RunCtx<'_>) {
        if let TriggerKind::Msg { msg } = &self.kind {
            ctx.set_input(Input::Msg {
                msg: msg.clone(),
                created_on: self.triggered_on,
            });
            ctx.log_event(EventKind::MsgReceived { msg: msg.clone() });
        }
    }
}
