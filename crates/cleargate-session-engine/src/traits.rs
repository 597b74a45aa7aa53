//! Pluggable contracts between the session engine and its collaborators.
//!
//! Flow behaviour (actions, routers, waits) is supplied as trait objects
//! decoded by the [`FlowReader`](crate::flow::FlowReader). Everything the
//! engine needs from the outside world (assets, time, identities, HTTP)
//! is injected through the [`Engine`](crate::engine::Engine).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{ActionError, AssetError, RouterError, WaitError};
use crate::events::EventKind;
use crate::flow::Flow;
use crate::modifiers::Modifier;
use crate::resumes::Resume;
use crate::routers::ActivatedWait;
use crate::runtime::RunCtx;
use crate::types::{ActionUuid, ExitUuid, FlowUuid, WebhookCall, WebhookRequest};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One instruction executed when a run visits a node.
///
/// Actions are executed in order. An action that wants to enter a subflow
/// calls [`RunCtx::push_flow`]; the engine stops executing the node's
/// remaining actions and starts the child run. Returning `Err` fails the
/// run, it never fails the session.
#[async_trait]
pub trait Action: Send + Sync + Debug {
    fn uuid(&self) -> ActionUuid;

    /// The `type` tag this action is registered under.
    fn type_name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError>;
}

// ---------------------------------------------------------------------------
// Router / Wait
// ---------------------------------------------------------------------------

/// Picks the exit a run leaves a node by.
pub trait Router: Send + Sync + Debug {
    fn type_name(&self) -> &'static str;

    /// The wait to begin before routing, if any.
    fn wait(&self) -> Option<&dyn Wait> {
        None
    }

    /// Pick an exit. `Ok(None)` means no exit matched.
    fn route(&self, ctx: &mut RunCtx<'_>) -> Result<Option<ExitUuid>, RouterError>;

    /// Pick an exit after the node's wait timed out.
    fn route_timeout(&self, ctx: &mut RunCtx<'_>) -> Result<Option<ExitUuid>, RouterError>;
}

/// A suspension point for a run.
pub trait Wait: Send + Sync + Debug {
    fn type_name(&self) -> &'static str;

    /// Start waiting. Returns `None` when the wait decides not to suspend
    /// the run, in which case the router routes immediately.
    fn begin(&self, ctx: &mut RunCtx<'_>) -> Option<ActivatedWait>;

    /// Check whether `resume` can end this wait.
    fn end(&self, resume: &Resume) -> Result<(), WaitError>;
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Receiver of everything a sprint produces.
pub trait EventSink {
    fn log_event(&mut self, kind: EventKind);

    /// Apply a modifier to the session contact and record it.
    fn log_modifier(&mut self, modifier: Modifier);
}

// ---------------------------------------------------------------------------
// Assets and services
// ---------------------------------------------------------------------------

/// Source of flow definitions for a session.
pub trait SessionAssets: Send + Sync {
    fn flow(&self, uuid: &FlowUuid) -> Result<Arc<Flow>, AssetError>;
}

/// Performs HTTP calls on behalf of the `call_webhook` action.
#[async_trait]
pub trait WebhookService: Send + Sync {
    async fn call(&self, request: WebhookRequest) -> Result<WebhookCall, ActionError>;
}

/// Source of timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of new identities for sessions, runs, steps and messages.
pub trait UuidGenerator: Send + Sync {
    fn new_uuid(&self) -> Uuid;
}
