//! Execution contexts handed to actions, routers, waits, triggers and
//! resumes.
//!
//! Flow behaviour interacts with the session exclusively through these
//! contexts. The engine builds a fresh [`RunCtx`] per node visit; flow
//! code never constructs one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::flow_stack::FlowStack;
use super::run::{Run, RunSummary};
use super::session::{PushedFlow, SessionState};
use super::sprint::Sprint;
use crate::engine::Engine;
use crate::events::{Event, EventKind};
use crate::flow::Flow;
use crate::modifiers::Modifier;
use crate::routers::ActivatedWait;
use crate::traits::{EventSink, SessionAssets, WebhookService};
use crate::triggers::Trigger;
use crate::types::{
    Contact, Environment, ExitUuid, FlowType, Input, Locals, NodeUuid, Results, RunResult,
    RunStatus, RunUuid, SessionStatus, SessionUuid, StepUuid, WebhookCall,
};

// ---------------------------------------------------------------------------
// RunCtx
// ---------------------------------------------------------------------------

/// Context for work done on behalf of one run.
///
/// Events logged here are stamped with the current step, attached to the
/// run and appended to the sprint.
pub struct RunCtx<'a> {
    run: &'a mut Run,
    session: &'a mut SessionState,
    sprint: &'a mut Sprint,
    engine: &'a Engine,
    assets: &'a dyn SessionAssets,
}

impl<'a> RunCtx<'a> {
    pub(crate) fn new(
        run: &'a mut Run,
        session: &'a mut SessionState,
        sprint: &'a mut Sprint,
        engine: &'a Engine,
        assets: &'a dyn SessionAssets,
    ) -> Self {
        Self {
            run,
            session,
            sprint,
            engine,
            assets,
        }
    }

    pub fn run(&self) -> &Run {
        self.run
    }

    pub fn run_uuid(&self) -> RunUuid {
        self.run.uuid
    }

    pub fn session_uuid(&self) -> SessionUuid {
        self.session.uuid
    }

    pub fn session_type(&self) -> FlowType {
        self.session.session_type
    }

    /// The step events are currently stamped with.
    pub fn step_uuid(&self) -> Option<StepUuid> {
        self.run.path.last().map(|s| s.uuid)
    }

    /// The node the run is currently at.
    pub fn node_uuid(&self) -> Option<NodeUuid> {
        self.run.path.last().map(|s| s.node_uuid)
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.session.contact.as_ref()
    }

    pub fn environment(&self) -> &Environment {
        &self.session.environment
    }

    pub fn input(&self) -> Option<&Input> {
        self.session.input.as_ref()
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.session.trigger.as_ref()
    }

    /// Summary of the run in another session that started this one.
    pub fn parent_run(&self) -> Option<&RunSummary> {
        self.session.parent_run.as_ref()
    }

    pub fn flow_stack(&self) -> &FlowStack {
        &self.session.flow_stack
    }

    pub fn assets(&self) -> &dyn SessionAssets {
        self.assets
    }

    pub fn webhook_service(&self) -> Option<Arc<dyn WebhookService>> {
        self.engine.webhook_service()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    pub fn new_uuid(&self) -> Uuid {
        self.engine.new_uuid()
    }

    pub fn results(&self) -> &Results {
        &self.run.results
    }

    pub fn locals_mut(&mut self) -> &mut Locals {
        &mut self.run.locals
    }

    pub fn run_summary(&self) -> RunSummary {
        self.run.summary(self.session.contact.as_ref())
    }

    /// Save a result on the run and log `run_result_changed`.
    pub fn save_result(
        &mut self,
        name: &str,
        value: &str,
        category: Option<String>,
        input: Option<String>,
        extra: Option<serde_json::Value>,
    ) {
        let Some(node_uuid) = self.node_uuid() else {
            tracing::warn!(run_uuid = %self.run.uuid, result = name, "no current node, result not saved");
            return;
        };
        let now = self.now();
        let saved = self.run.results.save(RunResult {
            name: name.to_string(),
            value: value.to_string(),
            category,
            node_uuid,
            input,
            extra,
            created_on: now,
        });
        let event = EventKind::RunResultChanged {
            name: saved.name.clone(),
            value: saved.value.clone(),
            category: saved.category.clone(),
            input: saved.input.clone(),
            extra: saved.extra.clone(),
        };
        self.log_event(event);
    }

    /// Cache the most recent webhook call on the run.
    pub fn set_webhook(&mut self, call: WebhookCall) {
        self.run.webhook = Some(call);
    }

    /// Ask the engine to enter `flow` once the current action returns. A
    /// terminal push ends every other run in the session first.
    pub fn push_flow(&mut self, flow: Arc<Flow>, terminal: bool) {
        let parent_run_uuid = (!terminal).then_some(self.run.uuid);
        self.log_event(EventKind::FlowEntered {
            flow: flow.reference(),
            parent_run_uuid,
            terminal,
        });
        self.session.pushed_flow = Some(PushedFlow { flow, terminal });
    }

    /// Log a failure and exit the run as failed.
    pub fn fail(&mut self, err: impl std::fmt::Display) {
        tracing::warn!(
            session_uuid = %self.session.uuid,
            run_uuid = %self.run.uuid,
            error = %err,
            "run failed"
        );
        self.log_event(EventKind::failure(err));
        let now = self.now();
        self.run.exit(RunStatus::Failed, now);
    }

    pub(crate) fn set_input(&mut self, input: Input) {
        self.run.had_input = true;
        self.session.input = Some(input);
    }

    pub(crate) fn refresh_contact(&mut self, contact: Contact) {
        self.session.contact = Some(contact.clone());
        self.log_event(EventKind::ContactRefreshed { contact });
    }

    pub(crate) fn refresh_environment(&mut self, environment: Environment) {
        self.session.environment = environment.clone();
        self.log_event(EventKind::EnvironmentRefreshed { environment });
    }

    pub(crate) fn exit_run(&mut self, status: RunStatus) {
        let now = self.now();
        self.run.exit(status, now);
    }

    pub(crate) fn has_pushed_flow(&self) -> bool {
        self.session.pushed_flow.is_some()
    }

    pub(crate) fn leave_step(&mut self, exit_uuid: ExitUuid) {
        self.run.leave_step(exit_uuid);
    }

    /// Suspend the run and the session on `wait`.
    pub(crate) fn activate_wait(&mut self, wait: ActivatedWait) {
        let now = self.now();
        self.run.set_status(RunStatus::Waiting, now);
        self.run.wait_count += 1;
        self.session.status = SessionStatus::Waiting;
        self.session.wait = Some(wait);
    }
}

impl EventSink for RunCtx<'_> {
    fn log_event(&mut self, kind: EventKind) {
        let now = self.now();
        tracing::debug!(
            run_uuid = %self.run.uuid,
            event_type = kind.type_name(),
            "event"
        );
        let event = Event::new(kind, now, self.step_uuid());
        self.run.events.push(event.clone());
        self.run.modified_on = now;
        self.sprint.events.push(event);
    }

    fn log_modifier(&mut self, modifier: Modifier) {
        let Some(contact) = self.session.contact.as_mut() else {
            tracing::debug!(run_uuid = %self.run.uuid, "no contact, modifier ignored");
            return;
        };
        let changed = modifier.apply(contact);
        self.sprint.modifiers.push(modifier);
        if let Some(kind) = changed {
            self.log_event(kind);
        }
    }
}

// ---------------------------------------------------------------------------
// SessionCtx
// ---------------------------------------------------------------------------

/// Context for session-level work with no run, e.g. trigger initialization.
/// Events logged here go to the sprint only.
pub struct SessionCtx<'a> {
    session: &'a mut SessionState,
    sprint: &'a mut Sprint,
    engine: &'a Engine,
}

impl<'a> SessionCtx<'a> {
    pub(crate) fn new(
        session: &'a mut SessionState,
        sprint: &'a mut Sprint,
        engine: &'a Engine,
    ) -> Self {
        Self {
            session,
            sprint,
            engine,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.session.contact.as_ref()
    }

    pub(crate) fn set_contact(&mut self, contact: Contact) {
        self.session.contact = Some(contact);
    }

    pub(crate) fn set_environment(&mut self, environment: Environment) {
        self.session.environment = environment;
    }

    pub(crate) fn set_input(&mut self, input: Input) {
        self.session.input = Some(input);
    }
}

impl EventSink for SessionCtx<'_> {
    fn log_event(&mut self, kind: EventKind) {
        let event = Event::new(kind, self.now(), None);
        self.sprint.events.push(event);
    }

    fn log_modifier(&mut self, modifier: Modifier) {
        let changed = match self.session.contact.as_mut() {
            Some(contact) => modifier.apply(contact),
            None => return,
        };
        self.sprint.modifiers.push(modifier);
        if let Some(kind) = changed {
            self.log_event(kind);
        }
    }
}
