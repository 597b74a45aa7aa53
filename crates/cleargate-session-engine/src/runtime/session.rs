//! The session aggregate: a contact's journey through one or more runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::ctx::{RunCtx, SessionCtx};
use super::flow_stack::FlowStack;
use super::run::{Run, RunSummary};
use super::sprint::Sprint;
use crate::engine::Engine;
use crate::errors::{ReadError, RunError, SessionError};
use crate::events::{Event, EventKind};
use crate::flow::Flow;
use crate::resumes::Resume;
use crate::routers::ActivatedWait;
use crate::traits::SessionAssets;
use crate::triggers::Trigger;
use crate::types::{
    Contact, Environment, FlowType, Input, Results, RunStatus, RunUuid, SessionStatus,
    SessionUuid,
};

/// A subflow requested by an action, entered once the node stops
/// executing actions.
#[derive(Debug, Clone)]
pub(crate) struct PushedFlow {
    pub(crate) flow: Arc<Flow>,
    pub(crate) terminal: bool,
}

/// Session-wide state that actions may touch, kept apart from the runs so
/// a run and the session can be borrowed mutably at once.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) uuid: SessionUuid,
    pub(crate) session_type: FlowType,
    pub(crate) environment: Environment,
    pub(crate) contact: Option<Contact>,
    pub(crate) trigger: Option<Trigger>,
    pub(crate) status: SessionStatus,
    pub(crate) wait: Option<ActivatedWait>,
    pub(crate) input: Option<Input>,
    pub(crate) parent_run: Option<RunSummary>,
    pub(crate) pushed_flow: Option<PushedFlow>,
    pub(crate) flow_stack: FlowStack,
}

impl SessionState {
    pub(crate) fn new(uuid: SessionUuid) -> Self {
        Self {
            uuid,
            session_type: FlowType::default(),
            environment: Environment::default(),
            contact: None,
            trigger: None,
            status: SessionStatus::Active,
            wait: None,
            input: None,
            parent_run: None,
            pushed_flow: None,
            flow_stack: FlowStack::default(),
        }
    }
}

/// A contact's execution state across start and resume calls.
///
/// Created by [`Engine::new_session`] or read back with
/// [`Engine::read_session`]. Only one caller may drive a session at a
/// time; both entry points take `&mut self`.
pub struct Session {
    pub(crate) engine: Arc<Engine>,
    pub(crate) assets: Arc<dyn SessionAssets>,
    pub(crate) runs: Vec<Run>,
    pub(crate) runs_by_uuid: HashMap<RunUuid, usize>,
    pub(crate) state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("uuid", &self.state.uuid)
            .field("status", &self.state.status)
            .field("runs", &self.runs.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(engine: Arc<Engine>, assets: Arc<dyn SessionAssets>) -> Self {
        let uuid = SessionUuid(engine.new_uuid());
        Self {
            engine,
            assets,
            runs: Vec::new(),
            runs_by_uuid: HashMap::new(),
            state: SessionState::new(uuid),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn uuid(&self) -> SessionUuid {
        self.state.uuid
    }

    pub fn session_type(&self) -> FlowType {
        self.state.session_type
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn environment(&self) -> &Environment {
        &self.state.environment
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.state.contact.as_ref()
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.state.trigger.as_ref()
    }

    pub fn wait(&self) -> Option<&ActivatedWait> {
        self.state.wait.as_ref()
    }

    pub fn input(&self) -> Option<&Input> {
        self.state.input.as_ref()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn get_run(&self, uuid: &RunUuid) -> Option<&Run> {
        self.runs_by_uuid.get(uuid).map(|&i| &self.runs[i])
    }

    /// The run currently suspended on a wait.
    pub fn waiting_run(&self) -> Option<&Run> {
        self.waiting_run_index().map(|i| &self.runs[i])
    }

    /// Results of every run combined into one set, the newest result winning
    /// where runs saved the same name.
    pub fn merged_results(&self) -> Results {
        let mut merged = Results::new();
        for run in &self.runs {
            merged.merge(&run.results);
        }
        merged
    }

    /// Summary of the run in another session that started this one.
    pub fn parent_run(&self) -> Option<&RunSummary> {
        self.state.parent_run.as_ref()
    }

    pub(crate) fn waiting_run_index(&self) -> Option<usize> {
        self.runs
            .iter()
            .position(|r| r.status == RunStatus::Waiting)
    }

    pub(crate) fn add_run(&mut self, run: Run) -> usize {
        let idx = self.runs.len();
        self.runs_by_uuid.insert(run.uuid, idx);
        self.runs.push(run);
        idx
    }

    pub(crate) fn run_ctx<'s>(&'s mut self, idx: usize, sprint: &'s mut Sprint) -> RunCtx<'s> {
        RunCtx::new(
            &mut self.runs[idx],
            &mut self.state,
            sprint,
            &self.engine,
            self.assets.as_ref(),
        )
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Start the session from `trigger`, running until it waits or ends.
    pub async fn start(&mut self, trigger: Trigger) -> Result<Sprint, SessionError> {
        if self.state.trigger.is_some() || !self.runs.is_empty() {
            return Err(SessionError::AlreadyStarted);
        }

        let mut sprint = Sprint::new();
        let flow =
            self.assets
                .flow(&trigger.flow.uuid)
                .map_err(|source| SessionError::FlowNotFound {
                    flow: trigger.flow.clone(),
                    source,
                })?;

        let parent_run = parent_run_summary(&trigger)?;
        self.state.trigger = Some(trigger.clone());
        self.state.parent_run = parent_run;
        self.prepare_for_sprint(None)?;

        tracing::info!(
            session_uuid = %self.state.uuid,
            trigger = trigger.type_name(),
            flow = %trigger.flow,
            "starting session"
        );

        let mut ctx = SessionCtx::new(&mut self.state, &mut sprint, &self.engine);
        trigger.initialize(&mut ctx);

        self.state.session_type = flow.flow_type();
        self.state.pushed_flow = Some(PushedFlow {
            flow,
            terminal: false,
        });
        self.continue_until_wait(&mut sprint, None, None, true)
            .await?;
        Ok(sprint)
    }

    // -----------------------------------------------------------------------
    // Resume
    // -----------------------------------------------------------------------

    /// Resume a waiting session with external input.
    ///
    /// A resume the current wait doesn't accept leaves the session untouched
    /// and returns a sprint holding a single `error` event.
    pub async fn resume(&mut self, resume: Resume) -> Result<Sprint, SessionError> {
        let mut sprint = Sprint::new();

        if self.state.status != SessionStatus::Waiting {
            return Err(SessionError::NotWaiting {
                status: self.state.status,
            });
        }
        let idx = self
            .waiting_run_index()
            .ok_or(SessionError::NoWaitingRun)?;

        self.prepare_for_sprint(Some(idx))?;

        tracing::info!(
            session_uuid = %self.state.uuid,
            run_uuid = %self.runs[idx].uuid,
            resume = resume.type_name(),
            "resuming session"
        );

        let Some(flow) = self.runs[idx].flow.clone() else {
            let flow = self.runs[idx].flow_ref.clone();
            self.fail_session(&mut sprint, idx, RunError::FlowMissing { flow });
            return Ok(sprint);
        };
        let Some(step) = self.runs[idx].path.last() else {
            self.fail_session(&mut sprint, idx, RunError::NoPath);
            return Ok(sprint);
        };
        let node_uuid = step.node_uuid;
        let Some(node) = flow.node(&node_uuid) else {
            let flow = flow.reference();
            self.fail_session(&mut sprint, idx, RunError::NodeNotFound { node_uuid, flow });
            return Ok(sprint);
        };
        let Some(wait) = node.router().and_then(|r| r.wait()) else {
            let message = format!("node {node_uuid} has no wait to resume");
            self.fail_session(&mut sprint, idx, RunError::Resume { message });
            return Ok(sprint);
        };

        if let Err(err) = wait.end(&resume) {
            tracing::warn!(session_uuid = %self.state.uuid, error = %err, "resume rejected");
            sprint
                .events
                .push(Event::new(EventKind::error(err), self.engine.now(), None));
            return Ok(sprint);
        }

        self.state.wait = None;
        self.state.status = SessionStatus::Active;
        let now = self.engine.now();
        self.runs[idx].set_status(RunStatus::Active, now);

        let mut ctx = self.run_ctx(idx, &mut sprint);
        if let Err(err) = resume.apply(&mut ctx) {
            ctx.fail(err);
        }

        let destination = self.find_resume_destination(&mut sprint, idx, resume.is_timeout());
        self.continue_until_wait(&mut sprint, Some(idx), destination, false)
            .await?;
        Ok(sprint)
    }

    // -----------------------------------------------------------------------
    // Sprint preparation and failure
    // -----------------------------------------------------------------------

    /// Rebuild the flow stack from the waiting run's ancestry and resolve the
    /// trigger's parent run summary if not yet cached.
    pub(crate) fn prepare_for_sprint(&mut self, waiting: Option<usize>) -> Result<(), SessionError> {
        let mut stack = FlowStack::default();
        if let Some(idx) = waiting {
            for ancestor in self.ancestors(idx)?.into_iter().rev() {
                stack.push(self.runs[ancestor].flow_ref.uuid);
            }
            stack.push(self.runs[idx].flow_ref.uuid);
        }
        self.state.flow_stack = stack;

        if self.state.parent_run.is_none() {
            if let Some(trigger) = &self.state.trigger {
                self.state.parent_run = parent_run_summary(trigger)?;
            }
        }
        Ok(())
    }

    /// Indexes of the ancestors of run `idx`, nearest first.
    pub(crate) fn ancestors(&self, idx: usize) -> Result<Vec<usize>, SessionError> {
        let mut seen = HashSet::from([self.runs[idx].uuid]);
        let mut ancestors = Vec::new();
        let mut current = idx;
        while let Some(parent_uuid) = self.runs[current].parent_uuid {
            if !seen.insert(parent_uuid) {
                return Err(SessionError::AncestryCycle {
                    run_uuid: self.runs[idx].uuid,
                });
            }
            let Some(&parent) = self.runs_by_uuid.get(&parent_uuid) else {
                break;
            };
            ancestors.push(parent);
            current = parent;
        }
        Ok(ancestors)
    }

    /// Fail the session when a resume can't even begin: the waiting run logs
    /// the failure and every unfinished run exits failed.
    pub(crate) fn fail_session(&mut self, sprint: &mut Sprint, idx: usize, err: RunError) {
        tracing::warn!(session_uuid = %self.state.uuid, error = %err, "session failed");
        self.run_ctx(idx, sprint).fail(err);

        let now = self.engine.now();
        for run in &mut self.runs {
            if matches!(run.status, RunStatus::Active | RunStatus::Waiting) {
                run.exit(RunStatus::Failed, now);
            }
        }
        self.state.status = SessionStatus::Failed;
        self.state.wait = None;
    }
}

/// The summary of the run that started this session, if `trigger` carries one.
fn parent_run_summary(trigger: &Trigger) -> Result<Option<RunSummary>, SessionError> {
    let Some(summary) = trigger.run_summary() else {
        return Ok(None);
    };
    let summary = serde_json::from_value(summary.clone())
        .map_err(|e| ReadError::invalid("run summary", e.to_string()))?;
    Ok(Some(summary))
}
