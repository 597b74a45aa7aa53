//! The continuation loop: advances the current run node by node until the
//! session waits, completes or fails.

use super::ctx::RunCtx;
use super::run::Run;
use super::sprint::Sprint;
use super::Session;
use crate::errors::{RunError, SessionError};
use crate::flow::Node;
use crate::types::{NodeUuid, RunStatus, SessionStatus, StepUuid};

impl Session {
    /// Run from `destination` in run `current` until the session waits or
    /// ends. A pending subflow push is entered first. `initialize` lets the
    /// trigger seed the first node visited.
    pub(crate) async fn continue_until_wait(
        &mut self,
        sprint: &mut Sprint,
        mut current: Option<usize>,
        mut destination: Option<NodeUuid>,
        mut initialize: bool,
    ) -> Result<(), SessionError> {
        let max_steps = self.engine.config().max_steps_per_sprint;
        let mut steps = 0usize;

        loop {
            if let Some(pushed) = self.state.pushed_flow.take() {
                let now = self.engine.now();
                let parent_uuid = if pushed.terminal {
                    for run in &mut self.runs {
                        if !run.status.is_exited() {
                            run.exit(RunStatus::Completed, now);
                        }
                    }
                    self.state.flow_stack = Default::default();
                    None
                } else {
                    current.map(|i| self.runs[i].uuid)
                };

                self.state.flow_stack.push(pushed.flow.uuid());
                destination = pushed.flow.entry_node();
                let run = Run::new(
                    self.engine.new_uuid().into(),
                    pushed.flow,
                    parent_uuid,
                    now,
                );
                tracing::debug!(
                    session_uuid = %self.state.uuid,
                    run_uuid = %run.uuid,
                    flow = %run.flow_ref,
                    "run started"
                );
                current = Some(self.add_run(run));
            }

            let Some(idx) = current else {
                return Ok(());
            };

            match destination {
                None => {
                    let now = self.engine.now();
                    if !self.runs[idx].status.is_exited() {
                        self.runs[idx].exit(RunStatus::Completed, now);
                    }
                    let failed = self.runs[idx].status == RunStatus::Failed;

                    match self.active_parent(idx) {
                        Some(parent) => {
                            self.state.flow_stack.pop();
                            current = Some(parent);
                            if failed {
                                self.runs[parent].exit(RunStatus::Failed, now);
                                destination = None;
                            } else {
                                destination = self.find_resume_destination(sprint, parent, false);
                            }
                        }
                        None => {
                            self.state.status = if failed {
                                SessionStatus::Failed
                            } else {
                                SessionStatus::Completed
                            };
                            tracing::info!(
                                session_uuid = %self.state.uuid,
                                status = %self.state.status,
                                "session ended"
                            );
                            return Ok(());
                        }
                    }
                }
                Some(node_uuid) => {
                    steps += 1;
                    if steps > max_steps {
                        self.run_ctx(idx, sprint)
                            .fail(RunError::StepLimit { max: max_steps });
                        destination = None;
                        continue;
                    }

                    destination = self
                        .visit_node(sprint, idx, node_uuid, initialize)
                        .await;
                    initialize = false;

                    if self.state.status == SessionStatus::Waiting {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// The parent of run `idx` if it exists and hasn't exited.
    fn active_parent(&self, idx: usize) -> Option<usize> {
        let parent_uuid = self.runs[idx].parent_uuid?;
        let &parent = self.runs_by_uuid.get(&parent_uuid)?;
        (!self.runs[parent].status.is_exited()).then_some(parent)
    }

    /// Visit a node, returning where to go next. `None` when the run waits,
    /// pushes a subflow, fails or leaves by an exit with no destination.
    async fn visit_node(
        &mut self,
        sprint: &mut Sprint,
        idx: usize,
        node_uuid: NodeUuid,
        initialize: bool,
    ) -> Option<NodeUuid> {
        let Some(flow) = self.runs[idx].flow.clone() else {
            let flow = self.runs[idx].flow_ref.clone();
            self.run_ctx(idx, sprint).fail(RunError::FlowMissing { flow });
            return None;
        };
        let Some(node) = flow.node(&node_uuid) else {
            let flow = flow.reference();
            self.run_ctx(idx, sprint)
                .fail(RunError::NodeNotFound { node_uuid, flow });
            return None;
        };

        let now = self.engine.now();
        let step_uuid = StepUuid(self.engine.new_uuid());
        self.runs[idx].create_step(step_uuid, node_uuid, now);
        if self.state.flow_stack.has_visited(&node_uuid) {
            tracing::debug!(node_uuid = %node_uuid, "revisiting node within sprint");
        }
        self.state.flow_stack.visit(node_uuid);

        let trigger = if initialize {
            self.state.trigger.clone()
        } else {
            None
        };

        let mut ctx = self.run_ctx(idx, sprint);
        if let Some(trigger) = trigger {
            trigger.initialize_run(&mut ctx);
        }

        for action in node.actions() {
            if let Err(err) = action.execute(&mut ctx).await {
                tracing::debug!(action_uuid = %action.uuid(), action = action.type_name(), "action errored");
                ctx.fail(RunError::Action(err));
            }
            if ctx.run().status == RunStatus::Failed || ctx.has_pushed_flow() {
                return None;
            }
        }

        if let Some(wait) = node.router().and_then(|r| r.wait()) {
            if let Some(activated) = wait.begin(&mut ctx) {
                ctx.activate_wait(activated);
                drop(ctx);
                self.state.flow_stack.unvisit(&node_uuid);
                return None;
            }
        }

        pick_node_exit(&mut ctx, node, false)
    }

    /// Where run `idx` goes next from the node it's stopped at, or `None` if
    /// it is no longer active.
    pub(crate) fn find_resume_destination(
        &mut self,
        sprint: &mut Sprint,
        idx: usize,
        timeout: bool,
    ) -> Option<NodeUuid> {
        if self.runs[idx].status != RunStatus::Active {
            return None;
        }

        let Some(flow) = self.runs[idx].flow.clone() else {
            let flow = self.runs[idx].flow_ref.clone();
            self.run_ctx(idx, sprint).fail(RunError::FlowMissing { flow });
            return None;
        };
        let Some(node_uuid) = self.runs[idx].path.last().map(|s| s.node_uuid) else {
            self.run_ctx(idx, sprint).fail(RunError::NoPath);
            return None;
        };
        let Some(node) = flow.node(&node_uuid) else {
            let flow = flow.reference();
            self.run_ctx(idx, sprint)
                .fail(RunError::NodeNotFound { node_uuid, flow });
            return None;
        };

        let mut ctx = self.run_ctx(idx, sprint);
        pick_node_exit(&mut ctx, node, timeout)
    }
}

/// Route out of `node` and record the exit on the current step.
fn pick_node_exit(ctx: &mut RunCtx<'_>, node: &Node, timeout: bool) -> Option<NodeUuid> {
    let node_uuid = node.uuid();
    let exit_uuid = match node.router() {
        Some(router) => {
            let routed = if timeout {
                router.route_timeout(ctx)
            } else {
                router.route(ctx)
            };
            match routed {
                Ok(Some(exit_uuid)) => exit_uuid,
                Ok(None) => {
                    ctx.fail(RunError::NoExit { node_uuid });
                    return None;
                }
                Err(source) => {
                    ctx.fail(RunError::Router { node_uuid, source });
                    return None;
                }
            }
        }
        None => node.exits().first()?.uuid,
    };

    let Some(exit) = node.exit(&exit_uuid) else {
        ctx.fail(RunError::ExitNotFound {
            exit_uuid,
            node_uuid,
        });
        return None;
    };
    ctx.leave_step(exit_uuid);
    exit.destination_uuid
}
