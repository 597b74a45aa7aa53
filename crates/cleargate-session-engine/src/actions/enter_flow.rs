//! Entering a subflow.
//!
//! The action only requests the push. The continuation loop creates the
//! child run once the current node stops executing actions, and resumes
//! this run from the same node when the child exits.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{ActionError, RunError};
use crate::runtime::RunCtx;
use crate::traits::Action;
use crate::types::{ActionUuid, FlowReference};

#[derive(Debug, Clone, Deserialize)]
pub struct EnterFlow {
    pub uuid: ActionUuid,
    pub flow: FlowReference,
    /// A terminal push ends every other run and never returns here.
    #[serde(default)]
    pub terminal: bool,
}

#[async_trait]
impl Action for EnterFlow {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "enter_flow"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        if ctx
            .flow_stack()
            .has_visited_flow_since_resume(&self.flow.uuid)
        {
            ctx.fail("flow loop detected, stopping execution before entering flow again");
            return Ok(());
        }

        match ctx.assets().flow(&self.flow.uuid) {
            Ok(flow) => ctx.push_flow(flow, self.terminal),
            Err(err) => {
                tracing::warn!(flow = %self.flow, error = %err, "unable to enter flow");
                ctx.fail(RunError::FlowMissing {
                    flow: self.flow.clone(),
                });
            }
        }
        Ok(())
    }
}
