use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::events::EventKind;
use crate::runtime::RunCtx;
use crate::traits::{Action, EventSink};
use crate::types::{ActionUuid, FlowReference};

/// Asks the caller to start a new session in `flow` for the same contact.
///
/// Logs `session_triggered` with a summary of this run. The caller turns
/// that into a `flow_action` trigger; this session continues regardless.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSession {
    pub uuid: ActionUuid,
    pub flow: FlowReference,
}

#[async_trait]
impl Action for StartSession {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "start_session"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        if let Err(err) = ctx.assets().flow(&self.flow.uuid) {
            ctx.log_event(EventKind::error(format!("{} is missing: {err}", self.flow)));
            return Ok(());
        }

        let run_summary =
            serde_json::to_value(ctx.run_summary()).map_err(|e| ActionError::Failed {
                message: format!("unable to summarize run: {e}"),
            })?;
        ctx.log_event(EventKind::SessionTriggered {
            flow: self.flow.clone(),
            run_summary,
        });
        Ok(())
    }
}
