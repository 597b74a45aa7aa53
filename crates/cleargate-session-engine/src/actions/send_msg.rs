use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::events::EventKind;
use crate::runtime::RunCtx;
use crate::traits::{Action, EventSink};
use crate::types::{ActionUuid, MsgOut, MsgUuid};

/// Sends a message to the contact's first URN.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMsg {
    pub uuid: ActionUuid,
    pub text: String,
}

#[async_trait]
impl Action for SendMsg {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "send_msg"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        let urn = ctx.contact().and_then(|c| c.urns.first().cloned());
        let msg = MsgOut {
            uuid: MsgUuid(ctx.new_uuid()),
            urn,
            text: self.text.clone(),
        };
        ctx.log_event(EventKind::MsgCreated { msg });
        Ok(())
    }
}
