//! Calling an external webhook through the engine's [`WebhookService`].
//!
//! The call is recorded as a `webhook_called` event and cached on the run.
//! With a `result_name` the status is also saved as a result whose `extra`
//! holds the parsed response body.
//!
//! [`WebhookService`]: crate::traits::WebhookService

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::events::EventKind;
use crate::runtime::RunCtx;
use crate::traits::{Action, EventSink};
use crate::types::{ActionUuid, WebhookRequest};

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallWebhook {
    pub uuid: ActionUuid,
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub result_name: Option<String>,
}

#[async_trait]
impl Action for CallWebhook {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "call_webhook"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        let service = ctx.webhook_service().ok_or_else(|| ActionError::Service {
            message: "no webhook service configured".into(),
        })?;

        let request = WebhookRequest {
            method: self.method.to_uppercase(),
            url: self.url.trim().to_string(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        };
        let call = service.call(request).await?;

        tracing::debug!(
            run_uuid = %ctx.run_uuid(),
            url = %call.url,
            status_code = call.status_code,
            "webhook called"
        );
        ctx.log_event(EventKind::WebhookCalled {
            url: call.url.clone(),
            status_code: call.status_code,
            elapsed_ms: call.elapsed_ms,
            request: call.request.clone(),
            response: call.response.clone(),
        });

        if let Some(result_name) = &self.result_name {
            let category = if call.is_success() { "Success" } else { "Failure" };
            ctx.save_result(
                result_name,
                &call.status_code.to_string(),
                Some(category.to_string()),
                Some(format!("{} {}", call.method, call.url)),
                call.response_json.clone(),
            );
        }
        ctx.set_webhook(call);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_defaults_to_get() {
        let action: CallWebhook = serde_json::from_str(
            r#"{"uuid": "e97cd6d5-3354-4dbd-85bc-6c1f87849eec", "type": "call_webhook", "url": "http://example.com/lookup"}"#,
        )
        .unwrap();
        assert_eq!(action.method, "GET");
        assert!(action.result_name.is_none());
    }
}
