use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::runtime::RunCtx;
use crate::traits::Action;
use crate::types::ActionUuid;

/// Saves a named result on the run.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRunResult {
    pub uuid: ActionUuid,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[async_trait]
impl Action for SetRunResult {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "set_run_result"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        if self.name.trim().is_empty() {
            return Err(ActionError::Failed {
                message: "result name can't be empty".into(),
            });
        }
        ctx.save_result(&self.name, &self.value, self.category.clone(), None, None);
        Ok(())
    }
}
