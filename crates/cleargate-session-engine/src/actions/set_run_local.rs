use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::runtime::RunCtx;
use crate::traits::Action;
use crate::types::ActionUuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOperation {
    #[default]
    Set,
    Increment,
    Clear,
}

/// Updates a run-scoped local variable. Locals produce no events.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRunLocal {
    pub uuid: ActionUuid,
    pub local: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub operation: LocalOperation,
}

#[async_trait]
impl Action for SetRunLocal {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "set_run_local"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        let locals = ctx.locals_mut();
        match self.operation {
            LocalOperation::Set => locals.set(&self.local, &self.value),
            LocalOperation::Clear => locals.clear(&self.local),
            LocalOperation::Increment => {
                let by: i64 = parse_int(&self.value, "increment")?;
                let current = match locals.get(&self.local) {
                    Some(v) => parse_int(v, "local")?,
                    None => 0,
                };
                locals.set(&self.local, (current + by).to_string());
            }
        }
        Ok(())
    }
}

fn parse_int(value: &str, what: &str) -> Result<i64, ActionError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| ActionError::Failed {
        message: format!("{what} value {value:?} isn't an integer"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_defaults_to_set() {
        let action: SetRunLocal = serde_json::from_str(
            r#"{"uuid": "e97cd6d5-3354-4dbd-85bc-6c1f87849eec", "type": "set_run_local", "local": "count", "value": "3"}"#,
        )
        .unwrap();
        assert_eq!(action.operation, LocalOperation::Set);
    }

    #[test]
    fn parse_int_treats_blank_as_zero() {
        assert_eq!(parse_int(" ", "local").unwrap(), 0);
        assert_eq!(parse_int("-4", "local").unwrap(), -4);
        assert!(parse_int("four", "local").is_err());
    }
}
