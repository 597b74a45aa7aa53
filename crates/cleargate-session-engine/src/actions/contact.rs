//! Actions that modify the session contact through modifiers.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ActionError;
use crate::modifiers::Modifier;
use crate::runtime::RunCtx;
use crate::traits::{Action, EventSink};
use crate::types::ActionUuid;

fn require_contact(ctx: &RunCtx<'_>, action: &str) -> Result<(), ActionError> {
    match ctx.contact() {
        Some(_) => Ok(()),
        None => Err(ActionError::Failed {
            message: format!("{action} requires a contact"),
        }),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetContactName {
    pub uuid: ActionUuid,
    pub name: String,
}

#[async_trait]
impl Action for SetContactName {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "set_contact_name"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        require_contact(ctx, self.type_name())?;
        ctx.log_modifier(Modifier::Name {
            name: self.name.trim().to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetContactLanguage {
    pub uuid: ActionUuid,
    #[serde(default)]
    pub language: String,
}

#[async_trait]
impl Action for SetContactLanguage {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "set_contact_language"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        require_contact(ctx, self.type_name())?;

        let language = Some(self.language.trim().to_string()).filter(|l| !l.is_empty());
        if let Some(lang) = &language {
            let allowed = &ctx.environment().allowed_languages;
            if !allowed.is_empty() && !allowed.contains(lang) {
                return Err(ActionError::Failed {
                    message: format!("language {lang} isn't allowed in this environment"),
                });
            }
        }
        ctx.log_modifier(Modifier::Language { language });
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetContactField {
    pub uuid: ActionUuid,
    pub field: String,
    /// Blank clears the field.
    #[serde(default)]
    pub value: String,
}

#[async_trait]
impl Action for SetContactField {
    fn uuid(&self) -> ActionUuid {
        self.uuid
    }

    fn type_name(&self) -> &'static str {
        "set_contact_field"
    }

    async fn execute(&self, ctx: &mut RunCtx<'_>) -> Result<(), ActionError> {
        require_contact(ctx, self.type_name())?;
        let value = Some(self.value.trim().to_string()).filter(|v| !v.is_empty());
        ctx.log_modifier(Modifier::Field {
            field: self.field.clone(),
            value,
        });
        Ok(())
    }
}
