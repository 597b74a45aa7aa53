//! The `switch` router: tests an operand against ordered cases.

use serde::Deserialize;

use super::waits::RouterWait;
use crate::errors::RouterError;
use crate::runtime::RunCtx;
use crate::traits::{Router, Wait};
use crate::types::{CategoryUuid, ExitUuid};

/// A routing outcome mapped to one of the node's exits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub uuid: CategoryUuid,
    pub name: String,
    pub exit_uuid: ExitUuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseTest {
    /// Any non-blank text.
    HasText,
    /// Any word of the first argument appears in the text.
    HasAnyWord,
    /// The text equals the first argument, ignoring case and padding.
    HasOnlyText,
    /// The text contains a number.
    HasNumber,
}

impl CaseTest {
    fn matches(&self, text: &str, arguments: &[String]) -> Result<bool, RouterError> {
        let matched = match self {
            Self::HasText => !text.trim().is_empty(),
            Self::HasAnyWord => {
                let wanted: Vec<String> = words(first_argument(*self, arguments)?).collect();
                words(text).any(|w| wanted.contains(&w))
            }
            Self::HasOnlyText => {
                text.trim().to_lowercase() == first_argument(*self, arguments)?.trim().to_lowercase()
            }
            Self::HasNumber => words(text).any(|w| w.parse::<f64>().is_ok()),
        };
        Ok(matched)
    }
}

fn first_argument(test: CaseTest, arguments: &[String]) -> Result<&str, RouterError> {
    arguments
        .first()
        .map(String::as_str)
        .ok_or_else(|| RouterError::Failed {
            message: format!("{test:?} case requires an argument"),
        })
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|w| w.trim_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    #[serde(rename = "type")]
    pub test: CaseTest,
    #[serde(default)]
    pub arguments: Vec<String>,
    pub category_uuid: CategoryUuid,
}

/// What a switch router tests, written as `@input`, `@results.<name>`,
/// `@locals.<key>`, `@parent.results.<name>`, `@trigger.params.<key>` or
/// `@webhook.status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Operand {
    Input,
    Result(String),
    Local(String),
    ParentResult(String),
    TriggerParam(String),
    WebhookStatus,
}

impl TryFrom<String> for Operand {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let path = s
            .strip_prefix('@')
            .ok_or_else(|| format!("operand must start with '@': {s}"))?;
        let operand = match path {
            "input" | "input.text" => Self::Input,
            "webhook.status" => Self::WebhookStatus,
            _ => {
                if let Some(name) = path.strip_prefix("results.") {
                    Self::Result(name.to_string())
                } else if let Some(key) = path.strip_prefix("locals.") {
                    Self::Local(key.to_string())
                } else if let Some(name) = path.strip_prefix("parent.results.") {
                    Self::ParentResult(name.to_string())
                } else if let Some(key) = path.strip_prefix("trigger.params.") {
                    Self::TriggerParam(key.to_string())
                } else {
                    return Err(format!("unknown operand: {s}"));
                }
            }
        };
        Ok(operand)
    }
}

impl Operand {
    fn evaluate(&self, ctx: &RunCtx<'_>) -> Option<String> {
        match self {
            Self::Input => ctx.input().map(|i| i.text().to_string()),
            Self::Result(name) => ctx.results().get(name).map(|r| r.value.clone()),
            Self::Local(key) => ctx.run().locals().get(key).map(str::to_string),
            Self::ParentResult(name) => ctx
                .parent_run()
                .and_then(|p| p.results.get(name))
                .map(|r| r.value.clone()),
            Self::TriggerParam(key) => ctx.trigger().and_then(|t| t.param(key)),
            Self::WebhookStatus => ctx.run().webhook().map(|w| w.status_code.to_string()),
        }
    }
}

fn input_operand() -> Operand {
    Operand::Input
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchRouter {
    #[serde(default)]
    wait: Option<RouterWait>,
    #[serde(default)]
    result_name: Option<String>,
    #[serde(default = "input_operand")]
    operand: Operand,
    #[serde(default)]
    cases: Vec<Case>,
    categories: Vec<Category>,
    #[serde(default)]
    default_category_uuid: Option<CategoryUuid>,
}

impl SwitchRouter {
    fn category(&self, uuid: &CategoryUuid) -> Result<&Category, RouterError> {
        self.categories
            .iter()
            .find(|c| c.uuid == *uuid)
            .ok_or_else(|| RouterError::Failed {
                message: format!("no such category: {uuid}"),
            })
    }

    fn route_to(
        &self,
        ctx: &mut RunCtx<'_>,
        category_uuid: &CategoryUuid,
        value: &str,
    ) -> Result<Option<ExitUuid>, RouterError> {
        let category = self.category(category_uuid)?;
        if let Some(result_name) = &self.result_name {
            let input = ctx.input().map(|i| i.text().to_string());
            ctx.save_result(
                result_name,
                value,
                Some(category.name.clone()),
                input,
                None,
            );
        }
        Ok(Some(category.exit_uuid))
    }
}

impl Router for SwitchRouter {
    fn type_name(&self) -> &'static str {
        "switch"
    }

    fn wait(&self) -> Option<&dyn Wait> {
        self.wait.as_ref().map(RouterWait::as_wait)
    }

    fn route(&self, ctx: &mut RunCtx<'_>) -> Result<Option<ExitUuid>, RouterError> {
        let text = self.operand.evaluate(ctx).unwrap_or_default();

        let mut matched = None;
        for case in &self.cases {
            if case.test.matches(&text, &case.arguments)? {
                matched = Some(case.category_uuid);
                break;
            }
        }

        match matched.or(self.default_category_uuid) {
            Some(category_uuid) => self.route_to(ctx, &category_uuid, &text),
            None => Ok(None),
        }
    }

    fn route_timeout(&self, ctx: &mut RunCtx<'_>) -> Result<Option<ExitUuid>, RouterError> {
        let category_uuid = self
            .wait
            .as_ref()
            .and_then(RouterWait::timeout)
            .map(|t| t.category_uuid)
            .ok_or(RouterError::NoTimeoutCategory)?;
        self.route_to(ctx, &category_uuid, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_operands() {
        let parse = |s: &str| Operand::try_from(s.to_string());
        assert_eq!(parse("@input"), Ok(Operand::Input));
        assert_eq!(parse("@results.color"), Ok(Operand::Result("color".into())));
        assert_eq!(parse("@locals.count"), Ok(Operand::Local("count".into())));
        assert_eq!(
            parse("@parent.results.age"),
            Ok(Operand::ParentResult("age".into()))
        );
        assert_eq!(
            parse("@trigger.params.source"),
            Ok(Operand::TriggerParam("source".into()))
        );
        assert_eq!(parse("@webhook.status"), Ok(Operand::WebhookStatus));
        assert!(parse("input").is_err());
        assert!(parse("@contact.name").is_err());
    }

    #[test]
    fn case_tests() {
        let args = vec!["yes yeah yep".to_string()];
        assert!(CaseTest::HasAnyWord.matches("Yeah, sure", &args).unwrap());
        assert!(!CaseTest::HasAnyWord.matches("nope", &args).unwrap());
        assert!(CaseTest::HasOnlyText
            .matches("  STOP ", &["stop".to_string()])
            .unwrap());
        assert!(CaseTest::HasText.matches("x", &[]).unwrap());
        assert!(!CaseTest::HasText.matches("   ", &[]).unwrap());
        assert!(CaseTest::HasNumber.matches("I am 32.", &[]).unwrap());
        assert!(!CaseTest::HasNumber.matches("thirty two", &[]).unwrap());
        assert!(CaseTest::HasAnyWord.matches("yes", &[]).is_err());
    }

    #[test]
    fn reads_router_with_wait() {
        let router: SwitchRouter = serde_json::from_value(json!({
            "type": "switch",
            "wait": {"type": "msg", "timeout": {"seconds": 600, "category_uuid": "3f5a0c9e-8f0b-4f4d-9d2c-4d9d7c0a1b01"}},
            "result_name": "Answer",
            "operand": "@input",
            "cases": [{"type": "has_any_word", "arguments": ["yes"], "category_uuid": "3f5a0c9e-8f0b-4f4d-9d2c-4d9d7c0a1b02"}],
            "categories": [
                {"uuid": "3f5a0c9e-8f0b-4f4d-9d2c-4d9d7c0a1b01", "name": "No Response", "exit_uuid": "8a0f3d5e-2c1b-4a6d-9e8f-7a6b5c4d3e01"},
                {"uuid": "3f5a0c9e-8f0b-4f4d-9d2c-4d9d7c0a1b02", "name": "Yes", "exit_uuid": "8a0f3d5e-2c1b-4a6d-9e8f-7a6b5c4d3e02"}
            ]
        }))
        .unwrap();
        assert!(router.wait().is_some());
        assert_eq!(router.categories.len(), 2);
        assert!(router.default_category_uuid.is_none());
    }
}
