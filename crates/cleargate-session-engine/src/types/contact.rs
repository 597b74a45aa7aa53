//! Contact, environment and message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{ContactUuid, MsgUuid};

/// The person a session is driving through its flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub uuid: ContactUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ISO-639-3 language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urns: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    pub created_on: DateTime<Utc>,
}

impl Contact {
    pub fn new(uuid: ContactUuid, created_on: DateTime<Utc>) -> Self {
        Self {
            uuid,
            name: None,
            language: None,
            urns: Vec::new(),
            fields: BTreeMap::new(),
            created_on,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_urn(mut self, urn: impl Into<String>) -> Self {
        self.urns.push(urn.into());
        self
    }
}

/// Locale and formatting settings a session evaluates under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            time_format: default_time_format(),
            timezone: default_timezone(),
            default_language: None,
            allowed_languages: Vec::new(),
            default_country: None,
        }
    }
}

fn default_date_format() -> String {
    "YYYY-MM-DD".into()
}
fn default_time_format() -> String {
    "tt:mm".into()
}
fn default_timezone() -> String {
    "UTC".into()
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// An incoming message from the contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgIn {
    pub uuid: MsgUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

/// An outgoing message created by a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgOut {
    pub uuid: MsgUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    pub text: String,
}

/// The most recent input a session received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Input {
    Msg {
        #[serde(flatten)]
        msg: MsgIn,
        created_on: DateTime<Utc>,
    },
}

impl Input {
    /// Text used when routing on the input.
    pub fn text(&self) -> &str {
        match self {
            Self::Msg { msg, .. } => &msg.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn environment_defaults_fill_missing_fields() {
        let env: Environment = serde_json::from_value(json!({"timezone": "Africa/Kigali"})).unwrap();
        assert_eq!(env.timezone, "Africa/Kigali");
        assert_eq!(env.date_format, "YYYY-MM-DD");
        assert!(env.allowed_languages.is_empty());
    }

    #[test]
    fn input_is_tagged_and_flattened() {
        let input = Input::Msg {
            msg: MsgIn {
                uuid: MsgUuid(Uuid::nil()),
                urn: Some("tel:+250788123123".into()),
                text: "yes".into(),
                attachments: vec![],
            },
            created_on: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["type"], "msg");
        assert_eq!(value["text"], "yes");
        assert_eq!(value["urn"], "tel:+250788123123");

        let back: Input = serde_json::from_value(value).unwrap();
        assert_eq!(back.text(), "yes");
    }

    #[test]
    fn unknown_input_type_is_rejected() {
        let err = serde_json::from_value::<Input>(json!({"type": "carrier_pigeon"}));
        assert!(err.is_err());
    }
}
