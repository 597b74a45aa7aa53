//! Contact modifiers.
//!
//! A modifier is a state change requested against the session contact.
//! Applying it mutates the contact and yields the event describing the
//! change, or nothing when the contact already matched.

use serde::{Deserialize, Serialize};

use crate::events::EventKind;
use crate::types::Contact;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum Modifier {
    Name {
        name: String,
    },
    Language {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Field {
        field: String,
        /// `None` clears the field.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl Modifier {
    /// Apply to `contact`, returning the event to log if anything changed.
    pub fn apply(&self, contact: &mut Contact) -> Option<EventKind> {
        match self {
            Self::Name { name } => {
                if contact.name.as_deref() == Some(name.as_str()) {
                    return None;
                }
                contact.name = Some(name.clone());
                Some(EventKind::ContactNameChanged { name: name.clone() })
            }
            Self::Language { language } => {
                if contact.language == *language {
                    return None;
                }
                contact.language = language.clone();
                Some(EventKind::ContactLanguageChanged {
                    language: language.clone(),
                })
            }
            Self::Field { field, value } => {
                let changed = match value {
                    Some(value) => {
                        contact.fields.insert(field.clone(), value.clone()).as_ref() != Some(value)
                    }
                    None => contact.fields.remove(field).is_some(),
                };
                changed.then(|| EventKind::ContactFieldChanged {
                    field: field.clone(),
                    value: value.clone(),
                })
            }
        }
    }
}
