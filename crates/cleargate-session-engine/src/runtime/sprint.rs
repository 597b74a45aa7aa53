use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::modifiers::Modifier;

/// Everything produced by a single `start` or `resume` call, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    #[serde(default)]
    pub(crate) events: Vec<Event>,
    #[serde(default)]
    pub(crate) modifiers: Vec<Modifier>,
}

impl Sprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}
