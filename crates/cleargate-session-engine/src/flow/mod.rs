//! Flow definitions as the engine consumes them.
//!
//! A [`Flow`] is an ordered list of nodes. Each [`Node`] carries its
//! actions, an optional router and its exits. Flows are immutable once
//! read and shared between sessions behind an `Arc`.

mod reader;

pub use reader::FlowReader;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::{Action, Router};
use crate::types::{ExitUuid, FlowReference, FlowType, FlowUuid, NodeUuid};

/// A way out of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub uuid: ExitUuid,
    /// `None` ends the run when taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_uuid: Option<NodeUuid>,
}

#[derive(Debug)]
pub struct Node {
    uuid: NodeUuid,
    actions: Vec<Arc<dyn Action>>,
    router: Option<Arc<dyn Router>>,
    exits: Vec<Exit>,
}

impl Node {
    pub fn new(
        uuid: NodeUuid,
        actions: Vec<Arc<dyn Action>>,
        router: Option<Arc<dyn Router>>,
        exits: Vec<Exit>,
    ) -> Self {
        Self {
            uuid,
            actions,
            router,
            exits,
        }
    }

    pub fn uuid(&self) -> NodeUuid {
        self.uuid
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    pub fn router(&self) -> Option<&dyn Router> {
        self.router.as_deref()
    }

    pub fn exits(&self) -> &[Exit] {
        &self.exits
    }

    pub fn exit(&self, uuid: &ExitUuid) -> Option<&Exit> {
        self.exits.iter().find(|e| e.uuid == *uuid)
    }
}

#[derive(Debug)]
pub struct Flow {
    uuid: FlowUuid,
    name: String,
    language: Option<String>,
    flow_type: FlowType,
    nodes: Vec<Node>,
    node_index: HashMap<NodeUuid, usize>,
}

impl Flow {
    pub fn new(
        uuid: FlowUuid,
        name: impl Into<String>,
        language: Option<String>,
        flow_type: FlowType,
        nodes: Vec<Node>,
    ) -> Self {
        let node_index = nodes.iter().enumerate().map(|(i, n)| (n.uuid, i)).collect();
        Self {
            uuid,
            name: name.into(),
            language,
            flow_type,
            nodes,
            node_index,
        }
    }

    pub fn uuid(&self) -> FlowUuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, uuid: &NodeUuid) -> Option<&Node> {
        self.node_index.get(uuid).map(|&i| &self.nodes[i])
    }

    /// Where a new run of this flow starts. `None` for an empty flow.
    pub fn entry_node(&self) -> Option<NodeUuid> {
        self.nodes.first().map(|n| n.uuid)
    }

    pub fn reference(&self) -> FlowReference {
        FlowReference::new(self.uuid, self.name.clone())
    }
}
