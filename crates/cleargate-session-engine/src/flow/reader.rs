//! Decoding flow JSON into [`Flow`] values.
//!
//! Actions and routers are decoded through registries keyed by their
//! `"type"` tag, so embedders can add their own behaviour next to the
//! built-ins. An unregistered type is a hard read error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{Exit, Flow, Node};
use crate::actions::{
    CallWebhook, EnterFlow, SendMsg, SetContactField, SetContactLanguage, SetContactName,
    SetRunLocal, SetRunResult, StartSession,
};
use crate::errors::ReadError;
use crate::routers::SwitchRouter;
use crate::traits::{Action, Router};
use crate::types::{FlowType, FlowUuid, NodeUuid};

type ActionDecoder = fn(Value) -> Result<Arc<dyn Action>, serde_json::Error>;
type RouterDecoder = fn(Value) -> Result<Arc<dyn Router>, serde_json::Error>;

fn decode_action<T: Action + DeserializeOwned + 'static>(
    value: Value,
) -> Result<Arc<dyn Action>, serde_json::Error> {
    Ok(Arc::new(serde_json::from_value::<T>(value)?))
}

fn decode_router<T: Router + DeserializeOwned + 'static>(
    value: Value,
) -> Result<Arc<dyn Router>, serde_json::Error> {
    Ok(Arc::new(serde_json::from_value::<T>(value)?))
}

/// Registry-driven flow decoder.
#[derive(Clone, Default)]
pub struct FlowReader {
    actions: HashMap<String, ActionDecoder>,
    routers: HashMap<String, RouterDecoder>,
}

impl FlowReader {
    /// A reader with no registered types.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader with every built-in action and router registered.
    pub fn with_builtins() -> Self {
        let mut reader = Self::new();
        reader.register_action::<SetRunResult>("set_run_result");
        reader.register_action::<SetRunLocal>("set_run_local");
        reader.register_action::<SetContactName>("set_contact_name");
        reader.register_action::<SetContactLanguage>("set_contact_language");
        reader.register_action::<SetContactField>("set_contact_field");
        reader.register_action::<SendMsg>("send_msg");
        reader.register_action::<EnterFlow>("enter_flow");
        reader.register_action::<StartSession>("start_session");
        reader.register_action::<CallWebhook>("call_webhook");
        reader.register_router::<SwitchRouter>("switch");
        reader
    }

    /// Register an action type. Replaces any decoder under the same tag.
    pub fn register_action<T: Action + DeserializeOwned + 'static>(&mut self, type_name: &str) {
        self.actions
            .insert(type_name.to_string(), decode_action::<T> as ActionDecoder);
    }

    /// Register a router type. Replaces any decoder under the same tag.
    pub fn register_router<T: Router + DeserializeOwned + 'static>(&mut self, type_name: &str) {
        self.routers
            .insert(type_name.to_string(), decode_router::<T> as RouterDecoder);
    }

    pub fn read_flow_json(&self, data: &str) -> Result<Flow, ReadError> {
        let value: Value = serde_json::from_str(data)?;
        self.read_flow(value)
    }

    pub fn read_flow(&self, value: Value) -> Result<Flow, ReadError> {
        let raw: FlowJson = serde_json::from_value(value)?;

        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for node in raw.nodes {
            if !seen.insert(node.uuid) {
                return Err(ReadError::invalid(
                    "flow",
                    format!("duplicate node {} in flow {}", node.uuid, raw.uuid),
                ));
            }

            let actions = node
                .actions
                .into_iter()
                .map(|a| self.read_action(a))
                .collect::<Result<Vec<_>, _>>()?;
            let router = node.router.map(|r| self.read_router(r)).transpose()?;
            nodes.push(Node::new(node.uuid, actions, router, node.exits));
        }

        Ok(Flow::new(
            raw.uuid,
            raw.name,
            raw.language,
            raw.flow_type,
            nodes,
        ))
    }

    fn read_action(&self, value: Value) -> Result<Arc<dyn Action>, ReadError> {
        let type_name = type_tag(&value, "action")?;
        let decode = self
            .actions
            .get(type_name)
            .ok_or_else(|| ReadError::UnknownType {
                kind: "action",
                type_name: type_name.to_string(),
            })?;
        Ok(decode(value)?)
    }

    fn read_router(&self, value: Value) -> Result<Arc<dyn Router>, ReadError> {
        let type_name = type_tag(&value, "router")?;
        let decode = self
            .routers
            .get(type_name)
            .ok_or_else(|| ReadError::UnknownType {
                kind: "router",
                type_name: type_name.to_string(),
            })?;
        Ok(decode(value)?)
    }
}

impl std::fmt::Debug for FlowReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        let mut routers: Vec<_> = self.routers.keys().collect();
        routers.sort();
        f.debug_struct("FlowReader")
            .field("actions", &actions)
            .field("routers", &routers)
            .finish()
    }
}

fn type_tag<'v>(value: &'v Value, kind: &'static str) -> Result<&'v str, ReadError> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ReadError::invalid(kind, "missing \"type\""))
}

#[derive(Deserialize)]
struct FlowJson {
    uuid: FlowUuid,
    #[serde(default)]
    name: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(rename = "type", default)]
    flow_type: FlowType,
    #[serde(default)]
    nodes: Vec<NodeJson>,
}

#[derive(Deserialize)]
struct NodeJson {
    uuid: NodeUuid,
    #[serde(default)]
    actions: Vec<Value>,
    #[serde(default)]
    router: Option<Value>,
    #[serde(default)]
    exits: Vec<Exit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FLOW: &str = "50c3706e-fedb-42c0-8eab-dda3335714b7";
    const NODE1: &str = "72a1f5df-49f9-45df-94c9-d86f7ea064e5";
    const NODE2: &str = "3dcccbb4-d29c-41dd-a01f-16d814c9ab82";

    fn flow_json(actions: Value) -> Value {
        json!({
            "uuid": FLOW,
            "name": "Registration",
            "language": "eng",
            "type": "messaging",
            "nodes": [
                {
                    "uuid": NODE1,
                    "actions": actions,
                    "exits": [{"uuid": "d7a36118-0a38-4b35-a7e4-ae89042f0d3c", "destination_uuid": NODE2}]
                },
                {
                    "uuid": NODE2,
                    "exits": [{"uuid": "37491e99-f4c2-4a00-a29f-8e00a1d8c9b9"}]
                }
            ]
        })
    }

    #[test]
    fn reads_builtin_actions() {
        let reader = FlowReader::with_builtins();
        let flow = reader
            .read_flow(flow_json(json!([
                {"uuid": "e97cd6d5-3354-4dbd-85bc-6c1f87849eec", "type": "send_msg", "text": "Hi there"}
            ])))
            .unwrap();

        assert_eq!(flow.name(), "Registration");
        assert_eq!(flow.language(), Some("eng"));
        assert_eq!(flow.nodes().len(), 2);
        assert_eq!(flow.entry_node(), Some(NODE1.parse().unwrap()));

        let node = flow.node(&NODE1.parse().unwrap()).unwrap();
        assert_eq!(node.actions().len(), 1);
        assert_eq!(node.actions()[0].type_name(), "send_msg");
        assert!(node.router().is_none());
        assert_eq!(node.exits()[0].destination_uuid, Some(NODE2.parse().unwrap()));
    }

    #[test]
    fn unknown_action_type_is_a_read_error() {
        let reader = FlowReader::with_builtins();
        let err = reader
            .read_flow(flow_json(json!([
                {"uuid": "e97cd6d5-3354-4dbd-85bc-6c1f87849eec", "type": "launch_rocket"}
            ])))
            .unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnknownType { kind: "action", ref type_name } if type_name == "launch_rocket"
        ));
    }

    #[test]
    fn empty_reader_knows_no_types() {
        let reader = FlowReader::new();
        let err = reader
            .read_flow(flow_json(json!([
                {"uuid": "e97cd6d5-3354-4dbd-85bc-6c1f87849eec", "type": "send_msg", "text": "Hi"}
            ])))
            .unwrap_err();
        assert!(matches!(err, ReadError::UnknownType { .. }));
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let reader = FlowReader::with_builtins();
        let err = reader
            .read_flow(json!({
                "uuid": FLOW,
                "nodes": [
                    {"uuid": NODE1, "exits": []},
                    {"uuid": NODE1, "exits": []}
                ]
            }))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate node"));
    }

    #[test]
    fn flow_type_defaults_to_messaging() {
        let reader = FlowReader::new();
        let flow = reader
            .read_flow_json(&format!(r#"{{"uuid": "{FLOW}", "nodes": []}}"#))
            .unwrap();
        assert_eq!(flow.flow_type(), FlowType::Messaging);
        assert!(flow.entry_node().is_none());
    }
}
