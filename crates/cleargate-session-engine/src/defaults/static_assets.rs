//! In-memory asset source.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::AssetError;
use crate::flow::{Flow, FlowReader};
use crate::traits::SessionAssets;
use crate::types::FlowUuid;

/// Flows held in memory, keyed by UUID.
#[derive(Debug, Default, Clone)]
pub struct StaticAssets {
    flows: HashMap<FlowUuid, Arc<Flow>>,
}

#[derive(Deserialize)]
struct Bundle {
    #[serde(default)]
    flows: Vec<Value>,
}

impl StaticAssets {
    pub fn new(flows: impl IntoIterator<Item = Flow>) -> Self {
        Self {
            flows: flows
                .into_iter()
                .map(|f| (f.uuid(), Arc::new(f)))
                .collect(),
        }
    }

    /// Read a `{"flows": [...]}` bundle.
    pub fn from_json(reader: &FlowReader, data: &str) -> Result<Self, AssetError> {
        let bundle: Bundle = serde_json::from_str(data).map_err(crate::errors::ReadError::from)?;
        let flows = bundle
            .flows
            .into_iter()
            .map(|f| reader.read_flow(f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(flows))
    }

    pub fn add(&mut self, flow: Flow) {
        self.flows.insert(flow.uuid(), Arc::new(flow));
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl SessionAssets for StaticAssets {
    fn flow(&self, uuid: &FlowUuid) -> Result<Arc<Flow>, AssetError> {
        self.flows
            .get(uuid)
            .cloned()
            .ok_or(AssetError::FlowNotFound { uuid: *uuid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bundle_and_looks_up_flows() {
        let reader = FlowReader::with_builtins();
        let assets = StaticAssets::from_json(
            &reader,
            r#"{"flows": [
                {"uuid": "50c3706e-fedb-42c0-8eab-dda3335714b7", "name": "A", "nodes": []},
                {"uuid": "a8d27b94-d3d0-4a96-8074-0f162f342195", "name": "B", "nodes": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(assets.len(), 2);

        let flow = assets
            .flow(&"a8d27b94-d3d0-4a96-8074-0f162f342195".parse().unwrap())
            .unwrap();
        assert_eq!(flow.name(), "B");

        let err = assets
            .flow(&"00000000-0000-0000-0000-000000000001".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, AssetError::FlowNotFound { .. }));
    }

    #[test]
    fn bundle_with_unknown_action_fails() {
        let reader = FlowReader::with_builtins();
        let err = StaticAssets::from_json(
            &reader,
            r#"{"flows": [{"uuid": "50c3706e-fedb-42c0-8eab-dda3335714b7", "nodes": [
                {"uuid": "72a1f5df-49f9-45df-94c9-d86f7ea064e5", "actions": [{"type": "dance"}], "exits": []}
            ]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown action type: dance"));
    }
}
