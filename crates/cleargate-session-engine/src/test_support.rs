//! Test utilities for driving sessions without real services.
//!
//! ```ignore
//! let webhooks = RecordingWebhookService::new(200, r#"{"ok": true}"#);
//! let engine = test_engine_builder().webhook_service(webhooks.clone()).build();
//!
//! let flow = FlowBuilder::new(FLOW_UUID, "Lookup")
//!     .node(NODE_UUID, json!([{"uuid": ACTION_UUID, "type": "call_webhook", "url": URL}]), None, json!([]))
//!     .build(engine.flow_reader())?;
//! let assets = Arc::new(StaticAssets::new([flow]));
//!
//! let mut session = engine.new_session(assets);
//! session.start(trigger).await?;
//! assert_eq!(webhooks.requests().len(), 1);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::defaults::{FixedClock, SequentialUuids};
use crate::engine::{Engine, EngineBuilder};
use crate::errors::{ActionError, ReadError};
use crate::flow::{Flow, FlowReader};
use crate::traits::WebhookService;
use crate::types::{WebhookCall, WebhookRequest};

/// The time deterministic test engines start their clocks at.
pub fn test_start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_default()
}

/// A builder with a clock that ticks one second per read and sequential
/// UUIDs, so marshaled sessions are reproducible.
pub fn test_engine_builder() -> EngineBuilder {
    Engine::builder()
        .clock(FixedClock::advancing(test_start_time(), Duration::seconds(1)))
        .uuids(SequentialUuids::new(1))
}

// ---------------------------------------------------------------------------
// FlowBuilder
// ---------------------------------------------------------------------------

/// Assembles flow JSON node by node.
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    uuid: String,
    name: String,
    flow_type: String,
    nodes: Vec<Value>,
}

impl FlowBuilder {
    pub fn new(uuid: &str, name: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: name.to_string(),
            flow_type: "messaging".into(),
            nodes: Vec::new(),
        }
    }

    pub fn flow_type(mut self, flow_type: &str) -> Self {
        self.flow_type = flow_type.to_string();
        self
    }

    /// Append a node. `actions` and `exits` are JSON arrays.
    pub fn node(mut self, uuid: &str, actions: Value, router: Option<Value>, exits: Value) -> Self {
        let mut node = json!({"uuid": uuid, "actions": actions, "exits": exits});
        if let Some(router) = router {
            node["router"] = router;
        }
        self.nodes.push(node);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "name": self.name,
            "language": "eng",
            "type": self.flow_type,
            "nodes": self.nodes,
        })
    }

    pub fn build(&self, reader: &FlowReader) -> Result<Flow, ReadError> {
        reader.read_flow(self.to_json())
    }
}

// ---------------------------------------------------------------------------
// RecordingWebhookService
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Recorded {
    status_code: u16,
    body: String,
    requests: Vec<WebhookRequest>,
}

/// Answers every call with a canned response and records the requests.
/// Clones share the same recording.
#[derive(Debug, Clone)]
pub struct RecordingWebhookService {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingWebhookService {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorded {
                status_code,
                body: body.into(),
                requests: Vec::new(),
            })),
        }
    }

    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.inner.lock().requests.clone()
    }
}

#[async_trait]
impl WebhookService for RecordingWebhookService {
    async fn call(&self, request: WebhookRequest) -> Result<WebhookCall, ActionError> {
        let mut recorded = self.inner.lock();
        recorded.requests.push(request.clone());

        let trace = format!("{} {} HTTP/1.1", request.method, request.url);
        Ok(WebhookCall {
            url: request.url,
            method: request.method,
            status_code: recorded.status_code,
            request: trace,
            response: recorded.body.clone(),
            response_json: serde_json::from_str(&recorded.body).ok(),
            elapsed_ms: 1,
            created_on: test_start_time(),
        })
    }
}
