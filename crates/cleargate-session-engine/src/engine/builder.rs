//! Engine builder: assembles configuration, services and the flow reader.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::{Engine, EngineConfig};
use crate::defaults::{RandomUuids, SystemClock};
use crate::flow::FlowReader;
use crate::traits::{Action, Clock, Router, UuidGenerator, WebhookService};

/// Builder for assembling the [`Engine`].
///
/// Every field is optional. The clock defaults to [`SystemClock`], UUIDs to
/// [`RandomUuids`], and the reader starts with all built-in actions and
/// routers registered. Without a webhook service `call_webhook` fails the
/// run.
pub struct EngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    uuids: Option<Arc<dyn UuidGenerator>>,
    webhooks: Option<Arc<dyn WebhookService>>,
    reader: FlowReader,
}

impl EngineBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: None,
            uuids: None,
            webhooks: None,
            reader: FlowReader::with_builtins(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_steps_per_sprint(mut self, max: usize) -> Self {
        self.config.max_steps_per_sprint = max;
        self
    }

    pub fn max_persisted_webhook_body(mut self, bytes: usize) -> Self {
        self.config.max_persisted_webhook_body = bytes;
        self
    }

    /// Set the clock. Default: [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Set the UUID generator. Default: [`RandomUuids`].
    pub fn uuids(mut self, uuids: impl UuidGenerator + 'static) -> Self {
        self.uuids = Some(Arc::new(uuids));
        self
    }

    pub fn webhook_service(mut self, service: impl WebhookService + 'static) -> Self {
        self.webhooks = Some(Arc::new(service));
        self
    }

    /// Register an action type under its `"type"` tag.
    pub fn action<T: Action + DeserializeOwned + 'static>(mut self, type_name: &str) -> Self {
        self.reader.register_action::<T>(type_name);
        self
    }

    /// Register a router type under its `"type"` tag.
    pub fn router<T: Router + DeserializeOwned + 'static>(mut self, type_name: &str) -> Self {
        self.reader.register_router::<T>(type_name);
        self
    }

    pub fn build(self) -> Arc<Engine> {
        if self.config.max_steps_per_sprint == 0 {
            tracing::warn!("max_steps_per_sprint is 0, every run will fail on its first node");
        }
        Arc::new(Engine {
            config: self.config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            uuids: self.uuids.unwrap_or_else(|| Arc::new(RandomUuids)),
            webhooks: self.webhooks,
            reader: self.reader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{FixedClock, SequentialUuids};
    use chrono::DateTime;

    #[test]
    fn defaults() {
        let engine = Engine::builder().build();
        assert_eq!(engine.config().max_steps_per_sprint, 100);
        assert_eq!(engine.config().max_persisted_webhook_body, 10_000);
        assert!(engine.webhook_service().is_none());
        assert_ne!(engine.new_uuid(), engine.new_uuid());
    }

    #[test]
    fn overrides() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let engine = Engine::builder()
            .max_steps_per_sprint(5)
            .max_persisted_webhook_body(64)
            .clock(FixedClock::new(start))
            .uuids(SequentialUuids::new(7))
            .build();

        assert_eq!(engine.config().max_steps_per_sprint, 5);
        assert_eq!(engine.config().max_persisted_webhook_body, 64);
        assert_eq!(engine.now(), start);
        assert_eq!(engine.new_uuid(), SequentialUuids::new(7).new_uuid());
    }
}
