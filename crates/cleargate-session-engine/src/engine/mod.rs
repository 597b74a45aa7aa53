//! The engine: configured factory for sessions.
//!
//! The [`Engine`] carries configuration, the flow reader and injected
//! services, and is shared by every session it creates. Construct via
//! [`Engine::builder()`].
//!
//! ```rust,ignore
//! let engine = Engine::builder()
//!     .max_steps_per_sprint(200)
//!     .webhook_service(MyHttpWebhooks::new())
//!     .action::<MyAction>("my_action")
//!     .build();
//!
//! let mut session = engine.new_session(assets.clone());
//! let sprint = session.start(trigger).await?;
//! let json = session.to_json()?;
//! ```

mod builder;

pub use builder::EngineBuilder;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{AssetError, ReadError, SessionError};
use crate::flow::{Flow, FlowReader};
use crate::runtime::Session;
use crate::traits::{Clock, SessionAssets, UuidGenerator, WebhookService};
use crate::types::AssetReference;

/// Engine-wide limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Node visits allowed in a single sprint before the run fails.
    /// Default: 100.
    pub max_steps_per_sprint: usize,
    /// Webhook response bodies of this many bytes or more aren't persisted
    /// with the run. Default: 10,000.
    pub max_persisted_webhook_body: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_sprint: 100,
            max_persisted_webhook_body: 10_000,
        }
    }
}

pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) uuids: Arc<dyn UuidGenerator>,
    pub(super) webhooks: Option<Arc<dyn WebhookService>>,
    pub(super) reader: FlowReader,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("reader", &self.reader)
            .field("webhooks", &self.webhooks.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reader flows for this engine's sessions should be decoded with.
    pub fn flow_reader(&self) -> &FlowReader {
        &self.reader
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn new_uuid(&self) -> Uuid {
        self.uuids.new_uuid()
    }

    pub fn webhook_service(&self) -> Option<Arc<dyn WebhookService>> {
        self.webhooks.clone()
    }

    pub fn read_flow(&self, data: &str) -> Result<Flow, ReadError> {
        self.reader.read_flow_json(data)
    }

    /// A fresh, unstarted session.
    pub fn new_session(self: &Arc<Self>, assets: Arc<dyn SessionAssets>) -> Session {
        Session::new(Arc::clone(self), assets)
    }

    /// Read a session marshaled with [`Session::to_json`]. Flows that can't
    /// be resolved are reported to `missing` and left unresolved on their
    /// runs.
    pub fn read_session(
        self: &Arc<Self>,
        assets: Arc<dyn SessionAssets>,
        data: &[u8],
        missing: &mut dyn FnMut(AssetReference, &AssetError),
    ) -> Result<Session, SessionError> {
        Ok(crate::marshal::read_session(
            Arc::clone(self),
            assets,
            data,
            missing,
        )?)
    }
}
