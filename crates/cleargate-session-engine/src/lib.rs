//! Cleargate session engine: resumable flow execution for messaging and IVR.
//!
//! A [`Session`] follows one contact through one or more flows. Each flow
//! visit is a [`Run`] that records the nodes it passed through, the results
//! it saved and the events it generated. Sessions advance in sprints: a
//! [`Trigger`] starts one, a [`Resume`] continues it after a wait, and each
//! call returns the [`Sprint`] of events and contact modifiers produced.
//!
//! Between sprints a waiting session is marshaled to JSON with
//! [`Session::to_json`] and read back with [`Engine::read_session`], so the
//! engine itself holds no state and has no dependencies on databases,
//! queues or HTTP servers.
pub mod actions;
pub mod defaults;
pub mod engine;
pub mod errors;
pub mod events;
pub mod flow;
mod marshal;
pub mod modifiers;
pub mod resumes;
pub mod routers;
pub mod runtime;
pub mod traits;
pub mod triggers;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-export public types at the crate level.

// actions
pub use actions::{
    CallWebhook, EnterFlow, SendMsg, SetContactField, SetContactLanguage, SetContactName,
    SetRunLocal, SetRunResult, StartSession,
};

// defaults
pub use defaults::{FileAssets, FixedClock, RandomUuids, SequentialUuids, StaticAssets, SystemClock};

// engine
pub use engine::{Engine, EngineBuilder, EngineConfig};

// errors
pub use errors::{
    ActionError, AssetError, ReadError, RouterError, RunError, SessionError, WaitError,
};

// events / modifiers
pub use events::{Event, EventKind};
pub use modifiers::Modifier;

// flow
pub use flow::{Exit, Flow, FlowReader, Node};

// resumes / triggers
pub use resumes::{Resume, ResumeKind};
pub use triggers::{Trigger, TriggerKind};

// routers
pub use routers::{ActivatedWait, MsgWait, SwitchRouter, WaitTimeout};

// runtime
pub use runtime::{FlowStack, Run, RunCtx, RunSummary, Session, SessionCtx, Sprint, Step};

// traits
pub use traits::{
    Action, Clock, EventSink, Router, SessionAssets, UuidGenerator, Wait, WebhookService,
};

// types
pub use types::{
    AssetReference, Contact, Environment, FlowReference, FlowType, Input, Locals, MsgIn, MsgOut,
    Results, RunResult, RunStatus, SessionStatus, WebhookCall, WebhookRequest,
};
