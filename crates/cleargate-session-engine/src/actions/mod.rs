//! Built-in action handlers.
//!
//! Each action is decoded from its JSON definition by the
//! [`FlowReader`](crate::flow::FlowReader) and executed in order when a
//! run visits its node.

pub mod call_webhook;
pub mod contact;
pub mod enter_flow;
pub mod send_msg;
pub mod set_run_local;
pub mod set_run_result;
pub mod start_session;

pub use call_webhook::CallWebhook;
pub use contact::{SetContactField, SetContactLanguage, SetContactName};
pub use enter_flow::EnterFlow;
pub use send_msg::SendMsg;
pub use set_run_local::SetRunLocal;
pub use set_run_result::SetRunResult;
pub use start_session::StartSession;
