//! Session execution runtime.
//!
//! A [`Session`] owns its runs and drives them through the continuation
//! loop. Each `start` or `resume` call produces a [`Sprint`] holding the
//! events and modifiers generated along the way.

mod continuation;
mod ctx;
mod flow_stack;
mod run;
mod session;
mod sprint;


pub use ctx::{RunCtx, SessionCtx};
pub use flow_stack::FlowStack;
pub use run::{Run, RunSummary, Step};
pub use session::Session;
pub use sprint::Sprint;

pub(crate) use session::SessionState;
