//! Built-in routers and waits.

mod switch;
mod waits;

pub use switch::{Case, CaseTest, Category, Operand, SwitchRouter};
pub use waits::{ActivatedWait, MsgWait, WaitTimeout};
