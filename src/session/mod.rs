//! Session management module.
//!
//! Maps caller-supplied game identifiers to conversational contexts and
//! guarantees at most one context per identifier.

mod id;
mod store;

pub use id::{ContextId, SessionId};
pub use store::{spawn_idle_sweeper, SessionEntry, SessionStore};
