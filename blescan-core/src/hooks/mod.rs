//! Lifecycle hooks run around scan sessions
//!
//! Hooks are zero-argument actions. Before-hooks run when a session starts,
//! before the radio is asked to discover; after-hooks run once the radio has
//! been stopped. Each registration returns a [`HookToken`] that removes
//! exactly that hook again.

mod list;

pub use list::{Hook, HookList, HookStage, HookToken, run_hooks};
