//! Breakpoint registry
//!
//! Pending breakpoints and the context captured when they were hit.

mod store;
mod types;

pub use store::{BreakpointStore, PauseRegistry, WaitHandle, WaitOutcome};
pub use types::*;
