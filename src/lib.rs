//! MCP Debugger
//!
//! Cooperative debugging for running programs. Instrumented code calls
//! [`client::DebugBreak::here`] and parks on a long-poll request to the debug
//! server until an AI controller inspects the breakpoint and resumes it
//! through the MCP bridge.
//!
//! # Modules
//!
//! - `breakpoints`: Breakpoint records and the registry of paused callers
//! - `server` / `routes`: HTTP debug server
//! - `mcp`: JSON-RPC bridge exposing the debugging tools
//! - `client`: Instrumentation entry points used by the debugged program

pub mod breakpoints;
pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod routes;
pub mod server;
pub mod source;
pub mod state;

pub use breakpoints::{BreakpointContext, BreakpointStore, PauseRegistry};
pub use client::{DebugBreak, DebugBreakConfig, PauseOutcome};
pub use config::Config;
pub use server::DebugServer;
