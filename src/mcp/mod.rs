//! MCP bridge
//!
//! Line-delimited JSON-RPC session that exposes the debug server to an AI
//! controller as four tools: `get_breakpoints`, `get_context`, `resume` and
//! `resume_all`.
//!
//! Failures are reported on two channels. Protocol problems (bad JSON,
//! unknown method) become JSON-RPC error objects. Problems running a tool
//! (server unreachable, missing argument, unknown tool) become a normal
//! result with `isError: true`.

mod client;
mod protocol;
mod session;
mod tools;

pub use client::{DebugApi, DebugServerClient, ResumeOutcome};
pub use protocol::*;
pub use session::McpServer;
pub use tools::{call_tool, Tool, ToolDescriptor, ToolsListResult};

use thiserror::Error;

/// Failure while running a tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Could not connect to debug server at {url}. Make sure 'mcpdebugger serve' is running.\n\nDetails: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    MissingArgument(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unexpected response from debug server: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl ToolError {
    /// Render as an `isError` tool result
    pub fn to_result(&self) -> CallToolResult {
        CallToolResult::error(format!("Error: {}", self))
    }
}
