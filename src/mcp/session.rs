//! MCP session loop
//!
//! Reads one JSON-RPC message per line and writes at most one response line
//! per message. Messages are handled strictly in order: the next line is not
//! read until the current one is answered. Tools only make short control
//! calls to the debug server, so this never waits on a paused breakpoint.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::client::DebugApi;
use super::protocol::{
    CallToolParams, CallToolResult, Incoming, InitializeResult, Method, RpcError, RpcResponse,
};
use super::tools::{call_tool, ToolsListResult};

/// MCP server that exposes debugging tools to an AI controller
pub struct McpServer<A> {
    api: A,
}

impl<A: DebugApi> McpServer<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Serve over the process's stdin/stdout
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve until `reader` reaches end of input
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = %self.api.base_url(), "MCP session started");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(line).await else {
                continue;
            };

            match serde_json::to_string(&response) {
                Ok(mut encoded) => {
                    encoded.push('\n');
                    writer.write_all(encoded.as_bytes()).await?;
                    writer.flush().await?;
                }
                Err(e) => tracing::error!("Failed to encode response: {}", e),
            }
        }

        tracing::info!("MCP session ended");
        Ok(())
    }

    /// Handle a single line, returning the response to write (if any)
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let incoming = match Incoming::parse(line) {
            Ok(incoming) => incoming,
            Err(response) => {
                tracing::warn!("Rejected malformed message");
                return Some(response);
            }
        };

        match incoming {
            Incoming::Notification { method } => {
                tracing::debug!(method = %method, "Notification received");
                None
            }
            Incoming::Request { id, method, params } => {
                Some(self.handle_request(id, method, params).await)
            }
        }
    }

    async fn handle_request(
        &self,
        id: Option<Value>,
        method: Method,
        params: Option<Value>,
    ) -> RpcResponse {
        match method {
            Method::Initialize => RpcResponse::from_serializable(id, &InitializeResult::current()),
            Method::ToolsList => RpcResponse::from_serializable(id, &ToolsListResult::all()),
            Method::ToolsCall => {
                let params = match params.map(serde_json::from_value::<CallToolParams>) {
                    Some(Ok(params)) => params,
                    Some(Err(e)) => {
                        return RpcResponse::error(
                            id,
                            RpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                        )
                    }
                    None => {
                        return RpcResponse::error(
                            id,
                            RpcError::invalid_params("Missing tools/call params"),
                        )
                    }
                };

                let result = match call_tool(&self.api, &params.name, params.arguments).await {
                    Ok(text) => CallToolResult::text(text),
                    Err(e) => {
                        tracing::warn!(tool = %params.name, "Tool call failed: {}", e);
                        e.to_result()
                    }
                };
                RpcResponse::from_serializable(id, &result)
            }
            Method::Other(name) => {
                tracing::debug!(method = %name, "Unknown method");
                RpcResponse::error(id, RpcError::method_not_found(&name))
            }
        }
    }
}
