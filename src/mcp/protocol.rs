//! JSON-RPC 2.0 message types
//!
//! Incoming lines are parsed into [`Incoming`]; every reply is an
//! [`RpcResponse`] carrying either a result or an [`RpcError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// MCP protocol revision spoken by the bridge
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Methods whose name starts with this prefix never get a reply
const NOTIFICATION_PREFIX: &str = "notifications/";

/// Raw shape of a line before it is classified
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// Methods the bridge understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ToolsList,
    ToolsCall,
    Other(String),
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        match name.as_str() {
            "initialize" => Method::Initialize,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            _ => Method::Other(name),
        }
    }
}

/// A classified incoming message
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Needs exactly one response; `id` is echoed back as-is (null if absent)
    Request {
        id: Option<Value>,
        method: Method,
        params: Option<Value>,
    },
    /// `notifications/*`; never answered
    Notification { method: String },
}

impl Incoming {
    /// Parse one line of input
    ///
    /// On failure the returned response is ready to be written.
    pub fn parse(line: &str) -> Result<Self, RpcResponse> {
        let value: Value = serde_json::from_str(line).map_err(|e| {
            RpcResponse::error(None, RpcError::new(PARSE_ERROR, format!("Parse error: {}", e)))
        })?;

        // Echo the id even when the rest of the envelope is malformed
        let id = value.get("id").cloned();
        let raw: RawMessage = serde_json::from_value(value).map_err(|e| {
            RpcResponse::error(
                id,
                RpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
            )
        })?;

        let Some(method) = raw.method else {
            return Err(RpcResponse::error(
                raw.id,
                RpcError::new(INVALID_REQUEST, "Invalid request: missing method"),
            ));
        };

        if method.starts_with(NOTIFICATION_PREFIX) {
            return Ok(Incoming::Notification { method });
        }

        Ok(Incoming::Request {
            id: raw.id,
            method: Method::from(method),
            params: raw.params,
        })
    }
}

/// A JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Unknown method: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}

/// Either half of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcPayload {
    Result(Value),
    Error(RpcError),
}

/// A JSON-RPC response line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(flatten)]
    pub payload: RpcPayload,
}

impl RpcResponse {
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            payload: RpcPayload::Result(result),
        }
    }

    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            payload: RpcPayload::Error(error),
        }
    }

    /// Serialize a typed result, reporting serialization failure as an
    /// internal error
    pub fn from_serializable<T: Serialize>(id: Option<Value>, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::result(id, value),
            Err(e) => Self::error(id, RpcError::internal(e.to_string())),
        }
    }
}

/// Result of `initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl InitializeResult {
    pub fn current() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: "mcpdebugger".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Params of `tools/call`
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// A block of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Result of `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }
}
