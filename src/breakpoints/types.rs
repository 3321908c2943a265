//! Breakpoint types
//!
//! Wire types shared by the debug server, the MCP bridge and the
//! instrumentation client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single captured stack frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameInfo {
    pub method: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub file: Option<String>,
    /// 1-based line, 0 when unknown
    #[serde(default)]
    pub line: u32,
    /// 1-based column, 0 when unknown
    #[serde(default)]
    pub column: u32,
}

/// Snapshot of a pause site, sent with `POST /break`
///
/// Produced once by the instrumentation side and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointContext {
    /// Unique among currently pending breakpoints
    pub id: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    pub method: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub call_stack: Vec<StackFrameInfo>,
    /// Lines surrounding the hit, if the source was readable at capture time
    #[serde(default)]
    pub source_lines: Option<Vec<String>>,
    /// 1-based line number of `source_lines[0]`
    #[serde(default)]
    pub source_start_line: u32,
    #[serde(default = "Utc::now")]
    pub hit_time: DateTime<Utc>,
}

impl BreakpointContext {
    /// Create a context with only an id and a location label
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: None,
            line: 0,
            column: 0,
            method: method.into(),
            type_name: type_name.into(),
            call_stack: Vec::new(),
            source_lines: None,
            source_start_line: 0,
            hit_time: Utc::now(),
        }
    }

    /// Set the source location
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }

    /// Set the captured call stack
    pub fn with_call_stack(mut self, frames: Vec<StackFrameInfo>) -> Self {
        self.call_stack = frames;
        self
    }

    /// Set the captured source lines
    pub fn with_source(mut self, lines: Vec<String>, start_line: u32) -> Self {
        self.source_lines = Some(lines);
        self.source_start_line = start_line;
        self
    }

    /// `Type.method` label used in logs and tool output
    pub fn location_label(&self) -> String {
        format!("{}.{}", self.type_name, self.method)
    }
}

/// Response of `POST /break` once the breakpoint is resumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakAck {
    pub resumed: bool,
}

/// Response of `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub active_breakpoints: usize,
    pub breakpoints: Vec<BreakpointContext>,
}

impl StatusResponse {
    /// Build a running status from a registry snapshot
    pub fn running(breakpoints: Vec<BreakpointContext>) -> Self {
        Self {
            status: "running".to_string(),
            active_breakpoints: breakpoints.len(),
            breakpoints,
        }
    }

    /// Find a pending breakpoint by id
    pub fn find(&self, id: &str) -> Option<&BreakpointContext> {
        self.breakpoints.iter().find(|bp| bp.id == id)
    }
}

/// Response of `POST /resume/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub resumed: bool,
    pub id: String,
}

/// Response of `POST /resume-all`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAllResponse {
    pub resumed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wire_names() {
        let context = BreakpointContext::new("bp-0001-120000", "app::orders", "checkout")
            .with_location("/src/orders.rs", 42, 9)
            .with_source(vec!["let x = 1;".to_string()], 42);

        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["id"], "bp-0001-120000");
        assert_eq!(json["type"], "app::orders");
        assert_eq!(json["callStack"], serde_json::json!([]));
        assert_eq!(json["sourceStartLine"], 42);
        assert!(json.get("hitTime").is_some());
    }

    #[test]
    fn test_context_accepts_minimal_payload() {
        let context: BreakpointContext = serde_json::from_str(
            r#"{"id":"bp-1","method":"Main","type":"Program","line":0}"#,
        )
        .unwrap();

        assert_eq!(context.id, "bp-1");
        assert!(context.file.is_none());
        assert!(context.call_stack.is_empty());
        assert!(context.source_lines.is_none());
        assert_eq!(context.location_label(), "Program.Main");
    }

    #[test]
    fn test_status_find() {
        let status = StatusResponse::running(vec![
            BreakpointContext::new("a", "T", "m"),
            BreakpointContext::new("b", "T", "n"),
        ]);

        assert_eq!(status.active_breakpoints, 2);
        assert_eq!(status.find("b").map(|bp| bp.method.as_str()), Some("n"));
        assert!(status.find("c").is_none());
    }
}
