//! Debugger tools
//!
//! Descriptors advertised by `tools/list` and the handlers behind
//! `tools/call`. Handlers return plain text meant for a human or an AI.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::client::{DebugApi, ResumeOutcome};
use super::ToolError;
use crate::breakpoints::{BreakpointContext, StatusResponse};
use crate::source::{self, SourceExcerpt};

/// Lines shown either side of the hit line in `get_context`
const CONTEXT_LINES: u32 = 5;

/// The tools exposed over MCP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetBreakpoints,
    GetContext,
    Resume,
    ResumeAll,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Tool::GetBreakpoints,
        Tool::GetContext,
        Tool::Resume,
        Tool::ResumeAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::GetBreakpoints => "get_breakpoints",
            Tool::GetContext => "get_context",
            Tool::Resume => "resume",
            Tool::ResumeAll => "resume_all",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn descriptor(self) -> ToolDescriptor {
        let (description, input_schema) = match self {
            Tool::GetBreakpoints => (
                "List all active breakpoints that are currently waiting to be resumed",
                no_arguments(),
            ),
            Tool::GetContext => (
                "Get detailed context for a breakpoint including call stack and source code",
                id_argument("Breakpoint ID"),
            ),
            Tool::Resume => (
                "Resume execution at a specific breakpoint, allowing the paused code to continue",
                id_argument("Breakpoint ID to resume"),
            ),
            Tool::ResumeAll => ("Resume all active breakpoints at once", no_arguments()),
        };

        ToolDescriptor {
            name: self.name(),
            description,
            input_schema,
        }
    }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn id_argument(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": description }
        },
        "required": ["id"]
    })
}

/// Entry in the `tools/list` result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

impl ToolsListResult {
    pub fn all() -> Self {
        Self {
            tools: Tool::ALL.into_iter().map(Tool::descriptor).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdArgs {
    #[serde(default)]
    id: Option<String>,
}

/// Extract the required, non-blank `id` argument
fn required_id(arguments: Option<Value>) -> Result<String, ToolError> {
    let args: IdArgs = match arguments {
        Some(Value::Null) | None => IdArgs::default(),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments(e.to_string()))?
        }
    };

    match args.id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ToolError::MissingArgument("Breakpoint ID is required".to_string())),
    }
}

/// Run a tool by name
pub async fn call_tool(
    api: &dyn DebugApi,
    name: &str,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    let tool = Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

    match tool {
        Tool::GetBreakpoints => {
            let status = api.status().await?;
            Ok(render_breakpoint_list(&status))
        }
        Tool::GetContext => {
            let id = required_id(arguments)?;
            let status = api.status().await?;
            Ok(render_context(&id, status.find(&id)))
        }
        Tool::Resume => {
            let id = required_id(arguments)?;
            let outcome = api.resume(&id).await?;
            Ok(render_resume(&id, &outcome))
        }
        Tool::ResumeAll => {
            let count = api.resume_all().await?;
            Ok(render_resume_all(count))
        }
    }
}

fn render_breakpoint_list(status: &StatusResponse) -> String {
    if status.active_breakpoints == 0 {
        return "No active breakpoints. The application is either not running or hasn't hit any DebugBreak calls yet.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Active breakpoints: {}", status.active_breakpoints);
    let _ = writeln!(out);

    for bp in &status.breakpoints {
        let short_file = bp
            .file
            .as_deref()
            .map(|f| {
                Path::new(f)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| f.to_string())
            })
            .unwrap_or_else(|| "?".to_string());

        let _ = writeln!(out, "  [{}]", bp.id);
        let _ = writeln!(out, "    Location: {}", bp.location_label());
        let _ = writeln!(out, "    File: {}:{}", short_file, bp.line);
        let _ = writeln!(out);
    }

    out.push_str("Use get_context with a breakpoint ID to see source code and call stack.\n");
    out.push_str("Use resume with a breakpoint ID to continue execution.\n");
    out
}

fn render_context(id: &str, breakpoint: Option<&BreakpointContext>) -> String {
    let Some(bp) = breakpoint else {
        return format!(
            "Breakpoint '{}' not found. It may have already been resumed or the ID is incorrect.",
            id
        );
    };

    let file = bp.file.as_deref().unwrap_or("Unknown");

    let mut out = String::new();
    let _ = writeln!(out, "=== Breakpoint {} ===", id);
    let _ = writeln!(out);
    let _ = writeln!(out, "Location: {}", bp.location_label());
    let _ = writeln!(out, "File: {}", file);
    let _ = writeln!(out, "Line: {}", bp.line);
    let _ = writeln!(out);

    // Prefer the file as it is now; fall back to what was captured at the hit.
    let local = bp
        .file
        .as_deref()
        .and_then(|f| source::read_context(f, bp.line, CONTEXT_LINES));
    let captured = bp.source_lines.as_ref().map(|lines| SourceExcerpt {
        lines: lines.clone(),
        start_line: bp.source_start_line,
    });

    match (local, captured) {
        (Some(excerpt), _) => write_source(&mut out, "Source:", file, &excerpt, bp.line),
        (None, Some(excerpt)) if !excerpt.lines.is_empty() => {
            write_source(&mut out, "Source (captured at hit):", file, &excerpt, bp.line)
        }
        _ if bp.file.is_some() && bp.line > 0 => {
            out.push_str("(Source file not accessible from this machine)\n\n");
        }
        _ => {}
    }

    if !bp.call_stack.is_empty() {
        out.push_str("Call stack:\n");
        for frame in &bp.call_stack {
            let _ = write!(out, "  at {}.{}", frame.type_name, frame.method);
            if let Some(file) = &frame.file {
                let _ = write!(out, " ({}:{})", file, frame.line);
            }
            out.push('\n');
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Use 'resume' with id '{}' to continue execution.", id);
    out
}

fn write_source(out: &mut String, heading: &str, file: &str, excerpt: &SourceExcerpt, line: u32) {
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "```{}", source::fence_language(file));
    out.push_str(&excerpt.render(line));
    out.push_str("```\n\n");
}

fn render_resume(id: &str, outcome: &ResumeOutcome) -> String {
    match outcome {
        ResumeOutcome::Resumed => format!("Breakpoint '{}' resumed. Execution continues.", id),
        ResumeOutcome::NotFound(message) => format!("Could not resume breakpoint: {}", message),
    }
}

fn render_resume_all(count: usize) -> String {
    if count == 0 {
        "No active breakpoints to resume.".to_string()
    } else {
        format!("Resumed {} breakpoint(s). All paused execution continues.", count)
    }
}
