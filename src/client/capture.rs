//! Context capture
//!
//! Builds a [`BreakpointContext`] for a call site: location from
//! `#[track_caller]`, call stack parsed from a forced backtrace, and the
//! surrounding source lines when the file is readable.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

use crate::breakpoints::{BreakpointContext, StackFrameInfo};
use crate::source;

/// Lines captured either side of the hit line
const SOURCE_CONTEXT_LINES: u32 = 5;

/// Frames from these paths are instrumentation or runtime internals
const SKIPPED_PREFIXES: &[&str] = &[
    "mcpdebugger::client::",
    "std::backtrace",
    "std::rt::",
    "std::sys",
    "core::ops::function",
    "<core::",
    "__rust",
    "__libc_start",
    "_start",
];

const UNKNOWN: &str = "<unknown>";

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Next breakpoint id, `bp-<seq>-<HHMMSS>`
pub fn next_id() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
    format!("bp-{:04}-{}", seq, Utc::now().format("%H%M%S"))
}

/// Capture everything known about the call site at `location`
pub fn capture_context(location: &Location<'_>) -> BreakpointContext {
    let file = resolve_file(location.file());
    let frames = relevant_frames(parse_backtrace(&Backtrace::force_capture().to_string()), location.file());

    let (type_name, method) = frames
        .first()
        .map(|f| (f.type_name.clone(), f.method.clone()))
        .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));

    let mut context = BreakpointContext::new(next_id(), type_name, method)
        .with_location(file.clone(), location.line(), location.column())
        .with_call_stack(frames);

    if let Some(excerpt) = source::read_context(&file, location.line(), SOURCE_CONTEXT_LINES) {
        context = context.with_source(excerpt.lines, excerpt.start_line);
    }

    context
}

/// Make a relative caller path absolute when it exists from the working dir
fn resolve_file(file: &str) -> String {
    std::fs::canonicalize(file)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| file.to_string())
}

/// Parse the `Display` form of a captured [`Backtrace`]
///
/// Frames look like:
///
/// ```text
///    4: my_app::orders::checkout
///              at ./src/orders.rs:42:9
/// ```
pub fn parse_backtrace(text: &str) -> Vec<StackFrameInfo> {
    let mut frames: Vec<StackFrameInfo> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();

        if let Some(location) = line.strip_prefix("at ") {
            // Inlined frames can carry several `at` lines; keep the first.
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    let (file, line, column) = split_location(location);
                    frame.file = Some(file);
                    frame.line = line;
                    frame.column = column;
                }
            }
            continue;
        }

        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let (type_name, method) = split_symbol(symbol);
        frames.push(StackFrameInfo {
            method,
            type_name,
            file: None,
            line: 0,
            column: 0,
        });
    }

    frames
}

/// Split `path:line:col` from the right so paths may contain `:`
fn split_location(location: &str) -> (String, u32, u32) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().unwrap_or_default();
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle) {
        (Some(file), Some(line)) => match (line.parse(), last.parse()) {
            (Ok(line), Ok(column)) => (file.to_string(), line, column),
            _ => (location.to_string(), 0, 0),
        },
        (None, Some(file)) => (file.to_string(), last.parse().unwrap_or(0), 0),
        _ => (location.to_string(), 0, 0),
    }
}

/// Split `crate::module::function::h1234` into (`crate::module`, `function`)
fn split_symbol(symbol: &str) -> (String, String) {
    let segments: Vec<&str> = symbol
        .split("::")
        .filter(|s| !s.starts_with("{{closure}}"))
        .filter(|s| !is_hash_segment(s))
        .collect();

    match segments.split_last() {
        Some((method, [])) => (UNKNOWN.to_string(), method.to_string()),
        Some((method, path)) => (path.join("::"), method.to_string()),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    }
}

fn is_hash_segment(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Drop instrumentation and runtime frames, starting at the caller
fn relevant_frames(frames: Vec<StackFrameInfo>, caller_file: &str) -> Vec<StackFrameInfo> {
    let caller = Path::new(caller_file);
    let starts_at_caller = |frame: &StackFrameInfo| {
        frame
            .file
            .as_deref()
            .map(|f| Path::new(f).ends_with(caller) || Path::new(caller).ends_with(f))
            .unwrap_or(false)
    };

    let start = frames.iter().position(starts_at_caller).unwrap_or(0);

    frames
        .into_iter()
        .skip(start)
        .filter(|frame| {
            let symbol = if frame.type_name == UNKNOWN {
                frame.method.clone()
            } else {
                format!("{}::{}", frame.type_name, frame.method)
            };
            !SKIPPED_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
        })
        .collect()
}
