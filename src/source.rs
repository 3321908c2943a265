//! Source excerpts
//!
//! Reads the lines around a breakpoint from disk. Used when capturing a
//! breakpoint and again by `get_context` when the file is readable from
//! where the bridge runs.

use std::fmt::Write as _;
use std::path::Path;

/// Lines read around a target line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExcerpt {
    pub lines: Vec<String>,
    /// 1-based line number of `lines[0]`
    pub start_line: u32,
}

impl SourceExcerpt {
    /// Render as numbered lines with `marked_line` flagged by `>>`
    ///
    /// `start_line` can come from a client payload; lines whose number would
    /// overflow are left out.
    pub fn render(&self, marked_line: u32) -> String {
        let mut out = String::new();
        for (offset, text) in self.lines.iter().enumerate() {
            let Some(number) = u32::try_from(offset)
                .ok()
                .and_then(|offset| self.start_line.checked_add(offset))
            else {
                break;
            };
            let marker = if number == marked_line { " >> " } else { "    " };
            let _ = writeln!(out, "{:>4}{}{}", number, marker, text);
        }
        out
    }
}

/// Read `context_lines` lines either side of 1-based `line`
///
/// Returns `None` when the path is empty, the line is 0, or the file cannot
/// be read.
pub fn read_context(path: impl AsRef<Path>, line: u32, context_lines: u32) -> Option<SourceExcerpt> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() || line == 0 {
        return None;
    }

    let content = std::fs::read_to_string(path).ok()?;
    let all_lines: Vec<&str> = content.lines().collect();
    if all_lines.is_empty() {
        return None;
    }

    let index = (line - 1) as usize;
    let start = index.saturating_sub(context_lines as usize);
    let end = (index + context_lines as usize).min(all_lines.len() - 1);
    if start > end {
        return None;
    }

    Some(SourceExcerpt {
        lines: all_lines[start..=end].iter().map(|l| l.to_string()).collect(),
        start_line: start as u32 + 1,
    })
}

/// Markdown fence language for a source file
pub fn fence_language(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("rs") => "rust",
        Some("cs") => "csharp",
        Some("py") => "python",
        Some("go") => "go",
        Some("ts") => "typescript",
        Some("js") => "javascript",
        _ => "",
    }
}
