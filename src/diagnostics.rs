//! Span-anchored error reporting
//!
//! Renders a one-line header followed by the offending source line, its
//! neighbours, and a caret underline beneath the span:
//!
//! ```text
//! Error at main.enki:3:9: symbol not found: y
//!   2 | define f() -> int {
//!   3 |   return y
//!     |          ^
//!   4 | }
//! ```

use crate::span::{SourceFile, Span};
use colored::Colorize;
use std::fmt::Write;

/// Render a diagnostic with source context into a string
pub fn render(file: &SourceFile, span: Span, message: &str) -> String {
    let start = file.position(span.start);
    let end = file.position(span.end);
    let line_index = start.line as usize;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} at {}:{}:{}: {}",
        "Error".red().bold(),
        file.name(),
        start.line + 1,
        start.column + 1,
        message
    );

    let Some(line) = file.line(line_index) else {
        return out;
    };

    // Line above, when present
    if line_index > 0 {
        if let Some(above) = file.line(line_index - 1) {
            let _ = writeln!(out, "  {} | {}", line_index, above);
        }
    }

    // The offending line with its caret underline
    let _ = writeln!(out, "  {} | {}", line_index + 1, line);
    let caret_end = if end.line == start.line {
        (end.column as usize).min(line.len()).max(start.column as usize + 1)
    } else {
        line.len()
    };
    let underline: String = std::iter::repeat(' ')
        .take(start.column as usize)
        .chain(std::iter::repeat('^').take(caret_end - start.column as usize))
        .collect();
    let _ = writeln!(out, "    | {}", underline.red());

    // Line below, when present
    if let Some(below) = file.line(line_index + 1) {
        let _ = writeln!(out, "  {} | {}", line_index + 2, below);
    }

    out
}

/// Render a diagnostic and write it to stderr
pub fn emit(file: &SourceFile, span: Span, message: &str) {
    eprint!("{}", render(file, span, message));
}
