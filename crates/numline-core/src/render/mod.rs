//! Rendering evaluated documents: annotated text, JSON and markdown.

mod md;

pub use md::write_markdown;

use crate::document::ParsedLine;
use crate::error::Result;

/// Column results are aligned to when no other width is configured.
pub const DEFAULT_RESULT_COLUMN: usize = 32;

/// The document text with each line's result after a `=` gutter at `column`.
pub fn render_annotated(lines: &[ParsedLine], column: usize) -> String {
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let input = line.input.trim_end();
        match line.display() {
            Some(shown) => out.push_str(&format!("{:<width$} = {}", input, shown, width = column)),
            None => out.push_str(input),
        }
    }
    out
}

/// Pretty-printed JSON array of lines.
pub fn to_json(lines: &[ParsedLine]) -> Result<String> {
    Ok(serde_json::to_string_pretty(lines)?)
}
