//! Markdown export

use crate::document::{LineType, ParsedLine};
use std::io::Write;
use std::path::Path;

/// Write evaluated lines to a markdown file as a table. Blank lines are left
/// out; line numbers are 1-based.
pub fn write_markdown(path: &Path, lines: &[ParsedLine]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "# Calculations")?;
    writeln!(file)?;

    if lines.iter().all(|l| l.line_type == LineType::Blank) {
        writeln!(file, "*Empty document*")?;
        return Ok(());
    }

    writeln!(file, "| Line | Input | Result |")?;
    writeln!(file, "|---|---|---|")?;
    for line in lines.iter().filter(|l| l.line_type != LineType::Blank) {
        writeln!(
            file,
            "| {} | {} | {} |",
            line.line_number + 1,
            escape_markdown(line.input.trim()),
            escape_markdown(&line.display().unwrap_or_default())
        )?;
    }

    Ok(())
}

/// Escape special markdown characters in table content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}
