use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Calculation,
    Header,
    Comment,
    Blank,
}

/// One evaluated line of a document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLine {
    /// Zero-based position in the document.
    pub line_number: usize,
    /// The raw, untrimmed line.
    pub input: String,
    pub result: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "type")]
    pub line_type: LineType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_level: Option<u8>,
    /// The unformatted result, kept for block aggregation.
    #[serde(skip)]
    pub value: Option<f64>,
}

impl ParsedLine {
    pub(crate) fn passive(line_number: usize, input: &str, line_type: LineType) -> Self {
        ParsedLine {
            line_number,
            input: input.to_string(),
            result: None,
            error: None,
            line_type,
            header_level: None,
            value: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// What a reader sees next to the line: the result, `Error: ...`, or
    /// nothing.
    pub fn display(&self) -> Option<String> {
        match (&self.result, &self.error) {
            (Some(result), _) => Some(result.clone()),
            (None, Some(error)) => Some(format!("Error: {}", error)),
            (None, None) => None,
        }
    }
}

fn header_re() -> &'static Regex {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    HEADER_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("header regex must compile"))
}

/// Classify a line. Returns the header level for headers.
pub(crate) fn classify(line: &str) -> (LineType, Option<u8>) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (LineType::Blank, None);
    }
    if let Some(caps) = header_re().captures(trimmed) {
        return (LineType::Header, Some(caps[1].len() as u8));
    }
    if trimmed.starts_with("//") {
        return (LineType::Comment, None);
    }
    (LineType::Calculation, None)
}
