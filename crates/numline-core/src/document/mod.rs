//! Document evaluation (UI-agnostic).

mod eval;
mod io;
mod line;

pub use eval::Evaluator;
pub use io::{MAX_DOCUMENT_FILE_BYTES, read_document};
pub use line::{LineType, ParsedLine};
