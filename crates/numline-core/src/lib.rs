//! numline-core - document evaluator + export.

pub mod document;
pub mod error;
pub mod render;

pub use document::{Evaluator, LineType, ParsedLine};
pub use error::{NumlineError, Result};

pub use numline_engine::engine::{EvalContext, Variable};
