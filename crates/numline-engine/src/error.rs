//! Error types for the calculation engine.

use thiserror::Error;

use crate::engine::Category;

/// Errors raised while evaluating a single calculator line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Cannot convert between {from} and {to}")]
    CategoryMismatch { from: Category, to: Category },

    #[error("Unknown temperature unit: {0}")]
    UnknownTemperatureUnit(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Syntax or evaluation failure reported by the arithmetic evaluator.
    #[error("{0}")]
    Syntax(String),

    #[error("Undefined symbol: {0}")]
    UnknownSymbol(String),

    #[error("Date out of range")]
    DateOutOfRange,

    #[error("Cannot use non-finite value {0} in an expression")]
    NonFinite(f64),

    #[error("Expression is nested too deeply")]
    TooDeep,
}

/// Errors raised while loading exchange rates.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Malformed rate payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid rate for {code}: {rate}")]
    InvalidRate { code: String, rate: f64 },

    #[error("Rate payload is based on {0}, expected USD")]
    UnsupportedBase(String),

    #[error("Rate payload contains no rates")]
    Empty,
}

pub type Result<T> = std::result::Result<T, CalcError>;
