//! numline_engine - line calculator engine + Rhai integration.
//!
//! A line of text goes through a fixed sequence of rewriting passes (see
//! [`engine::EvalContext`]) and what is left is evaluated as arithmetic.

pub mod builtins;
pub mod engine;
pub mod error;

pub use error::{CalcError, RateError, Result};
