//! Calculator engine API.
//!
//! - [`tokenize`], [`Token`] - Typed token stream for one line
//! - [`EvalContext`] - Variables, previous result and collaborators for a document
//! - [`convert`], [`convert_temperature`] - Unit conversion tables
//! - [`CurrencyService`] - Exchange rate cache with background refresh
//! - [`create_engine`] - Rhai engine with the math built-ins registered
//! - [`format_number`] - Display formatting for results

mod context;
pub mod currency;
mod dates;
mod eval;
mod format;
mod pipeline;
mod token;
mod units;

pub use context::{Clock, EvalContext, Quantity, Variable};
pub use currency::{
    CurrencyRate, CurrencyService, DEFAULT_RATES_URL, DEFAULT_REFRESH_INTERVAL, HttpRateSource,
    JsonRateSource, RateSource, RateTable, RefreshHandle, StaticRateSource, spawn_refresh,
};
pub use eval::{create_engine, evaluate_tokens, render_script};
pub use format::{format_number, parse_formatted};
pub use pipeline::MAX_PIPELINE_DEPTH;
pub use token::{Op, Token, join_tokens, tokenize};
pub use units::{
    Category, ConversionUnit, TemperatureScale, convert, convert_temperature, lookup, units_in,
};
