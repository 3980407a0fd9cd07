//! Evaluation context: the state one calculator document owns.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rhai::Engine;
use serde::Serialize;

use super::currency::CurrencyService;
use super::eval::create_engine;
use super::pipeline;
use super::token::{Token, tokenize};
use crate::error::Result;

/// A named value defined by an assignment line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A pipeline result: the number, plus the unit or currency code it was
/// converted into when the line was a direct conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Option<String>,
}

impl Quantity {
    pub fn plain(value: f64) -> Self {
        Quantity { value, unit: None }
    }

    pub fn with_unit(value: f64, unit: impl Into<String>) -> Self {
        Quantity {
            value,
            unit: Some(unit.into()),
        }
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Variables, the previous result, and the collaborators the pipeline needs.
///
/// The caller owns the context and resets it per document pass; nothing here
/// is global except the default currency service.
pub struct EvalContext {
    variables: HashMap<String, Variable>,
    previous: Option<f64>,
    currency: Arc<CurrencyService>,
    clock: Clock,
    engine: Engine,
}

impl EvalContext {
    /// A context backed by the process-wide currency service.
    pub fn new() -> Self {
        Self::with_currency(CurrencyService::global())
    }

    pub fn with_currency(currency: Arc<CurrencyService>) -> Self {
        EvalContext {
            variables: HashMap::new(),
            previous: None,
            currency,
            clock: Arc::new(Utc::now),
            engine: create_engine(),
        }
    }

    /// Replace the clock used by `today`/`now`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Evaluate an expression to a number.
    pub fn evaluate(&self, expr: &str) -> Result<f64> {
        self.evaluate_quantity(expr).map(|q| q.value)
    }

    pub fn evaluate_quantity(&self, expr: &str) -> Result<Quantity> {
        self.evaluate_tokens(tokenize(expr.trim()))
    }

    pub fn evaluate_tokens(&self, tokens: Vec<Token>) -> Result<Quantity> {
        pipeline::run(self, tokens, 0)
    }

    pub fn define(&mut self, name: &str, value: f64, unit: Option<String>) {
        self.variables.insert(
            name.to_string(),
            Variable {
                name: name.to_string(),
                value,
                unit,
            },
        );
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// All variables, sorted by name.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self.variables.values().cloned().collect();
        vars.sort_by(|a, b| a.name.cmp(&b.name));
        vars
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    pub fn set_previous(&mut self, value: Option<f64>) {
        self.previous = value;
    }

    /// Forget all variables and the previous result.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.previous = None;
    }

    pub fn currency(&self) -> &CurrencyService {
        &self.currency
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("variables", &self.variables)
            .field("previous", &self.previous)
            .finish_non_exhaustive()
    }
}
