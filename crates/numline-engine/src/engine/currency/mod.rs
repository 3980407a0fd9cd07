//! Currency conversion.
//!
//! Rates are USD-relative and live in an immutable [`RateTable`]. The
//! [`CurrencyService`] holds the current table behind an `Arc` and a refresh
//! swaps in a complete new table, so a reader always sees either the old map
//! or the new one, never a mix.

mod refresh;
mod source;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CalcError, RateError, Result};

pub use refresh::{DEFAULT_REFRESH_INTERVAL, RefreshHandle, spawn_refresh};
pub use source::{
    DEFAULT_RATES_URL, HttpRateSource, JsonRateSource, RateSource, StaticRateSource,
    parse_rates_payload,
};

/// Rates used until a refresh succeeds.
pub const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.50),
    ("AUD", 1.53),
    ("CAD", 1.39),
    ("CHF", 0.88),
    ("CNY", 7.24),
    ("INR", 83.12),
    ("RUB", 92.50),
    ("KRW", 1310.00),
    ("MXN", 17.08),
    ("BRL", 4.97),
    ("ZAR", 18.62),
    ("SEK", 10.68),
    ("NOK", 10.89),
    ("DKK", 6.86),
    ("SGD", 1.34),
    ("HKD", 7.83),
    ("NZD", 1.67),
    ("TRY", 34.20),
    ("ILS", 3.64),
    ("UAH", 41.20),
];

const SYMBOLS: &[(&str, &str)] = &[
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
    ("₽", "RUB"),
    ("₩", "KRW"),
    ("₪", "ILS"),
    ("₺", "TRY"),
    ("₴", "UAH"),
    ("A$", "AUD"),
    ("C$", "CAD"),
    ("CA$", "CAD"),
    ("NZ$", "NZD"),
    ("HK$", "HKD"),
    ("S$", "SGD"),
];

const NAMES: &[(&str, &str)] = &[
    ("dollar", "USD"),
    ("dollars", "USD"),
    ("euro", "EUR"),
    ("euros", "EUR"),
    ("pound", "GBP"),
    ("pounds", "GBP"),
    ("yen", "JPY"),
    ("yuan", "CNY"),
    ("rupee", "INR"),
    ("rupees", "INR"),
    ("ruble", "RUB"),
    ("rubles", "RUB"),
    ("won", "KRW"),
    ("franc", "CHF"),
    ("francs", "CHF"),
];

/// Return the table's own copy of a currency symbol, if `symbol` is one.
pub(crate) fn lookup_symbol(symbol: &str) -> Option<&'static str> {
    SYMBOLS.iter().find(|(s, _)| *s == symbol).map(|(s, _)| *s)
}

/// ISO code for a currency symbol (`€` -> `EUR`).
pub fn symbol_code(symbol: &str) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, code)| *code)
}

/// ISO code for an English currency name, case-insensitive (`Euros` -> `EUR`).
pub fn name_code(name: &str) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// Three ASCII upper-case letters: the shape of an ISO 4217 code.
pub fn looks_like_code(text: &str) -> bool {
    text.len() == 3 && text.bytes().all(|b| b.is_ascii_uppercase())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrencyRate {
    pub code: String,
    pub rate: f64,
    pub last_updated: DateTime<Utc>,
}

/// A complete, immutable set of USD-relative rates.
#[derive(Clone, Debug)]
pub struct RateTable {
    rates: HashMap<String, f64>,
    last_updated: DateTime<Utc>,
}

impl RateTable {
    pub fn fallback() -> Self {
        RateTable {
            rates: FALLBACK_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
            last_updated: Utc::now(),
        }
    }

    /// Validate a fetched map. Codes are upper-cased and USD is pinned to 1;
    /// a single non-finite or non-positive rate rejects the whole map.
    pub fn from_rates(rates: HashMap<String, f64>) -> std::result::Result<Self, RateError> {
        if rates.is_empty() {
            return Err(RateError::Empty);
        }

        let mut table = HashMap::with_capacity(rates.len() + 1);
        for (code, rate) in rates {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(RateError::InvalidRate { code, rate });
            }
            table.insert(code.to_uppercase(), rate);
        }
        table.insert("USD".to_string(), 1.0);

        Ok(RateTable {
            rates: table,
            last_updated: Utc::now(),
        })
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Known codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(|c| c.as_str()).collect();
        codes.sort_unstable();
        codes
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Shared rate cache with whole-table replacement.
#[derive(Debug)]
pub struct CurrencyService {
    table: RwLock<Arc<RateTable>>,
}

impl CurrencyService {
    /// A service seeded with [`FALLBACK_RATES`].
    pub fn new() -> Self {
        Self::with_table(RateTable::fallback())
    }

    pub fn with_table(table: RateTable) -> Self {
        CurrencyService {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// The process-wide service.
    pub fn global() -> Arc<CurrencyService> {
        static GLOBAL: OnceLock<Arc<CurrencyService>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(CurrencyService::new())).clone()
    }

    /// The table current at the time of the call.
    pub fn snapshot(&self) -> Arc<RateTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new table in one step.
    pub fn replace(&self, table: RateTable) {
        let mut current = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(table);
    }

    /// `(amount / from_rate) * to_rate`, with both codes upper-cased.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let table = self.snapshot();
        let from_code = from.to_uppercase();
        let to_code = to.to_uppercase();

        let from_rate = table
            .get(&from_code)
            .ok_or_else(|| CalcError::UnknownCurrency(from_code.clone()))?;
        let to_rate = table
            .get(&to_code)
            .ok_or_else(|| CalcError::UnknownCurrency(to_code.clone()))?;

        Ok((amount / from_rate) * to_rate)
    }

    pub fn rate(&self, code: &str) -> Option<CurrencyRate> {
        let table = self.snapshot();
        let code = code.to_uppercase();
        table.get(&code).map(|rate| CurrencyRate {
            code,
            rate,
            last_updated: table.last_updated(),
        })
    }

    pub fn is_currency_code(&self, text: &str) -> bool {
        self.snapshot().get(text).is_some()
    }

    /// Fetch from `source` and publish the result. On failure the current
    /// table stays in place and the error is logged and returned.
    pub fn refresh_rates(&self, source: &dyn RateSource) -> std::result::Result<usize, RateError> {
        let table = match source.fetch().and_then(RateTable::from_rates) {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!(
                    source = %source.describe(),
                    error = %err,
                    "exchange rate refresh failed, keeping cached rates"
                );
                return Err(err);
            }
        };

        let count = table.len();
        self.replace(table);
        tracing::info!(source = %source.describe(), count, "exchange rates refreshed");
        Ok(count)
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}
