//! Exchange rate sources.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::RateError;

const MAX_RATES_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The public endpoint for USD-based rates.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Something that can produce a full USD-relative rate map.
///
/// Any error means "no refresh"; callers keep whatever rates they had.
pub trait RateSource: Send + Sync {
    fn fetch(&self) -> Result<HashMap<String, f64>, RateError>;

    /// Short label used in log lines.
    fn describe(&self) -> String {
        "rate source".to_string()
    }
}

#[derive(Debug, Deserialize)]
struct RatesPayload {
    base: Option<String>,
    rates: HashMap<String, f64>,
}

/// Parse a `{"base": "USD", "rates": {"EUR": 0.92, ...}}` payload.
pub fn parse_rates_payload(content: &str) -> Result<HashMap<String, f64>, RateError> {
    let payload: RatesPayload = serde_json::from_str(content)?;

    if let Some(base) = payload.base.as_deref()
        && !base.eq_ignore_ascii_case("USD")
    {
        return Err(RateError::UnsupportedBase(base.to_string()));
    }

    Ok(payload.rates)
}

/// Rates read from a JSON payload on disk, re-read on every fetch.
#[derive(Clone, Debug)]
pub struct JsonRateSource {
    path: PathBuf,
}

impl JsonRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonRateSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateSource for JsonRateSource {
    fn fetch(&self) -> Result<HashMap<String, f64>, RateError> {
        let meta = std::fs::metadata(&self.path)?;
        if meta.len() > MAX_RATES_FILE_BYTES {
            return Err(too_large(&self.path.display().to_string(), meta.len()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_rates_payload(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn too_large(what: &str, size: u64) -> RateError {
    RateError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!(
            "Refusing to read {}: rates payload too large ({} bytes, max {})",
            what, size, MAX_RATES_FILE_BYTES
        ),
    ))
}

/// Rates fetched from an HTTP endpoint serving the JSON payload.
#[derive(Clone, Debug)]
pub struct HttpRateSource {
    url: String,
    timeout: Duration,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>) -> Self {
        HttpRateSource {
            url: url.into(),
            timeout: HTTP_TIMEOUT,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RateSource for HttpRateSource {
    fn fetch(&self) -> Result<HashMap<String, f64>, RateError> {
        let response = ureq::get(&self.url)
            .timeout(self.timeout)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => {
                    RateError::Http(format!("{} returned status {}", self.url, code))
                }
                ureq::Error::Transport(transport) => RateError::Http(transport.to_string()),
            })?;

        let mut body = String::new();
        response
            .into_reader()
            .take(MAX_RATES_FILE_BYTES + 1)
            .read_to_string(&mut body)?;
        if body.len() as u64 > MAX_RATES_FILE_BYTES {
            return Err(too_large(&self.url, body.len() as u64));
        }
        parse_rates_payload(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A fixed rate map.
#[derive(Clone, Debug, Default)]
pub struct StaticRateSource {
    rates: HashMap<String, f64>,
}

impl StaticRateSource {
    pub fn new<'a>(rates: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        StaticRateSource {
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_string(), rate))
                .collect(),
        }
    }
}

impl RateSource for StaticRateSource {
    fn fetch(&self) -> Result<HashMap<String, f64>, RateError> {
        Ok(self.rates.clone())
    }

    fn describe(&self) -> String {
        "static rates".to_string()
    }
}
