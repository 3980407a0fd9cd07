//! User configuration (`config.toml`).

use directories::ProjectDirs;
use numline_core::render::DEFAULT_RESULT_COLUMN;
use numline_engine::engine::DEFAULT_REFRESH_INTERVAL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const MIN_REFRESH_SECS: u64 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    currency: Option<CurrencySection>,
    display: Option<DisplaySection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CurrencySection {
    rates_file: Option<PathBuf>,
    rates_url: Option<String>,
    refresh_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplaySection {
    result_column: Option<usize>,
}

/// Effective settings after the config file is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub rates_file: Option<PathBuf>,
    pub rates_url: Option<String>,
    pub refresh_interval: Duration,
    pub result_column: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rates_file: None,
            rates_url: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            result_column: DEFAULT_RESULT_COLUMN,
        }
    }
}

/// Load the config from `explicit`, or from the user config dir.
///
/// Problems never fail the load: they come back as warnings and the
/// affected settings keep their defaults.
pub fn load_config(explicit: Option<&PathBuf>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = Config::default();

    let Some(path) = explicit.cloned().or_else(user_config_path) else {
        return (config, warnings);
    };
    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    let Some(file) = read_config_file(&path, &mut warnings) else {
        return (config, warnings);
    };

    if let Some(currency) = file.currency {
        config.rates_file = currency.rates_file.map(|p| resolve_relative(&path, p));
        config.rates_url = currency.rates_url;
        if let Some(secs) = currency.refresh_secs {
            if secs < MIN_REFRESH_SECS {
                warnings.push(format!(
                    "refresh_secs = {} is too small, using {}",
                    secs, MIN_REFRESH_SECS
                ));
            }
            config.refresh_interval = Duration::from_secs(secs.max(MIN_REFRESH_SECS));
        }
    }
    if let Some(display) = file.display
        && let Some(column) = display.result_column
    {
        config.result_column = column;
    }

    (config, warnings)
}

fn read_config_file(path: &Path, warnings: &mut Vec<String>) -> Option<ConfigFile> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    }
}

/// Relative paths in the config are relative to the config file.
fn resolve_relative(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match config_path.parent() {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "numline")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
