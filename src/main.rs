//! Numline - a line-oriented calculator for the terminal

mod config;
mod repl;

use anyhow::{Context, Result};
use numline_core::document::read_document;
use numline_core::render::{render_annotated, to_json, write_markdown};
use numline_core::{Evaluator, ParsedLine};
use numline_engine::engine::{
    CurrencyService, DEFAULT_RATES_URL, HttpRateSource, JsonRateSource, RateSource, spawn_refresh,
};
use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Exit status when `--strict` is set and a line failed.
const EXIT_LINE_ERRORS: i32 = 2;

fn print_usage() {
    eprintln!("Usage: numline [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Document to evaluate (reads stdin if omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <TEXT>      Evaluate TEXT as a document");
    eprintln!("  -i, --interactive         Start an interactive session");
    eprintln!("  -o, --output <FILE>       Export results to a markdown file");
    eprintln!("  -a, --annotate            Print each line with its result");
    eprintln!("  --json                    Print results as JSON");
    eprintln!("  --column <N>              Result column for --annotate");
    eprintln!("  --rates <FILE>            Load exchange rates from a JSON file");
    eprintln!("  --rates-url <URL>         Fetch exchange rates from URL");
    eprintln!("                            (e.g. {})", DEFAULT_RATES_URL);
    eprintln!("  --config <FILE>           Use this config file");
    eprintln!("  --strict                  Exit with status 2 if any line fails");
    eprintln!("  -v, --verbose             Debug logging to stderr");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    command: Option<String>,
    output_file: Option<PathBuf>,
    rates_file: Option<PathBuf>,
    rates_url: Option<String>,
    config_file: Option<PathBuf>,
    column: Option<usize>,
    interactive: bool,
    annotate: bool,
    json: bool,
    strict: bool,
    verbose: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires an expression");
                    std::process::exit(1);
                }
                opts.command = Some(args[i].to_string());
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                opts.output_file = Some(PathBuf::from(&args[i]));
            }
            "--rates" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --rates requires a file path");
                    std::process::exit(1);
                }
                opts.rates_file = Some(PathBuf::from(&args[i]));
            }
            "--rates-url" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --rates-url requires a URL");
                    std::process::exit(1);
                }
                opts.rates_url = Some(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                opts.config_file = Some(PathBuf::from(&args[i]));
            }
            "--column" => {
                i += 1;
                match args.get(i).map(|s| s.parse::<usize>()) {
                    Some(Ok(column)) => opts.column = Some(column),
                    _ => {
                        eprintln!("Error: --column requires a non-negative number");
                        std::process::exit(1);
                    }
                }
            }
            "-i" | "--interactive" => opts.interactive = true,
            "-a" | "--annotate" => opts.annotate = true,
            "--json" => opts.json = true,
            "--strict" => opts.strict = true,
            "-v" | "--verbose" => opts.verbose = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    init_logging(opts.verbose);

    match run(opts) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(opts: Options) -> Result<i32> {
    let (config, warnings) = config::load_config(opts.config_file.as_ref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let column = opts.column.unwrap_or(config.result_column);
    let source = if opts.rates_file.is_some() || opts.rates_url.is_some() {
        rate_source(opts.rates_file, opts.rates_url)
    } else {
        rate_source(config.rates_file, config.rates_url)
    };
    let currency = CurrencyService::global();

    if opts.interactive {
        // Keep the handle alive for the whole session; dropping it stops the thread.
        let refresh = match source {
            Some(source) => Some(
                spawn_refresh(currency, source, config.refresh_interval)
                    .context("Failed to start exchange rate refresh")?,
            ),
            None => None,
        };
        tracing::debug!(refresh = refresh.is_some(), "starting interactive session");
        let mut evaluator = Evaluator::new();
        let stdin = io::stdin();
        let prompt = stdin.is_terminal();
        repl::run(&mut evaluator, stdin.lock(), &mut io::stdout(), prompt)?;
        return Ok(0);
    }

    if let Some(source) = source {
        // A failed load is logged by the service and the built-in rates stay.
        let _ = currency.refresh_rates(source.as_ref());
    }

    let text = document_text(&opts.command, &opts.file_path)?;
    let lines = Evaluator::new().evaluate_document(&text);

    if let Some(output_path) = opts.output_file {
        write_markdown(&output_path, &lines)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Exported to {}", output_path.display());
    } else if opts.json {
        println!("{}", to_json(&lines)?);
    } else if opts.annotate {
        println!("{}", render_annotated(&lines, column));
    } else {
        print_results(&lines);
    }

    if opts.strict && lines.iter().any(ParsedLine::is_error) {
        return Ok(EXIT_LINE_ERRORS);
    }
    Ok(0)
}

/// A rates file wins over a URL when both are given.
fn rate_source(file: Option<PathBuf>, url: Option<String>) -> Option<Arc<dyn RateSource>> {
    if let Some(path) = file {
        let source = JsonRateSource::new(path);
        tracing::debug!(path = %source.path().display(), "using exchange rate file");
        return Some(Arc::new(source));
    }
    url.map(|url| {
        let source = HttpRateSource::new(url);
        tracing::debug!(url = source.url(), "using exchange rate endpoint");
        Arc::new(source) as Arc<dyn RateSource>
    })
}

/// The document to evaluate: `-c` text, a file, or stdin. A single trailing
/// newline ends the last line rather than starting a new one.
fn document_text(command: &Option<String>, file_path: &Option<PathBuf>) -> Result<String> {
    if let Some(command) = command {
        return Ok(command.clone());
    }

    let mut text = match file_path {
        Some(path) => read_document(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// One output line per input line: the result, `Error: ...`, or nothing.
fn print_results(lines: &[ParsedLine]) {
    for line in lines {
        println!("{}", line.display().unwrap_or_default());
    }
}
