//! Command-line interface for layercfg
//!
//! Prints the configuration that files, the environment and `--set`
//! overrides merge into.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{MergeEngine, CONFIG_FLAG};
use crate::sources::{FlagSet, FlagValue, Format};

mod utils;

use utils::parse_assignment;

/// Merge config files, environment variables and flags into one configuration
#[derive(Parser)]
#[command(name = "layercfg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only environment variables starting with this prefix are read
    #[arg(short, long, value_name = "PREFIX", default_value = "")]
    prefix: String,

    /// Character separating nested keys
    #[arg(short, long, value_name = "CHAR", default_value = ".")]
    delimiter: String,

    /// Format of the config files [default: from the first file's extension, else yaml]
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Config file to load (repeatable, comma-separated); later files win
    #[arg(short, long = "config", value_name = "FILE", value_delimiter = ',')]
    config: Vec<String>,

    /// Set KEY to VALUE with flag precedence (repeatable)
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Output::Json)]
    output: Output,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Yaml,
    Toml,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let merged = merge(&cli)?;
    println!("{}", render(&merged, cli.output)?);
    Ok(())
}

fn merge(cli: &Cli) -> Result<Value> {
    let engine = MergeEngine::new(cli.prefix.as_str(), &cli.delimiter)?.with_format(file_format(cli));

    let mut flags = FlagSet::new().define_list(CONFIG_FLAG);
    if !cli.config.is_empty() {
        flags.set(CONFIG_FLAG, FlagValue::List(cli.config.clone()))?;
    }
    for (key, value) in &cli.set {
        flags = flags.define(key.as_str(), "");
        flags.set(key, value.as_str())?;
    }

    let mut merged = Value::Null;
    engine.load(&flags, &mut merged).context("Failed loading configuration")?;
    Ok(merged)
}

fn file_format(cli: &Cli) -> Format {
    if let Some(format) = cli.format {
        return format;
    }
    let inferred = cli.config.first().and_then(|path| Format::from_path(Path::new(path)));
    tracing::debug!("Inferred config format {:?}", inferred);
    inferred.unwrap_or_default()
}

fn render(value: &Value, output: Output) -> Result<String> {
    let rendered = match output {
        Output::Json => serde_json::to_string_pretty(value)?,
        Output::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
        Output::Toml => toml::to_string_pretty(value)
            .context("Configuration cannot be rendered as TOML")?
            .trim_end()
            .to_string(),
    };
    Ok(rendered)
}
