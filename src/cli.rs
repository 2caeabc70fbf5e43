use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{config::DEFAULT_TIMEOUT_SECS, lsp::ServerCommand, output::OutputFormat};

/// Everything `main` needs to run one request.
#[derive(Debug, Clone)]
pub struct Config {
    pub command: ServerCommand,
    pub method: String,
    pub params: Option<Value>,
    /// `None` when initialization is skipped.
    pub root_uri: Option<String>,
    pub timeout: Duration,
    pub format: OutputFormat,
    pub quiet: bool,
}

#[derive(Parser, Debug)]
#[command(name = "clsp", version)]
#[command(about = "Send one request to a language server over stdio and print the response", long_about = None)]
pub struct Cli {
    /// LSP server command (e.g. gopls, clangd, pylsp)
    #[arg(long, value_name = "CMD", required_unless_present = "list_methods")]
    pub server: Option<String>,

    /// Server arguments, comma-separated
    #[arg(long, value_name = "ARGS", default_value = "", allow_hyphen_values = true)]
    pub args: String,

    /// LSP method to call
    #[arg(long, required_unless_present = "list_methods")]
    pub method: Option<String>,

    /// JSON parameters for the method
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub params: String,

    /// Read parameters from a JSON file
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Root URI for initialization (defaults to the current directory)
    #[arg(long, value_name = "URI")]
    pub root: Option<String>,

    /// Skip the initialize handshake
    #[arg(long)]
    pub skip_init: bool,

    /// Session timeout, e.g. 500ms, 30s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Only output result data, no headers or labels
    #[arg(long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// List common LSP methods and exit
    #[arg(long)]
    pub list_methods: bool,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> Result<Config> {
        let program = self.server.context("--server is required")?;
        let method = self.method.context("--method is required")?;

        let params = match &self.params_file {
            Some(path) => Some(load_params_file(path)?),
            None => parse_params(&self.params)?,
        };

        let root_uri = if self.skip_init {
            None
        } else {
            Some(match self.root {
                Some(root) => root,
                None => default_root_uri()?,
            })
        };

        Ok(Config {
            command: ServerCommand::new(program).args(split_args(&self.args)),
            method,
            params,
            root_uri,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            format: self.format,
            quiet: self.quiet,
        })
    }
}

/// Split `a, b,c` into trimmed arguments, dropping empty ones.
pub fn split_args(args: &str) -> Vec<String> {
    args.split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse literal params. An empty string or `{}` means "send no params".
pub fn parse_params(params: &str) -> Result<Option<Value>> {
    let params = params.trim();
    if params.is_empty() || params == "{}" {
        return Ok(None);
    }

    serde_json::from_str(params)
        .map(Some)
        .context("Failed to parse params JSON")
}

fn load_params_file(path: &Path) -> Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse params file JSON {}", path.display()))
}

fn default_root_uri() -> Result<String> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(format!("file://{}", cwd.display()))
}

/// Parse `500ms`, `30s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration {value:?}"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => Ok(Duration::from_secs(number.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(number.saturating_mul(3600))),
        _ => Err(format!("unknown duration unit {unit:?} in {value:?}")),
    }
}
