use clap::ValueEnum;
use serde_json::Value;

use crate::protocol::LSPResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Labelled, indented JSON
    Pretty,
    /// The whole response as compact JSON
    Json,
    /// Only the result (or error) as compact JSON
    Raw,
}

/// Render a response the way it is printed on stdout.
pub fn render(
    method: &str,
    response: &LSPResponse,
    format: OutputFormat,
    quiet: bool,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(response),
        OutputFormat::Raw => serde_json::to_string(&payload(response)),
        OutputFormat::Pretty if quiet => serde_json::to_string_pretty(&payload(response)),
        OutputFormat::Pretty => Ok(format!(
            "Response for {}:\n{}",
            method,
            serde_json::to_string_pretty(response)?
        )),
    }
}

fn payload(response: &LSPResponse) -> Value {
    if let Some(error) = &response.error {
        return serde_json::to_value(error).unwrap_or(Value::Null);
    }
    response.result.clone().unwrap_or(Value::Null)
}

pub const COMMON_METHODS: &str = "\
Common LSP Methods:

Text Document:
  textDocument/hover           - Get hover information
  textDocument/completion      - Get code completion
  textDocument/definition      - Go to definition
  textDocument/references      - Find references
  textDocument/documentSymbol  - Get document symbols
  textDocument/formatting      - Format document
  textDocument/codeAction      - Get code actions
  textDocument/rename          - Rename symbol

Workspace:
  workspace/symbol             - Find workspace symbols
  workspace/executeCommand     - Execute command

Diagnostics:
  textDocument/publishDiagnostics - Diagnostics (notification)

Example parameter files can be created with:
  echo '{\"textDocument\":{\"uri\":\"file:///path/to/file.go\"},\"position\":{\"line\":10,\"character\":5}}' > hover.json
";
