use anyhow::{Context, Result};
use log::{error, warn};
use std::{process::ExitCode, time::Duration};
use tokio::time::Instant;

use clsp::{
    cli::{Cli, Config},
    config::CLOSE_TIMEOUT_SECS,
    lsp::LspSession,
    output,
    protocol::LSPResponse,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::from_args();

    // Initialize logging. Everything goes to stderr; stdout is for the response.
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.list_methods {
        print!("{}", output::COMMON_METHODS);
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let deadline = Instant::now() + config.timeout;

    let mut session =
        LspSession::spawn(&config.command).context("Failed to start LSP server")?;

    let rendered = exchange(&mut session, &config, deadline)
        .await
        .and_then(|response| {
            output::render(&config.method, &response, config.format, config.quiet)
                .context("Failed to render response")
        });

    if let Ok(text) = &rendered {
        println!("{}", text);
    }

    let report = session
        .close(Instant::now() + Duration::from_secs(CLOSE_TIMEOUT_SECS))
        .await;
    for e in report.errors() {
        warn!("Failed to close LSP client: {}", e);
    }

    rendered.map(|_| ())
}

async fn exchange(
    session: &mut LspSession,
    config: &Config,
    deadline: Instant,
) -> Result<LSPResponse> {
    if let Some(root_uri) = &config.root_uri {
        session
            .initialize(root_uri, deadline)
            .await
            .context("Failed to initialize LSP server")?;
    }

    session
        .send_request(&config.method, config.params.clone(), deadline)
        .await
        .with_context(|| format!("Failed to send request {}", config.method))
}
