//! tunebridge - playlist transfer from YouTube Music to Spotify
//!
//! Two modes over the same pipeline:
//! - `transfer`: run once, print every progress event line on stdout
//! - `serve`: HTTP service streaming progress over SSE
//!
//! Configuration precedence: CLI flag > environment (`TUNEBRIDGE_*`, `.env`)
//! > TOML file > compiled defaults.

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::{info, warn};

use tunebridge_common::config::{default_config_path, write_toml_config, TomlConfig};
use tunebridge_common::logging::{init_logging, with_bootstrap_logging};
use tunebridge_transfer::clients::{SpotifyClient, YouTubeClient};
use tunebridge_transfer::services::{TransferOptions, TransferOrchestrator, TransferRequest};
use tunebridge_transfer::AppState;

/// Command-line arguments for tunebridge
#[derive(Parser, Debug)]
#[command(name = "tunebridge")]
#[command(about = "Copy a YouTube Music playlist into a Spotify playlist")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config_dir>/tunebridge/config.toml)
    #[arg(short, long, global = true, env = "TUNEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transfer one playlist and print progress lines
    Transfer {
        /// Source playlist URL (must contain `list=`)
        #[arg(long)]
        source_url: String,

        /// Destination playlist URL (must contain a `playlist` segment)
        #[arg(long)]
        destination_url: String,

        /// Track ids per append call (1-100)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Most source tracks to read
        #[arg(long)]
        page_limit: Option<usize>,

        /// Source API key
        #[arg(long)]
        source_api_key: Option<String>,

        /// Destination OAuth access token
        #[arg(long)]
        destination_token: Option<String>,
    },

    /// Serve the SSE transfer endpoint
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a config file populated with defaults
    InitConfig {
        /// Target path (defaults to the standard location)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = with_bootstrap_logging(|| TomlConfig::load(cli.config.as_deref()))?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    match cli.command {
        Command::Transfer {
            source_url,
            destination_url,
            batch_size,
            page_limit,
            source_api_key,
            destination_token,
        } => {
            if let Some(size) = batch_size {
                config.transfer.batch_size = size;
            }
            if let Some(limit) = page_limit {
                config.source.page_limit = limit;
            }
            if let Some(key) = source_api_key {
                config.source.api_key = Some(key);
            }
            if let Some(token) = destination_token {
                config.destination.access_token = Some(token);
            }
            prepare(&config)?;

            let orchestrator = build_orchestrator(&config)?;
            run_transfer(orchestrator, TransferRequest::new(source_url, destination_url)).await
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            prepare(&config)?;

            let orchestrator = build_orchestrator(&config)?;
            serve(orchestrator, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::InitConfig { path, force } => {
            init_logging(&config.logging)?;
            let path = path
                .or_else(default_config_path)
                .context("Could not determine config directory; pass --path")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            write_toml_config(&TomlConfig::default(), &path)?;
            info!("Wrote default config to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn prepare(config: &TomlConfig) -> Result<()> {
    config.validate()?;
    init_logging(&config.logging)?;
    info!("tunebridge {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn build_orchestrator(config: &TomlConfig) -> Result<TransferOrchestrator> {
    let source = YouTubeClient::from_config(&config.source)
        .context("Source client unavailable (set TUNEBRIDGE_SOURCE_API_KEY)")?;
    let destination = SpotifyClient::from_config(&config.destination)
        .context("Destination client unavailable (set TUNEBRIDGE_DESTINATION_TOKEN)")?;

    Ok(TransferOrchestrator::new(
        Arc::new(source),
        Arc::new(destination),
        TransferOptions::from_config(config),
    ))
}

/// Print every event line; fail if an error was seen or `complete` never came
async fn run_transfer(
    orchestrator: TransferOrchestrator,
    request: TransferRequest,
) -> Result<ExitCode> {
    let mut events = Box::pin(orchestrator.stream(request));
    let mut stdout = std::io::stdout();
    let mut saw_error = false;
    let mut saw_complete = false;

    while let Some(event) = events.next().await {
        saw_error |= event.is_error();
        saw_complete |= event.is_complete();
        writeln!(stdout, "{}", event)?;
        stdout.flush()?;
    }

    if saw_error || !saw_complete {
        warn!(
            error = saw_error,
            complete = saw_complete,
            "Transfer did not finish cleanly"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve(orchestrator: TransferOrchestrator, config: &TomlConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let app = tunebridge_transfer::build_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_arguments_parse() {
        let cli = Cli::try_parse_from([
            "tunebridge",
            "transfer",
            "--source-url",
            "https://music.youtube.com/playlist?list=PL1",
            "--destination-url",
            "https://open.spotify.com/playlist/abc",
            "--batch-size",
            "50",
        ])
        .unwrap();

        match cli.command {
            Command::Transfer {
                source_url,
                batch_size,
                page_limit,
                ..
            } => {
                assert_eq!(source_url, "https://music.youtube.com/playlist?list=PL1");
                assert_eq!(batch_size, Some(50));
                assert_eq!(page_limit, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_transfer_requires_both_urls() {
        let result = Cli::try_parse_from([
            "tunebridge",
            "transfer",
            "--source-url",
            "https://music.youtube.com/playlist?list=PL1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tunebridge",
            "serve",
            "--config",
            "/tmp/t.toml",
            "-p",
            "8080",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        match cli.command {
            Command::Serve { port, host } => {
                assert_eq!(port, Some(8080));
                assert_eq!(host, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
