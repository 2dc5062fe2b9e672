//! CLI implementation for fundflow
//!
//! `serve` runs the HTTP API. `beneficiary` and `payer` run a single
//! analysis and print the response envelope as pretty JSON.

use crate::config::{self, Config};
use crate::rpc::{EtherscanClient, DEFAULT_API_URL};
use crate::server::{self, AppState, Beneficiary, Envelope, Payer};
use crate::service::FundFlowService;
use crate::trace::DEFAULT_MAX_HOPS;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Ethereum fund-flow analysis
#[derive(Parser)]
#[command(name = "fundflow")]
#[command(about = "Trace who received and who funded an Ethereum address")]
pub struct Cli {
    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct ProviderArgs {
    /// Etherscan-compatible API endpoint
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// API key (overrides ETHERSCAN_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Timeout for each transaction-list fetch, in seconds
    #[arg(long, global = true, default_value_t = 20)]
    fetch_timeout_secs: u64,

    /// Timeout for each contract lookup, in seconds
    #[arg(long, global = true, default_value_t = 5)]
    oracle_timeout_secs: u64,

    /// Maximum contract forwards followed per trace
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_HOPS)]
    max_hops: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Print who received funds from an address
    Beneficiary {
        /// Ethereum address (0x-prefixed, 40 hex chars)
        address: String,
    },
    /// Print who funded an address, one hop upstream
    Payer {
        /// Ethereum address (0x-prefixed, 40 hex chars)
        address: String,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    config::load_env_file(cli.env_file.as_deref())?;
    let p = cli.provider;
    let cfg = Config::new(
        p.api_url,
        config::api_key(p.api_key)?,
        p.fetch_timeout_secs,
        p.oracle_timeout_secs,
        p.max_hops,
    )?;

    let client = Arc::new(EtherscanClient::new(cfg.api_url.clone()));
    let service = FundFlowService::new(client.clone(), client, cfg.analysis);

    match cli.command {
        Commands::Serve { bind } => {
            let state = AppState {
                service,
                key: cfg.api_key,
            };
            server::serve(bind, state).await?;
        }
        Commands::Beneficiary { address } => {
            let aggregates = service
                .beneficiaries(&address, &cfg.api_key)
                .await
                .with_context(|| format!("Beneficiary analysis failed for {}", address))?;
            print_json(&Envelope::success(
                aggregates.into_iter().map(Beneficiary::from).collect(),
            ))?;
        }
        Commands::Payer { address } => {
            let aggregates = service
                .payers(&address, &cfg.api_key)
                .await
                .with_context(|| format!("Payer analysis failed for {}", address))?;
            print_json(&Envelope::success(
                aggregates.into_iter().map(Payer::from).collect(),
            ))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["fundflow", "serve"]).unwrap();
        assert_eq!(cli.provider.api_url, DEFAULT_API_URL);
        assert_eq!(cli.provider.max_hops, DEFAULT_MAX_HOPS);
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind.port(), 8080),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_analysis_with_global_flags() {
        let cli = Cli::try_parse_from([
            "fundflow",
            "payer",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
            "--max-hops",
            "4",
            "--api-key",
            "k",
        ])
        .unwrap();
        assert_eq!(cli.provider.max_hops, 4);
        assert_eq!(cli.provider.api_key.as_deref(), Some("k"));
        match cli.command {
            Commands::Payer { address } => {
                assert_eq!(address, "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")
            }
            _ => panic!("expected payer"),
        }
    }

    #[test]
    fn test_address_is_required() {
        assert!(Cli::try_parse_from(["fundflow", "beneficiary"]).is_err());
    }
}
