//! Ledger Query CLI
//!
//! Runs one query against the configured networks and prints the response
//! envelope as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_query::LedgerQueryService;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::OffersRequest;

#[derive(Debug, Parser)]
#[command(name = "ledger_query", about = "Query tokens and NFTs on XRPL-family ledgers")]
struct Args {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environment overlay (config/environments/<env>.toml)
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Most-held issued tokens
    Tokens {
        #[arg(long, default_value = "xrpl")]
        network: String,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// NFT listing with metadata and offers
    Nfts {
        #[arg(long, default_value = "xrpl")]
        network: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Open offers for one NFT
    Offers {
        #[arg(long, default_value = "xrpl")]
        network: String,
        #[arg(long)]
        nft_id: String,
        #[arg(long)]
        include_expired: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ledger_config::load_config(args.config.as_deref(), args.env.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Starting ledger query");

    let service = LedgerQueryService::new(Arc::new(config))?;

    match args.command {
        Command::Tokens { network, limit } => {
            print_json(&service.load_tokens(&network, limit).await)?;
        }
        Command::Nfts { network, limit } => {
            print_json(&service.load_nfts(&network, limit).await)?;
        }
        Command::Offers {
            network,
            nft_id,
            include_expired,
        } => {
            let request = OffersRequest {
                network,
                nft_id,
                include_expired,
            };
            print_json(&service.fetch_nft_offers(&request).await)?;
        }
    }

    info!("📊 Cache metrics: {:?}", service.cache().metrics());
    service.clients().disconnect_all().await;

    Ok(())
}
