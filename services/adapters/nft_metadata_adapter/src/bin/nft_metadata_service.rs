//! NFT Metadata Service
//!
//! Resolves the metadata for one or more NFT URIs from the command line and
//! prints the normalized records as JSON.

use anyhow::Result;
use clap::Parser;
use nft_metadata_adapter::{MetadataConfig, MetadataResolver};
use std::path::PathBuf;
use tracing::info;
use types::decode_hex_uri;

#[derive(Debug, Parser)]
#[command(name = "nft_metadata_service", about = "Resolve NFT metadata URIs")]
struct Args {
    /// URIs to resolve (plain or hex-encoded as stored on ledger)
    #[arg(required = true)]
    uris: Vec<String>,

    /// NFT id used as a hint for the per-item metadata service
    #[arg(long)]
    nft_id: Option<String>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Environment overlay (config/environments/<env>.toml)
    #[arg(long)]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nft_metadata_adapter=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("🚀 Starting NFT Metadata Service");

    let settings = ledger_config::load_config(args.config.as_deref(), args.env.as_deref())?;
    let config = MetadataConfig::from_settings(&settings.metadata, &settings.cache);
    info!("📁 Cache directory: {:?}", config.cache_dir);

    let resolver = MetadataResolver::new(config)?;

    for raw in &args.uris {
        let uri = decode_hex_uri(raw);
        let resolution = resolver
            .resolve_detailed(&uri, args.nft_id.as_deref())
            .await;
        info!("Resolved {} via {}", uri, resolution.origin);
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "uri": uri,
                "resolvedUri": resolution.resolved_uri,
                "source": resolution.origin.to_string(),
                "metadata": resolution.record,
            }))?
        );
    }

    let metrics = resolver.get_metrics().await;
    info!("📊 Metrics: {:?}", metrics);

    resolver.save_cache().await?;

    Ok(())
}
