//! Veil peer - demo entry point
//!
//! Brings up a single peer with an in-memory ledger, sets up an auction
//! enclave, registers it and runs a sealed-bid auction through the
//! confidential invocation and endorsement path.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veil_attestation::SoftwareQuoteIssuer;
use veil_enclave::SoftwareEnclave;
use veil_peer::chaincode::enclave::SETUP;
use veil_peer::{AuctionProgram, AuctionResult, Peer, PeerConfig, Session};
use veil_storage::MemoryLedger;
use veil_types::{EndorsementPolicy, ProgramDefinition, SerializedIdentity};

#[derive(Debug, Parser)]
#[command(name = "veil-peer", version, about = "Veil peer with an enclave-backed auction")]
struct Args {
    /// Peer configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Program id the auction is deployed under
    #[arg(long, default_value = "auction")]
    program_id: String,

    /// Hex enclave measurement committed in the program definition
    #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
    measurement: String,

    /// Auction name
    #[arg(long, default_value = "MyAuction")]
    auction: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = PeerConfig::load(args.config.as_deref()).context("loading peer config")?;
    info!(
        channel = %config.channel_id,
        operator = %config.operator_id,
        endpoint = %config.host_endpoint,
        mode = %config.attestation.mode,
        "Starting Veil peer"
    );

    let csp = veil_crypto::create_default_csp()?;
    let ledger = MemoryLedger::new();
    ledger.define_program(
        ProgramDefinition::new(&args.program_id, &args.measurement, 1)
            .with_policy(EndorsementPolicy::any_of([config.operator_id.clone()])),
    );

    let operator = SerializedIdentity::new(config.operator_id.clone(), Vec::new());
    let peer = Peer::from_config(config, ledger, csp.clone())?;
    let enclave = SoftwareEnclave::new(
        Arc::new(AuctionProgram),
        csp.clone(),
        Arc::new(SoftwareQuoteIssuer::from_hex(&args.measurement)?),
    );
    peer.install(&args.program_id, Arc::new(enclave))?;

    let session = Session::new(&peer, csp, operator, &args.program_id);
    let enclave_id = session.call(&args.program_id, SETUP, &[]).await?;
    info!(enclave_id = %String::from_utf8_lossy(&enclave_id), "Enclave registered");

    let name = args.auction.as_str();
    session.submit("init", &[name]).await?;
    for (bidder, value) in [("alice", "200"), ("bob", "350"), ("carol", "275")] {
        let reply = session.submit("submit", &[name, bidder, value]).await?;
        info!(bidder, reply = %String::from_utf8_lossy(&reply), "Bid endorsed");
    }
    session.submit("close", &[name]).await?;

    let result: AuctionResult = serde_json::from_slice(&session.submit("eval", &[name]).await?)
        .context("decoding auction result")?;
    info!(auction = name, winner = %result.winner, value = result.value, "Auction evaluated");
    Ok(())
}
