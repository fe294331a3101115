//! # Swarm Node
//!
//! Runs one swarm node over UDP until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Install telemetry (`SWARM_LOG_LEVEL`, `SWARM_JSON_LOGS`)
//! 2. Load configuration from the file given as first argument or
//!    `SWARM_CONFIG`, then apply `SWARM_*` overrides
//! 3. Bind the UDP socket and register peers
//! 4. Start gossip tasks
//!
//! Every committed block is logged; rumors from other nodes are logged at
//! debug level.

use std::sync::Arc;

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, SwarmNode};
use shared_types::{Block, GossipPacket};
use swarm_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{debug, info};

/// Load configuration from file (if any) and environment.
fn load_config() -> Result<NodeConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SWARM_CONFIG").ok());

    let mut config = match &path {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => NodeConfig::default(),
    };
    config
        .apply_env()
        .context("invalid SWARM_* environment override")?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_telemetry(&TelemetryConfig::for_node(&config.gossip.identifier))?;

    let node = SwarmNode::bind(&config)
        .await
        .with_context(|| format!("failed to start node on {}", config.gossip.address))?;

    node.register_callback(Arc::new(|origin: &str, packet: &GossipPacket| match packet {
        GossipPacket::Rumor(rumor) if rumor.extra.is_none() => {
            debug!(origin, id = rumor.id, text = %rumor.text, "rumor");
        }
        GossipPacket::Private(message) => {
            debug!(origin, bytes = message.data.len(), "private message");
        }
        _ => {}
    }));
    node.on_commit(Arc::new(|block: &Block| {
        info!(index = block.index, hash = %block.hash_hex(), kind = block.content.kind(), "chain extended");
    }));

    node.start()?;
    info!(
        identifier = %node.identifier(),
        peers = node.peers().len(),
        "Node is running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c().await?;

    node.stop().await;
    Ok(())
}
