//! # Node Configuration
//!
//! Configuration for one swarm node, loaded from a TOML file and then
//! overridden from `SWARM_*` environment variables.
//!
//! ```toml
//! [gossip]
//! identifier = "drone-a"
//! address = "127.0.0.1:5000"
//! peers = ["127.0.0.1:5001", "127.0.0.1:5002"]
//! anti_entropy_secs = 10
//! route_timer_secs = 0
//!
//! [consensus]
//! num_participants = 3
//! node_index = 0
//! paxos_retry = 1
//! round_timeout_ms = 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sw_01_gossip::config::MAX_DATAGRAM_SIZE;
use sw_01_gossip::GossipConfig;
use sw_02_consensus::ConsensusConfig;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Gossip layer configuration.
    pub gossip: GossipSection,
    /// Consensus and block log configuration.
    pub consensus: ConsensusSection,
}

/// Gossip configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GossipSection {
    /// Name rumors from this node carry as origin.
    pub identifier: String,
    /// UDP bind address.
    pub address: String,
    /// Initial peers, `host:port`.
    pub peers: Vec<String>,
    /// Anti-entropy period in seconds. Zero disables it.
    pub anti_entropy_secs: u64,
    /// Route rumor period in seconds. Zero disables it.
    pub route_timer_secs: u64,
    /// Largest datagram sent or accepted.
    pub max_datagram_size: usize,
}

impl Default for GossipSection {
    fn default() -> Self {
        Self {
            identifier: "node".to_string(),
            address: "127.0.0.1:5000".to_string(),
            peers: Vec::new(),
            anti_entropy_secs: 10,
            route_timer_secs: 0,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// Consensus configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsensusSection {
    /// Size of the swarm; the quorum is a strict majority of it.
    pub num_participants: usize,
    /// This node's position in the swarm, used to break ballot ties.
    pub node_index: u32,
    /// Ballot number increment on retry.
    pub paxos_retry: u64,
    /// Base retry deadline in milliseconds.
    pub round_timeout_ms: u64,
}

impl Default for ConsensusSection {
    fn default() -> Self {
        Self {
            num_participants: 1,
            node_index: 0,
            paxos_retry: 1,
            round_timeout_ms: 1_000,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&document)
    }

    /// Apply `SWARM_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `SWARM_IDENTIFIER` | `gossip.identifier` |
    /// | `SWARM_ADDRESS` | `gossip.address` |
    /// | `SWARM_PEERS` | `gossip.peers`, comma separated |
    /// | `SWARM_ANTI_ENTROPY_SECS` | `gossip.anti_entropy_secs` |
    /// | `SWARM_ROUTE_TIMER_SECS` | `gossip.route_timer_secs` |
    /// | `SWARM_NUM_PARTICIPANTS` | `consensus.num_participants` |
    /// | `SWARM_NODE_INDEX` | `consensus.node_index` |
    /// | `SWARM_PAXOS_RETRY` | `consensus.paxos_retry` |
    /// | `SWARM_ROUND_TIMEOUT_MS` | `consensus.round_timeout_ms` |
    pub fn apply_lookup(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(identifier) = lookup("SWARM_IDENTIFIER") {
            self.gossip.identifier = identifier;
        }
        if let Some(address) = lookup("SWARM_ADDRESS") {
            self.gossip.address = address;
        }
        if let Some(peers) = lookup("SWARM_PEERS") {
            self.gossip.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(str::to_string)
                .collect();
        }
        override_parsed(&lookup, "SWARM_ANTI_ENTROPY_SECS", &mut self.gossip.anti_entropy_secs)?;
        override_parsed(&lookup, "SWARM_ROUTE_TIMER_SECS", &mut self.gossip.route_timer_secs)?;
        override_parsed(&lookup, "SWARM_NUM_PARTICIPANTS", &mut self.consensus.num_participants)?;
        override_parsed(&lookup, "SWARM_NODE_INDEX", &mut self.consensus.node_index)?;
        override_parsed(&lookup, "SWARM_PAXOS_RETRY", &mut self.consensus.paxos_retry)?;
        override_parsed(&lookup, "SWARM_ROUND_TIMEOUT_MS", &mut self.consensus.round_timeout_ms)?;
        Ok(())
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gossip.identifier.is_empty() {
            return Err(ConfigError::Invalid("gossip.identifier must not be empty".into()));
        }
        if self.consensus.num_participants == 0 {
            return Err(ConfigError::Invalid(
                "consensus.num_participants must be at least 1".into(),
            ));
        }
        if self.consensus.node_index as usize >= self.consensus.num_participants {
            return Err(ConfigError::Invalid(format!(
                "consensus.node_index {} out of range for {} participants",
                self.consensus.node_index, self.consensus.num_participants
            )));
        }
        if self.consensus.paxos_retry == 0 {
            return Err(ConfigError::Invalid("consensus.paxos_retry must be at least 1".into()));
        }
        Ok(())
    }

    pub fn to_gossip_config(&self) -> GossipConfig {
        GossipConfig {
            identifier: self.gossip.identifier.clone(),
            anti_entropy: Duration::from_secs(self.gossip.anti_entropy_secs),
            route_timer: Duration::from_secs(self.gossip.route_timer_secs),
            max_datagram_size: self.gossip.max_datagram_size,
        }
    }

    pub fn to_consensus_config(&self) -> ConsensusConfig {
        ConsensusConfig {
            num_participants: self.consensus.num_participants,
            node_index: self.consensus.node_index,
            paxos_retry: self.consensus.paxos_retry,
            round_timeout: Duration::from_millis(self.consensus.round_timeout_ms),
        }
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) -> Result<(), ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    *field = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
    })?;
    Ok(())
}
