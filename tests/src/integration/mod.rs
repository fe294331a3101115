//! Cross-subsystem scenarios: gossip, consensus and block log wired together
//! through `node-runtime`.

pub mod consensus_flows;
pub mod gossip_flows;
pub mod support;
