//! # Shared Types Crate
//!
//! Types that travel between peers or between subsystems of one peer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: packets, consensus sub-messages and blocks
//!   are defined once here and reused by gossip, consensus and the block log.
//! - **Closed Variants**: every polymorphic payload is a serde-tagged enum, so
//!   decoding an unknown kind fails instead of producing a half-filled value.
//! - **Immutable Blocks**: a [`Block`] is never mutated after construction;
//!   its hash covers index, parent link and content.

pub mod consensus;
pub mod entities;
pub mod packets;

pub use consensus::*;
pub use entities::*;
pub use packets::*;
