//! Adapters connecting subsystem ports to each other.

pub mod broadcaster;

pub use broadcaster::GossipBroadcaster;
