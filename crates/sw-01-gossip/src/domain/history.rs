//! Per-origin rumor history.
//!
//! For each origin the history keeps `next_id` (lowest id not yet delivered)
//! and every stored rumor. Ids below `next_id` are delivered; ids at or above
//! it are buffered until the gap before them closes.

use std::collections::{BTreeMap, HashMap};

use shared_types::{PeerStatus, RumorMessage, StatusPacket};

/// Result of recording one incoming rumor.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The rumor filled the next slot. Holds it plus every buffered rumor it
    /// unblocked, in id order.
    Accepted(Vec<RumorMessage>),
    /// Already stored; `count` is how many copies have arrived since.
    Duplicate { count: u32 },
    /// Ahead of a gap; held back until the gap closes.
    Buffered,
    /// Id 0 is never assigned.
    Invalid,
}

/// How a remote status summary relates to the local history.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusComparison {
    /// The remote lacks this rumor, the lowest one it is missing.
    LocalAhead(RumorMessage),
    /// The remote has rumors the local node has not delivered.
    RemoteAhead,
    InSync,
}

#[derive(Debug)]
struct StoredRumor {
    rumor: RumorMessage,
    duplicates: u32,
}

#[derive(Debug)]
struct OriginLog {
    next_id: u32,
    rumors: BTreeMap<u32, StoredRumor>,
}

impl Default for OriginLog {
    fn default() -> Self {
        Self {
            next_id: 1,
            rumors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RumorHistory {
    origins: HashMap<String, OriginLog>,
}

impl RumorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rumor: RumorMessage) -> RecordOutcome {
        if rumor.id == 0 {
            return RecordOutcome::Invalid;
        }

        let log = self.origins.entry(rumor.origin.clone()).or_default();

        if let Some(stored) = log.rumors.get_mut(&rumor.id) {
            stored.duplicates += 1;
            return RecordOutcome::Duplicate {
                count: stored.duplicates,
            };
        }

        let id = rumor.id;
        log.rumors.insert(
            id,
            StoredRumor {
                rumor,
                duplicates: 0,
            },
        );

        if id != log.next_id {
            return RecordOutcome::Buffered;
        }

        let mut delivered = Vec::new();
        while let Some(stored) = log.rumors.get(&log.next_id) {
            delivered.push(stored.rumor.clone());
            log.next_id += 1;
        }
        RecordOutcome::Accepted(delivered)
    }

    /// Lowest undelivered id for `origin`, 1 if never heard of.
    pub fn next_id(&self, origin: &str) -> u32 {
        self.origins.get(origin).map_or(1, |log| log.next_id)
    }

    /// A delivered rumor.
    pub fn get(&self, origin: &str, id: u32) -> Option<&RumorMessage> {
        let log = self.origins.get(origin)?;
        if id >= log.next_id {
            return None;
        }
        log.rumors.get(&id).map(|stored| &stored.rumor)
    }

    /// Status summary, sorted by origin.
    pub fn status(&self) -> StatusPacket {
        let mut want: Vec<PeerStatus> = self
            .origins
            .iter()
            .map(|(identifier, log)| PeerStatus {
                identifier: identifier.clone(),
                next_id: log.next_id,
            })
            .collect();
        want.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        StatusPacket { want }
    }

    /// Compare with a remote summary. Missing rumors on the remote side take
    /// precedence over missing ones locally.
    pub fn compare(&self, remote: &StatusPacket) -> StatusComparison {
        let mut origins: Vec<&String> = self.origins.keys().collect();
        origins.sort();

        for origin in origins {
            let wanted = remote.next_id(origin);
            if let Some(rumor) = self.get(origin, wanted) {
                return StatusComparison::LocalAhead(rumor.clone());
            }
        }

        let remote_ahead = remote
            .want
            .iter()
            .any(|status| status.next_id > self.next_id(&status.identifier));
        if remote_ahead {
            StatusComparison::RemoteAhead
        } else {
            StatusComparison::InSync
        }
    }
}
