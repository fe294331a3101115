//! Vote counting by distinct origin.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use shared_types::Block;

/// Votes for values grouped by key; each origin counts once per key.
#[derive(Debug)]
pub struct Tally<K> {
    votes: HashMap<K, (Block, HashSet<String>)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            votes: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote and return the number of distinct voters for `key`.
    /// The first value seen for a key is kept.
    pub fn record(&mut self, key: K, value: &Block, origin: &str) -> usize {
        let (_, voters) = self
            .votes
            .entry(key)
            .or_insert_with(|| (value.clone(), HashSet::new()));
        voters.insert(origin.to_string());
        voters.len()
    }

    pub fn count(&self, key: &K) -> usize {
        self.votes.get(key).map_or(0, |(_, voters)| voters.len())
    }

    pub fn value(&self, key: &K) -> Option<&Block> {
        self.votes.get(key).map(|(value, _)| value)
    }
}
