//! Next-hop routing table.
//!
//! One entry per destination. An entry only moves to a new next hop when a
//! rumor from the destination carries a strictly higher id than the one that
//! set the current entry, and it never points back at the local node.

use std::collections::HashMap;
use std::net::SocketAddr;

use shared_types::RouteEntry;

#[derive(Debug)]
pub struct RoutingTable {
    local_addr: SocketAddr,
    routes: HashMap<String, RouteEntry>,
}

impl RoutingTable {
    pub fn new(local_addr: SocketAddr) -> Self {
        Self {
            local_addr,
            routes: HashMap::new(),
        }
    }

    /// Apply a rumor `id` from `destination` that arrived via `next_hop`.
    /// Returns true if the table changed.
    pub fn update(&mut self, destination: &str, id: u32, next_hop: SocketAddr) -> bool {
        if next_hop == self.local_addr {
            return false;
        }
        if let Some(entry) = self.routes.get(destination) {
            if id <= entry.last_id {
                return false;
            }
        }
        self.routes.insert(
            destination.to_string(),
            RouteEntry {
                next_hop,
                last_id: id,
            },
        );
        true
    }

    /// Point `destination` at `next_hop`, keeping the freshness mark.
    pub fn set(&mut self, destination: &str, next_hop: SocketAddr) -> bool {
        if next_hop == self.local_addr {
            return false;
        }
        let last_id = self.routes.get(destination).map_or(0, |entry| entry.last_id);
        self.routes
            .insert(destination.to_string(), RouteEntry { next_hop, last_id });
        true
    }

    pub fn next_hop(&self, destination: &str) -> Option<SocketAddr> {
        self.routes.get(destination).map(|entry| entry.next_hop)
    }

    pub fn get(&self, destination: &str) -> Option<&RouteEntry> {
        self.routes.get(destination)
    }

    pub fn snapshot(&self) -> HashMap<String, RouteEntry> {
        self.routes.clone()
    }

    pub fn destinations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_fresher_id_wins() {
        let mut table = RoutingTable::new(addr(1));
        assert!(table.update("A", 5, addr(2)));
        assert!(!table.update("A", 3, addr(3)));
        assert!(!table.update("A", 5, addr(3)));

        let entry = table.get("A").unwrap();
        assert_eq!(entry.last_id, 5);
        assert_eq!(entry.next_hop, addr(2));

        assert!(table.update("A", 6, addr(3)));
        assert_eq!(table.next_hop("A"), Some(addr(3)));
    }

    #[test]
    fn test_never_routes_through_self() {
        let mut table = RoutingTable::new(addr(1));
        assert!(!table.update("A", 1, addr(1)));
        assert!(!table.set("A", addr(1)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_manual_route_keeps_freshness() {
        let mut table = RoutingTable::new(addr(1));
        table.update("A", 7, addr(2));
        assert!(table.set("A", addr(3)));
        assert_eq!(table.get("A").unwrap().last_id, 7);
        assert!(!table.update("A", 7, addr(2)));
    }

    #[test]
    fn test_destinations_sorted() {
        let mut table = RoutingTable::new(addr(1));
        table.update("C", 1, addr(2));
        table.update("B", 1, addr(2));
        assert_eq!(table.destinations(), vec!["B", "C"]);
        assert_eq!(table.len(), 2);
    }
}
