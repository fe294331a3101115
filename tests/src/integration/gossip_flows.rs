//! # Gossip Flows
//!
//! Dissemination across a multi-hop swarm:
//!
//! ```text
//!   A ── B ── C ── D          (line: routes to A go through the neighbour)
//!
//!   A ── C ── B               (rumor 2 from A to C lost once, repaired by
//!                              the status exchange)
//! ```

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{SwarmOptions, Topology};
    use shared_types::GossipPacket;
    use sw_01_gossip::config::MAX_DATAGRAM_SIZE;
    use sw_01_gossip::{MemoryNetwork, PacketCodec};

    use crate::integration::support::{fast_options, launch, wait_for};

    const TIMEOUT: Duration = Duration::from_secs(5);

    // =========================================================================
    // DISSEMINATION
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rumor_reaches_every_peer_exactly_once() {
        let network = MemoryNetwork::new();
        let options = fast_options(4).with_topology(Topology::Line);
        let (swarm, logs) = launch(&network, &options);

        assert_eq!(swarm.node(0).unwrap().submit("hello"), 1);

        let all_delivered = wait_for(TIMEOUT, || logs.iter().all(|log| log.len() == 1)).await;
        assert!(all_delivered, "rumor did not reach every peer");

        // Let anti-entropy run a few rounds; nothing is delivered twice.
        tokio::time::sleep(Duration::from_millis(300)).await;
        for log in &logs {
            assert_eq!(
                log.entries(),
                vec![("A".to_string(), 1, "hello".to_string())]
            );
        }

        // Every other peer routes to A through the neighbour towards A.
        for index in 1..4 {
            let routes = swarm.node(index).unwrap().routes();
            let route = routes.get("A").expect("route to A");
            assert_eq!(route.next_hop, swarm.node(index - 1).unwrap().local_address());
            assert_eq!(route.last_id, 1);
        }
        assert!(!swarm.node(0).unwrap().routes().contains_key("A"));

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_rumor_is_delivered_everywhere() {
        let network = MemoryNetwork::new();
        let options = SwarmOptions {
            route_timer: Duration::from_millis(30),
            ..fast_options(3).with_topology(Topology::Line)
        };
        let (swarm, logs) = launch(&network, &options);

        let id = swarm.node(1).unwrap().submit("");

        let all_delivered = wait_for(TIMEOUT, || {
            logs.iter()
                .all(|log| log.entries().contains(&("B".to_string(), id, String::new())))
        })
        .await;
        assert!(all_delivered, "empty rumor was not delivered on every node");

        // Route rumors from the same origins never show up.
        tokio::time::sleep(Duration::from_millis(200)).await;
        for log in &logs {
            assert_eq!(log.entries(), vec![("B".to_string(), id, String::new())]);
        }

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rumors_from_many_origins_keep_per_origin_order() {
        let network = MemoryNetwork::new();
        let (swarm, logs) = launch(&network, &fast_options(3));

        for round in 0..3 {
            for node in swarm.nodes() {
                node.submit(&format!("{}-{round}", node.identifier()));
            }
        }

        let all_delivered = wait_for(TIMEOUT, || logs.iter().all(|log| log.len() == 9)).await;
        assert!(all_delivered, "not every rumor was delivered");

        for log in &logs {
            for origin in ["A", "B", "C"] {
                let ids: Vec<u32> = log
                    .entries()
                    .into_iter()
                    .filter(|(from, _, _)| from == origin)
                    .map(|(_, id, _)| id)
                    .collect();
                assert_eq!(ids, vec![1, 2, 3], "origin {origin}");
            }
        }
        swarm.stop().await;
    }

    // =========================================================================
    // LOSS REPAIR
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lost_rumor_is_repaired_in_order() {
        let network = MemoryNetwork::new();
        // A ↔ C ↔ B
        let options = fast_options(3).with_topology(Topology::Edges(vec![(0, 2), (2, 1)]));
        let (swarm, logs) = launch(&network, &options);

        let a = swarm.node(0).unwrap().local_address();
        let c = swarm.node(2).unwrap().local_address();
        let codec = PacketCodec::new(MAX_DATAGRAM_SIZE);
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dropped);
        network.set_drop_filter(move |from: SocketAddr, to: SocketAddr, payload: &[u8]| {
            if from != a || to != c {
                return false;
            }
            let is_second = matches!(
                codec.decode(payload),
                Ok(GossipPacket::Rumor(rumor)) if rumor.origin == "A" && rumor.id == 2
            );
            // Lose the first copy only.
            is_second && !flag.swap(true, Ordering::SeqCst)
        });

        for text in ["one", "two", "three"] {
            swarm.node(0).unwrap().submit(text);
        }

        let repaired = wait_for(TIMEOUT, || logs[2].len() == 3 && logs[1].len() == 3).await;
        assert!(repaired, "C delivered {:?}", logs[2].texts());
        assert!(dropped.load(Ordering::SeqCst), "filter never dropped rumor 2");

        let expected = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        assert_eq!(logs[2].texts(), expected);
        assert_eq!(logs[1].texts(), expected);

        network.clear_drop_filter();
        swarm.stop().await;
    }

    // =========================================================================
    // PRIVATE MESSAGES
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_private_message_follows_routes() {
        let network = MemoryNetwork::new();
        let options = SwarmOptions {
            route_timer: Duration::from_millis(100),
            ..fast_options(3).with_topology(Topology::Line)
        };
        let (swarm, _) = launch(&network, &options);

        let received = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        swarm
            .node(2)
            .unwrap()
            .register_callback(Arc::new(move |origin: &str, packet: &GossipPacket| {
                if let GossipPacket::Private(message) = packet {
                    sink.lock().push((origin.to_string(), message.data.clone()));
                }
            }));

        let routed = wait_for(TIMEOUT, || swarm.node(0).unwrap().routes().contains_key("C")).await;
        assert!(routed, "A never learned a route to C");
        assert_eq!(
            swarm.node(0).unwrap().routes()["C"].next_hop,
            swarm.node(1).unwrap().local_address()
        );

        swarm.node(0).unwrap().send_private("C", b"waypoint".to_vec(), 10);
        let delivered = wait_for(TIMEOUT, || !received.lock().is_empty()).await;
        assert!(delivered, "private message never arrived");
        assert_eq!(
            *received.lock(),
            vec![("A".to_string(), b"waypoint".to_vec())]
        );

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_private_message_dies_at_hop_limit() {
        let network = MemoryNetwork::new();
        let options = SwarmOptions {
            route_timer: Duration::from_millis(100),
            ..fast_options(3).with_topology(Topology::Line)
        };
        let (swarm, _) = launch(&network, &options);

        let received = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&received);
        swarm
            .node(2)
            .unwrap()
            .register_callback(Arc::new(move |_: &str, packet: &GossipPacket| {
                if matches!(packet, GossipPacket::Private(_)) {
                    sink.store(true, Ordering::SeqCst);
                }
            }));

        let routed = wait_for(TIMEOUT, || swarm.node(0).unwrap().routes().contains_key("C")).await;
        assert!(routed);

        // A forwards with limit 1; B decrements to 0 and drops it.
        swarm.node(0).unwrap().send_private("C", b"x".to_vec(), 2);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!received.load(Ordering::SeqCst));

        swarm.stop().await;
    }
}
