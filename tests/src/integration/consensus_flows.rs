//! # Consensus Flows
//!
//! Block log agreement with consensus messages carried by gossip:
//!
//! ```text
//! propose ──→ Prepare/Promise/Propose/Accept/Confirm as rumor extras
//!                 │
//!                 └──→ every node's block log ──→ commit at the same index
//! ```

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{Swarm, SwarmNode};
    use parking_lot::Mutex;
    use shared_types::{hash_hex, Block, BlockContent, ZERO_HASH};
    use sw_01_gossip::{MemoryNetwork, MemoryTransport};
    use sw_03_block_log::BlockLogError;

    use crate::integration::support::{fast_options, launch, wait_for};

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn chain_len(node: &SwarmNode<MemoryTransport>) -> usize {
        node.get_chain().1.len()
    }

    async fn wait_for_len(swarm: &Swarm<MemoryTransport>, len: usize) -> bool {
        wait_for(TIMEOUT, || {
            swarm.nodes().iter().all(|node| chain_len(node) == len)
        })
        .await
    }

    // =========================================================================
    // AGREEMENT
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_proposals_commit_one_block() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(3));

        let from_a = swarm.node(0).unwrap().propose(BlockContent::text("from-a")).unwrap();
        let from_b = swarm.node(1).unwrap().propose(BlockContent::text("from-b")).unwrap();
        assert_eq!(from_a.index, 0);
        assert_eq!(from_b.index, 0);

        assert!(wait_for_len(&swarm, 1).await, "index 0 did not commit everywhere");

        let tails: Vec<String> = swarm.nodes().iter().map(|node| node.get_chain().0).collect();
        assert!(tails.iter().all(|tail| *tail == tails[0]));
        assert!(tails[0] == from_a.hash_hex() || tails[0] == from_b.hash_hex());

        let committed = swarm.node(2).unwrap().blocks();
        assert!(committed[0].is_genesis());

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_chain_grows_with_linked_blocks() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(3));

        let commits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&commits);
        swarm
            .node(2)
            .unwrap()
            .on_commit(Arc::new(move |block: &Block| sink.lock().push(block.index)));

        for (round, proposer) in [0usize, 1, 2].into_iter().enumerate() {
            assert!(wait_for_len(&swarm, round).await);
            let block = swarm
                .node(proposer)
                .unwrap()
                .propose_and_wait(BlockContent::text(format!("block-{round}")), TIMEOUT)
                .await
                .unwrap();
            // Propose after a commit at i targets i + 1.
            assert_eq!(block.index, round as u64);
        }
        assert!(wait_for_len(&swarm, 3).await);

        for node in swarm.nodes() {
            let blocks = node.blocks();
            assert_eq!(blocks[0].previous_hash, ZERO_HASH);
            assert_eq!(blocks[1].previous_hash, blocks[0].hash());
            assert_eq!(blocks[2].previous_hash, blocks[1].hash());
            assert_eq!(node.get_chain().0, hash_hex(&blocks[2].hash()));
        }
        assert_eq!(*commits.lock(), vec![0, 1, 2]);

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_targets_content_is_agreed() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(3));

        let targets = BlockContent::Targets {
            targets: vec![[1.0, 2.0, 3.0], [-4.5, 0.0, 12.25]],
        };
        let committed = swarm
            .node(1)
            .unwrap()
            .propose_and_wait(targets.clone(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(committed.content, targets);

        assert!(wait_for_len(&swarm, 1).await);
        assert_eq!(swarm.node(0).unwrap().blocks()[0].content, targets);

        swarm.stop().await;
    }

    // =========================================================================
    // FAILURE MODES
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_isolated_minority_cannot_commit() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(3));
        let isolated = swarm.node(0).unwrap().local_address();
        network.set_drop_filter(move |from, to, _| from == isolated || to == isolated);

        swarm.node(0).unwrap().propose(BlockContent::text("alone")).unwrap();
        assert_eq!(
            swarm.node(0).unwrap().propose(BlockContent::text("again")),
            Err(BlockLogError::RoundInProgress { index: 0 })
        );

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(chain_len(swarm.node(0).unwrap()), 0);

        // Once the partition heals the retrying proposer gets its quorum.
        network.clear_drop_filter();
        assert!(wait_for_len(&swarm, 1).await, "proposal never committed after healing");

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_majority_commits_with_crashed_peer() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(3));
        let crashed = swarm.node(2).unwrap().local_address();
        network.set_drop_filter(move |from, to, _| from == crashed || to == crashed);

        let block = swarm
            .node(0)
            .unwrap()
            .propose_and_wait(BlockContent::text("without-c"), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(block.index, 0);

        let survivors_agree = wait_for(TIMEOUT, || {
            chain_len(swarm.node(0).unwrap()) == 1 && chain_len(swarm.node(1).unwrap()) == 1
        })
        .await;
        assert!(survivors_agree, "A and B did not both commit");
        assert_eq!(swarm.node(0).unwrap().get_chain().0, swarm.node(1).unwrap().get_chain().0);
        assert_eq!(swarm.node(0).unwrap().get_chain().0, block.hash_hex());
        assert_eq!(chain_len(swarm.node(2).unwrap()), 0);

        swarm.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lossy_concurrent_proposers_agree_on_tail() {
        let network = MemoryNetwork::new();
        let (swarm, _) = launch(&network, &fast_options(5));
        // Lose every fifth datagram; anti-entropy and retries repair the rest.
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        network.set_drop_filter(move |_, _, _| seen.fetch_add(1, Ordering::SeqCst) % 5 == 4);

        for node in swarm.nodes() {
            // A peer's Confirm may already have reached this node.
            match node.propose(BlockContent::text(format!("from-{}", node.identifier()))) {
                Ok(proposal) => assert_eq!(proposal.index, 0),
                Err(e) => assert_eq!(e, BlockLogError::RoundInProgress { index: 0 }),
            }
        }

        assert!(wait_for_len(&swarm, 1).await, "index 0 did not commit everywhere");
        assert!(counter.load(Ordering::SeqCst) >= 5, "filter never dropped a datagram");

        let tails: Vec<String> = swarm.nodes().iter().map(|node| node.get_chain().0).collect();
        assert!(tails.iter().all(|tail| *tail == tails[0]), "tails diverged: {tails:?}");
        let proposed: Vec<String> = swarm
            .nodes()
            .iter()
            .map(|node| {
                Block::genesis(BlockContent::text(format!("from-{}", node.identifier())))
                    .hash_hex()
            })
            .collect();
        assert!(proposed.contains(&tails[0]));

        network.clear_drop_filter();
        swarm.stop().await;
    }
}
