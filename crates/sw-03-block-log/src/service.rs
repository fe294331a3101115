//! # Block Log Service
//!
//! Owns the chain and the round for the next position behind one lock.
//! Messages and callbacks produced while the lock is held are collected and
//! released after it drops, so a broadcaster may loop messages straight back
//! into [`handle_message`](BlockLogApi::handle_message).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::{Block, BlockContent, ConsensusMessage};
use sw_02_consensus::{ConsensusConfig, RoundOutput, RoundPhase, TlcRound};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{BlockFactory, BlockLogResult, ChainState, DefaultBlockFactory};
use crate::ports::{BlockLogApi, CommitCallback, ConsensusBroadcaster};

struct LogState {
    chain: ChainState,
    round: TlcRound,
    /// Messages for positions whose round is not open yet.
    pending: BTreeMap<u64, Vec<(String, ConsensusMessage)>>,
    /// Bumped on every propose and abandon; retry tasks of older epochs exit.
    epoch: u64,
}

/// Everything to release once the state lock is dropped.
#[derive(Default)]
struct Effects {
    messages: Vec<ConsensusMessage>,
    committed: Vec<Block>,
}

pub struct BlockLogService<B: ConsensusBroadcaster, F: BlockFactory = DefaultBlockFactory> {
    config: ConsensusConfig,
    broadcaster: Arc<B>,
    factory: F,
    state: Mutex<LogState>,
    callbacks: RwLock<Vec<CommitCallback>>,
    rng: Mutex<StdRng>,
    shutdown_tx: watch::Sender<bool>,
    this: Weak<Self>,
}

impl<B: ConsensusBroadcaster> BlockLogService<B> {
    pub fn new(config: ConsensusConfig, broadcaster: Arc<B>) -> Arc<Self> {
        Self::with_factory(config, broadcaster, DefaultBlockFactory)
    }
}

impl<B: ConsensusBroadcaster, F: BlockFactory> BlockLogService<B, F> {
    pub fn with_factory(config: ConsensusConfig, broadcaster: Arc<B>, factory: F) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        let round = TlcRound::new(&config, 0, shared_types::ZERO_HASH);

        Arc::new_cyclic(|this| Self {
            config,
            broadcaster,
            factory,
            state: Mutex::new(LogState {
                chain: ChainState::new(),
                round,
                pending: BTreeMap::new(),
                epoch: 0,
            }),
            callbacks: RwLock::new(Vec::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            shutdown_tx,
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn tail(&self) -> Option<Block> {
        self.state.lock().chain.tail().cloned()
    }

    /// Committed blocks from genesis to tail.
    pub fn blocks(&self) -> Vec<Block> {
        self.state.lock().chain.ordered()
    }

    pub fn len(&self) -> usize {
        self.state.lock().chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().chain.is_empty()
    }

    /// Position of the open round.
    pub fn current_step(&self) -> u64 {
        self.state.lock().round.step()
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.lock().round.phase()
    }

    /// Run the retry step now instead of waiting for the timer.
    pub fn retry_round(&self) -> bool {
        let epoch = self.state.lock().epoch;
        self.retry(epoch)
    }

    /// Abandon the local proposal and stop retry timers for good.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
        self.abandon_round();
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn retry(&self, epoch: u64) -> bool {
        let output = {
            let mut state = self.state.lock();
            if state.epoch != epoch || !state.round.is_proposing() {
                return false;
            }
            state.round.on_timeout()
        };
        self.release(Effects {
            messages: output.messages,
            committed: Vec::new(),
        });
        true
    }

    fn next_timeout(&self) -> Duration {
        self.config.jittered_timeout(&mut *self.rng.lock())
    }

    fn spawn_retry(&self, epoch: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(epoch, "no async runtime, proposal will only retry via retry_round");
            return;
        };
        let this = self.this.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        runtime.spawn(async move {
            loop {
                let Some(timeout) = this.upgrade().map(|service| service.next_timeout()) else {
                    break;
                };
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(timeout) => {}
                }
                if *shutdown.borrow() {
                    break;
                }
                let Some(service) = this.upgrade() else {
                    break;
                };
                if !service.retry(epoch) {
                    break;
                }
            }
        });
    }

    /// Apply a round output: commit, open the next round, replay buffered
    /// messages, and repeat while replays keep committing.
    fn settle(&self, state: &mut LogState, mut output: RoundOutput, effects: &mut Effects) {
        loop {
            effects.messages.append(&mut output.messages);
            let Some(block) = output.committed.take() else {
                return;
            };

            let index = block.index;
            if let Err(e) = state.chain.append(block.clone()) {
                error!(index, error = %e, "committed block does not extend the chain");
                return;
            }
            info!(index, hash = %block.hash_hex(), "block committed");
            effects.committed.push(block);

            let next = state.chain.next_index();
            state.round = TlcRound::new(&self.config, next, state.chain.tail_hash());
            state.epoch += 1;

            let buffered = state.pending.remove(&next).unwrap_or_default();
            state.pending = state.pending.split_off(&next);

            output = RoundOutput::default();
            for (origin, message) in buffered {
                let mut replayed = state.round.handle(&origin, &message);
                output.messages.append(&mut replayed.messages);
                if replayed.committed.is_some() {
                    output.committed = replayed.committed;
                    break;
                }
            }
        }
    }

    fn release(&self, effects: Effects) {
        for message in effects.messages {
            trace!(kind = message.kind(), step = message.step(), ballot = %message.ballot(), "broadcasting");
            self.broadcaster.broadcast(message);
        }
        if effects.committed.is_empty() {
            return;
        }
        let callbacks: Vec<CommitCallback> = self.callbacks.read().clone();
        for block in &effects.committed {
            for callback in &callbacks {
                callback(block);
            }
        }
    }
}

impl<B: ConsensusBroadcaster, F: BlockFactory> BlockLogApi for BlockLogService<B, F> {
    fn propose(&self, content: BlockContent) -> BlockLogResult<Block> {
        let (block, output, epoch) = {
            let mut state = self.state.lock();
            let block = if state.chain.is_empty() {
                self.factory.new_genesis_block(content)
            } else {
                self.factory.new_block(
                    state.chain.next_index(),
                    state.chain.tail_hash(),
                    content,
                )
            };
            let output = state.round.propose(block.clone())?;
            state.epoch += 1;
            (block, output, state.epoch)
        };

        info!(index = block.index, kind = block.content.kind(), "proposing block");
        self.spawn_retry(epoch);
        self.release(Effects {
            messages: output.messages,
            committed: Vec::new(),
        });
        Ok(block)
    }

    fn handle_message(&self, origin: &str, message: ConsensusMessage) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            let step = message.step();
            let current = state.round.step();

            if step < current {
                trace!(origin, step, current, "ignoring message for committed index");
                return;
            }
            if step > current {
                debug!(origin, step, current, kind = message.kind(), "buffering message for future index");
                state
                    .pending
                    .entry(step)
                    .or_default()
                    .push((origin.to_string(), message));
                return;
            }

            let output = state.round.handle(origin, &message);
            self.settle(&mut state, output, &mut effects);
        }
        self.release(effects);
    }

    fn get_chain(&self) -> (String, HashMap<String, Block>) {
        let state = self.state.lock();
        (state.chain.tail_hash_hex(), state.chain.blocks().clone())
    }

    fn on_commit(&self, callback: CommitCallback) {
        self.callbacks.write().push(callback);
    }

    fn abandon_round(&self) {
        let mut state = self.state.lock();
        if state.round.is_proposing() {
            info!(index = state.round.step(), "abandoning local proposal");
        }
        state.round.abandon();
        state.epoch += 1;
    }
}
