//! # Gossip Engine
//!
//! Wires the rumor history, routing table and peer set to a [`Transport`].
//!
//! ## Tasks
//!
//! ```text
//! transport ──recv──→ [receiver] ──decode──→ inbox ──→ [dispatcher] ──→ handlers
//!                                              ↑
//! submit / submit_extra / send_private ────────┘
//!
//! [anti-entropy]  every `anti_entropy`: status → one random peer
//! [route-rumor]   at start, then every `route_timer`: empty rumor
//! ```
//!
//! Local submissions go through the same inbox as network packets, so the
//! dispatcher is the only task that mutates gossip state and callbacks never
//! re-enter a handler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{
    ConsensusMessage, GossipPacket, PrivateMessage, RouteEntry, RumorMessage, StatusPacket,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::codec::PacketCodec;
use crate::config::GossipConfig;
use crate::dispatcher::{dispatch, PacketHandler};
use crate::domain::{resolve, PeerSet, RecordOutcome, RoutingTable, RumorHistory, StatusComparison};
use crate::error::GossipError;
use crate::ports::{GossipApi, GossipCallback, Transport, TransportError};

type Inbound = (GossipPacket, SocketAddr);

/// One gossip node bound to a transport.
pub struct GossipEngine<T: Transport> {
    config: GossipConfig,
    transport: Arc<T>,
    codec: PacketCodec,
    local_addr: SocketAddr,
    peers: RwLock<PeerSet>,
    routes: RwLock<RoutingTable>,
    history: Mutex<RumorHistory>,
    /// Last id assigned to a local rumor.
    local_id: Mutex<u32>,
    /// Last rumor sent to each peer, continued on an in-sync status.
    mongering: Mutex<HashMap<SocketAddr, RumorMessage>>,
    callbacks: RwLock<Vec<GossipCallback>>,
    rng: Mutex<StdRng>,
    inbox_tx: mpsc::UnboundedSender<Inbound>,
    inbox_rx: Mutex<Option<mpsc::UnboundedReceiver<Inbound>>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Transport> GossipEngine<T> {
    pub fn new(config: GossipConfig, transport: T) -> Self {
        let local_addr = transport.local_addr();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            codec: PacketCodec::new(config.max_datagram_size),
            config,
            transport: Arc::new(transport),
            local_addr,
            peers: RwLock::new(PeerSet::new(local_addr)),
            routes: RwLock::new(RoutingTable::new(local_addr)),
            history: Mutex::new(RumorHistory::new()),
            local_id: Mutex::new(0),
            mongering: Mutex::new(HashMap::new()),
            callbacks: RwLock::new(Vec::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            inbox_tx,
            inbox_rx: Mutex::new(Some(inbox_rx)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    /// Spawn the receiver, dispatcher and timer tasks.
    ///
    /// Must be called from within a tokio runtime. An engine runs at most
    /// once; a stopped engine cannot be restarted.
    pub fn start(self: &Arc<Self>) -> Result<(), GossipError> {
        if *self.shutdown_tx.borrow() {
            return Err(GossipError::AlreadyStarted);
        }
        let inbox_rx = self
            .inbox_rx
            .lock()
            .take()
            .ok_or(GossipError::AlreadyStarted)?;

        let mut tasks = self.tasks.lock();
        tasks.push(self.spawn_receiver());
        tasks.push(self.spawn_dispatcher(inbox_rx));

        if self.config.anti_entropy_enabled() {
            let engine = Arc::clone(self);
            tasks.push(self.spawn_ticker(self.config.anti_entropy, true, move || {
                engine.anti_entropy_tick()
            }));
        }
        if self.config.route_rumors_enabled() {
            let engine = Arc::clone(self);
            tasks.push(self.spawn_ticker(self.config.route_timer, false, move || {
                engine.submit_route_rumor();
            }));
        }

        info!(
            identifier = %self.config.identifier,
            address = %self.local_addr,
            anti_entropy_ms = self.config.anti_entropy.as_millis() as u64,
            route_timer_ms = self.config.route_timer.as_millis() as u64,
            "Gossip engine started"
        );
        Ok(())
    }

    /// Signal every task to stop and wait for them to finish.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);
        let handles = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "gossip task ended abnormally");
            }
        }
        info!(identifier = %self.config.identifier, "Gossip engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inbox_rx.lock().is_none() && !*self.shutdown_tx.borrow()
    }

    /// Current anti-entropy summary.
    pub fn status(&self) -> StatusPacket {
        self.history.lock().status()
    }

    /// Lowest id not yet delivered from `origin`.
    pub fn next_id(&self, origin: &str) -> u32 {
        self.history.lock().next_id(origin)
    }

    // =========================================================================
    // TASKS
    // =========================================================================

    fn spawn_receiver(&self) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let codec = self.codec;
        let inbox = self.inbox_tx.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    received = transport.recv_from() => match received {
                        Ok((bytes, from)) => match codec.decode(&bytes) {
                            Ok(packet) => {
                                if inbox.send((packet, from)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!(peer = %from, error = %e, "discarding packet"),
                        },
                        Err(TransportError::Closed) => break,
                        Err(e) => warn!(error = %e, "receive failed"),
                    },
                }
            }
        })
    }

    fn spawn_dispatcher(
        self: &Arc<Self>,
        mut inbox: mpsc::UnboundedReceiver<Inbound>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    next = inbox.recv() => match next {
                        Some((packet, from)) => dispatch(&*engine, packet, from),
                        None => break,
                    },
                }
            }
        })
    }

    fn spawn_ticker<F>(&self, period: Duration, skip_first: bool, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if skip_first {
                ticker.tick().await;
            }
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => tick(),
                }
            }
        })
    }

    fn anti_entropy_tick(&self) {
        let target = self.choose_peer(&[]);
        if let Some(peer) = target {
            trace!(peer = %peer, "anti-entropy status push");
            self.send_status(peer);
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn enqueue_local(&self, packet: GossipPacket) {
        if self.inbox_tx.send((packet, self.local_addr)).is_err() {
            debug!("gossip engine stopped; local packet dropped");
        }
    }

    fn next_local_rumor(&self, build: impl FnOnce(u32) -> RumorMessage) -> u32 {
        // Held across enqueue so ids reach the dispatcher in order.
        let mut last = self.local_id.lock();
        *last += 1;
        let id = *last;
        self.enqueue_local(GossipPacket::Rumor(build(id)));
        id
    }

    fn submit_route_rumor(&self) -> u32 {
        let origin = &self.config.identifier;
        self.next_local_rumor(|id| RumorMessage::route(origin.clone(), id))
    }

    fn send_packet(&self, packet: &GossipPacket, target: SocketAddr) {
        let bytes = match self.codec.encode(packet) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(kind = packet.kind(), error = %e, "cannot encode packet");
                return;
            }
        };
        if let Err(e) = self.transport.send_to(&bytes, target) {
            debug!(peer = %target, error = %e, "send failed");
        }
    }

    fn send_status(&self, target: SocketAddr) {
        let status = self.history.lock().status();
        self.send_packet(&GossipPacket::Status(status), target);
    }

    fn choose_peer(&self, exclude: &[SocketAddr]) -> Option<SocketAddr> {
        let peers = self.peers.read();
        peers.choose(&mut *self.rng.lock(), exclude)
    }

    fn flip_coin(&self, probability: f64) -> bool {
        self.rng.lock().gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Forward `rumor` to one random peer outside `exclude`.
    fn monger(&self, rumor: RumorMessage, exclude: &[SocketAddr]) {
        let Some(peer) = self.choose_peer(exclude) else {
            trace!(origin = %rumor.origin, id = rumor.id, "no peer to monger to");
            return;
        };
        trace!(origin = %rumor.origin, id = rumor.id, peer = %peer, "mongering");
        let packet = GossipPacket::Rumor(rumor.clone());
        self.mongering.lock().insert(peer, rumor);
        self.send_packet(&packet, peer);
    }

    fn update_route(&self, origin: &str, id: u32, from: SocketAddr) {
        if from == self.local_addr || origin == self.config.identifier {
            return;
        }
        if self.routes.write().update(origin, id, from) {
            debug!(destination = %origin, next_hop = %from, id, "route updated");
        }
    }

    fn deliver(&self, origin: &str, packet: &GossipPacket) {
        let callbacks: Vec<GossipCallback> = self.callbacks.read().clone();
        for callback in callbacks {
            callback(origin, packet);
        }
    }
}

// =============================================================================
// PACKET HANDLERS
// =============================================================================

impl<T: Transport> PacketHandler for GossipEngine<T> {
    fn on_rumor(&self, rumor: RumorMessage, from: SocketAddr) {
        let remote = from != self.local_addr;
        if remote {
            self.peers.write().insert(from);
        }

        let outcome = self.history.lock().record(rumor.clone());
        match outcome {
            RecordOutcome::Invalid => {
                debug!(origin = %rumor.origin, peer = %from, "ignoring rumor with id 0");
                return;
            }
            RecordOutcome::Accepted(delivered) => {
                self.update_route(&rumor.origin, rumor.id, from);
                for accepted in delivered {
                    if accepted.is_route_rumor() {
                        continue;
                    }
                    debug!(origin = %accepted.origin, id = accepted.id, "rumor delivered");
                    let origin = accepted.origin.clone();
                    self.deliver(&origin, &GossipPacket::Rumor(accepted));
                }
                self.monger(rumor, &[from]);
            }
            RecordOutcome::Duplicate { count } => {
                let probability = 0.5f64.powi(count.min(64) as i32);
                if self.flip_coin(probability) {
                    self.monger(rumor, &[from]);
                }
            }
            RecordOutcome::Buffered => {
                trace!(origin = %rumor.origin, id = rumor.id, "rumor buffered behind a gap");
                self.update_route(&rumor.origin, rumor.id, from);
            }
        }

        if remote {
            self.send_status(from);
        }
    }

    fn on_status(&self, status: StatusPacket, from: SocketAddr) {
        self.peers.write().insert(from);

        let comparison = self.history.lock().compare(&status);
        match comparison {
            StatusComparison::LocalAhead(rumor) => {
                trace!(peer = %from, origin = %rumor.origin, id = rumor.id, "sending missing rumor");
                self.send_packet(&GossipPacket::Rumor(rumor), from);
            }
            StatusComparison::RemoteAhead => self.send_status(from),
            StatusComparison::InSync => {
                let last = self.mongering.lock().remove(&from);
                if let Some(rumor) = last {
                    if self.flip_coin(0.5) {
                        self.monger(rumor, &[from]);
                    }
                }
            }
        }
    }

    fn on_private(&self, message: PrivateMessage, from: SocketAddr) {
        if from != self.local_addr {
            self.peers.write().insert(from);
        }

        if message.destination == self.config.identifier {
            debug!(origin = %message.origin, "private message delivered");
            let origin = message.origin.clone();
            self.deliver(&origin, &GossipPacket::Private(message));
            return;
        }

        let hop_limit = message.hop_limit.saturating_sub(1);
        if hop_limit == 0 {
            debug!(destination = %message.destination, "hop limit exhausted, dropping");
            return;
        }
        let next_hop = self.routes.read().next_hop(&message.destination);
        let Some(next_hop) = next_hop else {
            debug!(destination = %message.destination, "no route, dropping private message");
            return;
        };

        let forwarded = PrivateMessage {
            hop_limit,
            ..message
        };
        self.send_packet(&GossipPacket::Private(forwarded), next_hop);
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<T: Transport> GossipApi for GossipEngine<T> {
    fn identifier(&self) -> &str {
        &self.config.identifier
    }

    fn local_address(&self) -> SocketAddr {
        self.local_addr
    }

    fn submit(&self, text: &str) -> u32 {
        let origin = &self.config.identifier;
        self.next_local_rumor(|id| RumorMessage::new(origin.clone(), id, text))
    }

    fn submit_extra(&self, extra: ConsensusMessage) -> u32 {
        let origin = &self.config.identifier;
        self.next_local_rumor(|id| RumorMessage::with_extra(origin.clone(), id, extra))
    }

    fn send_private(&self, origin: &str, destination: &str, data: Vec<u8>, hop_limit: u32) {
        self.enqueue_local(GossipPacket::Private(PrivateMessage {
            origin: origin.to_string(),
            id: 0,
            destination: destination.to_string(),
            hop_limit,
            data,
        }));
    }

    fn add_peers(&self, addresses: &[String]) -> Result<(), GossipError> {
        for address in addresses {
            let addr = resolve(address)?;
            if self.peers.write().insert(addr) {
                debug!(peer = %addr, "peer added");
            }
        }
        Ok(())
    }

    fn register_callback(&self, callback: GossipCallback) {
        self.callbacks.write().push(callback);
    }

    fn peers(&self) -> Vec<SocketAddr> {
        self.peers.read().to_vec()
    }

    fn routes(&self) -> HashMap<String, RouteEntry> {
        self.routes.read().snapshot()
    }

    fn route_to(&self, destination: &str) -> Option<SocketAddr> {
        self.routes.read().next_hop(destination)
    }

    fn direct_nodes(&self) -> Vec<String> {
        self.routes.read().destinations()
    }

    fn add_route(&self, destination: &str, next_hop: SocketAddr) -> bool {
        self.routes.write().set(destination, next_hop)
    }
}
