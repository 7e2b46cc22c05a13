use crate::engine::{EngineEvent, MediaEngineFactory, TransportState};
use crate::event::CoreEvent;
use crate::peer::session::PeerSession;
use crate::peer::{NegotiationRole, NegotiationState};
use crate::room::RoomClient;
use bytes::Bytes;
use dashmap::DashMap;
use shutterlink_core::{
    IceCandidate, IceCandidateMessage, PeerId, RoomId, SdpKind, SessionDescriptionMessage,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Transition requests into the orchestrator's loop. Everything that can
/// mutate a `PeerSession` arrives here; nothing mutates from outside.
#[derive(Debug)]
pub enum OrchestratorCommand {
    /// Our relay-assigned identity, known once create/join resolves.
    SetLocalIdentity {
        local_peer_id: PeerId,
        room_id: RoomId,
    },
    /// Become initiator toward a peer from the join roster.
    ConnectTo(PeerId),
    /// A newcomer was announced; await their offer as responder.
    PeerObserved(PeerId),
    RemoteDescription(SessionDescriptionMessage),
    RemoteCandidate(IceCandidateMessage),
    /// Send bytes to every peer whose channel is open.
    Broadcast(Bytes),
    SendTo(PeerId, Bytes),
    /// The relay dropped: candidates can no longer be exchanged, so every
    /// session that has not reached `Open` is torn down.
    RelayLost,
    Leave,
}

/// Owns the `PeerId -> PeerSession` map and drives every negotiation state
/// machine. Runs as a single task; commands, engine events and the deadline
/// sweep are serialized through its `select!` loop, which is what enforces
/// the first-offer/first-answer-wins guards without extra locking.
pub struct Orchestrator {
    sessions: HashMap<PeerId, PeerSession>,
    /// Candidates from peers we have not created a session for yet.
    orphan_candidates: HashMap<PeerId, VecDeque<IceCandidate>>,
    cmd_rx: mpsc::Receiver<OrchestratorCommand>,
    engine_rx: mpsc::Receiver<EngineEvent>,
    engine_tx: mpsc::Sender<EngineEvent>,
    engines: Arc<dyn MediaEngineFactory>,
    room_client: Arc<RoomClient>,
    events_tx: mpsc::Sender<CoreEvent>,
    /// Shared read-only view of peer states for the embedding application.
    roster: Arc<DashMap<PeerId, NegotiationState>>,
    local: Option<(PeerId, RoomId)>,
    negotiation_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        cmd_rx: mpsc::Receiver<OrchestratorCommand>,
        engines: Arc<dyn MediaEngineFactory>,
        room_client: Arc<RoomClient>,
        events_tx: mpsc::Sender<CoreEvent>,
        roster: Arc<DashMap<PeerId, NegotiationState>>,
        negotiation_timeout: Duration,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::channel(256);
        Self {
            sessions: HashMap::new(),
            orphan_candidates: HashMap::new(),
            cmd_rx,
            engine_rx,
            engine_tx,
            engines,
            room_client,
            events_tx,
            roster,
            local: None,
            negotiation_timeout,
        }
    }

    pub async fn run(mut self) {
        info!("orchestrator loop started");
        let mut sweep = tokio::time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(OrchestratorCommand::Leave) | None => {
                            self.teardown_all().await;
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }
                evt = self.engine_rx.recv() => {
                    if let Some(evt) = evt {
                        self.handle_engine_event(evt).await;
                    }
                }
                _ = sweep.tick() => self.sweep_deadlines().await,
            }
        }
        info!("orchestrator loop finished");
    }

    async fn handle_command(&mut self, cmd: OrchestratorCommand) {
        match cmd {
            OrchestratorCommand::SetLocalIdentity {
                local_peer_id,
                room_id,
            } => {
                self.local = Some((local_peer_id, room_id));
            }
            OrchestratorCommand::ConnectTo(peer_id) => self.connect_to(peer_id).await,
            OrchestratorCommand::PeerObserved(peer_id) => self.peer_observed(peer_id).await,
            OrchestratorCommand::RemoteDescription(msg) => match msg.kind {
                SdpKind::Offer => self.on_remote_offer(msg).await,
                SdpKind::Answer => self.on_remote_answer(msg).await,
            },
            OrchestratorCommand::RemoteCandidate(msg) => self.on_remote_candidate(msg).await,
            OrchestratorCommand::Broadcast(data) => self.broadcast(data).await,
            OrchestratorCommand::SendTo(peer_id, data) => self.send_to(&peer_id, data).await,
            OrchestratorCommand::RelayLost => self.on_relay_lost().await,
            OrchestratorCommand::Leave => unreachable!("handled in run"),
        }
    }

    /// Initiator path: produce an offer, apply it locally, ship it.
    async fn connect_to(&mut self, peer_id: PeerId) {
        if self.sessions.contains_key(&peer_id) {
            debug!("session for {peer_id} already exists, connect ignored");
            return;
        }
        let Some((local, room)) = self.local.clone() else {
            warn!("connect to {peer_id} before local identity is known");
            return;
        };
        if !self.create_session(peer_id.clone(), NegotiationRole::Initiator).await {
            return;
        }
        // The deadline covers the whole negotiation, offer production included.
        let deadline = Instant::now() + self.negotiation_timeout;
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };
        session.deadline = Some(deadline);
        let engine = session.engine.clone();

        let offer = match engine.produce_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                error!("offer production for {peer_id} failed: {e}");
                return;
            }
        };
        if let Err(e) = engine.apply_local_description(offer.clone()).await {
            error!("applying local offer for {peer_id} failed: {e}");
            return;
        }
        if let Some(session) = self.sessions.get_mut(&peer_id) {
            session.local_description_set = true;
        }
        self.set_state(&peer_id, NegotiationState::OfferSent).await;

        let message = SessionDescriptionMessage::new(offer, local, room);
        if let Err(e) = self.room_client.send_description(message).await {
            error!("offer for {peer_id} could not be sent: {e}");
        }
    }

    /// Responder path: create the session and wait for the remote offer.
    async fn peer_observed(&mut self, peer_id: PeerId) {
        if self.sessions.contains_key(&peer_id) {
            debug!("session for {peer_id} already exists, observe ignored");
            return;
        }
        if self.create_session(peer_id.clone(), NegotiationRole::Responder).await {
            self.set_state(&peer_id, NegotiationState::Idle).await;
        }
    }

    async fn create_session(&mut self, peer_id: PeerId, role: NegotiationRole) -> bool {
        let engine = match self
            .engines
            .create(peer_id.clone(), self.engine_tx.clone())
            .await
        {
            Ok(engine) => engine,
            Err(e) => {
                error!("media engine for {peer_id} could not be created: {e}");
                let _ = self
                    .events_tx
                    .send(CoreEvent::PeerUnreachable(peer_id))
                    .await;
                return false;
            }
        };

        let mut session = PeerSession::new(peer_id.clone(), role, engine);
        if let Some(buffered) = self.orphan_candidates.remove(&peer_id) {
            debug!("{} early candidate(s) adopted for {peer_id}", buffered.len());
            session.pending_candidates = buffered;
        }
        self.roster.insert(peer_id.clone(), session.state);
        self.sessions.insert(peer_id, session);
        true
    }

    /// First offer wins: anything after a description is set is a duplicate
    /// (relay redelivery or glare) and is ignored, not failed.
    async fn on_remote_offer(&mut self, msg: SessionDescriptionMessage) {
        let peer_id = msg.sender_user_id.clone();
        if !self.sessions.contains_key(&peer_id) {
            // The offer can outrun notifyNewUser across independent
            // deliveries; the peer becomes known here instead.
            if !self.create_session(peer_id.clone(), NegotiationRole::Responder).await {
                return;
            }
        }

        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };
        if session.local_description_set || session.remote_description_set {
            if session.role == NegotiationRole::Initiator {
                debug!("offer glare with {peer_id}, keeping our own offer");
            } else {
                debug!("duplicate offer from {peer_id} ignored");
            }
            return;
        }
        let engine = session.engine.clone();

        if let Err(e) = engine.apply_remote_description(msg.description()).await {
            error!("applying remote offer from {peer_id} failed: {e}");
            return;
        }
        if let Some(session) = self.sessions.get_mut(&peer_id) {
            session.remote_description_set = true;
            session.deadline = Some(Instant::now() + self.negotiation_timeout);
        }
        self.set_state(&peer_id, NegotiationState::OfferReceived)
            .await;
        self.flush_candidates(&peer_id).await;

        // Answer immediately; the offer side is already waiting.
        let Some((local, room)) = self.local.clone() else {
            warn!("offer from {peer_id} arrived before local identity is known");
            return;
        };
        let answer = match engine.produce_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                error!("answer production for {peer_id} failed: {e}");
                return;
            }
        };
        if let Err(e) = engine.apply_local_description(answer.clone()).await {
            error!("applying local answer for {peer_id} failed: {e}");
            return;
        }
        if let Some(session) = self.sessions.get_mut(&peer_id) {
            session.local_description_set = true;
        }
        self.set_state(&peer_id, NegotiationState::AnswerExchanged)
            .await;

        let message = SessionDescriptionMessage::new(answer, local, room);
        if let Err(e) = self.room_client.send_description(message).await {
            error!("answer for {peer_id} could not be sent: {e}");
        }
    }

    /// First answer wins, mirroring the offer guard.
    async fn on_remote_answer(&mut self, msg: SessionDescriptionMessage) {
        let peer_id = msg.sender_user_id.clone();
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            warn!("answer from unknown peer {peer_id} dropped");
            return;
        };
        if session.remote_description_set {
            debug!("duplicate answer from {peer_id} ignored");
            return;
        }
        if !session.local_description_set {
            warn!("answer from {peer_id} without a local offer dropped");
            return;
        }

        let engine = session.engine.clone();
        if let Err(e) = engine.apply_remote_description(msg.description()).await {
            error!("applying remote answer from {peer_id} failed: {e}");
            return;
        }
        if let Some(session) = self.sessions.get_mut(&peer_id) {
            session.remote_description_set = true;
        }
        self.set_state(&peer_id, NegotiationState::AnswerExchanged)
            .await;
        self.flush_candidates(&peer_id).await;
    }

    /// Candidates may race ahead of the description they belong to; buffer
    /// until the remote description is applied, then flush in arrival order.
    async fn on_remote_candidate(&mut self, msg: IceCandidateMessage) {
        let peer_id = msg.sender_user_id.clone();
        let candidate = msg.candidate();

        let Some(session) = self.sessions.get_mut(&peer_id) else {
            self.orphan_candidates
                .entry(peer_id)
                .or_default()
                .push_back(candidate);
            return;
        };

        if session.remote_description_set {
            let engine = session.engine.clone();
            if let Err(e) = engine.add_remote_candidate(candidate).await {
                warn!("candidate from {peer_id} rejected by engine: {e}");
            }
        } else {
            session.pending_candidates.push_back(candidate);
        }
    }

    async fn flush_candidates(&mut self, peer_id: &PeerId) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        let engine = session.engine.clone();
        let buffered = std::mem::take(&mut session.pending_candidates);
        if buffered.is_empty() {
            return;
        }
        debug!("flushing {} buffered candidate(s) for {peer_id}", buffered.len());
        for candidate in buffered {
            if let Err(e) = engine.add_remote_candidate(candidate).await {
                warn!("buffered candidate for {peer_id} rejected by engine: {e}");
            }
        }
    }

    async fn broadcast(&mut self, data: Bytes) {
        let engines: Vec<_> = self
            .sessions
            .values()
            .filter(|s| s.state == NegotiationState::Open)
            .map(|s| (s.peer_id.clone(), s.engine.clone()))
            .collect();
        for (peer_id, engine) in engines {
            if let Err(e) = engine.send_bytes(data.clone()).await {
                warn!("broadcast to {peer_id} failed: {e}");
            }
        }
    }

    async fn send_to(&mut self, peer_id: &PeerId, data: Bytes) {
        let Some(session) = self.sessions.get(peer_id) else {
            warn!("send to unknown peer {peer_id} dropped");
            return;
        };
        if session.state != NegotiationState::Open {
            warn!("send to {peer_id} dropped: channel not open");
            return;
        }
        let engine = session.engine.clone();
        if let Err(e) = engine.send_bytes(data).await {
            warn!("send to {peer_id} failed: {e}");
        }
    }

    async fn on_relay_lost(&mut self) {
        warn!("relay lost; closing sessions still negotiating");
        self.orphan_candidates.clear();
        let stalled: Vec<PeerId> = self
            .sessions
            .values()
            .filter(|s| s.state != NegotiationState::Open)
            .map(|s| s.peer_id.clone())
            .collect();
        for peer_id in stalled {
            self.close_session(&peer_id).await;
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::CandidateGenerated(peer_id, candidate) => {
                // Side channel: valid in every live state, no transition.
                if !self.sessions.contains_key(&peer_id) {
                    debug!("local candidate for closed session {peer_id} dropped");
                    return;
                }
                let Some((local, room)) = self.local.clone() else {
                    return;
                };
                let message = IceCandidateMessage::new(candidate, local, room);
                if let Err(e) = self.room_client.send_candidate(message).await {
                    warn!("candidate for {peer_id} could not be sent: {e}");
                }
            }
            EngineEvent::StateChanged(peer_id, state) => {
                self.on_transport_state(peer_id, state).await;
            }
            EngineEvent::ChannelOpen(peer_id) => {
                let _ = self.events_tx.send(CoreEvent::ChannelOpen(peer_id)).await;
            }
            EngineEvent::Data(peer_id, data) => {
                let _ = self.events_tx.send(CoreEvent::Data { peer_id, data }).await;
            }
            EngineEvent::RemoteMedia(peer_id, surface) => {
                let _ = self
                    .events_tx
                    .send(CoreEvent::RemoteMedia { peer_id, surface })
                    .await;
            }
        }
    }

    async fn on_transport_state(&mut self, peer_id: PeerId, state: TransportState) {
        match state {
            TransportState::Connected => {
                let Some(session) = self.sessions.get_mut(&peer_id) else {
                    return;
                };
                if session.state == NegotiationState::AnswerExchanged {
                    session.deadline = None;
                    self.set_state(&peer_id, NegotiationState::Open).await;
                } else {
                    debug!(
                        "transport connected for {peer_id} in {:?}, no transition",
                        session.state
                    );
                }
            }
            TransportState::Disconnected | TransportState::Failed | TransportState::Closed => {
                if self.sessions.contains_key(&peer_id) {
                    info!("transport for {peer_id} reported {state:?}");
                    self.close_session(&peer_id).await;
                }
            }
            TransportState::New | TransportState::Connecting => {}
        }
    }

    /// Negotiations that never reach `Open` surface as unreachable peers.
    async fn sweep_deadlines(&mut self) {
        let now = Instant::now();
        let expired: Vec<PeerId> = self
            .sessions
            .values()
            .filter(|s| s.deadline.is_some_and(|d| d <= now))
            .map(|s| s.peer_id.clone())
            .collect();
        for peer_id in expired {
            warn!("negotiation with {peer_id} timed out");
            let _ = self
                .events_tx
                .send(CoreEvent::PeerUnreachable(peer_id.clone()))
                .await;
            self.close_session(&peer_id).await;
        }
    }

    /// `Closed` is terminal: the session is removed and a later connection
    /// attempt starts over from `Idle` with a fresh engine.
    async fn close_session(&mut self, peer_id: &PeerId) {
        let Some(session) = self.sessions.remove(peer_id) else {
            return;
        };
        if let Err(e) = session.engine.close().await {
            warn!("engine close for {peer_id} failed: {e}");
        }
        self.roster.remove(peer_id);
        let _ = self
            .events_tx
            .send(CoreEvent::PeerStateChanged {
                peer_id: peer_id.clone(),
                state: NegotiationState::Closed,
            })
            .await;
        let _ = self
            .events_tx
            .send(CoreEvent::PeerClosed(peer_id.clone()))
            .await;
    }

    async fn teardown_all(&mut self) {
        let peers: Vec<PeerId> = self.sessions.keys().cloned().collect();
        for peer_id in peers {
            self.close_session(&peer_id).await;
        }
        self.orphan_candidates.clear();
    }

    async fn set_state(&mut self, peer_id: &PeerId, state: NegotiationState) {
        if let Some(session) = self.sessions.get_mut(peer_id) {
            session.state = state;
        }
        self.roster.insert(peer_id.clone(), state);
        let _ = self
            .events_tx
            .send(CoreEvent::PeerStateChanged {
                peer_id: peer_id.clone(),
                state,
            })
            .await;
    }
}
