use crate::engine::MediaEngine;
use shutterlink_core::{IceCandidate, PeerId};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::Instant;

/// Who drives the offer for a given peer: the joiner initiates toward every
/// peer already in the room; a peer learning of a newcomer via
/// `notifyNewUser` responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}

/// Per-peer negotiation progress.
///
/// `Closed` is terminal; a torn-down peer renegotiates from a fresh `Idle`
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerExchanged,
    Open,
    Closed,
}

/// Negotiation and connection state for one remote peer. Exactly one exists
/// per peer id; all mutation happens inside the orchestrator's loop.
pub(crate) struct PeerSession {
    pub peer_id: PeerId,
    pub role: NegotiationRole,
    pub state: NegotiationState,
    pub local_description_set: bool,
    pub remote_description_set: bool,
    /// Remote candidates that arrived ahead of the remote description,
    /// in arrival order.
    pub pending_candidates: VecDeque<IceCandidate>,
    pub engine: Arc<dyn MediaEngine>,
    /// When set, the negotiation must reach `Open` before this instant.
    pub deadline: Option<Instant>,
}

impl PeerSession {
    pub fn new(peer_id: PeerId, role: NegotiationRole, engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            peer_id,
            role,
            state: NegotiationState::Idle,
            local_description_set: false,
            remote_description_set: false,
            pending_candidates: VecDeque::new(),
            engine,
            deadline: None,
        }
    }
}
