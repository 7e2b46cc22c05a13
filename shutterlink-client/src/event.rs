use crate::engine::MediaSurface;
use crate::peer::NegotiationState;
use bytes::Bytes;
use shutterlink_core::{PeerId, SharedObject};
use uuid::Uuid;

/// Everything the core surfaces to the embedding application.
///
/// Peer/negotiation variants come from the orchestrator; object variants
/// come from the shared-state sync layer.
#[derive(Debug)]
pub enum CoreEvent {
    PeerStateChanged {
        peer_id: PeerId,
        state: NegotiationState,
    },
    /// The data channel toward this peer is open for traffic.
    ChannelOpen(PeerId),
    /// Arbitrary application bytes received from a peer.
    Data { peer_id: PeerId, data: Bytes },
    /// A remote renderable media handle, plumbed through opaquely.
    RemoteMedia {
        peer_id: PeerId,
        surface: MediaSurface,
    },
    /// Negotiation with this peer did not complete in time.
    PeerUnreachable(PeerId),
    PeerClosed(PeerId),
    /// A shared overlay object was created or changed by a remote peer.
    ObjectChanged(SharedObject),
    /// A shared overlay object was deleted by a remote peer.
    ObjectRemoved(Uuid),
}
