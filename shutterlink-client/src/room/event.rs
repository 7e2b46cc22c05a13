use shutterlink_core::{IceCandidateMessage, PeerId, SessionDescriptionMessage};

/// Room-level notifications demultiplexed out of the relay stream.
///
/// Request/response pairs (createRoom, joinRoom) resolve their own pending
/// futures and never appear here.
#[derive(Debug)]
pub enum RoomEvent {
    /// A new participant joined the room (server-pushed `notifyNewUser`).
    NewPeer(PeerId),
    /// A remote offer or answer addressed to us.
    RemoteDescription(SessionDescriptionMessage),
    /// A remote ICE candidate addressed to us.
    RemoteCandidate(IceCandidateMessage),
    /// The relay connection dropped.
    RelayLost,
}
