mod envelope;
mod object;
mod peer;
mod room;
mod signaling;

pub use envelope::{MessageType, RoomEnvelope};
pub use object::{ObjectFrame, ObjectUpdate, SharedObject};
pub use peer::PeerId;
pub use room::{
    CreateRoomResponse, JoinRoomRequest, JoinRoomResponse, NotifyNewUser, RoomId, RoomIdentity,
};
pub use signaling::{
    IceCandidate, IceCandidateMessage, SdpKind, SessionDescription, SessionDescriptionMessage,
};
