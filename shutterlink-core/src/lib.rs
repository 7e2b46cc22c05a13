pub mod codec;
pub mod model;

pub use codec::CodecError;
pub use model::{
    CreateRoomResponse, IceCandidate, IceCandidateMessage, JoinRoomRequest, JoinRoomResponse,
    MessageType, NotifyNewUser, ObjectFrame, ObjectUpdate, PeerId, RoomEnvelope, RoomId,
    RoomIdentity, SdpKind, SessionDescription, SessionDescriptionMessage, SharedObject,
};
