use serde::{Deserialize, Serialize};

/// Outer discriminator of every message crossing the relay socket.
///
/// `Unknown` absorbs message types this client does not understand so that
/// envelope decoding itself never fails on them; callers log and drop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    CreateRoom,
    JoinRoom,
    NotifyNewUser,
    Sdp,
    IceCandidate,
    #[serde(other)]
    Unknown,
}

/// Outer wire envelope. The payload stays an opaque base64 blob until the
/// caller commits to a concrete schema via `codec::decode_payload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomEnvelope {
    #[serde(rename = "messageType")]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
