use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque server-issued room identifier.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a room as issued by the relay on creation.
/// Immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    pub room_id: RoomId,
    pub host_user_id: PeerId,
}

/// Payload of a `createRoom` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    #[serde(rename = "hostID")]
    pub host_id: PeerId,
}

impl CreateRoomResponse {
    pub fn into_identity(self) -> RoomIdentity {
        RoomIdentity {
            room_id: self.room_id,
            host_user_id: self.host_id,
        }
    }
}

/// Payload of a `joinRoom` request.
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

/// Payload of a `joinRoom` response: the local id assigned by the relay
/// plus the roster of peers already in the room.
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    #[serde(rename = "userID")]
    pub user_id: PeerId,
    #[serde(rename = "userList")]
    pub user_list: Vec<PeerId>,
}

/// Server-pushed payload announcing a freshly joined participant.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyNewUser {
    #[serde(rename = "newUserID")]
    pub new_user_id: PeerId,
}
