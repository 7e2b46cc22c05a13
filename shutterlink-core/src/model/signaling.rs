use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// A session description as produced/consumed by the media engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// An ICE candidate as produced/consumed by the media engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub sdp: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: i32,
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
}

/// Wire payload of an `sdp` envelope: a session description plus the
/// routing fields the relay needs to deliver it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescriptionMessage {
    pub kind: SdpKind,
    pub sdp: String,
    #[serde(rename = "senderUserID")]
    pub sender_user_id: PeerId,
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

impl SessionDescriptionMessage {
    pub fn new(desc: SessionDescription, sender_user_id: PeerId, room_id: RoomId) -> Self {
        Self {
            kind: desc.kind,
            sdp: desc.sdp,
            sender_user_id,
            room_id,
        }
    }

    pub fn description(&self) -> SessionDescription {
        SessionDescription {
            kind: self.kind,
            sdp: self.sdp.clone(),
        }
    }
}

/// Wire payload of an `iceCandidate` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidateMessage {
    pub sdp: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: i32,
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
    #[serde(rename = "senderUserID")]
    pub sender_user_id: PeerId,
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

impl IceCandidateMessage {
    pub fn new(candidate: IceCandidate, sender_user_id: PeerId, room_id: RoomId) -> Self {
        Self {
            sdp: candidate.sdp,
            sdp_mline_index: candidate.sdp_mline_index,
            sdp_mid: candidate.sdp_mid,
            sender_user_id,
            room_id,
        }
    }

    pub fn candidate(&self) -> IceCandidate {
        IceCandidate {
            sdp: self.sdp.clone(),
            sdp_mline_index: self.sdp_mline_index,
            sdp_mid: self.sdp_mid.clone(),
        }
    }
}
