use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position and size of an overlay object in the shared canvas space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObjectFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A decorative overlay object replicated across every peer in the room.
///
/// `owner` names the peer currently manipulating the object; `None` means
/// the object is free and anyone may claim it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedObject {
    pub id: Uuid,
    pub frame: ObjectFrame,
    #[serde(rename = "imageRef")]
    pub image_ref: String,
    #[serde(rename = "ownerPeerID")]
    pub owner: Option<PeerId>,
}

impl SharedObject {
    pub fn new(frame: ObjectFrame, image_ref: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            image_ref: image_ref.into(),
            owner: None,
        }
    }
}

/// Whole-object snapshot sent over the data channel on every local change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
#[serde(rename_all = "camelCase")]
pub enum ObjectUpdate {
    Upsert(SharedObject),
    Delete { id: Uuid },
}
