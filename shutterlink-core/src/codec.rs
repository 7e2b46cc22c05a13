//! Two-phase signaling codec.
//!
//! Phase one recovers the outer [`RoomEnvelope`] (message type + opaque
//! payload blob) without committing to any payload schema. Phase two,
//! dispatched by message type, decodes the blob into the concrete payload.
//! A schema failure in phase two is an error for that single message only.
//!
//! The payload blob travels as base64-encoded JSON bytes inside the
//! envelope's `message` field, matching the relay's wire format.

use crate::model::{MessageType, RoomEnvelope};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("failed to decode {message_type:?} payload: {source}")]
    Payload {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid base64 in {message_type:?} payload: {source}")]
    PayloadEncoding {
        message_type: MessageType,
        #[source]
        source: base64::DecodeError,
    },
    #[error("{message_type:?} envelope is missing its payload")]
    MissingPayload { message_type: MessageType },
}

/// Encode an envelope carrying `payload` under `message_type`.
pub fn encode<T: Serialize>(message_type: MessageType, payload: &T) -> Result<Bytes, CodecError> {
    let inner = serde_json::to_vec(payload).map_err(CodecError::Encode)?;
    let envelope = RoomEnvelope {
        message_type,
        message: Some(BASE64.encode(inner)),
    };
    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Encode a payload-less envelope (e.g. `createRoom`).
pub fn encode_bare(message_type: MessageType) -> Result<Bytes, CodecError> {
    let envelope = RoomEnvelope {
        message_type,
        message: None,
    };
    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Phase one: recover the envelope without touching the payload blob.
pub fn decode_envelope(bytes: &[u8]) -> Result<RoomEnvelope, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Envelope)
}

/// Phase two: decode the envelope's payload into the type expected for its
/// message type.
pub fn decode_payload<T: DeserializeOwned>(envelope: &RoomEnvelope) -> Result<T, CodecError> {
    let message_type = envelope.message_type;
    let blob = envelope
        .message
        .as_deref()
        .ok_or(CodecError::MissingPayload { message_type })?;
    let inner = BASE64
        .decode(blob)
        .map_err(|source| CodecError::PayloadEncoding {
            message_type,
            source,
        })?;
    serde_json::from_slice(&inner).map_err(|source| CodecError::Payload {
        message_type,
        source,
    })
}
