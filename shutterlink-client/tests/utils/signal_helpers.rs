use bytes::Bytes;
use serde::de::DeserializeOwned;
use shutterlink_client::event::CoreEvent;
use shutterlink_core::codec;
use shutterlink_core::{
    IceCandidate, IceCandidateMessage, MessageType, PeerId, RoomEnvelope, SdpKind,
    SessionDescriptionMessage,
};
use std::time::Duration;
use tokio::sync::mpsc;

pub const ROOM: &str = "ROOM1";

/// Decode one captured outbound frame into its envelope.
pub fn decode_out(bytes: &Bytes) -> RoomEnvelope {
    codec::decode_envelope(bytes).expect("outbound frame is not a valid envelope")
}

/// Decode one captured outbound frame, asserting its message type.
pub fn decode_out_as<T: DeserializeOwned>(bytes: &Bytes, expected: MessageType) -> T {
    let envelope = decode_out(bytes);
    assert_eq!(envelope.message_type, expected);
    codec::decode_payload(&envelope).expect("outbound payload does not decode")
}

/// Build an inbound remote description as the relay would deliver it.
pub fn remote_description(
    sender: &str,
    kind: SdpKind,
    sdp: &str,
) -> SessionDescriptionMessage {
    SessionDescriptionMessage {
        kind,
        sdp: sdp.to_owned(),
        sender_user_id: PeerId::from(sender),
        room_id: ROOM.into(),
    }
}

/// Build an inbound remote candidate as the relay would deliver it.
pub fn remote_candidate(sender: &str, sdp: &str) -> IceCandidateMessage {
    IceCandidateMessage::new(
        IceCandidate {
            sdp: sdp.to_owned(),
            sdp_mline_index: 0,
            sdp_mid: Some("0".to_owned()),
        },
        PeerId::from(sender),
        ROOM.into(),
    )
}

/// Await the next core event, failing the test on a stalled stream.
pub async fn recv_event(rx: &mut mpsc::Receiver<CoreEvent>) -> CoreEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no core event within 2s")
        .expect("core event channel closed")
}

/// Await the next outbound relay frame.
pub async fn recv_out(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Bytes {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no outbound frame within 2s")
        .expect("outbound channel closed")
}

/// Assert that nothing goes out on the relay for a short window.
pub async fn assert_no_out(rx: &mut mpsc::UnboundedReceiver<Bytes>) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(outcome.is_err(), "unexpected outbound frame: {outcome:?}");
}
