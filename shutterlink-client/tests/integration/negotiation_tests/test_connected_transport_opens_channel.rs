use bytes::Bytes;
use shutterlink_client::engine::EngineEvent;
use shutterlink_client::event::CoreEvent;
use shutterlink_client::peer::OrchestratorCommand;
use shutterlink_core::PeerId;
use std::time::Duration;

use crate::integration::{assume_identity, create_test_session, init_tracing, open_initiator};
use crate::utils::recv_event;

/// A connected transport promotes the session to `Open`, after which data
/// flows both ways through the orchestrator.
#[tokio::test]
async fn test_connected_transport_opens_channel() {
    init_tracing();

    let mut session = create_test_session(Duration::from_secs(30));
    assume_identity(&session).await;

    let engine = open_initiator(&mut session, "U1").await;

    engine.push(EngineEvent::ChannelOpen("U1".into())).await;
    match recv_event(&mut session.events_rx).await {
        CoreEvent::ChannelOpen(peer_id) => assert_eq!(peer_id, PeerId::from("U1")),
        other => panic!("expected ChannelOpen, got {other:?}"),
    }

    session
        .cmd_tx
        .send(OrchestratorCommand::SendTo(
            "U1".into(),
            Bytes::from_static(b"hello"),
        ))
        .await
        .unwrap();
    engine
        .push(EngineEvent::Data("U1".into(), Bytes::from_static(b"world")))
        .await;
    match recv_event(&mut session.events_rx).await {
        CoreEvent::Data { peer_id, data } => {
            assert_eq!(peer_id, PeerId::from("U1"));
            assert_eq!(&data[..], b"world");
        }
        other => panic!("expected Data, got {other:?}"),
    }

    // Fence on the command channel so the SendTo is definitely through.
    session
        .cmd_tx
        .send(OrchestratorCommand::PeerObserved("FENCE".into()))
        .await
        .unwrap();
    crate::integration::expect_state(
        &mut session.events_rx,
        "FENCE",
        shutterlink_client::peer::NegotiationState::Idle,
    )
    .await;

    let sent = engine.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(&sent[0][..], b"hello");
}
