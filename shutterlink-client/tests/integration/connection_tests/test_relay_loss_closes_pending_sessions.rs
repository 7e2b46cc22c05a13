use shutterlink_client::event::CoreEvent;
use shutterlink_client::peer::{NegotiationState, OrchestratorCommand};
use shutterlink_core::PeerId;
use std::time::Duration;

use crate::integration::{
    assume_identity, create_test_session, expect_state, init_tracing, open_initiator,
};
use crate::utils::recv_event;

/// Losing the relay kills sessions that still need it for signaling; peers
/// already exchanging data directly are unaffected.
#[tokio::test]
async fn test_relay_loss_closes_pending_sessions() {
    init_tracing();

    let mut session = create_test_session(Duration::from_secs(30));
    assume_identity(&session).await;

    let open_engine = open_initiator(&mut session, "U1").await;

    session
        .cmd_tx
        .send(OrchestratorCommand::ConnectTo("U2".into()))
        .await
        .unwrap();
    let _offer = crate::utils::recv_out(&mut session.outbound_rx).await;
    expect_state(&mut session.events_rx, "U2", NegotiationState::OfferSent).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::RelayLost)
        .await
        .unwrap();

    expect_state(&mut session.events_rx, "U2", NegotiationState::Closed).await;
    match recv_event(&mut session.events_rx).await {
        CoreEvent::PeerClosed(peer_id) => assert_eq!(peer_id, PeerId::from("U2")),
        other => panic!("expected PeerClosed, got {other:?}"),
    }

    let stalled_engine = session.engines.engine(&"U2".into()).unwrap();
    assert!(stalled_engine.was_closed());
    assert!(!open_engine.was_closed());
    assert_eq!(
        session.roster.get(&"U1".into()).map(|e| *e.value()),
        Some(NegotiationState::Open)
    );
    assert!(session.roster.get(&"U2".into()).is_none());
}
