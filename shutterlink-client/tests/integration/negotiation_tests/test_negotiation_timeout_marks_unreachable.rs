use shutterlink_client::event::CoreEvent;
use shutterlink_client::peer::{NegotiationState, OrchestratorCommand};
use shutterlink_core::PeerId;
use std::time::Duration;

use crate::integration::{assume_identity, create_test_session, expect_state, init_tracing};
use crate::utils::{recv_event, recv_out};

/// An offer that never gets answered surfaces as an unreachable peer and
/// the session is torn down.
#[tokio::test(start_paused = true)]
async fn test_negotiation_timeout_marks_unreachable() {
    init_tracing();

    let mut session = create_test_session(Duration::from_millis(200));
    assume_identity(&session).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::ConnectTo("U6".into()))
        .await
        .unwrap();
    let _offer = recv_out(&mut session.outbound_rx).await;
    expect_state(&mut session.events_rx, "U6", NegotiationState::OfferSent).await;

    // Nobody answers; the deadline sweep fires on its next tick.
    match recv_event(&mut session.events_rx).await {
        CoreEvent::PeerUnreachable(peer_id) => assert_eq!(peer_id, PeerId::from("U6")),
        other => panic!("expected PeerUnreachable, got {other:?}"),
    }
    expect_state(&mut session.events_rx, "U6", NegotiationState::Closed).await;
    match recv_event(&mut session.events_rx).await {
        CoreEvent::PeerClosed(peer_id) => assert_eq!(peer_id, PeerId::from("U6")),
        other => panic!("expected PeerClosed, got {other:?}"),
    }

    let engine = session.engines.engine(&"U6".into()).unwrap();
    assert!(engine.was_closed());
    assert!(session.roster.get(&"U6".into()).is_none());
}
