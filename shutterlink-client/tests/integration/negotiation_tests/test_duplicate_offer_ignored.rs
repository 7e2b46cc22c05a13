use shutterlink_client::peer::{NegotiationState, OrchestratorCommand};
use shutterlink_core::SdpKind;
use std::time::Duration;

use crate::integration::{assume_identity, create_test_session, expect_state, init_tracing};
use crate::utils::{assert_no_out, recv_out, remote_description};

/// First offer wins: a redelivered or glaring second offer must neither
/// reach the engine nor produce a second answer.
#[tokio::test]
async fn test_duplicate_offer_ignored() {
    init_tracing();

    let mut session = create_test_session(Duration::from_secs(30));
    assume_identity(&session).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::RemoteDescription(remote_description(
            "U5",
            SdpKind::Offer,
            "v=0 first-offer",
        )))
        .await
        .unwrap();

    expect_state(&mut session.events_rx, "U5", NegotiationState::OfferReceived).await;
    expect_state(&mut session.events_rx, "U5", NegotiationState::AnswerExchanged).await;
    let _answer = recv_out(&mut session.outbound_rx).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::RemoteDescription(remote_description(
            "U5",
            SdpKind::Offer,
            "v=0 second-offer",
        )))
        .await
        .unwrap();

    assert_no_out(&mut session.outbound_rx).await;

    let engine = session.engines.engine(&"U5".into()).unwrap();
    let applied = engine.applied_remote_descriptions();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].sdp, "v=0 first-offer");
}
