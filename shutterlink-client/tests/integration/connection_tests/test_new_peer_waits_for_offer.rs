use shutterlink_client::peer::{NegotiationState, OrchestratorCommand};
use shutterlink_core::{MessageType, PeerId, SdpKind, SessionDescriptionMessage};
use std::time::Duration;

use crate::integration::{LOCAL, assume_identity, create_test_session, expect_state, init_tracing};
use crate::utils::{assert_no_out, decode_out_as, recv_out, remote_description};

/// A peer announced via notifyNewUser is waited on, not raced: no offer
/// leaves this side, and the newcomer's offer is answered promptly.
#[tokio::test]
async fn test_new_peer_waits_for_offer() {
    init_tracing();

    let mut session = create_test_session(Duration::from_secs(30));
    assume_identity(&session).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::PeerObserved("U9".into()))
        .await
        .unwrap();
    expect_state(&mut session.events_rx, "U9", NegotiationState::Idle).await;
    assert_no_out(&mut session.outbound_rx).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::RemoteDescription(remote_description(
            "U9",
            SdpKind::Offer,
            "v=0 their-offer",
        )))
        .await
        .unwrap();

    expect_state(&mut session.events_rx, "U9", NegotiationState::OfferReceived).await;
    expect_state(&mut session.events_rx, "U9", NegotiationState::AnswerExchanged).await;

    let frame = recv_out(&mut session.outbound_rx).await;
    let answer: SessionDescriptionMessage = decode_out_as(&frame, MessageType::Sdp);
    assert_eq!(answer.kind, SdpKind::Answer);
    assert_eq!(answer.sender_user_id, PeerId::from(LOCAL));

    let engine = session.engines.engine(&"U9".into()).unwrap();
    let applied = engine.applied_remote_descriptions();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].sdp, "v=0 their-offer");
}
