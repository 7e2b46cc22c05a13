//! Integration tests for shutterlink-client.
//!
//! Tests are organized by functionality:
//! - `connection_tests` - room protocol and relay lifecycle
//! - `negotiation_tests` - per-peer offer/answer/candidate handling
//! - `sync_tests` - shared-object replication over open channels

pub mod negotiation_tests;

use bytes::Bytes;
use dashmap::DashMap;
use shutterlink_client::event::CoreEvent;
use shutterlink_client::peer::{NegotiationState, Orchestrator, OrchestratorCommand};
use shutterlink_client::room::RoomClient;
use shutterlink_core::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{MockEngineFactory, MockRelay};

pub const LOCAL: &str = "LOCAL";

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// An orchestrator running against mock relay and mock engines, with every
/// observable end exposed for assertions.
pub struct TestSession {
    pub cmd_tx: mpsc::Sender<OrchestratorCommand>,
    pub events_rx: mpsc::Receiver<CoreEvent>,
    pub outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    pub engines: Arc<MockEngineFactory>,
    pub relay: Arc<MockRelay>,
    pub roster: Arc<DashMap<PeerId, NegotiationState>>,
}

pub fn create_test_session(negotiation_timeout: Duration) -> TestSession {
    let (relay, outbound_rx) = MockRelay::new();
    let room_client = Arc::new(RoomClient::new(relay.clone(), Duration::from_secs(2)));
    let engines = Arc::new(MockEngineFactory::default());
    let roster = Arc::new(DashMap::new());

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (events_tx, events_rx) = mpsc::channel(64);

    let orchestrator = Orchestrator::new(
        cmd_rx,
        engines.clone(),
        room_client,
        events_tx,
        roster.clone(),
        negotiation_timeout,
    );
    tokio::spawn(orchestrator.run());

    TestSession {
        cmd_tx,
        events_rx,
        outbound_rx,
        engines,
        relay,
        roster,
    }
}

/// Give the orchestrator its relay-assigned identity, as create/join would.
pub async fn assume_identity(session: &TestSession) {
    session
        .cmd_tx
        .send(OrchestratorCommand::SetLocalIdentity {
            local_peer_id: LOCAL.into(),
            room_id: crate::utils::ROOM.into(),
        })
        .await
        .expect("orchestrator gone");
}

/// Await the next state-change event and assert peer and state.
pub async fn expect_state(
    rx: &mut mpsc::Receiver<CoreEvent>,
    peer: &str,
    expected: NegotiationState,
) {
    match crate::utils::recv_event(rx).await {
        CoreEvent::PeerStateChanged { peer_id, state } => {
            assert_eq!(peer_id, PeerId::from(peer));
            assert_eq!(state, expected);
        }
        other => panic!("expected state change, got {other:?}"),
    }
}

/// Drive a full initiator negotiation with `peer` through to `Open` and
/// return the engine double for further assertions.
pub async fn open_initiator(
    session: &mut TestSession,
    peer: &str,
) -> Arc<crate::utils::MockMediaEngine> {
    use crate::utils::{recv_out, remote_description};
    use shutterlink_client::engine::{EngineEvent, TransportState};
    use shutterlink_core::SdpKind;

    session
        .cmd_tx
        .send(OrchestratorCommand::ConnectTo(peer.into()))
        .await
        .expect("orchestrator gone");
    let _offer = recv_out(&mut session.outbound_rx).await;
    expect_state(&mut session.events_rx, peer, NegotiationState::OfferSent).await;

    session
        .cmd_tx
        .send(OrchestratorCommand::RemoteDescription(remote_description(
            peer,
            SdpKind::Answer,
            "v=0 remote-answer",
        )))
        .await
        .expect("orchestrator gone");
    expect_state(
        &mut session.events_rx,
        peer,
        NegotiationState::AnswerExchanged,
    )
    .await;

    let engine = session
        .engines
        .engine(&peer.into())
        .expect("engine was never created");
    engine
        .push(EngineEvent::StateChanged(
            peer.into(),
            TransportState::Connected,
        ))
        .await;
    expect_state(&mut session.events_rx, peer, NegotiationState::Open).await;
    engine
}
