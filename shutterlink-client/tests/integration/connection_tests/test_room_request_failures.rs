use shutterlink_client::error::ClientError;
use shutterlink_client::relay::RelayEvent;
use shutterlink_client::room::{RoomClient, RoomEvent};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, recv_out};

#[tokio::test]
async fn test_unanswered_request_times_out() {
    init_tracing();

    let (relay, _out_rx) = MockRelay::new();
    let client = RoomClient::new(relay, Duration::from_millis(100));

    let err = client.create_room().await.expect_err("must time out");
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");

    // The slot is free again after the timeout.
    let err = tokio::time::timeout(Duration::from_millis(300), client.create_room())
        .await
        .expect("second attempt stuck")
        .expect_err("still no relay behind this");
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_relay_loss_fails_pending_request() {
    init_tracing();

    let (relay, mut out_rx) = MockRelay::new();
    let client = Arc::new(RoomClient::new(relay, Duration::from_secs(5)));

    let relay_side = {
        let client = client.clone();
        tokio::spawn(async move {
            let _frame = recv_out(&mut out_rx).await;
            let event = client.handle_relay_event(RelayEvent::Disconnected);
            assert!(matches!(event, Some(RoomEvent::RelayLost)));
        })
    };

    let err = client.join_room("R1".into()).await.expect_err("must fail");
    assert!(matches!(err, ClientError::ConnectionLost), "got {err:?}");
    relay_side.await.unwrap();
}
