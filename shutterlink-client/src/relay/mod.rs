mod event;
mod ws;

pub use event::RelayEvent;
pub use ws::WsRelayTransport;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Outbound half of the relay connection.
///
/// The inbound half is the [`RelayEvent`] stream handed out at connect time.
/// Reconnect and backoff are the transport's own concern; layers above only
/// see Connected/Disconnected edges.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, data: Bytes) -> Result<()>;
    fn close(&self);
}
