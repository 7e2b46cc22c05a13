use bytes::Bytes;

/// What the relay transport reports upward.
#[derive(Debug)]
pub enum RelayEvent {
    /// Socket established (also emitted after a successful reconnect).
    Connected,
    /// Socket lost; a reconnect attempt follows.
    Disconnected,
    /// One opaque inbound payload.
    Message(Bytes),
}
