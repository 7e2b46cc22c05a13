use shutterlink_core::CodecError;
use thiserror::Error;

/// Failure taxonomy of the connection core.
///
/// Duplicate offers/answers are deliberately absent: a negotiation guard
/// rejection is idempotency, not failure, and is never surfaced as an error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A local request could not be serialized. Reported synchronously;
    /// the request never leaves the process.
    #[error("encoding failed: {0}")]
    Encoding(#[source] CodecError),

    /// The relay connection is gone; every pending room-protocol request
    /// fails with this.
    #[error("relay connection lost")]
    ConnectionLost,

    /// A room-protocol request or a peer negotiation exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    #[error("a {0} request is already pending")]
    RequestPending(&'static str),

    #[error("not joined to a room")]
    NotInRoom,

    #[error("unknown shared object")]
    UnknownObject,

    #[error("media transport failure: {0}")]
    MediaTransport(String),

    #[error("session closed")]
    SessionClosed,
}

impl From<webrtc::Error> for ClientError {
    fn from(err: webrtc::Error) -> Self {
        ClientError::MediaTransport(err.to_string())
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
