//! Peer-to-peer room client: relay signaling, WebRTC negotiation, data
//! channel fanout and shared-object replication.
//!
//! The entry point is [`RoomSession::connect`], which wires a relay
//! connection, the room protocol and the per-peer negotiation orchestrator
//! into one handle plus a [`CoreEvent`] stream for the application to render
//! from.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod peer;
pub mod relay;
pub mod room;
pub mod session;
pub mod sync;

pub use config::ClientConfig;
pub use engine::{
    EngineEvent, MediaEngine, MediaEngineFactory, MediaSurface, TransportState, WebRtcEngineFactory,
};
pub use error::{ClientError, Result};
pub use event::CoreEvent;
pub use peer::{NegotiationRole, NegotiationState, OrchestratorCommand};
pub use relay::{RelayEvent, RelayTransport, WsRelayTransport};
pub use room::{JoinedRoom, RoomClient, RoomEvent};
pub use session::RoomSession;
pub use sync::{ObjectSync, RemoteApply};
