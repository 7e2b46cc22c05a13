mod surface;
mod webrtc_engine;

pub use surface::MediaSurface;
pub use webrtc_engine::{WebRtcEngine, WebRtcEngineFactory};

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use shutterlink_core::{IceCandidate, PeerId, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connection-level state reported by a media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a media engine pushes into the orchestrator's loop.
pub enum EngineEvent {
    CandidateGenerated(PeerId, IceCandidate),
    StateChanged(PeerId, TransportState),
    ChannelOpen(PeerId),
    Data(PeerId, Bytes),
    RemoteMedia(PeerId, MediaSurface),
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::CandidateGenerated(p, _) => write!(f, "CandidateGenerated({p})"),
            EngineEvent::StateChanged(p, s) => write!(f, "StateChanged({p}, {s:?})"),
            EngineEvent::ChannelOpen(p) => write!(f, "ChannelOpen({p})"),
            EngineEvent::Data(p, d) => write!(f, "Data({p}, {} bytes)", d.len()),
            EngineEvent::RemoteMedia(p, _) => write!(f, "RemoteMedia({p})"),
        }
    }
}

/// Capability surface of the underlying media-transport engine.
///
/// The orchestrator drives negotiation exclusively through this trait; the
/// ICE/DTLS/SRTP machinery behind it is the engine's concern.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn produce_offer(&self) -> Result<SessionDescription>;
    async fn produce_answer(&self) -> Result<SessionDescription>;
    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()>;
    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()>;
    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;
    async fn send_bytes(&self, data: Bytes) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// Builds one engine per remote peer, wired to the orchestrator's
/// engine-event channel.
#[async_trait]
pub trait MediaEngineFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Arc<dyn MediaEngine>>;
}
