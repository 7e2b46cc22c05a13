use crate::engine::{EngineEvent, MediaEngine, MediaEngineFactory, MediaSurface, TransportState};
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use shutterlink_core::{IceCandidate, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine as RtcMediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

const DATA_CHANNEL_LABEL: &str = "room-data";

/// Media engine backed by the `webrtc` crate.
///
/// One instance per remote peer. All events are funneled into the
/// orchestrator's engine-event channel; nothing here mutates shared state.
pub struct WebRtcEngine {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl WebRtcEngine {
    pub async fn new(
        peer_id: PeerId,
        ice_servers: Vec<String>,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        let mut media = RtcMediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: if ice_servers.is_empty() {
                vec![]
            } else {
                vec![RTCIceServer {
                    urls: ice_servers,
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));

        // Connection-state changes drive the Open/Closed edges of the
        // orchestrator's state machine.
        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();
                Box::pin(async move {
                    info!("connection state for {uid}: {s:?}");
                    let _ = tx
                        .send(EngineEvent::StateChanged(uid, map_state(s)))
                        .await;
                })
            },
        ));

        // Trickle ICE: forward every generated local candidate.
        let ice_tx = event_tx.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    sdp: init.candidate,
                    sdp_mline_index: init.sdp_mline_index.map(i32::from).unwrap_or(0),
                    sdp_mid: init.sdp_mid,
                };
                let _ = tx.send(EngineEvent::CandidateGenerated(uid, candidate)).await;
            })
        }));

        // Responder side: the initiator creates the channel, we receive it.
        let dc_tx = event_tx.clone();
        let uid_dc = peer_id.clone();
        let dc_slot = data_channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let uid = uid_dc.clone();
            let slot = dc_slot.clone();
            Box::pin(async move {
                debug!("data channel '{}' announced by {uid}", dc.label());
                *slot.lock().await = Some(dc.clone());
                wire_data_channel(uid, dc, tx);
            })
        }));

        // Remote media is plumbed through untouched.
        let track_tx = event_tx.clone();
        let uid_track = peer_id.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let uid = uid_track.clone();
            Box::pin(async move {
                info!("remote track from {uid}");
                let _ = tx
                    .send(EngineEvent::RemoteMedia(uid, MediaSurface::new(track)))
                    .await;
            })
        }));

        Ok(Self {
            peer_id,
            peer_connection,
            data_channel,
            event_tx,
        })
    }
}

fn map_state(state: RTCPeerConnectionState) -> TransportState {
    match state {
        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => TransportState::New,
        RTCPeerConnectionState::Connecting => TransportState::Connecting,
        RTCPeerConnectionState::Connected => TransportState::Connected,
        RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
        RTCPeerConnectionState::Failed => TransportState::Failed,
        RTCPeerConnectionState::Closed => TransportState::Closed,
    }
}

/// Attach open/message handlers to a channel, whichever side created it.
fn wire_data_channel(peer_id: PeerId, dc: Arc<RTCDataChannel>, tx: mpsc::Sender<EngineEvent>) {
    let open_tx = tx.clone();
    let uid_open = peer_id.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let uid = uid_open.clone();
        Box::pin(async move {
            info!("data channel open for {uid}");
            let _ = tx.send(EngineEvent::ChannelOpen(uid)).await;
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx.clone();
        let uid = peer_id.clone();
        Box::pin(async move {
            let bytes = Bytes::from(msg.data.to_vec());
            let _ = tx.send(EngineEvent::Data(uid, bytes)).await;
        })
    }));
}

#[async_trait]
impl MediaEngine for WebRtcEngine {
    async fn produce_offer(&self) -> Result<SessionDescription> {
        // The channel must exist before the offer so its m-line is included.
        let mut slot = self.data_channel.lock().await;
        if slot.is_none() {
            let dc = self
                .peer_connection
                .create_data_channel(DATA_CHANNEL_LABEL, None)
                .await?;
            wire_data_channel(self.peer_id.clone(), dc.clone(), self.event_tx.clone());
            *slot = Some(dc);
        }
        drop(slot);

        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: offer.sdp,
        })
    }

    async fn produce_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: answer.sdp,
        })
    }

    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.sdp,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: u16::try_from(candidate.sdp_mline_index).ok(),
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn send_bytes(&self, data: Bytes) -> Result<()> {
        let dc = self
            .data_channel
            .lock()
            .await
            .clone()
            .ok_or_else(|| ClientError::MediaTransport("data channel not open".to_owned()))?;
        dc.send(&data).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(dc) = self.data_channel.lock().await.take() {
            if let Err(e) = dc.close().await {
                warn!("failed to close data channel for {}: {e}", self.peer_id);
            }
        }
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

/// Builds one `WebRtcEngine` per remote peer.
pub struct WebRtcEngineFactory {
    ice_servers: Vec<String>,
}

impl WebRtcEngineFactory {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl MediaEngineFactory for WebRtcEngineFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Arc<dyn MediaEngine>> {
        let engine = WebRtcEngine::new(peer_id, self.ice_servers.clone(), events).await?;
        Ok(Arc::new(engine))
    }
}
