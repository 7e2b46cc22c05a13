use crate::config::ClientConfig;
use crate::engine::MediaEngineFactory;
use crate::error::{ClientError, Result};
use crate::event::CoreEvent;
use crate::peer::{NegotiationState, Orchestrator, OrchestratorCommand};
use crate::relay::{RelayEvent, RelayTransport, WsRelayTransport};
use crate::room::{JoinedRoom, RoomClient, RoomEvent};
use crate::sync::{ObjectSync, RemoteApply};
use bytes::Bytes;
use dashmap::DashMap;
use shutterlink_core::{ObjectUpdate, PeerId, RoomId, RoomIdentity};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One participant's connection to one room.
///
/// Wires the relay transport, room protocol, peer orchestrator and object
/// sync together and exposes the app-facing surface. Created by [`connect`],
/// which also hands back the stream of [`CoreEvent`]s to render from.
///
/// [`connect`]: RoomSession::connect
pub struct RoomSession {
    cmd_tx: mpsc::Sender<OrchestratorCommand>,
    room_client: Arc<RoomClient>,
    relay: Arc<dyn RelayTransport>,
    objects: Arc<ObjectSync>,
    roster: Arc<DashMap<PeerId, NegotiationState>>,
    identity: Mutex<Option<(PeerId, RoomId)>>,
}

impl RoomSession {
    /// Connect to the relay and assemble the session plumbing. The session
    /// is in no room yet; follow with [`create_room`] or [`join_room`].
    ///
    /// [`create_room`]: RoomSession::create_room
    /// [`join_room`]: RoomSession::join_room
    pub async fn connect(
        config: ClientConfig,
        engines: Arc<dyn MediaEngineFactory>,
    ) -> Result<(Self, mpsc::Receiver<CoreEvent>)> {
        let (transport, relay_rx) = WsRelayTransport::connect(&config).await?;
        let relay: Arc<dyn RelayTransport> = Arc::new(transport);
        let room_client = Arc::new(RoomClient::new(relay.clone(), config.request_timeout));

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (raw_tx, raw_rx) = mpsc::channel(256);
        let (app_tx, app_rx) = mpsc::channel(256);
        let roster = Arc::new(DashMap::new());
        let objects = Arc::new(ObjectSync::new(cmd_tx.clone()));

        let orchestrator = Orchestrator::new(
            cmd_rx,
            engines,
            room_client.clone(),
            raw_tx,
            roster.clone(),
            config.negotiation_timeout,
        );
        tokio::spawn(orchestrator.run());
        tokio::spawn(pump_relay(relay_rx, room_client.clone(), cmd_tx.clone()));
        tokio::spawn(route_events(raw_rx, app_tx, objects.clone()));

        Ok((
            Self {
                cmd_tx,
                room_client,
                relay,
                objects,
                roster,
                identity: Mutex::new(None),
            },
            app_rx,
        ))
    }

    /// Create a room and become its host. The host initiates toward nobody;
    /// it responds to joiners as they are announced.
    pub async fn create_room(&self) -> Result<RoomIdentity> {
        let identity = self.room_client.create_room().await?;
        self.adopt_identity(identity.host_user_id.clone(), identity.room_id.clone())
            .await?;
        Ok(identity)
    }

    /// Join an existing room and initiate a connection toward every peer
    /// already present.
    pub async fn join_room(&self, room_id: RoomId) -> Result<JoinedRoom> {
        let joined = self.room_client.join_room(room_id.clone()).await?;
        self.adopt_identity(joined.local_peer_id.clone(), room_id)
            .await?;
        for peer in &joined.peers {
            self.cmd_tx
                .send(OrchestratorCommand::ConnectTo(peer.clone()))
                .await
                .map_err(|_| ClientError::SessionClosed)?;
        }
        Ok(joined)
    }

    async fn adopt_identity(&self, local_peer_id: PeerId, room_id: RoomId) -> Result<()> {
        info!("local identity is {local_peer_id} in room {room_id}");
        *self.identity.lock().expect("identity lock poisoned") =
            Some((local_peer_id.clone(), room_id.clone()));
        self.objects.set_local_peer(local_peer_id.clone());
        self.cmd_tx
            .send(OrchestratorCommand::SetLocalIdentity {
                local_peer_id,
                room_id,
            })
            .await
            .map_err(|_| ClientError::SessionClosed)
    }

    /// Send bytes to every peer whose data channel is open.
    pub async fn broadcast(&self, data: Bytes) -> Result<()> {
        self.in_room()?;
        self.cmd_tx
            .send(OrchestratorCommand::Broadcast(data))
            .await
            .map_err(|_| ClientError::SessionClosed)
    }

    /// Send bytes to a single peer.
    pub async fn send_to(&self, peer_id: PeerId, data: Bytes) -> Result<()> {
        self.in_room()?;
        self.cmd_tx
            .send(OrchestratorCommand::SendTo(peer_id, data))
            .await
            .map_err(|_| ClientError::SessionClosed)
    }

    /// Shared overlay objects replicated across the room.
    pub fn objects(&self) -> Arc<ObjectSync> {
        self.objects.clone()
    }

    /// Current view of every known peer and its negotiation state.
    pub fn peers(&self) -> Vec<(PeerId, NegotiationState)> {
        self.roster
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.identity
            .lock()
            .expect("identity lock poisoned")
            .as_ref()
            .map(|(peer, _)| peer.clone())
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.identity
            .lock()
            .expect("identity lock poisoned")
            .as_ref()
            .map(|(_, room)| room.clone())
    }

    /// Tear everything down: peer sessions first, then the relay socket.
    pub async fn leave(&self) {
        let _ = self.cmd_tx.send(OrchestratorCommand::Leave).await;
        self.relay.close();
    }

    fn in_room(&self) -> Result<()> {
        if self.identity.lock().expect("identity lock poisoned").is_some() {
            Ok(())
        } else {
            Err(ClientError::NotInRoom)
        }
    }
}

/// Feed inbound relay traffic through the room protocol and forward the
/// notifications the orchestrator must act on.
async fn pump_relay(
    mut relay_rx: mpsc::Receiver<RelayEvent>,
    room_client: Arc<RoomClient>,
    cmd_tx: mpsc::Sender<OrchestratorCommand>,
) {
    while let Some(event) = relay_rx.recv().await {
        let Some(room_event) = room_client.handle_relay_event(event) else {
            continue;
        };
        let cmd = match room_event {
            RoomEvent::NewPeer(peer_id) => OrchestratorCommand::PeerObserved(peer_id),
            RoomEvent::RemoteDescription(msg) => OrchestratorCommand::RemoteDescription(msg),
            RoomEvent::RemoteCandidate(msg) => OrchestratorCommand::RemoteCandidate(msg),
            RoomEvent::RelayLost => OrchestratorCommand::RelayLost,
        };
        if cmd_tx.send(cmd).await.is_err() {
            debug!("orchestrator gone, relay pump stopping");
            return;
        }
    }
}

/// Siphon object traffic out of the peer data stream; everything else goes
/// to the application untouched.
async fn route_events(
    mut raw_rx: mpsc::Receiver<CoreEvent>,
    app_tx: mpsc::Sender<CoreEvent>,
    objects: Arc<ObjectSync>,
) {
    while let Some(event) = raw_rx.recv().await {
        let forward = match event {
            CoreEvent::Data { peer_id, data } => match objects.apply_remote(&data) {
                RemoteApply::NotObjectTraffic => Some(CoreEvent::Data { peer_id, data }),
                RemoteApply::Ignored => None,
                RemoteApply::Applied(ObjectUpdate::Upsert(object)) => {
                    Some(CoreEvent::ObjectChanged(object))
                }
                RemoteApply::Applied(ObjectUpdate::Delete { id }) => {
                    Some(CoreEvent::ObjectRemoved(id))
                }
            },
            other => Some(other),
        };
        if let Some(event) = forward {
            if app_tx.send(event).await.is_err() {
                debug!("application receiver gone, event router stopping");
                return;
            }
        }
    }
}
