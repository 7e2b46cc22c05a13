use crate::error::{ClientError, Result};
use crate::relay::{RelayEvent, RelayTransport};
use crate::room::RoomEvent;
use shutterlink_core::codec;
use shutterlink_core::{
    CreateRoomResponse, IceCandidateMessage, JoinRoomRequest, JoinRoomResponse, MessageType,
    NotifyNewUser, PeerId, RoomId, RoomIdentity, SessionDescriptionMessage,
};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Result of a successful join: the id the relay assigned us plus the
/// roster of peers already present.
#[derive(Debug)]
pub struct JoinedRoom {
    pub local_peer_id: PeerId,
    pub peers: Vec<PeerId>,
}

#[derive(Default)]
struct Pending {
    create: Option<oneshot::Sender<Result<RoomIdentity>>>,
    join: Option<oneshot::Sender<Result<JoinedRoom>>>,
}

/// Room-protocol layer: turns create/join intents into wire requests and
/// demultiplexes the inbound relay stream into typed [`RoomEvent`]s.
///
/// At most one createRoom and one joinRoom may be pending at a time; a
/// session joins at most one room.
pub struct RoomClient {
    relay: Arc<dyn RelayTransport>,
    pending: Mutex<Pending>,
    request_timeout: Duration,
}

impl RoomClient {
    pub fn new(relay: Arc<dyn RelayTransport>, request_timeout: Duration) -> Self {
        Self {
            relay,
            pending: Mutex::new(Pending::default()),
            request_timeout,
        }
    }

    /// Ask the relay to create a room. Resolves with the room's identity or
    /// fails with `Timeout`/`ConnectionLost`. An encode failure is reported
    /// synchronously; the request never leaves the process.
    pub async fn create_room(&self) -> Result<RoomIdentity> {
        let bytes = codec::encode_bare(MessageType::CreateRoom).map_err(ClientError::Encoding)?;

        let rx = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if pending.create.is_some() {
                return Err(ClientError::RequestPending("createRoom"));
            }
            let (tx, rx) = oneshot::channel();
            pending.create = Some(tx);
            rx
        };

        if let Err(e) = self.relay.send(bytes).await {
            self.pending.lock().expect("pending lock poisoned").create = None;
            return Err(e);
        }

        self.await_response(rx, "createRoom").await
    }

    /// Join an existing room. Resolves with the local peer id and roster.
    pub async fn join_room(&self, room_id: RoomId) -> Result<JoinedRoom> {
        let request = JoinRoomRequest { room_id };
        let bytes =
            codec::encode(MessageType::JoinRoom, &request).map_err(ClientError::Encoding)?;

        let rx = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if pending.join.is_some() {
                return Err(ClientError::RequestPending("joinRoom"));
            }
            let (tx, rx) = oneshot::channel();
            pending.join = Some(tx);
            rx
        };

        if let Err(e) = self.relay.send(bytes).await {
            self.pending.lock().expect("pending lock poisoned").join = None;
            return Err(e);
        }

        self.await_response(rx, "joinRoom").await
    }

    async fn await_response<T>(
        &self,
        rx: oneshot::Receiver<Result<T>>,
        what: &'static str,
    ) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::SessionClosed),
            Err(_) => {
                warn!("{what} response did not arrive within {:?}", self.request_timeout);
                let mut pending = self.pending.lock().expect("pending lock poisoned");
                match what {
                    "createRoom" => pending.create = None,
                    _ => pending.join = None,
                }
                Err(ClientError::Timeout)
            }
        }
    }

    /// Forward a local session description to a peer via the relay.
    pub async fn send_description(&self, message: SessionDescriptionMessage) -> Result<()> {
        let bytes = codec::encode(MessageType::Sdp, &message).map_err(ClientError::Encoding)?;
        self.relay.send(bytes).await
    }

    /// Forward a locally generated ICE candidate to a peer via the relay.
    pub async fn send_candidate(&self, message: IceCandidateMessage) -> Result<()> {
        let bytes =
            codec::encode(MessageType::IceCandidate, &message).map_err(ClientError::Encoding)?;
        self.relay.send(bytes).await
    }

    /// Route one relay event. Returns a [`RoomEvent`] when the message is a
    /// notification the orchestrator must see; request responses resolve
    /// their pending futures internally.
    ///
    /// Decode failures affect only the offending message: they are logged
    /// and the message is dropped, leaving everything else untouched.
    pub fn handle_relay_event(&self, event: RelayEvent) -> Option<RoomEvent> {
        match event {
            RelayEvent::Connected => {
                debug!("relay connected");
                None
            }
            RelayEvent::Disconnected => {
                self.fail_pending();
                Some(RoomEvent::RelayLost)
            }
            RelayEvent::Message(bytes) => self.handle_message(&bytes),
        }
    }

    fn handle_message(&self, bytes: &[u8]) -> Option<RoomEvent> {
        let envelope = match codec::decode_envelope(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("undecodable relay message dropped: {e}");
                return None;
            }
        };

        match envelope.message_type {
            MessageType::CreateRoom => {
                match codec::decode_payload::<CreateRoomResponse>(&envelope) {
                    Ok(response) => {
                        let identity = response.into_identity();
                        info!("room created: {}", identity.room_id);
                        self.resolve_create(Ok(identity));
                    }
                    Err(e) => warn!("createRoom response dropped: {e}"),
                }
                None
            }
            MessageType::JoinRoom => {
                match codec::decode_payload::<JoinRoomResponse>(&envelope) {
                    Ok(response) => {
                        info!(
                            "joined room as {} with {} existing peer(s)",
                            response.user_id,
                            response.user_list.len()
                        );
                        self.resolve_join(Ok(JoinedRoom {
                            local_peer_id: response.user_id,
                            peers: response.user_list,
                        }));
                    }
                    Err(e) => warn!("joinRoom response dropped: {e}"),
                }
                None
            }
            MessageType::NotifyNewUser => {
                match codec::decode_payload::<NotifyNewUser>(&envelope) {
                    Ok(notify) => Some(RoomEvent::NewPeer(notify.new_user_id)),
                    Err(e) => {
                        warn!("notifyNewUser dropped: {e}");
                        None
                    }
                }
            }
            MessageType::Sdp => match codec::decode_payload::<SessionDescriptionMessage>(&envelope)
            {
                Ok(message) => Some(RoomEvent::RemoteDescription(message)),
                Err(e) => {
                    warn!("sdp message dropped: {e}");
                    None
                }
            },
            MessageType::IceCandidate => {
                match codec::decode_payload::<IceCandidateMessage>(&envelope) {
                    Ok(message) => Some(RoomEvent::RemoteCandidate(message)),
                    Err(e) => {
                        warn!("iceCandidate message dropped: {e}");
                        None
                    }
                }
            }
            MessageType::Unknown => {
                warn!("unknown messageType dropped");
                None
            }
        }
    }

    fn resolve_create(&self, result: Result<RoomIdentity>) {
        let slot = self.pending.lock().expect("pending lock poisoned").create.take();
        match slot {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => warn!("createRoom response with no pending request"),
        }
    }

    fn resolve_join(&self, result: Result<JoinedRoom>) {
        let slot = self.pending.lock().expect("pending lock poisoned").join.take();
        match slot {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => warn!("joinRoom response with no pending request"),
        }
    }

    fn fail_pending(&self) {
        let (create, join) = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            (pending.create.take(), pending.join.take())
        };
        if let Some(tx) = create {
            let _ = tx.send(Err(ClientError::ConnectionLost));
        }
        if let Some(tx) = join {
            let _ = tx.send(Err(ClientError::ConnectionLost));
        }
    }
}
