use crate::error::{ClientError, Result};
use crate::peer::OrchestratorCommand;
use bytes::Bytes;
use shutterlink_core::{ObjectFrame, ObjectUpdate, PeerId, SharedObject};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of feeding received bytes into the sync layer.
#[derive(Debug, PartialEq)]
pub enum RemoteApply {
    /// Not object traffic; hand the bytes to the application instead.
    NotObjectTraffic,
    /// Valid snapshot for an object mid-gesture locally; dropped so the
    /// local gesture is not fought over.
    Ignored,
    /// Snapshot applied last-writer-wins.
    Applied(ObjectUpdate),
}

/// Replicates overlay objects across the room over the open data channels.
///
/// Whole-object snapshots, not deltas: every local change rebroadcasts the
/// full object, so conflicting near-simultaneous edits converge on whatever
/// snapshot each peer received last. The data is cosmetic; brief divergence
/// is acceptable and self-heals on the next broadcast.
pub struct ObjectSync {
    objects: Mutex<HashMap<Uuid, SharedObject>>,
    /// Objects the local user is actively dragging/resizing. Remote
    /// snapshots for these are dropped until the gesture ends.
    active: Mutex<HashSet<Uuid>>,
    local_peer: Mutex<Option<PeerId>>,
    cmd_tx: mpsc::Sender<OrchestratorCommand>,
}

impl ObjectSync {
    pub fn new(cmd_tx: mpsc::Sender<OrchestratorCommand>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            active: Mutex::new(HashSet::new()),
            local_peer: Mutex::new(None),
            cmd_tx,
        }
    }

    /// Known once the room is created or joined.
    pub fn set_local_peer(&self, peer_id: PeerId) {
        *self.local_peer.lock().expect("lock poisoned") = Some(peer_id);
    }

    pub fn snapshot(&self) -> Vec<SharedObject> {
        self.objects
            .lock()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<SharedObject> {
        self.objects.lock().expect("lock poisoned").get(&id).cloned()
    }

    /// Create a new unowned object locally and replicate it.
    pub async fn create(&self, frame: ObjectFrame, image_ref: &str) -> Result<SharedObject> {
        let object = SharedObject::new(frame, image_ref);
        self.objects
            .lock()
            .expect("lock poisoned")
            .insert(object.id, object.clone());
        self.broadcast_upsert(object.clone()).await?;
        Ok(object)
    }

    /// Try to claim an object for a local drag/resize gesture.
    ///
    /// The claim succeeds when the object is unowned or already ours; it is
    /// atomic only from this peer's perspective, and the claim travels with
    /// the first snapshot. A losing near-simultaneous claimant finds out via
    /// whichever snapshot it receives last.
    pub async fn begin_gesture(&self, id: Uuid) -> Result<bool> {
        let claimed = {
            let local = self
                .local_peer
                .lock()
                .expect("lock poisoned")
                .clone()
                .ok_or(ClientError::NotInRoom)?;
            let mut objects = self.objects.lock().expect("lock poisoned");
            let object = objects.get_mut(&id).ok_or(ClientError::UnknownObject)?;
            match &object.owner {
                Some(owner) if *owner != local => None,
                _ => {
                    object.owner = Some(local);
                    Some(object.clone())
                }
            }
        };

        match claimed {
            Some(object) => {
                self.active.lock().expect("lock poisoned").insert(id);
                self.broadcast_upsert(object).await?;
                Ok(true)
            }
            None => {
                debug!("gesture on {id} rejected: owned by another peer");
                Ok(false)
            }
        }
    }

    /// Move/resize an object mid-gesture; rebroadcasts the full snapshot.
    pub async fn update_frame(&self, id: Uuid, frame: ObjectFrame) -> Result<()> {
        let object = {
            let mut objects = self.objects.lock().expect("lock poisoned");
            let object = objects.get_mut(&id).ok_or(ClientError::UnknownObject)?;
            object.frame = frame;
            object.clone()
        };
        self.broadcast_upsert(object).await
    }

    /// End the local gesture, releasing ownership back to the room.
    pub async fn end_gesture(&self, id: Uuid) -> Result<()> {
        let object = {
            let mut objects = self.objects.lock().expect("lock poisoned");
            let object = objects.get_mut(&id).ok_or(ClientError::UnknownObject)?;
            object.owner = None;
            object.clone()
        };
        self.active.lock().expect("lock poisoned").remove(&id);
        self.broadcast_upsert(object).await
    }

    /// Delete an object everywhere.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.objects.lock().expect("lock poisoned").remove(&id);
        self.active.lock().expect("lock poisoned").remove(&id);
        self.broadcast(ObjectUpdate::Delete { id }).await
    }

    /// Feed bytes received from a peer through the sync layer.
    pub fn apply_remote(&self, data: &Bytes) -> RemoteApply {
        let Ok(update) = serde_json::from_slice::<ObjectUpdate>(data) else {
            return RemoteApply::NotObjectTraffic;
        };

        let id = match &update {
            ObjectUpdate::Upsert(object) => object.id,
            ObjectUpdate::Delete { id } => *id,
        };
        if self.active.lock().expect("lock poisoned").contains(&id) {
            debug!("remote update for {id} dropped: local gesture in progress");
            return RemoteApply::Ignored;
        }

        let mut objects = self.objects.lock().expect("lock poisoned");
        match &update {
            ObjectUpdate::Upsert(object) => {
                objects.insert(object.id, object.clone());
            }
            ObjectUpdate::Delete { id } => {
                objects.remove(id);
            }
        }
        RemoteApply::Applied(update)
    }

    async fn broadcast_upsert(&self, object: SharedObject) -> Result<()> {
        self.broadcast(ObjectUpdate::Upsert(object)).await
    }

    async fn broadcast(&self, update: ObjectUpdate) -> Result<()> {
        let bytes = match serde_json::to_vec(&update) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!("object update could not be serialized: {e}");
                return Err(ClientError::MediaTransport(e.to_string()));
            }
        };
        self.cmd_tx
            .send(OrchestratorCommand::Broadcast(bytes))
            .await
            .map_err(|_| ClientError::SessionClosed)
    }
}
