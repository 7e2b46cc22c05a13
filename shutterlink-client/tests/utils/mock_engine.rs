use async_trait::async_trait;
use bytes::Bytes;
use shutterlink_client::engine::{EngineEvent, MediaEngine, MediaEngineFactory};
use shutterlink_client::error::Result;
use shutterlink_core::{IceCandidate, PeerId, SdpKind, SessionDescription};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One recorded call into the engine double, in invocation order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    ProduceOffer,
    ProduceAnswer,
    ApplyLocal(SessionDescription),
    ApplyRemote(SessionDescription),
    Candidate(IceCandidate),
    Sent(Bytes),
}

/// Media engine double: records every call and hands out canned SDP.
/// Tests inject transport-side events through [`MockMediaEngine::push`].
pub struct MockMediaEngine {
    peer_id: PeerId,
    calls: Mutex<Vec<EngineCall>>,
    closed: AtomicBool,
    events: mpsc::Sender<EngineEvent>,
}

impl MockMediaEngine {
    fn new(peer_id: PeerId, events: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            peer_id,
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            events,
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Remote candidates handed to the engine, in the order they arrived.
    pub fn remote_candidates(&self) -> Vec<IceCandidate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Candidate(candidate) => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn applied_remote_descriptions(&self) -> Vec<SessionDescription> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::ApplyRemote(desc) => Some(desc),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Sent(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Inject a transport-side event as if the real engine produced it.
    pub async fn push(&self, event: EngineEvent) {
        self.events.send(event).await.expect("engine events closed");
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn produce_offer(&self) -> Result<SessionDescription> {
        self.record(EngineCall::ProduceOffer);
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: format!("v=0 offer-for-{}", self.peer_id),
        })
    }

    async fn produce_answer(&self) -> Result<SessionDescription> {
        self.record(EngineCall::ProduceAnswer);
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: format!("v=0 answer-for-{}", self.peer_id),
        })
    }

    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(EngineCall::ApplyLocal(desc));
        Ok(())
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(EngineCall::ApplyRemote(desc));
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(EngineCall::Candidate(candidate));
        Ok(())
    }

    async fn send_bytes(&self, data: Bytes) -> Result<()> {
        self.record(EngineCall::Sent(data));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one [`MockMediaEngine`] per peer and keeps them reachable for
/// assertions after the orchestrator has taken ownership.
#[derive(Default)]
pub struct MockEngineFactory {
    engines: Mutex<HashMap<PeerId, Arc<MockMediaEngine>>>,
}

impl MockEngineFactory {
    pub fn engine(&self, peer_id: &PeerId) -> Option<Arc<MockMediaEngine>> {
        self.engines
            .lock()
            .expect("engines lock poisoned")
            .get(peer_id)
            .cloned()
    }

    pub fn engine_count(&self) -> usize {
        self.engines.lock().expect("engines lock poisoned").len()
    }
}

#[async_trait]
impl MediaEngineFactory for MockEngineFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Arc<dyn MediaEngine>> {
        let engine = Arc::new(MockMediaEngine::new(peer_id.clone(), events));
        self.engines
            .lock()
            .expect("engines lock poisoned")
            .insert(peer_id, engine.clone());
        Ok(engine)
    }
}
