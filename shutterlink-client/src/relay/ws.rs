use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::relay::{RelayEvent, RelayTransport};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Persistent WebSocket connection to the relay server.
///
/// Owns its socket inside a single spawned loop; outbound payloads arrive on
/// a channel, inbound payloads and connection edges leave as [`RelayEvent`]s.
/// A dropped socket is retried with doubling delays up to the configured cap.
pub struct WsRelayTransport {
    out_tx: mpsc::Sender<Bytes>,
    shutdown_tx: watch::Sender<bool>,
}

impl WsRelayTransport {
    /// Connect to the relay. The first connection attempt must succeed;
    /// later drops are handled by the internal reconnect loop.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, mpsc::Receiver<RelayEvent>)> {
        let stream = connect_async(&config.relay_url)
            .await
            .map(|(ws, _)| ws)
            .map_err(|e| {
                warn!("relay connect to {} failed: {e}", config.relay_url);
                ClientError::ConnectionLost
            })?;
        info!("connected to relay {}", config.relay_url);

        let (out_tx, out_rx) = mpsc::channel::<Bytes>(256);
        let (event_tx, event_rx) = mpsc::channel::<RelayEvent>(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = Runner {
            url: config.relay_url.clone(),
            initial_delay: config.reconnect_initial_delay,
            max_delay: config.reconnect_max_delay,
            out_rx,
            event_tx,
            shutdown_rx,
        };
        tokio::spawn(runner.run(stream));

        Ok((
            Self {
                out_tx,
                shutdown_tx,
            },
            event_rx,
        ))
    }
}

#[async_trait]
impl RelayTransport for WsRelayTransport {
    async fn send(&self, data: Bytes) -> Result<()> {
        self.out_tx
            .send(data)
            .await
            .map_err(|_| ClientError::ConnectionLost)
    }

    fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

struct Runner {
    url: String,
    initial_delay: Duration,
    max_delay: Duration,
    out_rx: mpsc::Receiver<Bytes>,
    event_tx: mpsc::Sender<RelayEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Runner {
    async fn run(mut self, first: WsStream) {
        let _ = self.event_tx.send(RelayEvent::Connected).await;
        let mut stream = Some(first);
        let mut delay = self.initial_delay;

        loop {
            let ws = match stream.take() {
                Some(ws) => ws,
                None => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown_rx.changed() => return,
                    }
                    match connect_async(&self.url).await {
                        Ok((ws, _)) => {
                            info!("relay reconnected");
                            delay = self.initial_delay;
                            let _ = self.event_tx.send(RelayEvent::Connected).await;
                            ws
                        }
                        Err(e) => {
                            warn!("relay reconnect failed: {e}; next attempt in {delay:?}");
                            delay = (delay * 2).min(self.max_delay);
                            continue;
                        }
                    }
                }
            };

            let socket_dropped = self.pump(ws).await;
            if !socket_dropped {
                return;
            }
            let _ = self.event_tx.send(RelayEvent::Disconnected).await;
        }
    }

    /// Drive one live socket. Returns true if the socket dropped and a
    /// reconnect should follow, false on shutdown.
    async fn pump(&mut self, ws: WsStream) -> bool {
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                out = self.out_rx.recv() => {
                    // All senders gone means the session is being torn down.
                    let Some(bytes) = out else { return false };
                    if let Err(e) = write.send(Message::Binary(bytes.to_vec())).await {
                        warn!("relay send failed: {e}");
                        return true;
                    }
                }
                inbound = read.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            let _ = self
                                .event_tx
                                .send(RelayEvent::Message(Bytes::from(text.into_bytes())))
                                .await;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            let _ = self
                                .event_tx
                                .send(RelayEvent::Message(Bytes::from(data)))
                                .await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("relay socket closed");
                            return true;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("relay socket error: {e}");
                            return true;
                        }
                    }
                }
                _ = self.shutdown_rx.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return false;
                }
            }
        }
    }
}
