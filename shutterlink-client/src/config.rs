use std::time::Duration;

/// Configuration for a room session.
#[derive(Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the relay server.
    pub relay_url: String,
    /// STUN/TURN urls handed to the media engine.
    pub ice_servers: Vec<String>,
    /// Deadline for createRoom/joinRoom request futures.
    pub request_timeout: Duration,
    /// Deadline for a peer negotiation to reach `Open`, counted from the
    /// first offer sent or received.
    pub negotiation_timeout: Duration,
    /// First relay reconnect delay; doubled per attempt.
    pub reconnect_initial_delay: Duration,
    /// Ceiling for the reconnect delay.
    pub reconnect_max_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:8080/signal".to_owned(),
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
            request_timeout: Duration::from_secs(10),
            negotiation_timeout: Duration::from_secs(30),
            reconnect_initial_delay: Duration::from_millis(500),
            reconnect_max_delay: Duration::from_secs(15),
        }
    }
}
