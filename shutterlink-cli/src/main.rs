use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use colored::*;
use shutterlink_client::{
    ClientConfig, CoreEvent, RoomSession, WebRtcEngineFactory,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shutterlink")]
#[command(about = "Join a peer-to-peer room and chat over data channels")]
struct Cli {
    /// WebSocket URL of the relay server.
    #[arg(long, default_value = "ws://127.0.0.1:8080/signal")]
    relay: String,

    /// STUN server handed to the media engine.
    #[arg(long, default_value = "stun:stun.l.google.com:19302")]
    stun: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new room and wait for peers.
    Create,
    /// Join an existing room by its code.
    Join {
        /// Room code; prompted for when omitted.
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig {
        relay_url: cli.relay,
        ice_servers: vec![cli.stun],
        ..ClientConfig::default()
    };

    let engines = Arc::new(WebRtcEngineFactory::new(config.ice_servers.clone()));
    let (session, events) = RoomSession::connect(config, engines)
        .await
        .context("could not reach the relay server")?;

    match cli.command {
        Commands::Create => {
            let identity = session.create_room().await.context("createRoom failed")?;
            println!("{}", "Room created.".green().bold());
            println!("   Code: {}", identity.room_id.to_string().cyan().bold());
            println!("   You:  {}", identity.host_user_id);
        }
        Commands::Join { code } => {
            let code = match code {
                Some(code) => code,
                None => dialoguer::Input::new()
                    .with_prompt("Room code")
                    .interact_text()
                    .context("no room code given")?,
            };
            let joined = session
                .join_room(code.as_str().into())
                .await
                .context("joinRoom failed")?;
            println!("{}", "Joined room.".green().bold());
            println!("   You:   {}", joined.local_peer_id);
            println!("   Peers: {}", joined.peers.len());
        }
    }
    println!("{}", "Type a line to send it to everyone; Ctrl-D to leave.".dimmed());

    let session = Arc::new(session);
    tokio::spawn(print_events(events));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        if let Err(e) = session.broadcast(Bytes::from(line)).await {
            eprintln!("{} {e}", "send failed:".red());
        }
    }

    session.leave().await;
    println!("{}", "Left the room.".dimmed());
    Ok(())
}

async fn print_events(mut events: mpsc::Receiver<CoreEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            CoreEvent::PeerStateChanged { peer_id, state } => {
                println!("{} {peer_id} -> {state:?}", "peer".yellow());
            }
            CoreEvent::ChannelOpen(peer_id) => {
                println!("{} channel to {peer_id} is open", "open".green());
            }
            CoreEvent::Data { peer_id, data } => {
                let text = String::from_utf8_lossy(&data);
                println!("{} {}", format!("{peer_id}:").cyan().bold(), text);
            }
            CoreEvent::RemoteMedia { peer_id, .. } => {
                println!("{} media track from {peer_id}", "media".magenta());
            }
            CoreEvent::PeerUnreachable(peer_id) => {
                println!("{} {peer_id} could not be reached", "fail".red());
            }
            CoreEvent::PeerClosed(peer_id) => {
                println!("{} {peer_id} left", "bye".dimmed());
            }
            CoreEvent::ObjectChanged(object) => {
                println!(
                    "{} {} at ({}, {})",
                    "object".blue(),
                    object.id,
                    object.frame.x,
                    object.frame.y
                );
            }
            CoreEvent::ObjectRemoved(id) => {
                println!("{} {id} removed", "object".blue());
            }
        }
    }
}
