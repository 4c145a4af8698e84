//! TCP listener and per-connection relay loop
//!
//! Accepts incoming terminal connections and spawns a relay task for each.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use ol_core::config::HubConfig;
use ol_protocol::EventCodec;

use crate::registry::PeerRegistry;

/// Outbound channel capacity per peer.
///
/// Holds events queued for one terminal between the broadcast path and
/// that terminal's writer task. A terminal that falls further behind than
/// this starts losing events rather than stalling the hub.
const PEER_CHANNEL_CAPACITY: usize = 256;

/// Relay hub server that listens for terminal connections
pub struct HubServer {
    /// Server configuration
    config: HubConfig,
    /// Shared peer registry
    registry: Arc<PeerRegistry>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl HubServer {
    /// Create a new hub server
    pub fn new(config: HubConfig, registry: Arc<PeerRegistry>, cancel: CancellationToken) -> Self {
        Self {
            config,
            registry,
            cancel,
        }
    }

    /// Bind the configured address and run the accept loop
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .with_context(|| format!("Failed to bind to {}", self.config.bind_address))?;

        self.serve(listener).await
    }

    /// Run the accept loop on an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Relay hub listening on {}", local_addr);

        loop {
            tokio::select! {
                // Check for shutdown
                _ = self.cancel.cancelled() => {
                    tracing::info!("Relay hub shutting down");
                    break;
                }

                // Accept new connections
                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            self.handle_connection(socket, peer_addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle a new incoming terminal connection
    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        if let Some(max) = self.config.max_connections {
            if self.registry.len() >= max as usize {
                tracing::warn!("Rejecting {}: connection limit {} reached", peer_addr, max);
                return;
            }
        }

        tracing::info!("Terminal connected from {}", peer_addr);

        let registry = Arc::clone(&self.registry);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            relay_connection(socket, registry, cancel).await;
            tracing::info!("Terminal at {} disconnected", peer_addr);
        });
    }
}

/// Relay loop for one terminal connection.
///
/// Registers the peer, announces the updated count, then forwards every
/// inbound event to all other peers until the connection closes.
async fn relay_connection(
    socket: TcpStream,
    registry: Arc<PeerRegistry>,
    cancel: CancellationToken,
) {
    let (out_tx, mut out_rx) = mpsc::channel(PEER_CHANNEL_CAPACITY);
    let peer_id = registry.register(out_tx);
    registry.broadcast_peer_count();

    let framed = Framed::new(socket, EventCodec::new());
    let (mut sink, mut stream) = framed.split();

    // Writer task: pump queued events out to this terminal
    let writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            if let Err(e) = sink.send(event).await {
                tracing::debug!("Write to terminal failed: {}", e);
                break;
            }
        }
    });

    // Read loop: relay each inbound event to every other peer
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(event)) => {
                        tracing::debug!("Relaying {:?} from {}", event.event_type(), peer_id);
                        registry.broadcast(peer_id, &event);
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Protocol error from {}: {}", peer_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Dropping the registry entry closes the writer's channel
    registry.unregister(peer_id);
    registry.broadcast_peer_count();
    let _ = writer.await;
}
