//! Outbound TCP connector to the relay hub
//!
//! Establishes the terminal's persistent connection and runs the I/O task
//! that moves framed events between the socket and the sync agent.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use ol_core::config::TerminalConfig;
use ol_protocol::{EventCodec, SyncEvent};

use super::retry::RetryPolicy;
use super::status::LinkStatus;

/// Channel capacity for events in either direction.
///
/// 256 gives headroom for bursts (a rush of orders, a peer replaying its
/// screen) without letting a stuck consumer pin unbounded memory.
const LINK_CHANNEL_CAPACITY: usize = 256;

/// Connection errors surfaced by the connector
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The hub did not answer within the connect timeout
    #[error("Connection to {addr} timed out")]
    Timeout { addr: String },

    /// TCP-level failure reaching the hub
    #[error("Failed to connect to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The retry budget ran out without a successful connection
    #[error("Hub unreachable after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },
}

/// Events delivered from the link to the sync agent
#[derive(Debug)]
pub enum LinkEvent {
    /// A sync event arrived from the hub
    Event(SyncEvent),
    /// The connection closed; no further events will arrive
    Disconnected,
}

/// Dials the hub and produces active links.
///
/// One connector per terminal process, constructed at startup and owned
/// explicitly so tests can substitute a fake transport at the sink seam.
pub struct HubConnector {
    config: TerminalConfig,
    status: Arc<LinkStatus>,
}

impl HubConnector {
    /// Create a new connector
    pub fn new(config: TerminalConfig, status: Arc<LinkStatus>) -> Self {
        Self { config, status }
    }

    /// Get the terminal configuration
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Attempt a single connection to the hub
    pub async fn try_connect(&self) -> Result<ActiveLink, ConnectError> {
        let addr = self.config.hub_address.clone();

        tracing::debug!("Connecting to hub at {}", addr);
        let socket = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(addr.as_str()),
        )
            .await
            .map_err(|_| ConnectError::Timeout { addr: addr.clone() })?
            .map_err(|e| ConnectError::Io {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("Connected to hub at {}", addr);
        Ok(self.spawn_io(socket))
    }

    /// Connect with a bounded number of fixed-delay retries.
    ///
    /// Returns `AttemptsExhausted` once the budget is spent; the caller is
    /// expected to continue in offline mode and surface a persistent
    /// disconnected status to the operator.
    pub async fn connect_with_retry(&self, policy: RetryPolicy) -> Result<ActiveLink, ConnectError> {
        let max = policy.max_attempts();
        for attempt in 1..=max {
            match self.try_connect().await {
                Ok(link) => return Ok(link),
                Err(e) => {
                    tracing::warn!("Connection attempt {}/{} failed: {}", attempt, max, e);
                    if attempt < max {
                        tokio::time::sleep(policy.delay()).await;
                    }
                }
            }
        }
        Err(ConnectError::AttemptsExhausted { attempts: max })
    }

    /// Spawn the I/O task over a connected socket and hand back the link
    fn spawn_io(&self, socket: TcpStream) -> ActiveLink {
        let (out_tx, mut out_rx) = mpsc::channel::<SyncEvent>(LINK_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<LinkEvent>(LINK_CHANNEL_CAPACITY);

        let status = Arc::clone(&self.status);
        status.set_connected(true);

        tokio::spawn(async move {
            let framed = Framed::new(socket, EventCodec::new());
            let (mut sink, mut stream) = framed.split();

            loop {
                tokio::select! {
                    outbound = out_rx.recv() => {
                        match outbound {
                            Some(event) => {
                                if let Err(e) = sink.send(event).await {
                                    tracing::warn!("Write to hub failed: {}", e);
                                    break;
                                }
                            }
                            // Link handle dropped; shut the connection down
                            None => break,
                        }
                    }
                    frame = stream.next() => {
                        match frame {
                            Some(Ok(event)) => {
                                if let SyncEvent::PeerCount(count) = event {
                                    status.set_peer_count(count);
                                }
                                if event_tx.send(LinkEvent::Event(event)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!("Protocol error from hub: {}", e);
                                break;
                            }
                            None => {
                                tracing::info!("Hub closed the connection");
                                break;
                            }
                        }
                    }
                }
            }

            status.set_connected(false);
            let _ = event_tx.send(LinkEvent::Disconnected).await;
        });

        ActiveLink {
            outbound: out_tx,
            events: event_rx,
            status: Arc::clone(&self.status),
        }
    }
}

/// An established connection to the hub
pub struct ActiveLink {
    /// Outbound event channel into the I/O task
    outbound: mpsc::Sender<SyncEvent>,
    /// Inbound events from the hub
    events: mpsc::Receiver<LinkEvent>,
    /// Shared liveness state
    status: Arc<LinkStatus>,
}

impl ActiveLink {
    /// Clone the outbound sender, for use as the agent's broadcast sink
    pub fn sender(&self) -> mpsc::Sender<SyncEvent> {
        self.outbound.clone()
    }

    /// Receive the next inbound event
    pub async fn recv_event(&mut self) -> Option<LinkEvent> {
        self.events.recv().await
    }

    /// Shared liveness state for this link
    pub fn status(&self) -> Arc<LinkStatus> {
        Arc::clone(&self.status)
    }
}
