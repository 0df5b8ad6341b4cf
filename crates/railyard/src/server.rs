//! `RailyardServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → world.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use railyard_protocol::{Codec, JsonCodec};
use railyard_transport::{Transport, TransportError, WebSocketTransport};
use railyard_world::{WorldConfig, WorldHandle, spawn_world};

use crate::RailyardError;
use crate::handler::handle_connection;

/// Shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) world: WorldHandle,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for a [`RailyardServer`].
///
/// ```rust,no_run
/// use railyard::prelude::*;
///
/// # async fn start() -> Result<(), RailyardError> {
/// let server = RailyardServer::builder()
///     .bind("0.0.0.0:3000")
///     .world_config(WorldConfig::single_train())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RailyardServerBuilder {
    bind_addr: String,
    world_config: WorldConfig,
    handshake_timeout: Duration,
}

impl RailyardServerBuilder {
    pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            world_config: WorldConfig::default(),
            handshake_timeout: Self::DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn world_config(mut self, config: WorldConfig) -> Self {
        self.world_config = config;
        self
    }

    /// How long a new peer has to finish the WebSocket upgrade before its
    /// socket is dropped.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and starts the world actor.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn build(self) -> Result<RailyardServer, RailyardError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let world = spawn_world(self.world_config);
        let state = Arc::new(ServerState {
            world,
            codec: JsonCodec,
            handshake_timeout: self.handshake_timeout,
        });
        Ok(RailyardServer { transport, state })
    }
}

impl Default for RailyardServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server with a running world. Call [`run`](Self::run) to start
/// accepting players.
pub struct RailyardServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
}

impl RailyardServer {
    pub fn builder() -> RailyardServerBuilder {
        RailyardServerBuilder::new()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// A handle to the world, e.g. to `step()` a manual-mode world.
    pub fn world(&self) -> WorldHandle {
        self.state.world.clone()
    }

    /// Accepts connections until the process ends.
    pub async fn run(self) -> Result<(), RailyardError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes, then stops the
    /// listener and the world. Open connections close once the world's
    /// channels do.
    ///
    /// The loop only takes sockets off the listener. Each WebSocket upgrade
    /// runs in that connection's own task.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), RailyardError> {
        tracing::info!(addr = %self.local_addr(), "Railyard server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(pending, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(TransportError::Shutdown) => break,
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                },
            }
        }

        tracing::info!("Railyard server shutting down");
        self.transport.shutdown().await?;
        // Already stopped is fine.
        let _ = self.state.world.shutdown().await;
        Ok(())
    }
}
