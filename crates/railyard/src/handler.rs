//! Per-connection handler: bridges one WebSocket to the world actor.
//!
//! Each accepted socket gets its own task running [`handle_connection`]:
//!   1. Finish the WebSocket upgrade within the handshake timeout
//!   2. Connect a session to the world (the world replies with `init`)
//!   3. Loop: inbound frames → world requests, world messages → frames
//!   4. On exit, a drop guard disconnects the session

use std::sync::Arc;
use std::time::Instant;

use railyard_protocol::{Channel, ClientMessage, Codec, Envelope, ServerMessage, SessionId};
use railyard_transport::{
    Connection, PendingWebSocket, Transport, WebSocketConnection, WebSocketTransport,
};
use railyard_world::WorldHandle;
use tokio::sync::mpsc;

use crate::RailyardError;
use crate::server::ServerState;

/// Disconnects the session when the handler exits, including by panic.
///
/// `Drop` is synchronous, so the disconnect runs as a detached task.
struct SessionGuard {
    session_id: SessionId,
    world: WorldHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session_id = self.session_id;
        let world = self.world.clone();
        tokio::spawn(async move {
            if let Err(e) = world.disconnect(session_id).await {
                tracing::debug!(%session_id, error = %e, "disconnect after close failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    pending: PendingWebSocket,
    state: Arc<ServerState<C>>,
) -> Result<(), RailyardError> {
    let conn = WebSocketTransport::upgrade(pending, state.handshake_timeout).await?;
    let session_id = SessionId::from(conn.id());
    let peer_addr = conn.peer_addr();
    let (tx, mut outbound) = mpsc::unbounded_channel();

    state.world.connect(session_id, tx).await?;
    let _guard = SessionGuard {
        session_id,
        world: state.world.clone(),
    };
    tracing::info!(%session_id, %peer_addr, "player connected");

    let start = Instant::now();
    let mut seq: u64 = 1;

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => route_frame(&state, session_id, &data).await?,
                Ok(None) => {
                    tracing::info!(%session_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%session_id, error = %e, "recv error");
                    break;
                }
            },
            msg = outbound.recv() => match msg {
                Some(msg) => send_message(&conn, &state.codec, msg, &mut seq, start).await?,
                None => {
                    tracing::info!(%session_id, "world stopped, closing connection");
                    let _ = conn.close().await;
                    break;
                }
            },
        }
    }

    // _guard drops here → session disconnect fires.
    Ok(())
}

/// Decodes one inbound frame and forwards it to the world. Frames that do
/// not decode are logged and dropped; the connection stays open.
async fn route_frame<C: Codec>(
    state: &ServerState<C>,
    session_id: SessionId,
    data: &[u8],
) -> Result<(), RailyardError> {
    let envelope: Envelope<ClientMessage> = match state.codec.decode(data) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(%session_id, error = %e, "failed to decode envelope");
            return Ok(());
        }
    };

    let world = &state.world;
    match envelope.payload {
        ClientMessage::Register(name) => {
            world.register(session_id, name.unwrap_or_default()).await?
        }
        ClientMessage::ToggleTrack { x, y } => world.toggle_track(session_id, x, y).await?,
        ClientMessage::StartTrain => world.spawn_train(session_id).await?,
    }
    Ok(())
}

/// Wraps a world message in an envelope and writes it, using the
/// unreliable path for messages that tolerate loss.
async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: ServerMessage,
    seq: &mut u64,
    start: Instant,
) -> Result<(), RailyardError> {
    let channel = msg.channel();
    let envelope = Envelope {
        seq: next_seq(seq),
        timestamp: start.elapsed().as_millis() as u64,
        channel,
        payload: msg,
    };
    let bytes = codec.encode(&envelope)?;
    match channel {
        Channel::Unreliable => conn.send_unreliable(&bytes).await?,
        Channel::ReliableOrdered | Channel::ReliableUnordered => conn.send(&bytes).await?,
    }
    Ok(())
}

fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
