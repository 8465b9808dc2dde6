// /ws: every sampled snapshot, pushed as a JSON text frame.
// One broadcast subscription per client; the sampler never waits on a socket.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};

use super::AppState;
use crate::models::Snapshot;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Live /ws client count; +1 on creation, -1 on drop.
struct ClientSlot(Arc<AtomicUsize>);

impl ClientSlot {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ClientSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_snapshots(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Subscribe before the upgrade completes so no snapshot sent after the handshake is missed.
    let rx = state.snapshots_tx.subscribe();
    let clients = state.ws_connections.clone();
    ws.on_upgrade(move |socket| async move {
        let _slot = ClientSlot::acquire(clients);
        match forward_snapshots(socket, rx).await {
            Ok(sent) => tracing::info!(operation = "ws_stream", sent, "client disconnected"),
            Err(e) => tracing::info!(operation = "ws_stream", error = %e, "stream ended"),
        }
    })
}

/// False once the socket is gone or a send stalls past `WS_SEND_TIMEOUT`.
async fn send_frame(socket: &mut WebSocket, frame: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(frame)).await, Ok(Ok(())))
}

/// Pumps snapshots to the client until it leaves; returns the number of frames sent.
async fn forward_snapshots(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<Snapshot>,
) -> anyhow::Result<u64> {
    tracing::info!(operation = "ws_stream", "client connected");
    let mut keepalive = interval(WS_PING_INTERVAL);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Ok(snapshot) => {
                    let payload = serde_json::to_string(&snapshot)?;
                    if !send_frame(&mut socket, Message::Text(payload.into())).await {
                        break;
                    }
                    sent += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(operation = "ws_stream", skipped, "slow client, snapshots dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Clients only ever close or answer pings.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = keepalive.tick() => {
                if !send_frame(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(sent)
}
