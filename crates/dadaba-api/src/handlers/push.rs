//! Push channel endpoints: WebSocket and Server-Sent Events.
//!
//! Both authenticate before the connection is accepted and hold one gateway
//! session for the lifetime of the connection. Dropping the session
//! unregisters it.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
};
use futures::{SinkExt, Stream, StreamExt};
use tracing::debug;

use dadaba_core::defaults::SSE_KEEPALIVE_SECS;
use dadaba_core::{Identity, PushMessage};
use dadaba_notify::PushSession;

use crate::{AppState, AuthUser};

/// WebSocket push channel. Frames are `{"event":"notification","data":{...}}`.
///
/// A missing or invalid credential answers 401 and no upgrade happens.
pub async fn ws_handler(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, identity))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, identity: Identity) {
    let ping_every = Duration::from_secs(state.gateway.config().ping_interval_secs.max(1));
    let mut session = state.gateway.open(identity);
    let (mut sender, mut receiver) = socket.split();
    // first ping one full period after the upgrade
    let mut ping_interval =
        tokio::time::interval_at(tokio::time::Instant::now() + ping_every, ping_every);

    loop {
        tokio::select! {
            frame = session.recv() => {
                let Some(message) = frame else { break };
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        debug!(error = %e, "Failed to encode push frame");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(
        subsystem = "api",
        component = "push",
        connection_id = %session.connection_id(),
        "WebSocket session ended"
    );
}

/// Server-Sent Events push channel. Each frame has event name `notification`
/// and the notification JSON as data.
pub async fn sse_stream(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.gateway.open(identity);
    Sse::new(session_events(session)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keepalive"),
    )
}

fn session_events(session: PushSession) -> impl Stream<Item = Result<Event, Infallible>> {
    session.filter_map(|message: PushMessage| async move {
        match message.data_json() {
            Ok(data) => Some(Ok(Event::default().event(message.event_name()).data(data))),
            Err(e) => {
                debug!(error = %e, "Failed to encode push frame");
                None
            }
        }
    })
}
