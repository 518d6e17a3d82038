//! WebSocket endpoints for the three client roles
//!
//! One task per connection reads inbound frames; a companion writer task
//! drains the connection's outbound queue into the socket, so every
//! connection has exactly one writer and queued messages keep their order.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::protocol::Outbound;
use crate::registry::Role;
use crate::relay::Relay;
use crate::ui::server::AppState;

/// Upgrade handler for speaker endpoints
pub async fn player_ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection_loop(state.relay.clone(), Role::Player, socket))
}

/// Upgrade handler for operator consoles
pub async fn controller_ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection_loop(state.relay.clone(), Role::Controller, socket))
}

/// Upgrade handler for live-microphone sources
pub async fn master_ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection_loop(state.relay.clone(), Role::Master, socket))
}

async fn connection_loop(relay: Arc<Relay>, role: Role, socket: WebSocket) {
    let (conn, rx) = relay.admit(role);
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, rx));

    // The username this connection most recently started an announcement
    // under; needed to release arbitration on disconnect.
    let mut declared: Option<String> = None;

    while let Some(Ok(message)) = stream.next().await {
        match (role, message) {
            (_, Message::Close(_)) => break,
            (Role::Player, Message::Text(text)) => relay.handle_player_text(&text),
            (Role::Controller, Message::Text(text)) => relay.handle_controller_text(&conn, &text),
            (Role::Master, Message::Text(text)) => relay.handle_master_text(&text, &mut declared),
            (Role::Master, Message::Binary(frame)) => relay.relay_frame(Bytes::from(frame)),
            // Binary from players/controllers and ping/pong traffic
            _ => {}
        }
    }

    // Teardown runs exactly once per connection, whichever end closed
    // first: registry entry goes first, then the arbitration release if
    // this connection held the channel.
    relay.remove(&conn);
    if let Some(name) = declared {
        relay.master_disconnected(&name);
    }
    writer.abort();
}

async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: UnboundedReceiver<Outbound>,
) {
    while let Some(item) = rx.recv().await {
        let message = match item {
            Outbound::Event(event) => Message::Text(event.to_json()),
            Outbound::Frame(frame) => Message::Binary(frame.to_vec()),
        };
        if sink.send(message).await.is_err() {
            // Transport failure: the read side tears the connection down
            break;
        }
    }
}
