//! WebSocket Connection Handler
//!
//! Connection lifecycle: HELLO, then IDENTIFY with login and secret key
//! within the identify timeout, then READY. From there the session gets
//! dispatches pushed by the gateway and must keep heartbeating.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use uuid::Uuid;

use super::gateway::GatewayEvent;
use super::messages::{GatewayReceive, GatewaySend, IdentifyPayload, OpCode, ReadyPayload};
use super::session::SessionState;
use crate::application::dto::UserView;
use crate::application::services::UserService;
use crate::domain::SessionFactory;
use crate::startup::AppState;

/// Grace period on top of the advertised heartbeat interval
const HEARTBEAT_GRACE: Duration = Duration::from_secs(10);

/// Time given to the writer to flush a final frame before the socket closes
const CLOSE_FLUSH: Duration = Duration::from_millis(100);

/// WebSocket upgrade handler
pub async fn ws_handler<S: SessionFactory>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> Response {
    ws.max_message_size(state.settings.gateway.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket<S: SessionFactory>(socket: WebSocket, state: AppState<S>) {
    let session_id = Uuid::new_v4().to_string();
    let mut session_state = SessionState::new(session_id.clone());

    tracing::debug!(session_id = %session_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = state.gateway.channel();

    if let Err(e) = send_frame(&mut sender, &GatewaySend::hello(state.gateway.heartbeat_interval())).await {
        tracing::debug!(session_id = %session_id, error = %e, "Failed to send Hello");
        return;
    }

    // Drain the session queue into the socket
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if send_frame(&mut sender, &frame).await.is_err() {
                break;
            }
        }
    });

    let identify_timeout = Duration::from_secs(state.settings.gateway.identify_timeout_secs);
    let identify = match timeout(identify_timeout, wait_for_identify(&mut receiver)).await {
        Ok(Some(identify)) => identify,
        Ok(None) => {
            tracing::debug!(session_id = %session_id, "Connection closed before Identify");
            sender_task.abort();
            return;
        }
        Err(_) => {
            tracing::debug!(session_id = %session_id, "Identify timeout");
            reject(&tx, sender_task).await;
            return;
        }
    };

    let user: UserView = match state
        .users
        .get_user_by_credentials(&identify.login, &identify.secret_key)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if e.is_business() {
                tracing::debug!(session_id = %session_id, "Identify rejected");
            } else {
                tracing::error!(session_id = %session_id, error = %e, "Identify failed");
            }
            reject(&tx, sender_task).await;
            return;
        }
    };

    let user_id = user.id;
    session_state.identify(user_id);
    state
        .gateway
        .register_session(session_id.clone(), user_id, tx.clone());

    let ready = GatewayEvent::Ready(ReadyPayload {
        user,
        session_id: session_id.clone(),
    });
    if !state.gateway.send_to_session(&session_id, &ready) {
        state.gateway.unregister_session(&session_id);
        sender_task.abort();
        return;
    }

    tracing::info!(user_id = %user_id, session_id = %session_id, "User connected and identified");

    let heartbeat_timeout = Duration::from_millis(state.gateway.heartbeat_interval()) + HEARTBEAT_GRACE;
    let mut heartbeat_check = interval(heartbeat_timeout);
    heartbeat_check.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_message(&text, &mut session_state, &tx);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = %session_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    // Pings are answered by axum
                    Some(Ok(_)) => {}
                }
            }

            _ = heartbeat_check.tick() => {
                if !session_state.is_alive(heartbeat_timeout) {
                    tracing::info!(session_id = %session_id, "Heartbeat timeout, closing connection");
                    break;
                }
            }
        }
    }

    state.gateway.unregister_session(&session_id);
    sender_task.abort();

    tracing::info!(user_id = %user_id, session_id = %session_id, "User disconnected");
}

/// Read frames until an identify frame arrives; None if the socket closes first
async fn wait_for_identify<R>(receiver: &mut R) -> Option<IdentifyPayload>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(frame) = serde_json::from_str::<GatewayReceive>(&text) else {
                    continue;
                };
                if OpCode::from_u8(frame.op) != Some(OpCode::Identify) {
                    continue;
                }
                if let Some(identify) = frame.d.and_then(|d| serde_json::from_value(d).ok()) {
                    return Some(identify);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

/// Handle a frame from an identified session
fn handle_message(text: &str, session_state: &mut SessionState, tx: &mpsc::Sender<GatewaySend>) {
    let frame = match serde_json::from_str::<GatewayReceive>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(session_id = %session_state.session_id, error = %e, "Invalid frame");
            return;
        }
    };

    match OpCode::from_u8(frame.op) {
        Some(OpCode::Heartbeat) => {
            session_state.heartbeat();
            if tx.try_send(GatewaySend::heartbeat_ack()).is_err() {
                tracing::debug!(session_id = %session_state.session_id, "Heartbeat ACK dropped");
            }
            tracing::trace!(session_id = %session_state.session_id, "Heartbeat received");
        }
        Some(OpCode::Identify) => {
            tracing::debug!(session_id = %session_state.session_id, "Already identified");
        }
        _ => {
            tracing::debug!(session_id = %session_state.session_id, op = frame.op, "Unknown opcode");
        }
    }
}

/// Answer with INVALID_SESSION and let the writer flush it before closing
async fn reject(tx: &mpsc::Sender<GatewaySend>, sender_task: tokio::task::JoinHandle<()>) {
    let _ = tx.try_send(GatewaySend::invalid_session());
    tokio::time::sleep(CLOSE_FLUSH).await;
    sender_task.abort();
}

async fn send_frame<W>(sender: &mut W, frame: &GatewaySend) -> Result<(), axum::Error>
where
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}
