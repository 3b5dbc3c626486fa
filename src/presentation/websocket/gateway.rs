//! WebSocket Gateway
//!
//! Registry of live connections and the push side of message delivery.
//! Each session owns a bounded queue drained by its socket task; pushes
//! never wait on a slow client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{GatewaySend, ReadyPayload};
use crate::application::dto::DeliveryView;
use crate::application::services::{DeliveryPublisher, PushOutcome};
use crate::config::GatewaySettings;
use crate::infrastructure::metrics;

/// Gateway event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "d")]
pub enum GatewayEvent {
    #[serde(rename = "READY")]
    Ready(ReadyPayload),
    #[serde(rename = "MESSAGE_CREATE")]
    MessageCreate(DeliveryView),
}

impl GatewayEvent {
    /// Get the event name for dispatch
    pub fn event_name(&self) -> &'static str {
        match self {
            GatewayEvent::Ready(_) => "READY",
            GatewayEvent::MessageCreate(_) => "MESSAGE_CREATE",
        }
    }

    /// Convert to JSON value for sending
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GatewayEvent::Ready(e) => serde_json::to_value(e).unwrap_or_default(),
            GatewayEvent::MessageCreate(e) => serde_json::to_value(e).unwrap_or_default(),
        }
    }
}

/// Connected session with message sender
pub struct ConnectedSession {
    pub user_id: Uuid,
    pub session_id: String,
    sequence: AtomicU64,
    sender: mpsc::Sender<GatewaySend>,
}

impl ConnectedSession {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Queue an event without waiting; false when the queue is full or closed.
    fn push(&self, event: &GatewayEvent) -> bool {
        let frame = GatewaySend::dispatch(event.event_name(), self.next_sequence(), event.to_json());
        self.sender.try_send(frame).is_ok()
    }
}

/// WebSocket gateway managing all connections
pub struct Gateway {
    /// Active sessions by session_id
    sessions: DashMap<String, Arc<ConnectedSession>>,
    /// User ID to session IDs mapping (one user can have multiple sessions)
    user_sessions: DashMap<Uuid, Vec<String>>,
    heartbeat_interval_ms: u64,
    channel_capacity: usize,
}

impl Gateway {
    pub fn new(settings: &GatewaySettings) -> Self {
        Self {
            sessions: DashMap::new(),
            user_sessions: DashMap::new(),
            heartbeat_interval_ms: settings.heartbeat_interval_ms,
            channel_capacity: settings.channel_capacity.max(1),
        }
    }

    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Create the outgoing queue for a new connection
    pub fn channel(&self) -> (mpsc::Sender<GatewaySend>, mpsc::Receiver<GatewaySend>) {
        mpsc::channel(self.channel_capacity)
    }

    /// Register an identified session
    pub fn register_session(&self, session_id: String, user_id: Uuid, sender: mpsc::Sender<GatewaySend>) {
        let session = Arc::new(ConnectedSession {
            user_id,
            session_id: session_id.clone(),
            sequence: AtomicU64::new(0),
            sender,
        });

        self.sessions.insert(session_id.clone(), session);
        self.user_sessions
            .entry(user_id)
            .or_default()
            .push(session_id.clone());
        metrics::set_gateway_sessions(self.sessions.len());

        tracing::info!(user_id = %user_id, session_id = %session_id, "Session registered");
    }

    /// Unregister a session
    pub fn unregister_session(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            if let Some(mut sessions) = self.user_sessions.get_mut(&session.user_id) {
                sessions.retain(|s| s != session_id);
            }
            self.user_sessions
                .remove_if(&session.user_id, |_, sessions| sessions.is_empty());
            metrics::set_gateway_sessions(self.sessions.len());

            tracing::info!(user_id = %session.user_id, session_id = %session_id, "Session unregistered");
        }
    }

    /// Send an event to a single session
    pub fn send_to_session(&self, session_id: &str, event: &GatewayEvent) -> bool {
        self.sessions
            .get(session_id)
            .map(|session| session.push(event))
            .unwrap_or(false)
    }

    /// Send an event to all sessions of a user
    pub fn send_to_user(&self, user_id: Uuid, event: &GatewayEvent) -> PushOutcome {
        let targets: Vec<Arc<ConnectedSession>> = match self.user_sessions.get(&user_id) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.sessions.get(id).map(|s| Arc::clone(s.value())))
                .collect(),
            None => Vec::new(),
        };

        if targets.is_empty() {
            return PushOutcome::Offline;
        }

        let mut pushed = false;
        for session in &targets {
            if session.push(event) {
                pushed = true;
            } else {
                tracing::debug!(session_id = %session.session_id, "Session queue full or closed");
            }
        }

        if pushed {
            PushOutcome::Pushed
        } else {
            PushOutcome::Dropped
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl DeliveryPublisher for Gateway {
    fn publish(&self, recipient_id: Uuid, delivery: &DeliveryView) -> PushOutcome {
        self.send_to_user(recipient_id, &GatewayEvent::MessageCreate(delivery.clone()))
    }
}
