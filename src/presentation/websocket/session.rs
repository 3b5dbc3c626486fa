//! WebSocket Session Management

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Per-connection state owned by the socket task
#[derive(Debug)]
pub struct SessionState {
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub last_heartbeat: Instant,
}

impl SessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            user_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    pub fn identify(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
        self.heartbeat();
    }

    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn is_alive(&self, timeout: Duration) -> bool {
        self.last_heartbeat.elapsed() < timeout
    }
}
