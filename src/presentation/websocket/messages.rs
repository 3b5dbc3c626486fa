//! WebSocket Message Types
//!
//! Frames exchanged on the gateway connection. Every frame carries an
//! opcode; dispatch frames also carry an event name and a sequence.

use serde::{Deserialize, Serialize};

use crate::application::dto::UserView;

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Event dispatch
    Dispatch = 0,
    /// Heartbeat
    Heartbeat = 1,
    /// Identify
    Identify = 2,
    /// Invalid session
    InvalidSession = 9,
    /// Hello
    Hello = 10,
    /// Heartbeat ACK
    HeartbeatAck = 11,
}

impl OpCode {
    pub fn from_u8(op: u8) -> Option<Self> {
        match op {
            0 => Some(OpCode::Dispatch),
            1 => Some(OpCode::Heartbeat),
            2 => Some(OpCode::Identify),
            9 => Some(OpCode::InvalidSession),
            10 => Some(OpCode::Hello),
            11 => Some(OpCode::HeartbeatAck),
            _ => None,
        }
    }
}

/// Incoming gateway message
#[derive(Debug, Deserialize)]
pub struct GatewayReceive {
    pub op: u8,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
}

/// Outgoing gateway message
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySend {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewaySend {
    fn control(op: OpCode, d: Option<serde_json::Value>) -> Self {
        Self {
            op: op as u8,
            d,
            s: None,
            t: None,
        }
    }

    pub fn hello(heartbeat_interval: u64) -> Self {
        let payload = HelloPayload { heartbeat_interval };
        Self::control(OpCode::Hello, serde_json::to_value(payload).ok())
    }

    pub fn heartbeat_ack() -> Self {
        Self::control(OpCode::HeartbeatAck, None)
    }

    /// Identification failed or timed out; the connection closes after this.
    pub fn invalid_session() -> Self {
        Self::control(OpCode::InvalidSession, Some(serde_json::Value::Bool(false)))
    }

    pub fn dispatch(event_name: &str, sequence: u64, d: serde_json::Value) -> Self {
        Self {
            op: OpCode::Dispatch as u8,
            d: Some(d),
            s: Some(sequence),
            t: Some(event_name.to_string()),
        }
    }
}

/// Hello payload (op 10)
#[derive(Debug, Serialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

/// Ready payload (dispatch READY)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub user: UserView,
    pub session_id: String,
}

/// Identify payload (op 2), the same credentials the HTTP API takes
#[derive(Debug, Deserialize)]
pub struct IdentifyPayload {
    pub login: String,
    pub secret_key: String,
}
