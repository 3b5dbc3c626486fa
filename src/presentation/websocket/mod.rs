//! WebSocket Gateway
//!
//! Real-time push of new messages to connected members.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod session;

pub use gateway::{Gateway, GatewayEvent};
pub use handler::ws_handler;
pub use messages::{GatewayReceive, GatewaySend, OpCode};
pub use session::SessionState;
