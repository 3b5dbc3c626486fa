//! Application Services
//!
//! Business logic services that coordinate domain operations. Each
//! operation runs in its own unit of work opened from the store.
//!
//! ## Available Services
//!
//! - **UserService**: User directory with unique names and logins
//! - **ChatService**: Chat creation, listing, renaming, ownership and removal
//! - **MemberService**: Membership, access checks and read watermarks
//! - **MessageService**: Posting messages and reading history
//!
//! Deliveries produced by posted messages go through [`delivery::fan_out`].

mod access;
pub mod chat_service;
pub mod delivery;
pub mod member_service;
pub mod message_service;
pub mod user_service;

pub use chat_service::{ChatService, ChatServiceImpl, CreateChatDto};
pub use delivery::{fan_out, DeliveryPublisher, PushOutcome};
pub use member_service::{MemberService, MemberServiceImpl};
pub use message_service::{MessageService, MessageServiceImpl, PostedMessage};
pub use user_service::{CreateUserDto, UpdateUserDto, UserService, UserServiceImpl};
