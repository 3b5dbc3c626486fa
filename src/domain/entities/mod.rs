//! # Domain Entities
//!
//! Core domain entities representing the main business objects of the chat backend.
//! All entities map directly to their corresponding database tables.
//!
//! - **User**: Account with a unique name and login, bound to a secret key
//! - **Chat**: A private (1:1) or group conversation with an owner
//! - **Member**: A user's membership in a chat, carrying the read watermark
//! - **Message**: An immutable text posted to a chat
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod user;
mod chat;
mod member;
mod message;

pub use user::{NewUser, User, UserRepository};

pub use chat::{Chat, ChatRepository, NewChat};

pub use member::{Member, MemberRepository, MemberUnread};

pub use message::{AuthoredMessage, Message, MessageRepository, NewMessage, PageDirection};
