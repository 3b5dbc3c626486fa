//! # Domain Layer
//!
//! The domain layer contains the core business objects of the chat backend.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Users, chats, members and messages with their repository traits
//! - **unit_of_work**: Transactional session contracts the services run on
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod unit_of_work;

// Re-export commonly used types
pub use entities::*;
pub use unit_of_work::{SessionFactory, UnitOfWork};
