//! # Chat Hub Library
//!
//! A multi-user chat backend with:
//! - Users bound to a login and secret key
//! - Private (1:1) and group chats with owner-managed membership
//! - Per-member read watermarks and unread counts
//! - RESTful HTTP API endpoints
//! - WebSocket gateway pushing new messages to connected members
//! - PostgreSQL or in-process storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities, repository traits and the unit of work
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: PostgreSQL, in-process store and metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! chat_hub/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities and contracts
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Storage and metrics implementations
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, validation, secret hashing)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
