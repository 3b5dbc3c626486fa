//! Shared utilities used across layers.

pub mod error;
pub mod secret;
pub mod validation;

pub use error::AppError;
pub use secret::SecretHasher;
