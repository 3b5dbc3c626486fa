//! Data Transfer Objects
//!
//! DTOs for API request/response serialization.

pub mod request;
pub mod response;

pub use response::{
    AvailabilityView, ChatView, DeliveryView, MessageView, ReadStateView, UserView,
};
