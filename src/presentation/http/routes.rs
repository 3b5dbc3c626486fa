//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::{chat, health, member, message, user};
use crate::domain::SessionFactory;
use crate::infrastructure::metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router<S: SessionFactory>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes::<S>())
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler::<S>))
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness::<S>))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes<S: SessionFactory>() -> Router<AppState<S>> {
    Router::new()
        .nest("/users", user_routes::<S>())
        .nest("/chats", chat_routes::<S>())
}

/// User routes; registration and availability checks are public
fn user_routes<S: SessionFactory>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            post(user::create_user::<S>)
                .get(user::list_users::<S>)
                .delete(user::remove_users::<S>),
        )
        .route("/name-used", get(user::name_used::<S>))
        .route("/login-used", get(user::login_used::<S>))
        .route(
            "/@me",
            get(user::get_current_user).patch(user::update_current_user::<S>),
        )
        .route("/{user_id}", get(user::get_user::<S>))
}

/// Chat routes
fn chat_routes<S: SessionFactory>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(chat::create_chat::<S>).get(chat::list_chats::<S>))
        .route(
            "/{chat_id}",
            get(chat::get_chat::<S>)
                .patch(chat::rename_chat::<S>)
                .delete(chat::remove_chat::<S>),
        )
        .route("/{chat_id}/owner", put(chat::change_owner::<S>))
        .route(
            "/{chat_id}/members",
            get(member::list_members::<S>)
                .post(member::add_members::<S>)
                .delete(member::remove_members::<S>),
        )
        .route("/{chat_id}/members/@me", delete(member::leave_chat::<S>))
        .route(
            "/{chat_id}/messages",
            get(message::get_messages::<S>).post(message::send_message::<S>),
        )
        .route(
            "/{chat_id}/messages/around-unread",
            get(message::get_around_unread::<S>),
        )
        .route(
            "/{chat_id}/read",
            get(member::get_read_state::<S>).put(member::mark_read::<S>),
        )
}
