//! Message Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{
    AroundUnreadQueryParams, MessageQueryParams, SendMessageRequest,
};
use crate::application::dto::MessageView;
use crate::application::services::{fan_out, MessageService};
use crate::domain::SessionFactory;
use crate::infrastructure::metrics;
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Page through a chat's history
pub async fn get_messages<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<MessageQueryParams>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let take = state.settings.paging.clamp(params.take);

    let messages = state
        .messages
        .get_messages(auth.user_id, chat_id, params.skip, take, params.direction)
        .await?;

    Ok(Json(messages))
}

/// History around the caller's read watermark
pub async fn get_around_unread<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<AroundUnreadQueryParams>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let take = state.settings.paging.clamp(params.take);

    let messages = state
        .messages
        .get_around_unread(auth.user_id, chat_id, take)
        .await?;

    Ok(Json(messages))
}

/// Post a message and push it to the other members
pub async fn send_message<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    body.validate().map_err(validation_error)?;

    let posted = state
        .messages
        .add_message(auth.user_id, chat_id, &body.text)
        .await?;
    metrics::record_message_created();

    // Committed already; pushing is best-effort
    let pushed = fan_out(state.gateway.as_ref(), &posted.deliveries);
    tracing::debug!(
        message_id = %posted.message.id,
        recipients = posted.deliveries.len(),
        pushed = pushed,
        "Message fanned out"
    );

    Ok((StatusCode::CREATED, Json(posted.message)))
}
