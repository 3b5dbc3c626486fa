//! Membership Handlers
//!
//! Member lists, owner-managed membership and the caller's read watermark.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{MarkReadRequest, MembersRequest};
use crate::application::dto::{ReadStateView, UserView};
use crate::application::services::{ChatService, MemberService};
use crate::domain::SessionFactory;
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

pub async fn list_members<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let members = state.members.list_members(auth.user_id, chat_id).await?;
    Ok(Json(members))
}

/// Add users to a group chat (owner only)
pub async fn add_members<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<MembersRequest>,
) -> Result<StatusCode, AppError> {
    body.validate().map_err(validation_error)?;

    state
        .members
        .add_members(auth.user_id, chat_id, &body.user_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove users from a group chat (owner only)
pub async fn remove_members<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<MembersRequest>,
) -> Result<StatusCode, AppError> {
    body.validate().map_err(validation_error)?;

    state
        .members
        .remove_members(auth.user_id, chat_id, &body.user_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_chat<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.members.leave_chat(auth.user_id, chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's watermark and unread count
pub async fn get_read_state<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ReadStateView>, AppError> {
    let last_read = state.members.last_read(auth.user_id, chat_id).await?;
    let chat = state.chats.get_chat(auth.user_id, chat_id).await?;

    Ok(Json(ReadStateView {
        chat_id,
        last_read,
        unread_count: chat.unread_count,
    }))
}

/// Advance the caller's watermark, to now when no body is sent
pub async fn mark_read<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    body: Option<Json<MarkReadRequest>>,
) -> Result<Json<ReadStateView>, AppError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let read_state = state
        .members
        .mark_read(auth.user_id, chat_id, body.up_to)
        .await?;
    Ok(Json(read_state))
}
