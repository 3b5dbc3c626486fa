//! Chat Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{ChangeOwnerRequest, CreateChatRequest, RenameChatRequest};
use crate::application::dto::ChatView;
use crate::application::services::{ChatService, CreateChatDto};
use crate::domain::SessionFactory;
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Create a private or group chat owned by the caller
pub async fn create_chat<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(body): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatView>), AppError> {
    body.validate().map_err(validation_error)?;

    let chat = state
        .chats
        .create_chat(
            auth.user_id,
            CreateChatDto {
                name: body.name,
                member_ids: body.member_ids,
                is_private: body.is_private,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(chat)))
}

/// Every chat the caller belongs to
pub async fn list_chats<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatView>>, AppError> {
    let chats = state.chats.get_all_chats(auth.user_id).await?;
    Ok(Json(chats))
}

pub async fn get_chat<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatView>, AppError> {
    let chat = state.chats.get_chat(auth.user_id, chat_id).await?;
    Ok(Json(chat))
}

pub async fn rename_chat<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<RenameChatRequest>,
) -> Result<StatusCode, AppError> {
    body.validate().map_err(validation_error)?;

    state.chats.rename_chat(auth.user_id, chat_id, &body.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hand ownership of a group chat to another user
pub async fn change_owner<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<ChangeOwnerRequest>,
) -> Result<StatusCode, AppError> {
    state
        .chats
        .change_owner(auth.user_id, chat_id, body.owner_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_chat<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.chats.remove_chat(auth.user_id, chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
