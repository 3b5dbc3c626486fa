//! User Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{
    AvailabilityQuery, CreateUserRequest, RemoveUsersRequest, UpdateUserRequest, UserSearchQuery,
};
use crate::application::dto::{AvailabilityView, UserView};
use crate::application::services::{CreateUserDto, UpdateUserDto, UserService};
use crate::domain::SessionFactory;
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Register a new user
pub async fn create_user<S: SessionFactory>(
    State(state): State<AppState<S>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    body.validate().map_err(validation_error)?;

    let user = state
        .users
        .create_user(CreateUserDto {
            name: body.name,
            login: body.login,
            secret_key: body.secret_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// List users, optionally filtered by a name fragment
pub async fn list_users<S: SessionFactory>(
    State(state): State<AppState<S>>,
    _auth: AuthUser,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = state.users.list_users(query.search.as_deref()).await?;
    Ok(Json(users))
}

/// Remove a batch of users
pub async fn remove_users<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(body): Json<RemoveUsersRequest>,
) -> Result<StatusCode, AppError> {
    body.validate().map_err(validation_error)?;

    tracing::debug!(user_id = %auth.user_id, count = body.ids.len(), "Removing users");
    state.users.remove_users(&body.ids).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Get current authenticated user
pub async fn get_current_user(auth: AuthUser) -> Json<UserView> {
    Json(auth.user)
}

/// Update current user
pub async fn update_current_user<S: SessionFactory>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<StatusCode, AppError> {
    body.validate().map_err(validation_error)?;

    state
        .users
        .update_user(
            auth.user_id,
            UpdateUserDto {
                name: body.name,
                login: body.login,
                secret_key: body.secret_key,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Get user by ID
pub async fn get_user<S: SessionFactory>(
    State(state): State<AppState<S>>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    let user = state.users.get_user(user_id).await?;
    Ok(Json(user))
}

/// Whether a display name is taken
pub async fn name_used<S: SessionFactory>(
    State(state): State<AppState<S>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityView>, AppError> {
    let used = state.users.is_name_used(&query.value).await?;
    Ok(Json(AvailabilityView { used }))
}

/// Whether a login is taken
pub async fn login_used<S: SessionFactory>(
    State(state): State<AppState<S>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityView>, AppError> {
    let used = state.users.is_login_used(&query.value).await?;
    Ok(Json(AvailabilityView { used }))
}
