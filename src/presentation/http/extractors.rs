//! Custom Extractors
//!
//! Callers identify themselves on every request with their login and
//! secret key, passed as headers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::application::dto::UserView;
use crate::application::services::UserService;
use crate::domain::SessionFactory;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub const LOGIN_HEADER: &str = "x-login";
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// The caller's own view, login included
    pub user: UserView,
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
    S: SessionFactory,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        let login = header(parts, LOGIN_HEADER)?;
        let secret_key = header(parts, SECRET_KEY_HEADER)?;

        let user = state
            .users
            .get_user_by_credentials(login, secret_key)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) | AppError::Validation(_) => {
                    AppError::Unauthorized("Login or key is incorrect".into())
                }
                other => other,
            })?;

        Ok(AuthUser {
            user_id: user.id,
            user,
        })
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))
}
