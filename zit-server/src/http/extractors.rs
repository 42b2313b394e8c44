//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header;
use axum::http::request::Parts;

use zit_core::auth::{self, token};
use zit_core::models::ValidationError;
use zit_core::repos::User;
use zit_core::AuthError;

use super::error::ApiError;
use crate::state::AppState;

/// Credential from the `Authorization: Bearer` header, if one was sent.
fn presented_token(parts: &Parts) -> Result<Option<String>, AuthError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::MalformedToken)?;
    Ok(Some(token::bearer_credential(value)?.to_owned()))
}

/// The authenticated caller. Rejects with 401 when no valid token is sent.
pub struct CurrentUser {
    pub user: User,
    /// The token the request was authenticated with
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts)?.ok_or(AuthError::MissingCredential)?;
        let user = auth::fetch_user_from_access_token(&state.db, &token).await?;
        Ok(Self { user, token })
    }
}

/// The caller if a token was sent, `None` for anonymous requests.
///
/// A token that is sent but invalid still rejects with 401.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts)?;
        let user = auth::fetch_optional_user(&state.db, token.as_deref()).await?;
        Ok(Self(user))
    }
}

/// Extract a numeric id from the path
pub struct ValidId(pub i64);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<i64> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::Validation(ValidationError::InvalidFormat {
                    field: "id",
                    reason: "must be an integer",
                })
            })?;
        Ok(Self(id))
    }
}
