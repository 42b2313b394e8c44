//! Identity resolution: bearer token to user, plus the account operations
//! that create and retire tokens.

use serde::Serialize;

use super::{password, token};
use crate::config::AuthConfig;
use crate::db::DatabaseAccessor;
use crate::error::AuthError;
use crate::models::{Password, Username};
use crate::repos::{TokenRepo, User, UserRepo};

/// A token as handed to the client. The plaintext is not stored anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Unix seconds
    pub expires_at: i64,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Resolve a presented token to its user.
///
/// Every failure is an [`AuthError`]. Deleting a user cascades to its
/// tokens, so a deleted user's token is [`AuthError::UnknownToken`];
/// [`AuthError::UnknownUser`] is left for a user deleted between the two
/// lookups below.
pub async fn fetch_user_from_access_token(
    db: &DatabaseAccessor,
    token: &str,
) -> Result<User, AuthError> {
    let token = token::parse(token)?;
    let stored = TokenRepo::new(db)
        .find_by_hash(&token::digest(token))
        .await?
        .ok_or(AuthError::UnknownToken)?;

    if stored.is_expired_at(now()) {
        tracing::debug!(token_id = stored.id, "rejected expired access token");
        return Err(AuthError::TokenExpired);
    }

    UserRepo::new(db)
        .get(stored.user_id)
        .await?
        .ok_or(AuthError::UnknownUser)
}

/// `Ok(None)` when no credential was presented; otherwise exactly
/// [`fetch_user_from_access_token`].
pub async fn fetch_optional_user(
    db: &DatabaseAccessor,
    token: Option<&str>,
) -> Result<Option<User>, AuthError> {
    match token {
        None => Ok(None),
        Some(token) => fetch_user_from_access_token(db, token).await.map(Some),
    }
}

/// Create an account. A taken username surfaces as `DbError::Conflict`.
pub async fn register_user(
    db: &DatabaseAccessor,
    config: &AuthConfig,
    username: &Username,
    password: &Password,
) -> Result<User, AuthError> {
    let hashed = password::hash_password(password, config.bcrypt_cost).await?;
    let user = UserRepo::new(db).create(username, &hashed).await?;
    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Check a username/password pair. An unknown user and a wrong password
/// give the same error.
pub async fn authenticate(
    db: &DatabaseAccessor,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let Some(user) = UserRepo::new(db).get_by_username(username).await? else {
        return Err(AuthError::InvalidCredentials);
    };
    if !password::verify_password(password, &user.password_hash).await? {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

/// Mint a token for `user`, valid for the configured TTL.
///
/// Tokens that have already expired, for any user, are deleted first.
pub async fn issue_access_token(
    db: &DatabaseAccessor,
    config: &AuthConfig,
    user: &User,
) -> Result<IssuedToken, AuthError> {
    let tokens = TokenRepo::new(db);
    let purged = tokens.delete_expired(now()).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired access tokens removed");
    }

    let access_token = token::generate();
    let expires_at = (chrono::Utc::now() + config.token_ttl()).timestamp();

    tokens
        .insert(&token::digest(&access_token), user.id, expires_at)
        .await?;

    tracing::debug!(user_id = user.id, expires_at, "access token issued");
    Ok(IssuedToken {
        access_token,
        expires_at,
    })
}

/// Revoke a token. Returns whether it existed.
pub async fn revoke_access_token(db: &DatabaseAccessor, token: &str) -> Result<bool, AuthError> {
    let token = token::parse(token)?;
    Ok(TokenRepo::new(db).delete_by_hash(&token::digest(token)).await?)
}
