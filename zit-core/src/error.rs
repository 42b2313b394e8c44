//! Structured error types for zit-core.
//!
//! Library code returns these `thiserror` enums; the binary and the HTTP
//! layer decide how they surface to users.

use thiserror::Error;

/// Errors raised by the database accessor, sessions and repositories.
#[derive(Error, Debug)]
pub enum DbError {
    /// The accessor was used before `connect()` (or after `disconnect()`).
    #[error("database accessor is not connected")]
    NotConnected,

    /// The configured URL names a backend the migrations cannot render.
    #[error("unsupported database backend; expected a postgres:// or sqlite:// URL")]
    UnsupportedDialect,

    /// A session handle was used after its scope ended.
    #[error("session {id} is closed")]
    SessionClosed { id: u64 },

    /// Exactly one row was required, none matched.
    #[error("no row was found when one was required")]
    NoRows,

    /// At most one row was required, several matched.
    #[error("multiple rows were found when at most one was required")]
    MultipleRows,

    /// A lookup by key found nothing.
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A uniqueness or foreign-key rule rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Driver, connectivity or statement failure, propagated unmodified.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Translate unique/foreign-key violations into [`DbError::Conflict`],
    /// leaving every other error untouched.
    pub fn into_conflict(self, message: impl FnOnce() -> String) -> Self {
        match &self {
            Self::Sqlx(sqlx::Error::Database(db))
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                Self::Conflict(message())
            }
            _ => self,
        }
    }
}

/// Result alias for database operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Authentication failures.
///
/// "No credential supplied" is deliberately not a variant: optional lookups
/// model it as `Ok(None)`, required lookups as [`AuthError::MissingCredential`].
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("not authenticated")]
    MissingCredential,

    #[error("access token is malformed")]
    MalformedToken,

    #[error("access token is not recognised")]
    UnknownToken,

    #[error("access token has expired")]
    TokenExpired,

    /// Tokens cascade with their user, so this only fires when the user is
    /// deleted between the token lookup and the user lookup.
    #[error("access token refers to a user that no longer exists")]
    UnknownUser,

    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    HashTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl AuthError {
    /// True for failures caused by the presented credential rather than by
    /// the server.
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, Self::Hash(_) | Self::HashTask(_) | Self::Db(_))
    }
}
