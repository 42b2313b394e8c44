//! Request-scoped unit of work.
//!
//! Each API request runs inside one database session. A successful response
//! commits it; any 4xx/5xx response rolls it back, so a handler that fails
//! halfway leaves nothing behind.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use zit_core::DbError;

use super::error::ApiError;
use crate::state::AppState;

/// Why a request's session was not committed.
enum Discard {
    /// The handler answered with an error status; send it as is.
    Response(Response),
    /// Opening or committing the session failed.
    Db(DbError),
}

impl From<DbError> for Discard {
    fn from(err: DbError) -> Self {
        Self::Db(err)
    }
}

pub async fn unit_of_work(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let outcome = state
        .db
        .session(|session| async move {
            let response = next.run(request).await;
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                tracing::debug!(session = session.id(), %status, "rolling back request session");
                return Err(Discard::Response(response));
            }
            Ok(response)
        })
        .await;

    match outcome {
        Ok(response) | Err(Discard::Response(response)) => response,
        Err(Discard::Db(err)) => ApiError::from(err).into_response(),
    }
}
