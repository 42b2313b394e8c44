//! Liveness endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct PingResponse {
    pub message: &'static str,
}

/// GET /ping
async fn ping() -> Json<PingResponse> {
    Json(PingResponse { message: "ok" })
}

/// Ping routes. Stateless, so they sit outside the per-request session.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/ping", get(ping))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_returns_ok() {
        let Json(body) = ping().await;
        assert_eq!(body.message, "ok");
    }
}
