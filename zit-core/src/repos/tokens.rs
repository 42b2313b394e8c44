//! Access token storage. Only SHA-256 digests of tokens are stored.

use sqlx::FromRow;

use crate::db::{decode, DatabaseAccessor};
use crate::error::DbResult;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AccessToken {
    pub id: i64,
    pub token_hash: String,
    pub user_id: i64,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub expires_at: i64,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

pub struct TokenRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> TokenRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: i64,
    ) -> DbResult<AccessToken> {
        let row = self
            .db
            .one(
                sqlx::query(
                    r#"
                    INSERT INTO access_tokens (token_hash, user_id, created_at, expires_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, token_hash, user_id, created_at, expires_at
                    "#,
                )
                .bind(token_hash)
                .bind(user_id)
                .bind(super::now())
                .bind(expires_at),
            )
            .await?;
        decode(&row)
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> DbResult<Option<AccessToken>> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    r#"
                    SELECT id, token_hash, user_id, created_at, expires_at
                    FROM access_tokens WHERE token_hash = $1
                    "#,
                )
                .bind(token_hash),
            )
            .await?;
        row.as_ref().map(decode).transpose()
    }

    /// Returns whether a token was removed.
    pub async fn delete_by_hash(&self, token_hash: &str) -> DbResult<bool> {
        let result = self
            .db
            .execute(sqlx::query("DELETE FROM access_tokens WHERE token_hash = $1").bind(token_hash))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove tokens that expired at or before `now`. Returns the count.
    pub async fn delete_expired(&self, now: i64) -> DbResult<u64> {
        let result = self
            .db
            .execute(sqlx::query("DELETE FROM access_tokens WHERE expires_at <= $1").bind(now))
            .await?;
        Ok(result.rows_affected())
    }
}
