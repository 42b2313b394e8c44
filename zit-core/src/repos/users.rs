//! User repository.

use serde::Serialize;
use sqlx::FromRow;

use crate::db::{decode, DatabaseAccessor};
use crate::error::{DbError, DbResult};
use crate::models::Username;

/// User record. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Unix seconds
    pub created_at: i64,
}

pub struct UserRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> UserRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Insert a user. A taken username is a conflict.
    pub async fn create(&self, username: &Username, password_hash: &str) -> DbResult<User> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                db.one(
                    sqlx::query(
                        r#"
                        INSERT INTO users (username, password_hash, created_at)
                        VALUES ($1, $2, $3)
                        RETURNING id, username, password_hash, created_at
                        "#,
                    )
                    .bind(username.as_str())
                    .bind(password_hash)
                    .bind(super::now()),
                )
                .await
            })
            .await
            .map_err(|e| {
                e.into_conflict(|| format!("username '{}' is taken", username.as_str()))
            })?;
        decode(&row)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
                )
                .bind(id),
            )
            .await?;
        row.as_ref().map(decode).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    r#"
                    SELECT id, username, password_hash, created_at
                    FROM users WHERE username = $1
                    "#,
                )
                .bind(username),
            )
            .await?;
        row.as_ref().map(decode).transpose()
    }

    /// Delete a user and, by cascade, their access tokens.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = self
            .db
            .execute(sqlx::query("DELETE FROM users WHERE id = $1").bind(id))
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }
        Ok(())
    }
}
