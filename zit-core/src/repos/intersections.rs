//! Intersection repository.

use serde::Serialize;
use sqlx::FromRow;

use super::ProjectRepo;
use crate::db::{decode, decode_all, DatabaseAccessor};
use crate::error::{DbError, DbResult};
use crate::models::IntersectionName;

/// Intersection record. `number` is the natural id, unique within the project.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Intersection {
    pub id: i64,
    pub project_id: i64,
    pub number: i64,
    pub name: String,
}

pub struct IntersectionRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> IntersectionRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Add an intersection to a project.
    pub async fn create(
        &self,
        project_id: i64,
        number: i64,
        name: &IntersectionName,
    ) -> DbResult<Intersection> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                ProjectRepo::new(db).get(project_id).await?;
                db.one(
                    sqlx::query(
                        r#"
                        INSERT INTO intersections (project_id, number, name)
                        VALUES ($1, $2, $3)
                        RETURNING id, project_id, number, name
                        "#,
                    )
                    .bind(project_id)
                    .bind(number)
                    .bind(name.as_str()),
                )
                .await
            })
            .await
            .map_err(|e| {
                e.into_conflict(|| {
                    format!("intersection {number} already exists in project {project_id}")
                })
            })?;

        decode(&row)
    }

    pub async fn get(&self, id: i64) -> DbResult<Intersection> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    "SELECT id, project_id, number, name FROM intersections WHERE id = $1",
                )
                .bind(id),
            )
            .await?
            .ok_or_else(|| DbError::not_found("intersection", id))?;
        decode(&row)
    }

    /// Intersections of a project, ordered by number.
    pub async fn list_for_project(&self, project_id: i64) -> DbResult<Vec<Intersection>> {
        let db = self.db;
        db.single_session(|_| async move {
            ProjectRepo::new(db).get(project_id).await?;
            let rows = db
                .all(
                    sqlx::query(
                        r#"
                        SELECT id, project_id, number, name
                        FROM intersections
                        WHERE project_id = $1
                        ORDER BY number
                        "#,
                    )
                    .bind(project_id),
                )
                .await?;
            decode_all(&rows)
        })
        .await
    }

    /// Delete an intersection that has no flows, relations or output.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let db = self.db;
        let result = db
            .transaction(|_| async move {
                db.execute(sqlx::query("DELETE FROM intersections WHERE id = $1").bind(id))
                    .await
            })
            .await
            .map_err(|e| {
                e.into_conflict(|| format!("intersection {id} still has dependent data"))
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("intersection", id));
        }
        Ok(())
    }
}
