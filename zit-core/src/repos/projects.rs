//! Project repository.

use serde::Serialize;
use sqlx::FromRow;

use crate::db::{decode, decode_all, DatabaseAccessor};
use crate::error::{DbError, DbResult};
use crate::models::{Description, Paginated, Pagination, ProjectName};

/// Project record.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Unix seconds
    pub created_at: i64,
}

pub struct ProjectRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Create a project. A taken name is a conflict.
    pub async fn create(
        &self,
        name: &ProjectName,
        description: &Description,
    ) -> DbResult<Project> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                db.one(
                    sqlx::query(
                        r#"
                        INSERT INTO projects (name, description, created_at)
                        VALUES ($1, $2, $3)
                        RETURNING id, name, description, created_at
                        "#,
                    )
                    .bind(name.as_str())
                    .bind(description.as_str())
                    .bind(super::now()),
                )
                .await
            })
            .await
            .map_err(|e| e.into_conflict(|| format!("project '{name}' already exists")))?;

        let project: Project = decode(&row)?;
        tracing::debug!(project_id = project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn get(&self, id: i64) -> DbResult<Project> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    "SELECT id, name, description, created_at FROM projects WHERE id = $1",
                )
                .bind(id),
            )
            .await?
            .ok_or_else(|| DbError::not_found("project", id))?;
        decode(&row)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Project>> {
        let row = self
            .db
            .one_or_none(
                sqlx::query(
                    "SELECT id, name, description, created_at FROM projects WHERE name = $1",
                )
                .bind(name),
            )
            .await?;
        row.as_ref().map(decode).transpose()
    }

    /// Newest first.
    pub async fn list(&self, page: Pagination) -> DbResult<Paginated<Project>> {
        let db = self.db;
        db.single_session(|_| async move {
            let total: i64 = db
                .scalar("SELECT COUNT(*) FROM projects")
                .await?
                .unwrap_or(0);

            let rows = db
                .all(
                    sqlx::query(
                        r#"
                        SELECT id, name, description, created_at
                        FROM projects
                        ORDER BY created_at DESC, id DESC
                        LIMIT $1 OFFSET $2
                        "#,
                    )
                    .bind(page.limit())
                    .bind(page.offset()),
                )
                .await?;

            Ok::<_, DbError>(Paginated::new(decode_all(&rows)?, total, page))
        })
        .await
    }

    /// Change name and description.
    pub async fn update(
        &self,
        id: i64,
        name: &ProjectName,
        description: &Description,
    ) -> DbResult<Project> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                db.one_or_none(
                    sqlx::query(
                        r#"
                        UPDATE projects SET name = $1, description = $2
                        WHERE id = $3
                        RETURNING id, name, description, created_at
                        "#,
                    )
                    .bind(name.as_str())
                    .bind(description.as_str())
                    .bind(id),
                )
                .await
            })
            .await
            .map_err(|e| e.into_conflict(|| format!("project '{name}' already exists")))?
            .ok_or_else(|| DbError::not_found("project", id))?;
        decode(&row)
    }

    /// Delete a project with no intersections left.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let db = self.db;
        let result = db
            .transaction(|_| async move {
                db.execute(sqlx::query("DELETE FROM projects WHERE id = $1").bind(id))
                    .await
            })
            .await
            .map_err(|e| {
                e.into_conflict(|| format!("project {id} still has intersections"))
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("project", id));
        }
        tracing::debug!(project_id = id, "project deleted");
        Ok(())
    }
}
