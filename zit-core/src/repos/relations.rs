//! Links between intersections (`relations_input_data`).

use serde::Serialize;
use sqlx::FromRow;

use super::IntersectionRepo;
use crate::db::{decode, decode_all, DatabaseAccessor};
use crate::error::{DbError, DbResult};
use crate::models::RelationInput;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Relation {
    pub id: i64,
    pub from_intersection_id: i64,
    pub to_intersection_id: i64,
    pub distance: i64,
    pub avg_speed: i64,
}

pub struct RelationRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> RelationRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Link two intersections of `project_id`. An end that is missing or
    /// belongs to another project is reported as not found.
    pub async fn create(&self, project_id: i64, input: &RelationInput) -> DbResult<Relation> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                let intersections = IntersectionRepo::new(db);
                for end in [input.from_intersection_id, input.to_intersection_id] {
                    let intersection = intersections.get(end).await?;
                    if intersection.project_id != project_id {
                        return Err(DbError::not_found(
                            "intersection",
                            format!("{end} in project {project_id}"),
                        ));
                    }
                }

                db.one(
                    sqlx::query(
                        r#"
                        INSERT INTO relations_input_data (
                            from_intersection_id, to_intersection_id, distance, avg_speed
                        )
                        VALUES ($1, $2, $3, $4)
                        RETURNING id, from_intersection_id, to_intersection_id,
                                  distance, avg_speed
                        "#,
                    )
                    .bind(input.from_intersection_id)
                    .bind(input.to_intersection_id)
                    .bind(input.distance)
                    .bind(input.avg_speed),
                )
                .await
            })
            .await?;

        decode(&row)
    }

    /// Relations whose start lies in the project.
    pub async fn list_for_project(&self, project_id: i64) -> DbResult<Vec<Relation>> {
        let rows = self
            .db
            .all(
                sqlx::query(
                    r#"
                    SELECT r.id, r.from_intersection_id, r.to_intersection_id,
                           r.distance, r.avg_speed
                    FROM relations_input_data r
                    JOIN intersections i ON i.id = r.from_intersection_id
                    WHERE i.project_id = $1
                    ORDER BY r.id
                    "#,
                )
                .bind(project_id),
            )
            .await?;
        decode_all(&rows)
    }
}
