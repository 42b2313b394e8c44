//! Approach flow repository (`flows_input_data`).

use serde::Serialize;
use sqlx::FromRow;

use super::IntersectionRepo;
use crate::db::{decode, decode_all, DatabaseAccessor};
use crate::error::{DbError, DbResult};
use crate::models::{Approach, FlowInput};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Flow {
    pub id: i64,
    pub intersection_id: i64,
    #[sqlx(try_from = "String")]
    pub approach: Approach,
    pub intensity_veh_per_hr: i64,
    pub bus_share: f64,
    pub len_between_intersections: i64,
    pub avg_speed: i64,
}

pub struct FlowRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> FlowRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Record a flow for one approach. Input must already be validated.
    pub async fn create(&self, intersection_id: i64, input: &FlowInput) -> DbResult<Flow> {
        let db = self.db;
        let row = db
            .transaction(|_| async move {
                IntersectionRepo::new(db).get(intersection_id).await?;
                db.one(
                    sqlx::query(
                        r#"
                        INSERT INTO flows_input_data (
                            intersection_id, approach, intensity_veh_per_hr,
                            bus_share, len_between_intersections, avg_speed
                        )
                        VALUES ($1, $2, $3, $4, $5, $6)
                        RETURNING id, intersection_id, approach, intensity_veh_per_hr,
                                  bus_share, len_between_intersections, avg_speed
                        "#,
                    )
                    .bind(intersection_id)
                    .bind(input.approach.as_str())
                    .bind(input.intensity_veh_per_hr)
                    .bind(input.bus_share)
                    .bind(input.len_between_intersections)
                    .bind(input.avg_speed),
                )
                .await
            })
            .await?;

        decode(&row)
    }

    pub async fn list_for_intersection(&self, intersection_id: i64) -> DbResult<Vec<Flow>> {
        let db = self.db;
        db.single_session(|_| async move {
            IntersectionRepo::new(db).get(intersection_id).await?;
            let rows = db
                .all(
                    sqlx::query(
                        r#"
                        SELECT id, intersection_id, approach, intensity_veh_per_hr,
                               bus_share, len_between_intersections, avg_speed
                        FROM flows_input_data
                        WHERE intersection_id = $1
                        ORDER BY id
                        "#,
                    )
                    .bind(intersection_id),
                )
                .await?;
            decode_all(&rows)
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = self
            .db
            .execute(sqlx::query("DELETE FROM flows_input_data WHERE id = $1").bind(id))
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("flow", id));
        }
        Ok(())
    }
}
