//! Signal-timing outputs (`output_data`), one row per intersection.

use serde::Serialize;
use sqlx::FromRow;

use super::IntersectionRepo;
use crate::db::{decode, DatabaseAccessor};
use crate::error::DbResult;
use crate::models::TimingOutput;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Output {
    pub id: i64,
    pub intersection_id: i64,
    pub cycle_north_south: i64,
    pub green_main_north_south: i64,
    pub lost_time_north_south: i64,
    pub cycle_east_west: i64,
    pub green_main_east_west: i64,
    pub lost_time_east_west: i64,
}

const COLUMNS: &str = "id, intersection_id, cycle_north_south, green_main_north_south, \
     lost_time_north_south, cycle_east_west, green_main_east_west, lost_time_east_west";

pub struct OutputRepo<'a> {
    db: &'a DatabaseAccessor,
}

impl<'a> OutputRepo<'a> {
    pub fn new(db: &'a DatabaseAccessor) -> Self {
        Self { db }
    }

    /// Store the timing for an intersection, replacing any previous value.
    pub async fn upsert(&self, intersection_id: i64, timing: &TimingOutput) -> DbResult<Output> {
        let db = self.db;
        let sql = format!(
            r#"
            INSERT INTO output_data (
                intersection_id, cycle_north_south, green_main_north_south,
                lost_time_north_south, cycle_east_west, green_main_east_west,
                lost_time_east_west
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (intersection_id) DO UPDATE SET
                cycle_north_south = excluded.cycle_north_south,
                green_main_north_south = excluded.green_main_north_south,
                lost_time_north_south = excluded.lost_time_north_south,
                cycle_east_west = excluded.cycle_east_west,
                green_main_east_west = excluded.green_main_east_west,
                lost_time_east_west = excluded.lost_time_east_west
            RETURNING {COLUMNS}
            "#
        );

        let row = db
            .transaction(|_| async move {
                IntersectionRepo::new(db).get(intersection_id).await?;
                db.one(
                    sqlx::query(&sql)
                        .bind(intersection_id)
                        .bind(timing.cycle_north_south)
                        .bind(timing.green_main_north_south)
                        .bind(timing.lost_time_north_south)
                        .bind(timing.cycle_east_west)
                        .bind(timing.green_main_east_west)
                        .bind(timing.lost_time_east_west),
                )
                .await
            })
            .await?;

        decode(&row)
    }

    pub async fn get_for_intersection(&self, intersection_id: i64) -> DbResult<Option<Output>> {
        let sql = format!("SELECT {COLUMNS} FROM output_data WHERE intersection_id = $1");
        let row = self
            .db
            .one_or_none(sqlx::query(&sql).bind(intersection_id))
            .await?;
        row.as_ref().map(decode).transpose()
    }
}
