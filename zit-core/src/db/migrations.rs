//! Schema migrations.
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so `run` is safe to call
//! on each startup. The DDL is shared between Postgres and SQLite; only the
//! auto-increment primary key is rendered per dialect.

use super::accessor::DatabaseAccessor;
use crate::error::{DbError, DbResult};

/// SQL dialect behind the configured URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.split_once(':')?;
        match scheme {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    fn primary_key(self) -> &'static str {
        match self {
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
            Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }
}

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id {pk},
        name VARCHAR(100) NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS intersections (
        id {pk},
        project_id BIGINT NOT NULL REFERENCES projects(id),
        number BIGINT NOT NULL,
        name VARCHAR(100) NOT NULL DEFAULT '',
        UNIQUE (project_id, number)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flows_input_data (
        id {pk},
        intersection_id BIGINT NOT NULL REFERENCES intersections(id),
        approach VARCHAR(1) NOT NULL CHECK (approach IN ('N', 'S', 'E', 'W')),
        intensity_veh_per_hr BIGINT NOT NULL CHECK (intensity_veh_per_hr >= 0),
        bus_share DOUBLE PRECISION NOT NULL CHECK (bus_share >= 0 AND bus_share <= 1),
        len_between_intersections BIGINT NOT NULL CHECK (len_between_intersections >= 0),
        avg_speed BIGINT NOT NULL CHECK (avg_speed >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS relations_input_data (
        id {pk},
        from_intersection_id BIGINT NOT NULL REFERENCES intersections(id),
        to_intersection_id BIGINT NOT NULL REFERENCES intersections(id),
        distance BIGINT NOT NULL CHECK (distance >= 0),
        avg_speed BIGINT NOT NULL CHECK (avg_speed >= 0),
        CHECK (from_intersection_id <> to_intersection_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS output_data (
        id {pk},
        intersection_id BIGINT NOT NULL UNIQUE REFERENCES intersections(id),
        cycle_north_south BIGINT NOT NULL CHECK (cycle_north_south >= 0),
        green_main_north_south BIGINT NOT NULL CHECK (green_main_north_south >= 0),
        lost_time_north_south BIGINT NOT NULL CHECK (lost_time_north_south >= 0),
        cycle_east_west BIGINT NOT NULL CHECK (cycle_east_west >= 0),
        green_main_east_west BIGINT NOT NULL CHECK (green_main_east_west >= 0),
        lost_time_east_west BIGINT NOT NULL CHECK (lost_time_east_west >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id {pk},
        username VARCHAR(100) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access_tokens (
        id {pk},
        token_hash VARCHAR(64) NOT NULL UNIQUE,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at BIGINT NOT NULL,
        expires_at BIGINT NOT NULL
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_intersections_project ON intersections(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_flows_intersection ON flows_input_data(intersection_id)",
    "CREATE INDEX IF NOT EXISTS idx_relations_from ON relations_input_data(from_intersection_id)",
    "CREATE INDEX IF NOT EXISTS idx_relations_to ON relations_input_data(to_intersection_id)",
    "CREATE INDEX IF NOT EXISTS idx_access_tokens_user ON access_tokens(user_id)",
];

/// All migration statements for `dialect`, tables before indexes.
pub fn statements(dialect: Dialect) -> Vec<String> {
    TABLES
        .iter()
        .map(|ddl| ddl.replace("{pk}", dialect.primary_key()))
        .chain(INDEXES.iter().map(|ddl| ddl.to_string()))
        .collect()
}

/// Create every table and index, in one transaction.
pub async fn run(db: &DatabaseAccessor) -> DbResult<()> {
    let dialect = db.dialect().ok_or(DbError::UnsupportedDialect)?;
    tracing::info!(?dialect, "running migrations");

    let statements = statements(dialect);
    let count = statements.len();
    db.transaction(|_| async move {
        for statement in &statements {
            db.execute(statement.as_str()).await?;
        }
        Ok::<_, DbError>(())
    })
    .await?;

    tracing::info!(statements = count, "migrations complete");
    Ok(())
}
