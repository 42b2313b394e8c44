//! Database layer: pool ownership, scoped sessions and migrations.
//!
//! - One pooled connection per session, never shared across tasks
//! - Sessions are found through a future-scoped registry, not passed around
//! - Nested `transaction()` calls become savepoints
//! - Constraint violations surface as `DbError::Conflict` in the repositories

pub mod accessor;
pub mod migrations;
pub mod registry;
pub mod rows;
pub mod session;

pub use accessor::DatabaseAccessor;
pub use migrations::Dialect;
pub use registry::SessionRegistry;
pub use session::Session;

use sqlx::any::AnyRow;
use sqlx::FromRow;

use crate::error::DbResult;

/// Decode a row into a record type.
pub fn decode<T>(row: &AnyRow) -> DbResult<T>
where
    T: for<'r> FromRow<'r, AnyRow>,
{
    Ok(T::from_row(row)?)
}

/// Decode every row.
pub fn decode_all<T>(rows: &[AnyRow]) -> DbResult<Vec<T>>
where
    T: for<'r> FromRow<'r, AnyRow>,
{
    rows.iter().map(decode).collect()
}
