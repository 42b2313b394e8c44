//! Result-shape checks shared by the accessor's query helpers.

use crate::error::{DbError, DbResult};

/// Exactly one row.
pub fn exactly_one<R>(rows: Vec<R>) -> DbResult<R> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        (None, _) => Err(DbError::NoRows),
        (Some(_), Some(_)) => Err(DbError::MultipleRows),
    }
}

/// Zero or one row.
pub fn at_most_one<R>(rows: Vec<R>) -> DbResult<Option<R>> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(_), Some(_)) => Err(DbError::MultipleRows),
        (row, _) => Ok(row),
    }
}
