//! Records and repositories.
//!
//! Repositories borrow the [`DatabaseAccessor`](crate::db::DatabaseAccessor)
//! and go through its query helpers, so a call made inside `session()` or
//! `transaction()` joins that unit of work; a call made outside runs in its
//! own short-lived session. Writes that can hit a constraint run in a nested
//! `transaction()` so a conflict never poisons the caller's session.
//!
//! Lookups by key return [`DbError::NotFound`](crate::error::DbError) when
//! the row is missing; constraint violations surface as `DbError::Conflict`.

pub mod flows;
pub mod intersections;
pub mod outputs;
pub mod projects;
pub mod relations;
pub mod tokens;
pub mod users;

pub use flows::{Flow, FlowRepo};
pub use intersections::{Intersection, IntersectionRepo};
pub use outputs::{Output, OutputRepo};
pub use projects::{Project, ProjectRepo};
pub use relations::{Relation, RelationRepo};
pub use tokens::{AccessToken, TokenRepo};
pub use users::{User, UserRepo};

/// Current time as stored in the `*_at` columns.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
