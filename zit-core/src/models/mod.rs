//! Validated input models.
//!
//! Request data is checked when these types are built; repositories only
//! accept the validated forms. Invalid input is a [`ValidationError`],
//! never a panic.

pub mod credentials;
pub mod pagination;
pub mod project;
pub mod traffic;
pub mod validation;

pub use credentials::{Password, Username};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use project::{Description, IntersectionName, ProjectName};
pub use traffic::{Approach, FlowInput, RelationInput, TimingOutput};
pub use validation::ValidationError;
