//! Route handlers organized by resource

pub mod auth;
pub mod intersections;
pub mod ping;
pub mod projects;
