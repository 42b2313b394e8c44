//! Bearer-token authentication.
//!
//! Tokens are opaque random strings handed to the client once. The database
//! only ever sees their SHA-256 digest, with an expiry. Resolution is
//! stateless: every call looks the digest up again.

pub mod identity;
pub mod password;
pub mod token;

pub use identity::{
    authenticate, fetch_optional_user, fetch_user_from_access_token, issue_access_token,
    register_user, revoke_access_token, IssuedToken,
};
