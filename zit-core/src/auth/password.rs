//! bcrypt hashing, run on the blocking pool.

use crate::error::AuthError;
use crate::models::Password;

pub async fn hash_password(password: &Password, cost: u32) -> Result<String, AuthError> {
    let plain = password.expose().to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hashed)
}

/// `Ok(false)` on mismatch; `Err` only if `hash` is not a bcrypt hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let plain = password.to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let password = Password::new("Secr3t!pass").unwrap();
        let hashed = hash_password(&password, 4).await.unwrap();

        assert_ne!(hashed, "Secr3t!pass");
        assert!(verify_password("Secr3t!pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong!Pass1", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("Secr3t!pass", "not-a-hash").await,
            Err(AuthError::Hash(_))
        ));
    }
}
