//! bcrypt hashing for stored credentials.
//!
//! Both operations are CPU-bound and run on the blocking pool so a slow hash
//! never stalls the request executor.

use crate::error::{AppError, AppResult};

/// Work factor for new hashes.
pub const HASH_COST: u32 = 10;

pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("There was an error encrypting the password: {e}")))
}

/// Compare a candidate password with a stored hash. bcrypt's verify compares
/// digests in constant time. A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify() {
        let hash = hash_password("hunter2".into(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("pw".into(), 4).await.unwrap();
        let b = hash_password("pw".into(), 4).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        assert!(!verify_password("pw".into(), "not-a-hash".into()).await.unwrap());
    }
}
