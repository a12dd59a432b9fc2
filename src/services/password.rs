// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! bcrypt password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use crate::error::AppError;

/// Work factor for new hashes.
pub const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash is treated as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?;

    Ok(verified.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Stored password hash is malformed");
        false
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter22").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("anything", "not-a-hash").await.unwrap());
    }
}
