// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that tokens issued at login can be decoded by the
//! auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use notiq::error::AppError;
use notiq::middleware::auth::{create_jwt, verify_jwt, Claims, TOKEN_TTL_SECS};

const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

fn now_secs() -> usize {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt("user-123", KEY).unwrap();
    let claims = verify_jwt(&token, KEY).unwrap();

    assert_eq!(claims.sub, "user-123");
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
}

#[test]
fn test_jwt_is_plain_hs256() {
    // Any HS256 verifier with the shared key must accept the token
    let token = create_jwt("user-123", KEY).unwrap();
    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(KEY),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();

    assert_eq!(data.header.alg, Algorithm::HS256);
    assert_eq!(data.claims.sub, "user-123");
}

#[test]
fn test_jwt_wrong_key() {
    let token = create_jwt("user-123", KEY).unwrap();

    assert!(matches!(
        verify_jwt(&token, b"wrong_key_wrong_key_wrong_key!!"),
        Err(AppError::InvalidToken)
    ));
}

#[test]
fn test_jwt_expired() {
    let now = now_secs();
    let claims = Claims {
        sub: "user-123".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(matches!(verify_jwt(&token, KEY), Err(AppError::InvalidToken)));
}

#[test]
fn test_jwt_empty_subject_rejected() {
    let now = now_secs();
    let claims = Claims {
        sub: String::new(),
        iat: now,
        exp: now + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(matches!(verify_jwt(&token, KEY), Err(AppError::InvalidToken)));
}

#[test]
fn test_jwt_other_algorithm_rejected() {
    let now = now_secs();
    let claims = Claims {
        sub: "user-123".to_string(),
        iat: now,
        exp: now + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, KEY).is_err());
}
