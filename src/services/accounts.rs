// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account creation and lookup for both login flows.

use crate::db::{FirestoreDb, UserKey};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{AuthProvider, User};
use crate::services::oauth::ProviderProfile;
use crate::services::password;

const EMAIL_TAKEN: &str = "User Already Exist";

/// Register a password account. Fails with `Conflict` if the email is taken.
pub async fn register(db: &FirestoreDb, email: &str, plaintext: &str) -> Result<User, AppError> {
    let email = normalize_email(email);

    if db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let hash = password::hash_password(plaintext).await?;
    let user = User::with_password(&email, hash);
    if !create_user(db, &user).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Check email + password. Unknown email, federated-only account and wrong
/// password are indistinguishable to the caller.
pub async fn authenticate(
    db: &FirestoreDb,
    email: &str,
    plaintext: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);

    let user = db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let Some(hash) = user.password_hash.as_deref() else {
        tracing::debug!(user_id = %user.id, "Password login attempted on federated account");
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify_password(plaintext, hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Resolve a federated login to a local account.
///
/// Lookup order: provider id, then email (linking the provider to the
/// existing account), otherwise a new account is created. Linking by email
/// requires the provider to have verified it; otherwise `UnverifiedEmail`.
pub async fn link_federated_user(
    db: &FirestoreDb,
    profile: &ProviderProfile,
) -> Result<User, AppError> {
    let provider = profile.provider;

    if let Some(user) = db
        .find_user_by_provider(provider, &profile.provider_id)
        .await?
    {
        return Ok(user);
    }

    let email = normalize_email(&profile.email);

    if let Some(user) = db.find_user_by_email(&email).await? {
        if !profile.email_verified {
            tracing::warn!(
                user_id = %user.id,
                provider = provider.as_str(),
                "Refusing to link account by unverified email"
            );
            return Err(AppError::UnverifiedEmail);
        }
        return link_provider(db, user, profile).await;
    }

    let user = User::with_provider(&email, provider, &profile.provider_id);
    if !create_user(db, &user).await? {
        return resolve_after_conflict(db, profile).await;
    }

    tracing::info!(
        user_id = %user.id,
        provider = provider.as_str(),
        "Created account from federated login"
    );
    Ok(user)
}

/// Attach the profile's provider id to an existing account.
async fn link_provider(
    db: &FirestoreDb,
    mut user: User,
    profile: &ProviderProfile,
) -> Result<User, AppError> {
    let provider = profile.provider;
    let key = UserKey::Provider(provider, &profile.provider_id);

    if !db.claim_user_key(key, &user.id).await? {
        return resolve_after_conflict(db, profile).await;
    }

    user.set_provider_id(provider, &profile.provider_id);
    if let Err(e) = db.upsert_user(&user).await {
        release_keys(db, &[key], &user.id).await;
        return Err(e);
    }

    tracing::info!(
        user_id = %user.id,
        provider = provider.as_str(),
        "Linked provider to existing account"
    );
    Ok(user)
}

/// A concurrent login claimed the provider id or email first.
async fn resolve_after_conflict(
    db: &FirestoreDb,
    profile: &ProviderProfile,
) -> Result<User, AppError> {
    db.find_user_by_provider(profile.provider, &profile.provider_id)
        .await?
        .ok_or_else(|| AppError::Conflict(EMAIL_TAKEN.to_string()))
}

/// Values of `user` that no other account may share.
fn unique_keys(user: &User) -> Vec<UserKey<'_>> {
    let mut keys = vec![UserKey::Email(&user.email)];
    for provider in [AuthProvider::Google, AuthProvider::Github] {
        if let Some(id) = user.provider_id(provider) {
            keys.push(UserKey::Provider(provider, id));
        }
    }
    keys
}

/// Claim every unique value of a new user, then store it.
///
/// Returns `false`, with nothing stored, if any value is already held.
async fn create_user(db: &FirestoreDb, user: &User) -> Result<bool, AppError> {
    let mut claimed = Vec::new();

    for key in unique_keys(user) {
        match db.claim_user_key(key, &user.id).await {
            Ok(true) => claimed.push(key),
            Ok(false) => {
                tracing::debug!(user_id = %user.id, key = ?key, "Unique user value already held");
                release_keys(db, &claimed, &user.id).await;
                return Ok(false);
            }
            Err(e) => {
                release_keys(db, &claimed, &user.id).await;
                return Err(e);
            }
        }
    }

    if let Err(e) = db.upsert_user(user).await {
        release_keys(db, &claimed, &user.id).await;
        return Err(e);
    }

    Ok(true)
}

async fn release_keys(db: &FirestoreDb, keys: &[UserKey<'_>], user_id: &str) {
    for &key in keys {
        if let Err(e) = db.release_user_key(key, user_id).await {
            tracing::warn!(error = %e, key = ?key, "Failed to release user claim");
        }
    }
}
