// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth clients for federated login (Google, GitHub).
//!
//! Handles:
//! - Building the provider authorization URL
//! - Exchanging the authorization code for an access token
//! - Fetching the provider profile (id + email)
//! - Signing and verifying the `state` round-trip parameter

use crate::config::OAuthCredentials;
use crate::error::AppError;
use crate::models::AuthProvider;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("notiq/", env!("CARGO_PKG_VERSION"));

/// How long a signed `state` stays valid.
pub const STATE_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// Provider URLs. Overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    /// GitHub only: fallback when the profile hides its email.
    pub emails_url: Option<String>,
    pub scope: &'static str,
}

impl ProviderEndpoints {
    pub fn for_provider(provider: AuthProvider) -> Self {
        match provider {
            AuthProvider::Google => Self {
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                profile_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
                emails_url: None,
                scope: "openid profile email",
            },
            AuthProvider::Github => Self {
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                profile_url: "https://api.github.com/user".to_string(),
                emails_url: Some("https://api.github.com/user/emails".to_string()),
                scope: "user:email",
            },
        }
    }
}

/// Identity returned by a provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: AuthProvider,
    pub provider_id: String,
    pub email: String,
    /// Whether the provider vouches for `email`. Only verified emails may
    /// be matched against existing accounts.
    pub email_verified: bool,
}

/// OAuth client for one identity provider.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    provider: AuthProvider,
    credentials: OAuthCredentials,
    endpoints: ProviderEndpoints,
}

impl OAuthClient {
    pub fn new(provider: AuthProvider, credentials: OAuthCredentials) -> Self {
        Self::with_endpoints(
            provider,
            credentials,
            ProviderEndpoints::for_provider(provider),
        )
    }

    pub fn with_endpoints(
        provider: AuthProvider,
        credentials: OAuthCredentials,
        endpoints: ProviderEndpoints,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            provider,
            credentials,
            endpoints,
        }
    }

    /// URL the browser is redirected to in order to start the login.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.endpoints.authorize_url,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode(self.endpoints.scope),
            urlencoding::encode(state),
        );
        if self.provider == AuthProvider::Google {
            url.push_str("&prompt=select_account");
        }
        url
    }

    /// Complete the login: exchange the code, then fetch the profile.
    pub async fn authenticate(
        &self,
        code: &str,
        callback_url: &str,
    ) -> Result<ProviderProfile, AppError> {
        let access_token = self.exchange_code(code, callback_url).await?;
        self.fetch_profile(&access_token).await
    }

    /// Exchange authorization code for an access token.
    async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuthProvider(format!("Token exchange failed: {}", e)))?;

        let token: TokenResponse = self.check_response_json(response).await?;

        match (token.access_token, token.error) {
            (Some(access_token), _) => Ok(access_token),
            (None, Some(error)) => Err(AppError::OAuthProvider(format!(
                "{} token exchange rejected: {}",
                self.provider.as_str(),
                error
            ))),
            (None, None) => Err(AppError::OAuthProvider(
                "Token response missing access_token".to_string(),
            )),
        }
    }

    /// Fetch the authenticated user's id and email.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AppError> {
        match self.provider {
            AuthProvider::Google => {
                let info: GoogleUserInfo =
                    self.get_json(&self.endpoints.profile_url, access_token).await?;
                let email = info.email.filter(|e| !e.is_empty()).ok_or_else(|| {
                    AppError::OAuthProvider("Google profile has no email".to_string())
                })?;
                Ok(ProviderProfile {
                    provider: AuthProvider::Google,
                    provider_id: info.sub,
                    email,
                    email_verified: info.email_verified.unwrap_or(false),
                })
            }
            AuthProvider::Github => {
                let user: GithubUser =
                    self.get_json(&self.endpoints.profile_url, access_token).await?;

                // GitHub only shows verified addresses as the public profile email.
                let verified_email = match user.email.filter(|e| !e.is_empty()) {
                    Some(email) => Some(email),
                    None => self.github_primary_email(access_token).await,
                };

                let (email, email_verified) = match verified_email {
                    Some(email) => (email, true),
                    None => (format!("{}@github.com", user.login), false),
                };

                Ok(ProviderProfile {
                    provider: AuthProvider::Github,
                    provider_id: user.id.to_string(),
                    email,
                    email_verified,
                })
            }
        }
    }

    /// Primary verified email from GitHub's email list, if accessible.
    async fn github_primary_email(&self, access_token: &str) -> Option<String> {
        let url = self.endpoints.emails_url.as_deref()?;
        match self.get_json::<Vec<GithubEmail>>(url, access_token).await {
            Ok(emails) => select_github_email(emails),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch GitHub emails");
                None
            }
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::OAuthProvider(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = self.provider.as_str(),
                status = %status,
                body = %body,
                "OAuth provider request failed"
            );
            return Err(AppError::OAuthProvider(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OAuthProvider(format!("JSON parse error: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

fn select_github_email(emails: Vec<GithubEmail>) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.clone())
}

// ─── OAuth State ─────────────────────────────────────────────

fn state_signature(payload: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Encode the frontend URL and issue time into a signed `state` value.
///
/// Format before base64url: `frontend_url|timestamp_ms_hex|signature_hex`.
pub fn sign_state(frontend_url: &str, secret: &[u8]) -> Result<String, AppError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let payload = format!("{}|{:x}", frontend_url, timestamp);
    let signature = state_signature(&payload, secret)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("HMAC init failed")))?;

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the signature and age of a `state` value and return its frontend URL.
pub fn verify_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // The URL itself may contain '|', so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let expected = state_signature(&payload, secret)?;

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_millis();
    if now_ms.saturating_sub(issued_ms) > STATE_MAX_AGE.as_millis() {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            client_id: "client id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn test_state_roundtrip() {
        let secret = b"secret_key";
        let state = sign_state("https://example.com", secret).unwrap();
        assert_eq!(
            verify_state(&state, secret),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_state_wrong_secret() {
        let state = sign_state("https://example.com", b"secret_key").unwrap();
        assert_eq!(verify_state(&state, b"wrong_key"), None);
    }

    #[test]
    fn test_state_expired() {
        let secret = b"secret_key";
        let payload = format!("{}|{:x}", "https://example.com", 1_000u128);
        let signature = state_signature(&payload, secret).unwrap();
        let state = URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature));
        assert_eq!(verify_state(&state, secret), None);
    }

    #[test]
    fn test_state_malformed() {
        let encoded = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_state(&encoded, b"secret_key"), None);
        assert_eq!(verify_state("%%%not-base64", b"secret_key"), None);
    }

    #[test]
    fn test_authorize_url_encodes_params() {
        let client = OAuthClient::new(AuthProvider::Github, credentials());
        let url = client.authorize_url("http://localhost:3000/api/auth/github/callback", "abc");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fgithub%2Fcallback"
        ));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("state=abc"));
        assert!(!url.contains("prompt="));
    }

    #[test]
    fn test_google_userinfo_email_verified() {
        let info: GoogleUserInfo = serde_json::from_str(
            r#"{"sub":"x","email":"victim@example.com","email_verified":false}"#,
        )
        .unwrap();
        assert_eq!(info.email_verified, Some(false));

        let info: GoogleUserInfo =
            serde_json::from_str(r#"{"sub":"x","email":"a@example.com"}"#).unwrap();
        assert_eq!(info.email_verified, None);
    }

    #[test]
    fn test_select_github_email_prefers_primary_verified() {
        let emails = vec![
            GithubEmail {
                email: "other@example.com".to_string(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "main@example.com".to_string(),
                primary: true,
                verified: true,
            },
        ];
        assert_eq!(
            select_github_email(emails),
            Some("main@example.com".to_string())
        );

        let unverified = vec![GithubEmail {
            email: "x@example.com".to_string(),
            primary: true,
            verified: false,
        }];
        assert_eq!(select_github_email(unverified), None);
    }
}
