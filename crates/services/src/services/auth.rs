//! Identity-provider client: password sign-in against the hosted auth API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("rate limited")]
    RateLimited,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("malformed identity response: {0}")]
    MalformedResponse(String),
}

/// Profile fields validated out of the provider's metadata bag.
///
/// `role` feeds the fallback dashboard route for users without a staff
/// membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct UserProfile {
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl UserProfile {
    /// Validate the dynamic `user_metadata` bag at the boundary. Unknown keys
    /// are ignored; fields of the wrong type are dropped with a warning
    /// rather than propagated.
    pub fn from_metadata(metadata: Option<&Value>) -> Self {
        let Some(map) = metadata.and_then(Value::as_object) else {
            return Self::default();
        };

        let field = |key: &str| match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                warn!(key = %key, value = %other, "dropping non-string metadata field");
                None
            }
        };

        Self {
            role: field("role"),
            first_name: field("first_name"),
            last_name: field("last_name"),
            phone: field("phone"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub profile: UserProfile,
    pub session: UserSession,
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
    user_metadata: Option<Value>,
}

/// Thin client for the hosted identity provider.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("vetportal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Verify an email/password pair and return the authenticated identity
    /// with its session and boundary-validated profile.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let res = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let token: TokenResponse = res
                    .json()
                    .await
                    .map_err(|e| AuthError::Serde(e.to_string()))?;

                let email = token.user.email.ok_or_else(|| {
                    AuthError::MalformedResponse("user record is missing an email".to_string())
                })?;
                let profile = UserProfile::from_metadata(token.user.user_metadata.as_ref());

                Ok(AuthenticatedUser {
                    id: token.user.id,
                    email,
                    profile,
                    session: UserSession {
                        access_token: token.access_token,
                        refresh_token: token.refresh_token,
                        expires_in: token.expires_in,
                    },
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(AuthError::InvalidCredentials)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AuthError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(AuthError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn profile_from_typical_metadata() {
        let metadata = json!({
            "role": "pet-owner",
            "first_name": "Maria",
            "last_name": "Santos",
            "avatar_url": "https://example.com/a.png"
        });

        let profile = UserProfile::from_metadata(Some(&metadata));
        assert_eq!(profile.role.as_deref(), Some("pet-owner"));
        assert_eq!(profile.first_name.as_deref(), Some("Maria"));
        assert_eq!(profile.last_name.as_deref(), Some("Santos"));
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn non_string_fields_are_dropped() {
        let metadata = json!({
            "role": 42,
            "first_name": ["Maria"],
            "phone": null
        });

        let profile = UserProfile::from_metadata(Some(&metadata));
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn missing_or_non_object_metadata_yields_empty_profile() {
        assert_eq!(UserProfile::from_metadata(None), UserProfile::default());

        let metadata = json!("free-form string");
        assert_eq!(
            UserProfile::from_metadata(Some(&metadata)),
            UserProfile::default()
        );
    }
}
