use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wire::error_message;

/// Tokens are treated as expired this long before Google says they are.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("wrong email or password")]
    InvalidCredentials,

    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode auth response: {0}")]
    Decode(String),
}

/// A signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id_token: String,
    pub refresh_token: String,
    pub email: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub api_key: String,
    pub identity_base_url: Option<String>,
    pub token_base_url: Option<String>,
}

impl AuthConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_base_url: None,
            token_base_url: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    email: String,
    local_id: String,
    expires_in: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: String,
}

/// Email/password sign-in against Google's identity toolkit.
pub struct AuthClient {
    config: AuthConfig,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn identity_base(&self) -> &str {
        self.config
            .identity_base_url
            .as_deref()
            .unwrap_or("https://identitytoolkit.googleapis.com")
    }

    fn token_base(&self) -> &str {
        self.config
            .token_base_url
            .as_deref()
            .unwrap_or("https://securetoken.googleapis.com")
    }

    fn url(&self, base: &str, path: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| AuthError::Rejected(format!("bad auth URL: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        Ok(url)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.url(self.identity_base(), "/v1/accounts:signInWithPassword")?;
        let response = self
            .client
            .post(url)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(error_message(response).await));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        debug!(email = %body.email, "signed in");

        Ok(Session {
            expires_at: expiry(&body.expires_in)?,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            email: body.email,
            user_id: body.local_id,
        })
    }

    /// Exchange the refresh token for a fresh id token.
    pub async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let url = self.url(self.token_base(), "/v1/token")?;
        let response = self
            .client
            .post(url)
            .json(&RefreshRequest {
                grant_type: "refresh_token",
                refresh_token: &session.refresh_token,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(error_message(response).await));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        debug!(user = %body.user_id, "session refreshed");

        Ok(Session {
            expires_at: expiry(&body.expires_in)?,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            email: session.email.clone(),
            user_id: body.user_id,
        })
    }
}

fn rejection(message: String) -> AuthError {
    // Codes may carry a suffix, e.g. "INVALID_PASSWORD : ...".
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Rejected(message),
    }
}

fn expiry(expires_in: &str) -> Result<DateTime<Utc>, AuthError> {
    let secs: i64 = expires_in
        .parse()
        .map_err(|_| AuthError::Decode(format!("bad expiresIn {expires_in:?}")))?;
    Ok(Utc::now() + Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_map_to_invalid_credentials() {
        assert!(matches!(
            rejection("INVALID_PASSWORD".into()),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            rejection("INVALID_LOGIN_CREDENTIALS".into()),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            rejection("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled".into()),
            AuthError::Rejected(_)
        ));
    }

    #[test]
    fn session_expires_with_margin() {
        let now = Utc::now();
        let session = Session {
            id_token: "a".into(),
            refresh_token: "b".into(),
            email: "ops@example.com".into(),
            user_id: "u1".into(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - Duration::seconds(120)));
    }
}
