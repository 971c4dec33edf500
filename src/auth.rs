//! Session tokens and Google OAuth.
//!
//! Sessions are stateless HS256 JWTs carrying {sub, email, name}. The OAuth
//! handshake is the plain authorization-code flow over `reqwest`: we build
//! the consent URL, exchange the callback code for an access token, and fetch
//! the userinfo document. The API key material never appears in logs.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::config::GoogleOAuth;
use crate::domain::UserType;
use crate::error::ApiError;
use crate::state::AppState;

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email \
                             https://www.googleapis.com/auth/userinfo.profile";

/// JWT claims for a logged-in session.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtAuth {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

/// Userinfo document returned by Google.
#[derive(Debug, Deserialize)]
pub struct GoogleUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Minimal Google OAuth client for the authorization-code flow.
#[derive(Clone)]
pub struct GoogleClient {
    client: reqwest::Client,
    cfg: GoogleOAuth,
}

impl GoogleClient {
    /// Construct the client if a client id is configured; otherwise None
    /// (login endpoints then report OAuth as unavailable).
    pub fn from_config(cfg: &GoogleOAuth) -> Option<Self> {
        if cfg.client_id.is_empty() {
            return None;
        }
        Some(Self {
            client: reqwest::Client::new(),
            cfg: cfg.clone(),
        })
    }

    /// Consent URL the frontend should redirect the user to.
    pub fn auth_url(&self, state: &str) -> String {
        // parse_with_params only fails on a malformed base, which is constant.
        reqwest::Url::parse_with_params(
            GOOGLE_AUTH_ENDPOINT,
            &[
                ("client_id", self.cfg.client_id.as_str()),
                ("redirect_uri", self.cfg.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )
        .map(|u| u.to_string())
        .unwrap_or_default()
    }

    /// Exchange the callback code for an access token and fetch userinfo.
    #[instrument(level = "info", skip_all, fields(code_len = code.len()))]
    pub async fn fetch_user(&self, code: &str) -> Result<GoogleUser, reqwest::Error> {
        let token: TokenResponse = self
            .client
            .post(GOOGLE_TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
                ("redirect_uri", self.cfg.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        self.client
            .get(GOOGLE_USERINFO_ENDPOINT)
            .query(&[("access_token", token.access_token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Extractor for authenticated routes: validates the Bearer token and exposes
/// the session claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingAuth)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::InvalidToken)?;
        let claims = state.jwt.validate(token).map_err(|e| {
            error!(target: "auth", error = %e, "JWT validation failed");
            ApiError::InvalidToken
        })?;
        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}

/// Extractor for admin routes: authenticated user whose stored account has
/// admin privileges.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .store
            .get_user(&auth.user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if user.user_type != UserType::Admin {
            return Err(ApiError::AdminRequired);
        }
        Ok(AdminUser(auth))
    }
}
