//! Google OAuth login endpoints and logout.
//!
//! Login is a two-step handshake: `/auth/google` hands the frontend a consent
//! URL carrying a random state parameter, and `/auth/google/callback` trades
//! the returned code for a Google userinfo document, upserts the account, and
//! redirects back to the frontend with a session JWT in the fragment.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use tracing::{error, info, instrument};

use crate::domain::User;
use crate::error::ApiError;
use crate::protocol::{AuthUrlOut, MessageOut, OAuthCallbackQuery};
use crate::state::AppState;
use crate::util::generate_oauth_state;

/// Minimum length we accept for the echoed state parameter. Ours are 43
/// base64 chars; anything shorter did not come from us.
const MIN_STATE_LEN: usize = 16;

#[instrument(level = "info", skip(state))]
pub async fn google_login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AuthUrlOut>, ApiError> {
    let google = state.google.as_ref().ok_or(ApiError::OAuthUnavailable)?;
    let auth_url = google.auth_url(&generate_oauth_state());
    Ok(Json(AuthUrlOut { auth_url }))
}

#[instrument(level = "info", skip_all, fields(state_len = q.state.len()))]
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(q): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let google = state.google.as_ref().ok_or(ApiError::OAuthUnavailable)?;
    if q.state.len() < MIN_STATE_LEN {
        return Err(ApiError::InvalidPayload("Invalid OAuth state"));
    }
    if q.code.is_empty() {
        return Err(ApiError::InvalidPayload("Missing authorization code"));
    }

    let google_user = google.fetch_user(&q.code).await.map_err(|e| {
        error!(target: "auth", error = %e, "Google code exchange failed");
        ApiError::InvalidToken
    })?;

    let now = Utc::now();
    let user = match state.store.get_user(&google_user.id).await? {
        // Returning user: refresh the Google-owned fields, keep everything
        // the user or an admin set (name, role, stats).
        Some(mut existing) => {
            existing.email = google_user.email;
            existing.picture = google_user.picture;
            existing.updated_at = now;
            existing
        }
        None => User {
            id: google_user.id,
            name: google_user.name,
            email: google_user.email,
            picture: google_user.picture,
            user_type: Default::default(),
            points: 0,
            cases_count: 0,
            accuracy: 0.0,
            badges: vec![],
            created_at: now,
            updated_at: now,
        },
    };
    state.store.put_user(user.clone()).await?;

    let token = state.jwt.issue(&user.id, &user.email, &user.name).map_err(|e| {
        error!(target: "auth", error = %e, "JWT signing failed");
        ApiError::Internal
    })?;
    info!(target: "auth", user = %user.id, "login completed");

    Ok(Redirect::temporary(&format!(
        "{}/#token={token}",
        state.config.frontend_url
    )))
}

/// Sessions are stateless JWTs; logout is client-side token disposal.
#[instrument(level = "info")]
pub async fn logout() -> Json<MessageOut> {
    Json(MessageOut {
        message: "Logged out".into(),
    })
}
