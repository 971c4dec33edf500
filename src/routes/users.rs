//! User endpoints: own profile, per-id lookup/update (self or admin), and the
//! admin account listing.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::instrument;

use crate::auth::{AdminUser, AuthUser};
use crate::domain::UserType;
use crate::error::ApiError;
use crate::protocol::{ProfileUpdateIn, UserListOut, UserOut, UserSummary};
use crate::state::AppState;

#[instrument(level = "info", skip(state, auth), fields(user = %auth.user_id))]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserOut>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(UserOut { user }))
}

#[instrument(level = "info", skip(state, auth), fields(user = %auth.user_id, %id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserOut>, ApiError> {
    require_self_or_admin(&state, &auth, &id).await?;
    // The looked-up account is a resource, not a credential: missing -> 404.
    let user = state
        .store
        .get_user(&id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(UserOut { user }))
}

#[instrument(level = "info", skip(state, auth, update), fields(user = %auth.user_id, %id))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<ProfileUpdateIn>,
) -> Result<Json<UserOut>, ApiError> {
    require_self_or_admin(&state, &auth, &id).await?;
    let mut user = state
        .store
        .get_user(&id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if let Some(name) = update.name {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidPayload("Name cannot be empty"));
        }
        user.name = name;
    }
    if let Some(email) = update.email {
        user.email = email;
    }
    user.updated_at = Utc::now();

    state.store.put_user(user.clone()).await?;
    Ok(Json(UserOut { user }))
}

#[instrument(level = "info", skip(state, _admin))]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<UserListOut>, ApiError> {
    let users = state.store.list_users().await?;
    let users: Vec<UserSummary> = users
        .into_iter()
        .map(|u| UserSummary {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();
    Ok(Json(UserListOut {
        count: users.len(),
        users,
    }))
}

async fn require_self_or_admin(
    state: &AppState,
    auth: &AuthUser,
    target_id: &str,
) -> Result<(), ApiError> {
    if auth.user_id == target_id {
        return Ok(());
    }
    let requester = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    if requester.user_type != UserType::Admin {
        return Err(ApiError::AdminRequired);
    }
    Ok(())
}
