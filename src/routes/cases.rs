//! Case endpoints: the public read-only views players use, and the admin CRUD
//! surface. Truth data (coffee attributes) is only ever written here; grading
//! reads it through the store.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::CoffeeCase;
use crate::error::ApiError;
use crate::protocol::{CaseListOut, CaseOut, CaseUpdate, CasesOut, CreateCaseIn, MessageOut, PageQuery};
use crate::state::AppState;
use crate::store::Page;

#[instrument(level = "info", skip(state))]
pub async fn list_active(State(state): State<Arc<AppState>>) -> Result<Json<CasesOut>, ApiError> {
    let cases = state.store.active_cases().await?;
    Ok(Json(CasesOut { cases }))
}

#[instrument(level = "info", skip(state))]
pub async fn get_active(State(state): State<Arc<AppState>>) -> Result<Json<CaseOut>, ApiError> {
    let case = state
        .store
        .active_case()
        .await?
        .ok_or(ApiError::NoActiveCase)?;
    Ok(Json(CaseOut { case }))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CaseOut>, ApiError> {
    let case = state
        .store
        .get_case(&id)
        .await?
        .ok_or(ApiError::NotFound("Case"))?;
    Ok(Json(CaseOut { case }))
}

//
// Admin
//

#[instrument(level = "info", skip(state, input), fields(admin = %admin.0.user_id))]
pub async fn create_case(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(input): Json<CreateCaseIn>,
) -> Result<Json<CaseOut>, ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::InvalidPayload("Case name is required"));
    }

    let now = Utc::now();
    let mut coffees = input.coffees;
    for coffee in &mut coffees {
        // Authoring tools send placeholder ids; give each coffee a stable one.
        if coffee.id.is_empty() || coffee.id.starts_with("coffee_") {
            coffee.id = format!("coffee_{}", Uuid::new_v4());
        }
    }

    let case = CoffeeCase {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        price: input.price,
        coffees,
        enabled_questions: input.enabled_questions,
        is_active: input.is_active,
        created_at: now,
        updated_at: now,
    };
    state.store.put_case(case.clone()).await?;
    info!(target: "brew_detective", case = %case.id, coffees = case.coffees.len(), "case created");
    Ok(Json(CaseOut { case }))
}

#[instrument(level = "info", skip(state, _admin))]
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<CaseListOut>, ApiError> {
    let page = Page::clamped(q.limit, q.offset, 20, 100);
    let cases = state.store.list_cases(page).await?;
    Ok(Json(CaseListOut {
        count: cases.len(),
        cases,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[instrument(level = "info", skip(state, _admin, update), fields(%id))]
pub async fn update_case(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(update): Json<CaseUpdate>,
) -> Result<Json<CaseOut>, ApiError> {
    let mut case = state
        .store
        .get_case(&id)
        .await?
        .ok_or(ApiError::NotFound("Case"))?;

    if let Some(name) = update.name {
        case.name = name;
    }
    if let Some(description) = update.description {
        case.description = description;
    }
    if let Some(price) = update.price {
        case.price = price;
    }
    if let Some(coffees) = update.coffees {
        case.coffees = coffees;
    }
    if let Some(enabled) = update.enabled_questions {
        case.enabled_questions = enabled;
    }
    if let Some(is_active) = update.is_active {
        case.is_active = is_active;
    }
    case.updated_at = Utc::now();

    state.store.put_case(case.clone()).await?;
    Ok(Json(CaseOut { case }))
}

#[instrument(level = "info", skip(state, _admin), fields(%id))]
pub async fn delete_case(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageOut>, ApiError> {
    if !state.store.delete_case(&id).await? {
        return Err(ApiError::NotFound("Case"));
    }
    info!(target: "brew_detective", case = %id, "case deleted");
    Ok(Json(MessageOut {
        message: "Case deleted".into(),
    }))
}
