//! Catalog endpoints: the answer options players pick from (regions,
//! varieties, processes, brewing methods). Public reads expose only active
//! items; the admin CRUD manages the full set.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::{CatalogCategory, CatalogItem};
use crate::error::ApiError;
use crate::protocol::{
    CatalogGroupedOut, CatalogItemOut, CatalogItemUpdate, CatalogItemsOut, CatalogListOut,
    CatalogListQuery, CreateCatalogItemIn, MessageOut,
};
use crate::state::AppState;
use crate::store::Page;

// Public reads are unpaginated in practice; the cap guards runaway catalogs.
const PUBLIC_PAGE: Page = Page {
    limit: 500,
    offset: 0,
};

#[instrument(level = "info", skip(state))]
pub async fn grouped(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogGroupedOut>, ApiError> {
    let items = state.store.list_catalog(None, true, PUBLIC_PAGE).await?;
    let mut catalog: BTreeMap<&'static str, Vec<CatalogItem>> = BTreeMap::new();
    for item in items {
        catalog.entry(item.category.as_str()).or_default().push(item);
    }
    Ok(Json(CatalogGroupedOut { catalog }))
}

#[instrument(level = "info", skip(state), fields(%category))]
pub async fn by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<CatalogItemsOut>, ApiError> {
    let category = CatalogCategory::parse(&category)
        .ok_or(ApiError::InvalidPayload("Unknown catalog category"))?;
    let items = state
        .store
        .list_catalog(Some(category), true, PUBLIC_PAGE)
        .await?;
    Ok(Json(CatalogItemsOut {
        count: items.len(),
        items,
    }))
}

//
// Admin
//

#[instrument(level = "info", skip(state, _admin, input), fields(category = %input.category.as_str()))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CreateCatalogItemIn>,
) -> Result<Json<CatalogItemOut>, ApiError> {
    if input.value.trim().is_empty() {
        return Err(ApiError::InvalidPayload("Catalog value is required"));
    }
    let item = CatalogItem {
        id: Uuid::new_v4().to_string(),
        category: input.category,
        value: input.value,
        label: input.label,
        display_order: input.display_order,
        is_active: input.is_active,
        created_at: Utc::now(),
    };
    state.store.put_catalog_item(item.clone()).await?;
    info!(target: "brew_detective", item = %item.id, "catalog item created");
    Ok(Json(CatalogItemOut { item }))
}

#[instrument(level = "info", skip(state, _admin))]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(q): Query<CatalogListQuery>,
) -> Result<Json<CatalogListOut>, ApiError> {
    let category = match &q.category {
        Some(s) => Some(
            CatalogCategory::parse(s).ok_or(ApiError::InvalidPayload("Unknown catalog category"))?,
        ),
        None => None,
    };
    let page = Page::clamped(q.limit, q.offset, 50, 100);
    let items = state.store.list_catalog(category, false, page).await?;
    Ok(Json(CatalogListOut {
        count: items.len(),
        items,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[instrument(level = "info", skip(state, _admin, update), fields(%id))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(update): Json<CatalogItemUpdate>,
) -> Result<Json<CatalogItemOut>, ApiError> {
    let mut item = state
        .store
        .get_catalog_item(&id)
        .await?
        .ok_or(ApiError::NotFound("Catalog item"))?;

    if let Some(label) = update.label {
        item.label = label;
    }
    if let Some(value) = update.value {
        item.value = value;
    }
    if let Some(is_active) = update.is_active {
        item.is_active = is_active;
    }
    if let Some(display_order) = update.display_order {
        item.display_order = display_order;
    }

    state.store.put_catalog_item(item.clone()).await?;
    Ok(Json(CatalogItemOut { item }))
}

#[instrument(level = "info", skip(state, _admin), fields(%id))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageOut>, ApiError> {
    if !state.store.delete_catalog_item(&id).await? {
        return Err(ApiError::NotFound("Catalog item"));
    }
    Ok(Json(MessageOut {
        message: "Catalog item deleted".into(),
    }))
}
