//! Order endpoints: purchase creation (which mints the redeemable code),
//! owner lookup, and the admin listing / status transitions that make a code
//! eligible for redemption.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::domain::{Order, OrderStatus, UserType};
use crate::error::ApiError;
use crate::protocol::{
    CreateOrderIn, CreateOrderOut, MessageOut, OrderListOut, OrderOut, OrderSummary, PageQuery,
    UpdateOrderStatusIn,
};
use crate::state::AppState;
use crate::store::Page;
use crate::util::generate_order_code;

#[instrument(level = "info", skip(state, auth, input), fields(user = %auth.user_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(input): Json<CreateOrderIn>,
) -> Result<Json<CreateOrderOut>, ApiError> {
    if input.case_id.is_empty() {
        return Err(ApiError::InvalidPayload("Case id is required"));
    }
    if state.store.get_case(&input.case_id).await?.is_none() {
        return Err(ApiError::NotFound("Case"));
    }

    // 36^6 codes; collisions are unlikely but cheap to check for.
    let mut code = generate_order_code();
    for _ in 0..4 {
        if state.store.find_order_by_code(&code).await?.is_none() {
            break;
        }
        warn!(target: "brew_detective", "order code collision, regenerating");
        code = generate_order_code();
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        code,
        user_id: auth.user_id,
        case_id: input.case_id,
        customer_name: input.customer_name,
        contact_info: input.contact_info,
        status: OrderStatus::Pending,
        total_amount: input.total_amount,
        is_submission_used: false,
        submission_used_by: None,
        submission_used_at: None,
        created_at: now,
        updated_at: now,
    };
    state.store.put_order(order.clone()).await?;
    info!(target: "brew_detective", order = %order.id, "order created");

    Ok(Json(CreateOrderOut {
        message: "Order created",
        order_id: order.id,
        order_code: order.code,
        status: order.status,
    }))
}

#[instrument(level = "info", skip(state, auth), fields(user = %auth.user_id, %id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderOut>, ApiError> {
    let order = state
        .store
        .get_order(&id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    if order.user_id != auth.user_id && !is_admin(&state, &auth.user_id).await? {
        // Others' orders are invisible, not forbidden.
        return Err(ApiError::NotFound("Order"));
    }
    Ok(Json(OrderOut { order }))
}

#[instrument(level = "info", skip(state, _admin, input), fields(%id, status = ?input.status))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateOrderStatusIn>,
) -> Result<Json<MessageOut>, ApiError> {
    let mut order = state
        .store
        .get_order(&id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    order.status = input.status;
    order.updated_at = Utc::now();
    state.store.put_order(order).await?;
    Ok(Json(MessageOut {
        message: "Order status updated".into(),
    }))
}

#[instrument(level = "info", skip(state, _admin))]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<OrderListOut>, ApiError> {
    let page = Page::clamped(q.limit, q.offset, 20, 100);
    let orders = state.store.list_orders(page).await?;

    let mut user_names: HashMap<String, String> = HashMap::new();
    let mut case_names: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(orders.len());
    for order in orders {
        let user_name = match user_names.get(&order.user_id) {
            Some(name) => name.clone(),
            None => {
                let name = state
                    .store
                    .get_user(&order.user_id)
                    .await?
                    .map(|u| u.name)
                    .unwrap_or_default();
                user_names.insert(order.user_id.clone(), name.clone());
                name
            }
        };
        let case_name = match case_names.get(&order.case_id) {
            Some(name) => name.clone(),
            None => {
                let name = state
                    .store
                    .get_case(&order.case_id)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_default();
                case_names.insert(order.case_id.clone(), name.clone());
                name
            }
        };
        rows.push(OrderSummary {
            order,
            user_name,
            case_name,
        });
    }

    Ok(Json(OrderListOut {
        count: rows.len(),
        orders: rows,
        limit: page.limit,
        offset: page.offset,
    }))
}

async fn is_admin(state: &AppState, user_id: &str) -> Result<bool, ApiError> {
    Ok(state
        .store
        .get_user(user_id)
        .await?
        .map(|u| u.user_type == UserType::Admin)
        .unwrap_or(false))
}
