//! Public request/response structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CatalogCategory, CatalogItem, Coffee, CoffeeAnswer, CoffeeCase, EnabledQuestions,
    LeaderboardEntry, Order, OrderStatus, User,
};
use chrono::{DateTime, Utc};

#[derive(Serialize)]
pub struct HealthOut {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Serialize)]
pub struct MessageOut {
    pub message: String,
}

/// limit/offset pagination accepted by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

//
// Auth
//

#[derive(Serialize)]
pub struct AuthUrlOut {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}

//
// Submissions
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub order_code: String,
    #[serde(default)]
    pub answers: Vec<CoffeeAnswer>,
    #[serde(default)]
    pub favorite_coffee: String,
    #[serde(default)]
    pub brewing_method: String,
}

#[derive(Serialize)]
pub struct SubmitOut {
    pub message: &'static str,
    pub submission_id: String,
    pub score: i64,
    pub accuracy: f64,
}

/// Row of a user's submission history, joined with the case name.
#[derive(Serialize)]
pub struct SubmissionSummary {
    pub id: String,
    pub case_id: String,
    pub case_name: String,
    pub score: i64,
    pub accuracy: f64,
    pub submitted_at: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SubmissionListOut {
    pub submissions: Vec<SubmissionSummary>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

//
// Orders
//

#[derive(Debug, Deserialize)]
pub struct CreateOrderIn {
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub total_amount: i64,
}

#[derive(Serialize)]
pub struct CreateOrderOut {
    pub message: &'static str,
    pub order_id: String,
    /// The short code customers type in when submitting.
    pub order_code: String,
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct OrderOut {
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusIn {
    pub status: OrderStatus,
}

/// Admin order listing row, joined with user and case names.
#[derive(Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: String,
    pub case_name: String,
}

#[derive(Serialize)]
pub struct OrderListOut {
    pub orders: Vec<OrderSummary>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

//
// Cases
//

#[derive(Serialize)]
pub struct CaseOut {
    pub case: CoffeeCase,
}

#[derive(Serialize)]
pub struct CasesOut {
    pub cases: Vec<CoffeeCase>,
}

#[derive(Serialize)]
pub struct CaseListOut {
    pub cases: Vec<CoffeeCase>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateCaseIn {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub coffees: Vec<Coffee>,
    #[serde(default)]
    pub enabled_questions: EnabledQuestions,
    #[serde(default)]
    pub is_active: bool,
}

/// Whitelisted partial update for a case. Anything not listed here cannot be
/// touched through the API (no open field maps).
#[derive(Debug, Default, Deserialize)]
pub struct CaseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub coffees: Option<Vec<Coffee>>,
    pub enabled_questions: Option<EnabledQuestions>,
    pub is_active: Option<bool>,
}

//
// Catalog
//

#[derive(Debug, Deserialize)]
pub struct CreateCatalogItemIn {
    pub category: CatalogCategory,
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Active options for every category, keyed by category name. Shape of the
/// public catalog endpoint the frontend renders its pickers from.
#[derive(Serialize)]
pub struct CatalogGroupedOut {
    pub catalog: std::collections::BTreeMap<&'static str, Vec<CatalogItem>>,
}

#[derive(Serialize)]
pub struct CatalogItemsOut {
    pub items: Vec<CatalogItem>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct CatalogItemOut {
    pub item: CatalogItem,
}

#[derive(Serialize)]
pub struct CatalogListOut {
    pub items: Vec<CatalogItem>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

/// Whitelisted partial update for a catalog item.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogItemUpdate {
    pub label: Option<String>,
    pub value: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogListQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

//
// Users & leaderboard
//

#[derive(Serialize)]
pub struct UserOut {
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateIn {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct UserListOut {
    pub users: Vec<UserSummary>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_users: usize,
}

#[derive(Serialize)]
pub struct CurrentCaseLeaderboardOut {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_users: usize,
    pub case_id: String,
    pub case_name: String,
}
