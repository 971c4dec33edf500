//! Domain models: users, coffee cases, submissions, orders, and catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account kind. Admin users can manage cases and the catalog.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Regular,
    Admin,
}
impl Default for UserType {
    fn default() -> Self {
        UserType::Regular
    }
}

/// A registered player. Aggregate stats (points, accuracy, badges) are updated
/// off the request path after each graded submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub cases_count: u32,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which questions are graded for a case. Set at authoring time; read-only
/// during grading. The first five count toward `questions_per_coffee`;
/// the last two are flat bonus questions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct EnabledQuestions {
    #[serde(default)]
    pub region: bool,
    #[serde(default)]
    pub variety: bool,
    #[serde(default)]
    pub process: bool,
    #[serde(default)]
    pub taste_note1: bool,
    #[serde(default)]
    pub taste_note2: bool,
    #[serde(default)]
    pub favorite_coffee: bool,
    #[serde(default)]
    pub brewing_method: bool,
}

impl EnabledQuestions {
    /// Number of graded fields per coffee (bonus questions excluded).
    pub fn per_coffee(&self) -> usize {
        [
            self.region,
            self.variety,
            self.process,
            self.taste_note1,
            self.taste_note2,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

/// Ground truth for a single coffee in a case. `tasting_notes` is a
/// comma-separated list of acceptable note strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coffee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub roast_level: String,
    #[serde(default)]
    pub tasting_notes: String,
    #[serde(default)]
    pub farm: String,
    #[serde(default)]
    pub altitude: u32,
}

/// A themed set of coffees with ground-truth attributes to be guessed.
/// Truth data is immutable once the case is published (is_active = true).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoffeeCase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub coffees: Vec<Coffee>,
    #[serde(default)]
    pub enabled_questions: EnabledQuestions,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's free-text answers for a single coffee.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoffeeAnswer {
    pub coffee_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub taste_note1: String,
    #[serde(default)]
    pub taste_note2: String,
}

/// A graded attempt at a case. Append-only: created once, never mutated.
/// `case_id` is empty when the submission was graded in degraded mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub case_id: String,
    pub order_code: String,
    pub answers: Vec<CoffeeAnswer>,
    #[serde(default)]
    pub favorite_coffee: String,
    #[serde(default)]
    pub brewing_method: String,
    pub score: i64,
    pub accuracy: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Order lifecycle. A code becomes redeemable only once delivered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
}
impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// A purchased case. `code` is the short user-facing order code, distinct from
/// the internal `id`. `is_submission_used` transitions false -> true exactly
/// once; there is no un-redemption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub code: String,
    pub user_id: String,
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub contact_info: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub is_submission_used: bool,
    #[serde(default)]
    pub submission_used_by: Option<String>,
    #[serde(default)]
    pub submission_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category of a catalog answer option.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CatalogCategory {
    Region,
    Variety,
    Process,
    BrewingMethod,
}

impl CatalogCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "region" => Some(Self::Region),
            "variety" => Some(Self::Variety),
            "process" => Some(Self::Process),
            "brewing_method" => Some(Self::BrewingMethod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Variety => "variety",
            Self::Process => "process",
            Self::BrewingMethod => "brewing_method",
        }
    }
}

/// One selectable answer option shown to players (e.g. a known region).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub category: CatalogCategory,
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A ranked row of the leaderboard.
#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub detective_name: String,
    pub points: i64,
    pub accuracy: f64,
    pub cases_count: u32,
    pub badges: Vec<String>,
    pub rank: usize,
}
