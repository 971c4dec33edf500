//! Document store abstraction and the in-memory implementation.
//!
//! The store is injected into `AppState` as a trait object so handlers and
//! core logic never touch a concrete backend (and tests can run against the
//! in-memory store). The contract is deliberately small: typed get/put/query
//! per collection, plus one conditional operation (`redeem_order`) that the
//! redemption guard depends on.
//!
//! `MemoryStore` keeps each collection in an `Arc<RwLock<HashMap>>`.
//! `redeem_order` performs its check and its write under a single write lock,
//! so two concurrent redemption attempts on the same code can never both
//! succeed. A backend-native implementation must preserve that property with
//! a transaction or compare-and-swap on `is_submission_used`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{
    CatalogCategory, CatalogItem, CoffeeCase, Order, OrderStatus, Submission, User,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}

/// Why a redemption attempt was rejected.
#[derive(Error, Debug)]
pub enum RedeemError {
    #[error("order code not found")]
    NotFound,
    #[error("order code already used")]
    AlreadyUsed,
    #[error("order not delivered")]
    NotDelivered,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Clamped limit/offset pagination used by list queries.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn clamped(limit: Option<usize>, offset: Option<usize>, default: usize, max: usize) -> Self {
        let limit = match limit {
            Some(l) if l > 0 && l <= max => l,
            _ => default,
        };
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Users
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn put_user(&self, user: User) -> Result<(), StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    // Cases
    async fn get_case(&self, id: &str) -> Result<Option<CoffeeCase>, StoreError>;
    async fn put_case(&self, case: CoffeeCase) -> Result<(), StoreError>;
    async fn delete_case(&self, id: &str) -> Result<bool, StoreError>;
    /// The single currently-active case, if any.
    async fn active_case(&self) -> Result<Option<CoffeeCase>, StoreError>;
    async fn active_cases(&self) -> Result<Vec<CoffeeCase>, StoreError>;
    /// All cases, newest first.
    async fn list_cases(&self, page: Page) -> Result<Vec<CoffeeCase>, StoreError>;

    // Submissions
    async fn put_submission(&self, submission: Submission) -> Result<(), StoreError>;
    /// A user's submissions, newest first.
    async fn submissions_for_user(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<Vec<Submission>, StoreError>;
    async fn submissions_for_case(&self, case_id: &str) -> Result<Vec<Submission>, StoreError>;

    // Orders
    async fn put_order(&self, order: Order) -> Result<(), StoreError>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>, StoreError>;
    /// Conditionally mark the order behind `code` as redeemed by `user_id`.
    /// Must be atomic: the status/used checks and the write happen as one
    /// operation, never as a separate read then write.
    async fn redeem_order(
        &self,
        code: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, RedeemError>;
    /// All orders, newest first.
    async fn list_orders(&self, page: Page) -> Result<Vec<Order>, StoreError>;

    // Catalog
    async fn get_catalog_item(&self, id: &str) -> Result<Option<CatalogItem>, StoreError>;
    async fn put_catalog_item(&self, item: CatalogItem) -> Result<(), StoreError>;
    async fn delete_catalog_item(&self, id: &str) -> Result<bool, StoreError>;
    /// Catalog items sorted by category then display order.
    async fn list_catalog(
        &self,
        category: Option<CatalogCategory>,
        only_active: bool,
        page: Page,
    ) -> Result<Vec<CatalogItem>, StoreError>;
}

/// In-memory document store. Default backend for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    cases: Arc<RwLock<HashMap<String, CoffeeCase>>>,
    submissions: Arc<RwLock<HashMap<String, Submission>>>,
    orders: Arc<RwLock<HashMap<String, Order>>>,
    catalog: Arc<RwLock<HashMap<String, CatalogItem>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.id.clone(), user);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn get_case(&self, id: &str) -> Result<Option<CoffeeCase>, StoreError> {
        Ok(self.cases.read().await.get(id).cloned())
    }

    async fn put_case(&self, case: CoffeeCase) -> Result<(), StoreError> {
        self.cases.write().await.insert(case.id.clone(), case);
        Ok(())
    }

    async fn delete_case(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.cases.write().await.remove(id).is_some())
    }

    async fn active_case(&self) -> Result<Option<CoffeeCase>, StoreError> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .find(|c| c.is_active)
            .cloned())
    }

    async fn active_cases(&self) -> Result<Vec<CoffeeCase>, StoreError> {
        let mut cases: Vec<CoffeeCase> = self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cases)
    }

    async fn list_cases(&self, page: Page) -> Result<Vec<CoffeeCase>, StoreError> {
        let mut cases: Vec<CoffeeCase> = self.cases.read().await.values().cloned().collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(&cases))
    }

    async fn put_submission(&self, submission: Submission) -> Result<(), StoreError> {
        self.submissions
            .write()
            .await
            .insert(submission.id.clone(), submission);
        Ok(())
    }

    async fn submissions_for_user(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut subs: Vec<Submission> = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(page.slice(&subs))
    }

    async fn submissions_for_case(&self, case_id: &str) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn put_order(&self, order: Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.code == code)
            .cloned())
    }

    async fn redeem_order(
        &self,
        code: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, RedeemError> {
        // Single write lock across check and set: no double-spend window.
        let mut orders = self.orders.write().await;
        let order = orders
            .values_mut()
            .find(|o| o.code == code)
            .ok_or(RedeemError::NotFound)?;
        if order.is_submission_used {
            return Err(RedeemError::AlreadyUsed);
        }
        if order.status != OrderStatus::Delivered {
            return Err(RedeemError::NotDelivered);
        }
        order.is_submission_used = true;
        order.submission_used_by = Some(user_id.to_string());
        order.submission_used_at = Some(now);
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn list_orders(&self, page: Page) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(&orders))
    }

    async fn get_catalog_item(&self, id: &str) -> Result<Option<CatalogItem>, StoreError> {
        Ok(self.catalog.read().await.get(id).cloned())
    }

    async fn put_catalog_item(&self, item: CatalogItem) -> Result<(), StoreError> {
        self.catalog.write().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn delete_catalog_item(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.catalog.write().await.remove(id).is_some())
    }

    async fn list_catalog(
        &self,
        category: Option<CatalogCategory>,
        only_active: bool,
        page: Page,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        let mut items: Vec<CatalogItem> = self
            .catalog
            .read()
            .await
            .values()
            .filter(|i| category.map_or(true, |c| i.category == c))
            .filter(|i| !only_active || i.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.category
                .as_str()
                .cmp(b.category.as_str())
                .then(a.display_order.cmp(&b.display_order))
        });
        Ok(page.slice(&items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered_order(code: &str) -> Order {
        let now = Utc::now();
        Order {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            user_id: "buyer".into(),
            case_id: String::new(),
            customer_name: String::new(),
            contact_info: String::new(),
            status: OrderStatus::Delivered,
            total_amount: 0,
            is_submission_used: false,
            submission_used_by: None,
            submission_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn redeem_succeeds_once_then_rejects() {
        let store = MemoryStore::new();
        store.put_order(delivered_order("ABC123")).await.unwrap();

        let first = store.redeem_order("ABC123", "u1", Utc::now()).await;
        let order = first.expect("first redemption should succeed");
        assert!(order.is_submission_used);
        assert_eq!(order.submission_used_by.as_deref(), Some("u1"));

        let second = store.redeem_order("ABC123", "u2", Utc::now()).await;
        assert!(matches!(second, Err(RedeemError::AlreadyUsed)));
    }

    #[tokio::test]
    async fn redeem_rejects_undelivered_and_unknown() {
        let store = MemoryStore::new();
        let mut order = delivered_order("PENDIN");
        order.status = OrderStatus::Shipped;
        store.put_order(order).await.unwrap();

        assert!(matches!(
            store.redeem_order("PENDIN", "u1", Utc::now()).await,
            Err(RedeemError::NotDelivered)
        ));
        assert!(matches!(
            store.redeem_order("NOPE00", "u1", Utc::now()).await,
            Err(RedeemError::NotFound)
        ));
    }

    #[tokio::test]
    async fn concurrent_redeems_cannot_both_succeed() {
        let store = Arc::new(MemoryStore::new());
        store.put_order(delivered_order("RACE01")).await.unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.redeem_order("RACE01", "a", Utc::now()).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.redeem_order("RACE01", "b", Utc::now()).await })
        };
        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn pagination_clamps_limits() {
        let page = Page::clamped(Some(500), None, 20, 100);
        assert_eq!(page.limit, 20);
        let page = Page::clamped(Some(30), Some(10), 20, 100);
        assert_eq!((page.limit, page.offset), (30, 10));
    }
}
