//! Core behaviors behind the HTTP handlers: the submission flow (redemption
//! guard + grading + persistence), the fire-and-forget user stats update, and
//! leaderboard assembly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::badges::derive_badges;
use crate::domain::{LeaderboardEntry, Submission};
use crate::error::ApiError;
use crate::protocol::{SubmitIn, SubmitOut};
use crate::scoring::{self, Grade};
use crate::state::AppState;
use crate::store::RedeemError;

/// Handle one case submission: validate, redeem the order code, grade, and
/// persist. The user aggregate update runs off the response path.
#[instrument(level = "info", skip(state, input), fields(%user_id, answers = input.answers.len()))]
pub async fn submit_case(
    state: &Arc<AppState>,
    user_id: &str,
    input: SubmitIn,
) -> Result<SubmitOut, ApiError> {
    if input.order_code.is_empty() {
        return Err(ApiError::InvalidPayload("Order code is required"));
    }

    // A missing active case rejects the submission; a store failure degrades
    // grading instead, so the endpoint stays available on backend hiccups.
    let active_case = match state.store.active_case().await {
        Ok(Some(case)) => Some(case),
        Ok(None) => return Err(ApiError::NoActiveCase),
        Err(e) => {
            warn!(target: "scoring", error = %e, "active case unresolvable; grading in degraded mode");
            None
        }
    };

    let now = Utc::now();
    state
        .store
        .redeem_order(&input.order_code, user_id, now)
        .await
        .map_err(|e| match e {
            RedeemError::NotFound => ApiError::OrderNotFound,
            RedeemError::AlreadyUsed => ApiError::OrderAlreadyUsed,
            RedeemError::NotDelivered => ApiError::OrderNotDelivered,
            RedeemError::Store(e) => ApiError::Store(e),
        })?;

    let (case_id, grade) = match &active_case {
        Some(case) => (
            case.id.clone(),
            scoring::grade(
                case,
                &input.answers,
                &input.favorite_coffee,
                &input.brewing_method,
            ),
        ),
        None => (String::new(), scoring::grade_degraded(&input.answers)),
    };

    let submission = Submission {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        case_id,
        order_code: input.order_code,
        answers: input.answers,
        favorite_coffee: input.favorite_coffee,
        brewing_method: input.brewing_method,
        score: grade.score,
        accuracy: grade.accuracy,
        submitted_at: now,
    };
    state.store.put_submission(submission.clone()).await?;
    info!(
        target: "scoring",
        submission = %submission.id,
        score = grade.score,
        accuracy = %format!("{:.4}", grade.accuracy),
        degraded = active_case.is_none(),
        "submission graded"
    );

    // Best-effort aggregate update; at most once, failures swallowed.
    {
        let state = state.clone();
        let user_id = submission.user_id.clone();
        tokio::spawn(async move {
            update_user_stats(&state, &user_id, grade).await;
        });
    }

    Ok(SubmitOut {
        message: "Submission successful",
        submission_id: submission.id,
        score: grade.score,
        accuracy: grade.accuracy,
    })
}

/// Fold a graded submission into the user aggregate: points, running-mean
/// accuracy, case count, and badges. Only existing users accumulate stats.
#[instrument(level = "info", skip(state), fields(%user_id, score = grade.score))]
pub async fn update_user_stats(state: &Arc<AppState>, user_id: &str, grade: Grade) {
    let user = match state.store.get_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(target: "brew_detective", %user_id, "stats update skipped: user not found");
            return;
        }
        Err(e) => {
            error!(target: "brew_detective", %user_id, error = %e, "stats update failed on read");
            return;
        }
    };

    let mut user = user;
    user.points += grade.score;
    user.cases_count += 1;
    let n = user.cases_count as f64;
    user.accuracy = (user.accuracy * (n - 1.0) + grade.accuracy) / n;
    user.badges = derive_badges(&user.badges, user.cases_count, user.accuracy, user.points);
    user.updated_at = Utc::now();

    if let Err(e) = state.store.put_user(user).await {
        error!(target: "brew_detective", %user_id, error = %e, "stats update failed on write");
    }
}

/// Global leaderboard: all users with any activity, ranked by total points.
pub async fn global_leaderboard(state: &AppState) -> Result<Vec<LeaderboardEntry>, ApiError> {
    let users = state.store.list_users().await?;
    let mut entries: Vec<LeaderboardEntry> = users
        .into_iter()
        .filter(|u| u.points > 0 || u.cases_count > 0)
        .map(|u| LeaderboardEntry {
            user_id: u.id,
            detective_name: u.name,
            points: u.points,
            accuracy: u.accuracy,
            cases_count: u.cases_count,
            badges: u.badges,
            rank: 0,
        })
        .collect();

    entries.sort_by(|a, b| b.points.cmp(&a.points));
    rank_and_truncate(&mut entries, state.config.leaderboard_top);
    Ok(entries)
}

/// Leaderboard for the active case only: each user's best submission counts.
pub async fn current_case_leaderboard(
    state: &AppState,
) -> Result<(String, String, Vec<LeaderboardEntry>), ApiError> {
    let case = state
        .store
        .active_case()
        .await?
        .ok_or(ApiError::NoActiveCase)?;
    let submissions = state.store.submissions_for_case(&case.id).await?;

    let mut best: HashMap<String, (i64, f64)> = HashMap::new();
    for s in &submissions {
        let entry = best.entry(s.user_id.clone()).or_insert((s.score, s.accuracy));
        if s.score > entry.0 {
            *entry = (s.score, s.accuracy);
        }
    }

    let mut entries = Vec::with_capacity(best.len());
    for (user_id, (points, accuracy)) in best {
        // Users deleted since submitting are skipped.
        let Some(user) = state.store.get_user(&user_id).await? else {
            continue;
        };
        entries.push(LeaderboardEntry {
            user_id,
            detective_name: user.name,
            points,
            accuracy,
            cases_count: 1,
            badges: user.badges,
            rank: 0,
        });
    }

    entries.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.accuracy.partial_cmp(&a.accuracy).unwrap_or(std::cmp::Ordering::Equal))
    });
    rank_and_truncate(&mut entries, state.config.leaderboard_top);
    Ok((case.id, case.name, entries))
}

fn rank_and_truncate(entries: &mut Vec<LeaderboardEntry>, top: usize) {
    entries.truncate(top);
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::config::AppConfig;
    use crate::domain::{
        CatalogCategory, CatalogItem, Coffee, CoffeeAnswer, CoffeeCase, EnabledQuestions, Order,
        OrderStatus, User, UserType,
    };
    use crate::store::{DocumentStore, MemoryStore, Page, StoreError};

    fn test_state(store: MemoryStore) -> Arc<AppState> {
        Arc::new(AppState::new(AppConfig::test_default(), Arc::new(store)))
    }

    /// Store whose case collection is unreachable; everything else delegates
    /// to an in-memory store. Exercises the degraded grading path.
    struct CaseOutageStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for CaseOutageStore {
        async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
            self.0.get_user(id).await
        }
        async fn put_user(&self, user: User) -> Result<(), StoreError> {
            self.0.put_user(user).await
        }
        async fn list_users(&self) -> Result<Vec<User>, StoreError> {
            self.0.list_users().await
        }
        async fn get_case(&self, _id: &str) -> Result<Option<CoffeeCase>, StoreError> {
            Err(StoreError::Unavailable("cases collection offline".into()))
        }
        async fn put_case(&self, case: CoffeeCase) -> Result<(), StoreError> {
            self.0.put_case(case).await
        }
        async fn delete_case(&self, id: &str) -> Result<bool, StoreError> {
            self.0.delete_case(id).await
        }
        async fn active_case(&self) -> Result<Option<CoffeeCase>, StoreError> {
            Err(StoreError::Unavailable("cases collection offline".into()))
        }
        async fn active_cases(&self) -> Result<Vec<CoffeeCase>, StoreError> {
            Err(StoreError::Unavailable("cases collection offline".into()))
        }
        async fn list_cases(&self, page: Page) -> Result<Vec<CoffeeCase>, StoreError> {
            self.0.list_cases(page).await
        }
        async fn put_submission(&self, submission: Submission) -> Result<(), StoreError> {
            self.0.put_submission(submission).await
        }
        async fn submissions_for_user(
            &self,
            user_id: &str,
            page: Page,
        ) -> Result<Vec<Submission>, StoreError> {
            self.0.submissions_for_user(user_id, page).await
        }
        async fn submissions_for_case(
            &self,
            case_id: &str,
        ) -> Result<Vec<Submission>, StoreError> {
            self.0.submissions_for_case(case_id).await
        }
        async fn put_order(&self, order: Order) -> Result<(), StoreError> {
            self.0.put_order(order).await
        }
        async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
            self.0.get_order(id).await
        }
        async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>, StoreError> {
            self.0.find_order_by_code(code).await
        }
        async fn redeem_order(
            &self,
            code: &str,
            user_id: &str,
            now: DateTime<Utc>,
        ) -> Result<Order, crate::store::RedeemError> {
            self.0.redeem_order(code, user_id, now).await
        }
        async fn list_orders(&self, page: Page) -> Result<Vec<Order>, StoreError> {
            self.0.list_orders(page).await
        }
        async fn get_catalog_item(&self, id: &str) -> Result<Option<CatalogItem>, StoreError> {
            self.0.get_catalog_item(id).await
        }
        async fn put_catalog_item(&self, item: CatalogItem) -> Result<(), StoreError> {
            self.0.put_catalog_item(item).await
        }
        async fn delete_catalog_item(&self, id: &str) -> Result<bool, StoreError> {
            self.0.delete_catalog_item(id).await
        }
        async fn list_catalog(
            &self,
            category: Option<CatalogCategory>,
            only_active: bool,
            page: Page,
        ) -> Result<Vec<CatalogItem>, StoreError> {
            self.0.list_catalog(category, only_active, page).await
        }
    }

    fn user(id: &str) -> User {
        let now = Utc::now();
        User {
            id: id.into(),
            name: format!("Detective {id}"),
            email: format!("{id}@example.com"),
            picture: String::new(),
            user_type: UserType::Regular,
            points: 0,
            cases_count: 0,
            accuracy: 0.0,
            badges: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn delivered_order(code: &str) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            code: code.into(),
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

    fn active_case() -> CoffeeCase {
        let now = Utc::now();
        CoffeeCase {
            id: "case-1".into(),
            name: "First Case".into(),
            description: String::new(),
            price: 0,
            coffees: vec![Coffee {
                id: "c1".into(),
                name: String::new(),
                region: "huila".into(),
                variety: "caturra".into(),
                process: "washed".into(),
                roast_level: String::new(),
                tasting_notes: "chocolate, caramel".into(),
                farm: String::new(),
                altitude: 0,
            }],
            enabled_questions: EnabledQuestions {
                region: true,
                variety: true,
                process: true,
                ..Default::default()
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn full_answer() -> CoffeeAnswer {
        CoffeeAnswer {
            coffee_id: "c1".into(),
            region: "Huila".into(),
            variety: "caturra".into(),
            process: "washed".into(),
            taste_note1: String::new(),
            taste_note2: String::new(),
        }
    }

    #[tokio::test]
    async fn submit_grades_and_consumes_the_code() {
        let store = MemoryStore::new();
        store.put_case(active_case()).await.unwrap();
        store.put_order(delivered_order("CODE01")).await.unwrap();
        let state = test_state(store);

        let out = submit_case(
            &state,
            "u1",
            SubmitIn {
                order_code: "CODE01".into(),
                answers: vec![full_answer()],
                favorite_coffee: String::new(),
                brewing_method: String::new(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out.score, 100);
        assert_eq!(out.accuracy, 1.0);

        // Same code again: rejected as already used.
        let again = submit_case(
            &state,
            "u2",
            SubmitIn {
                order_code: "CODE01".into(),
                answers: vec![full_answer()],
                favorite_coffee: String::new(),
                brewing_method: String::new(),
            },
        )
        .await;
        assert!(matches!(again, Err(ApiError::OrderAlreadyUsed)));
    }

    #[tokio::test]
    async fn submit_requires_active_case_and_code() {
        let store = MemoryStore::new();
        store.put_order(delivered_order("CODE02")).await.unwrap();
        let state = test_state(store);

        let missing_code = submit_case(
            &state,
            "u1",
            SubmitIn {
                order_code: String::new(),
                answers: vec![],
                favorite_coffee: String::new(),
                brewing_method: String::new(),
            },
        )
        .await;
        assert!(matches!(missing_code, Err(ApiError::InvalidPayload(_))));

        let no_case = submit_case(
            &state,
            "u1",
            SubmitIn {
                order_code: "CODE02".into(),
                answers: vec![full_answer()],
                favorite_coffee: String::new(),
                brewing_method: String::new(),
            },
        )
        .await;
        assert!(matches!(no_case, Err(ApiError::NoActiveCase)));
    }

    #[tokio::test]
    async fn store_outage_degrades_grading_but_still_burns_the_code() {
        let inner = MemoryStore::new();
        // An active case exists, but the outage store can't reach it.
        inner.put_case(active_case()).await.unwrap();
        inner.put_order(delivered_order("CODE03")).await.unwrap();
        let store = CaseOutageStore(inner);
        let state = Arc::new(AppState::new(
            AppConfig::test_default(),
            Arc::new(store),
        ));

        let mut answer = full_answer();
        answer.process = String::new();
        let out = submit_case(
            &state,
            "u1",
            SubmitIn {
                order_code: "CODE03".into(),
                answers: vec![answer],
                favorite_coffee: "any".into(),
                brewing_method: "v60".into(),
            },
        )
        .await
        .unwrap();
        // Degraded: 2 of 3 fixed fields non-empty, no bonus.
        assert!((out.accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(out.score, 66);

        // The submission is recorded without a case reference.
        let subs = state
            .store
            .submissions_for_user("u1", Page { limit: 10, offset: 0 })
            .await
            .unwrap();
        assert_eq!(subs.len(), 1);
        assert!(subs[0].case_id.is_empty());

        // Redemption was enforced as usual.
        let replay = submit_case(
            &state,
            "u2",
            SubmitIn {
                order_code: "CODE03".into(),
                answers: vec![full_answer()],
                favorite_coffee: String::new(),
                brewing_method: String::new(),
            },
        )
        .await;
        assert!(matches!(replay, Err(ApiError::OrderAlreadyUsed)));
    }

    #[tokio::test]
    async fn stats_update_folds_running_mean_and_badges() {
        let store = MemoryStore::new();
        store.put_user(user("u1")).await.unwrap();
        let state = test_state(store);

        update_user_stats(&state, "u1", Grade { score: 300, accuracy: 0.9 }).await;
        update_user_stats(&state, "u1", Grade { score: 100, accuracy: 0.5 }).await;

        let u = state.store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(u.points, 400);
        assert_eq!(u.cases_count, 2);
        assert!((u.accuracy - 0.7).abs() < 1e-9);
        assert!(u.badges.iter().any(|b| b == crate::badges::FIRST_CASE));
        assert!(u.badges.iter().any(|b| b == crate::badges::ACCURACY_70));
    }

    #[tokio::test]
    async fn stats_update_ignores_unknown_users() {
        let state = test_state(MemoryStore::new());
        // Must not panic or create a user from nothing.
        update_user_stats(&state, "ghost", Grade { score: 10, accuracy: 1.0 }).await;
        assert!(state.store.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn global_leaderboard_ranks_by_points() {
        let store = MemoryStore::new();
        let mut a = user("a");
        a.points = 500;
        a.cases_count = 2;
        let mut b = user("b");
        b.points = 900;
        b.cases_count = 1;
        let idle = user("idle");
        store.put_user(a).await.unwrap();
        store.put_user(b).await.unwrap();
        store.put_user(idle).await.unwrap();
        let state = test_state(store);

        let entries = global_leaderboard(&state).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, "b");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].user_id, "a");
        assert_eq!(entries[1].rank, 2);
    }

    #[tokio::test]
    async fn current_case_leaderboard_keeps_best_score_per_user() {
        let store = MemoryStore::new();
        store.put_case(active_case()).await.unwrap();
        store.put_user(user("u1")).await.unwrap();
        let now = Utc::now();
        for (id, score) in [("s1", 100), ("s2", 250)] {
            store
                .put_submission(Submission {
                    id: id.into(),
                    user_id: "u1".into(),
                    case_id: "case-1".into(),
                    order_code: String::new(),
                    answers: vec![],
                    favorite_coffee: String::new(),
                    brewing_method: String::new(),
                    score,
                    accuracy: 0.5,
                    submitted_at: now,
                })
                .await
                .unwrap();
        }
        let state = test_state(store);

        let (case_id, _, entries) = current_case_leaderboard(&state).await.unwrap();
        assert_eq!(case_id, "case-1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].points, 250);
    }
}
