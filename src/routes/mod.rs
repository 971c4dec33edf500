//! Router assembly: public endpoints, the authenticated API under `/api/v1`,
//! admin routes, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::protocol::HealthOut;
use crate::state::AppState;

pub mod auth;
pub mod cases;
pub mod catalog;
pub mod leaderboard;
pub mod orders;
pub mod submissions;
pub mod users;

/// Build the application router:
/// - Health + OAuth handshake at the root
/// - Public, authenticated, and admin API under `/api/v1/...`
/// - CORS from configured origins (any origin when none configured)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(health))
        // OAuth handshake
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/logout", post(auth::logout))
        // Public reads
        .route("/api/v1/cases", get(cases::list_active))
        .route("/api/v1/cases/active", get(cases::get_active))
        .route("/api/v1/cases/:id", get(cases::get_case))
        .route("/api/v1/leaderboard", get(leaderboard::global))
        .route("/api/v1/leaderboard/current", get(leaderboard::current_case))
        .route("/api/v1/catalog", get(catalog::grouped))
        .route("/api/v1/catalog/:category", get(catalog::by_category))
        // Authenticated
        .route("/api/v1/profile", get(users::profile))
        .route("/api/v1/users/:id", get(users::get).put(users::update))
        .route(
            "/api/v1/submissions",
            post(submissions::submit).get(submissions::list),
        )
        .route("/api/v1/orders", post(orders::create))
        .route("/api/v1/orders/:id", get(orders::get))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        // Admin
        .route(
            "/api/v1/admin/cases",
            post(cases::create_case).get(cases::list_cases),
        )
        .route(
            "/api/v1/admin/cases/:id",
            put(cases::update_case).delete(cases::delete_case),
        )
        .route(
            "/api/v1/admin/catalog",
            post(catalog::create).get(catalog::admin_list),
        )
        .route(
            "/api/v1/admin/catalog/:id",
            put(catalog::update).delete(catalog::delete),
        )
        .route("/api/v1/admin/orders", get(orders::admin_list))
        .route("/api/v1/admin/users", get(users::admin_list))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn health() -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok",
        service: "brew-detective-backend",
    })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::AppConfig;
    use crate::domain::{
        Coffee, CoffeeCase, EnabledQuestions, Order, OrderStatus, User, UserType,
    };
    use crate::store::{DocumentStore, MemoryStore};

    async fn seeded_state() -> Arc<AppState> {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .put_user(User {
                id: "player".into(),
                name: "Player One".into(),
                email: "p1@example.com".into(),
                picture: String::new(),
                user_type: UserType::Regular,
                points: 0,
                cases_count: 0,
                accuracy: 0.0,
                badges: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        store
            .put_user(User {
                id: "chief".into(),
                name: "Chief Detective".into(),
                email: "chief@example.com".into(),
                picture: String::new(),
                user_type: UserType::Admin,
                points: 0,
                cases_count: 0,
                accuracy: 0.0,
                badges: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        store
            .put_case(CoffeeCase {
                id: "case-1".into(),
                name: "Opening Case".into(),
                description: String::new(),
                price: 0,
                coffees: vec![Coffee {
                    id: "c1".into(),
                    name: String::new(),
                    region: "huila".into(),
                    variety: "caturra".into(),
                    process: "washed".into(),
                    roast_level: String::new(),
                    tasting_notes: "chocolate".into(),
                    farm: String::new(),
                    altitude: 0,
                }],
                enabled_questions: EnabledQuestions {
                    region: true,
                    variety: true,
                    ..Default::default()
                },
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        store
            .put_order(Order {
                id: Uuid::new_v4().to_string(),
                code: "TEST01".into(),
                user_id: "player".into(),
                case_id: "case-1".into(),
                customer_name: String::new(),
                contact_info: String::new(),
                status: OrderStatus::Delivered,
                total_amount: 0,
                is_submission_used: false,
                submission_used_by: None,
                submission_used_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        Arc::new(AppState::new(AppConfig::test_default(), Arc::new(store)))
    }

    fn bearer(state: &AppState, user_id: &str) -> String {
        let token = state
            .jwt
            .issue(user_id, "p1@example.com", "Player One")
            .unwrap();
        format!("Bearer {token}")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_router(seeded_state().await);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn submissions_require_a_token() {
        let app = build_router(seeded_state().await);
        let response = app
            .oneshot(
                Request::post("/api/v1/submissions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"order_code":"TEST01"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submit_flow_grades_then_burns_the_code() {
        let state = seeded_state().await;
        let app = build_router(state.clone());
        let payload = json!({
            "order_code": "TEST01",
            "answers": [{
                "coffee_id": "c1",
                "region": "Huila",
                "variety": "bourbon",
                "process": "",
                "taste_note1": "",
                "taste_note2": ""
            }],
            "favorite_coffee": "",
            "brewing_method": ""
        })
        .to_string();

        let request = |body: String, auth: String| {
            Request::post("/api/v1/submissions")
                .header("content-type", "application/json")
                .header("authorization", auth)
                .body(Body::from(body))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(request(payload.clone(), bearer(&state, "player")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        // 1 of 2 enabled questions correct: accuracy 0.5, score 50, no bonus.
        assert_eq!(body["score"], 50);
        assert_eq!(body["accuracy"], 0.5);

        let replay = app
            .oneshot(request(payload, bearer(&state, "player")))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_reject_regular_users() {
        let state = seeded_state().await;
        let app = build_router(state.clone());
        let response = app
            .oneshot(
                Request::get("/api/v1/admin/users")
                    .header("authorization", bearer(&state, "player"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_target_user_is_not_found_for_admins() {
        let state = seeded_state().await;
        let app = build_router(state.clone());
        let response = app
            .oneshot(
                Request::get("/api/v1/users/ghost")
                    .header("authorization", bearer(&state, "chief"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // The admin's credentials are fine; only the looked-up account is gone.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leaderboard_is_public_and_ranked() {
        let state = seeded_state().await;
        let mut winner = state.store.get_user("player").await.unwrap().unwrap();
        winner.points = 150;
        winner.cases_count = 1;
        state.store.put_user(winner).await.unwrap();

        let app = build_router(state);
        let response = app
            .oneshot(Request::get("/api/v1/leaderboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_users"], 1);
        assert_eq!(body["leaderboard"][0]["rank"], 1);
    }
}
