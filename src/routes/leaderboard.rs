//! Leaderboard endpoints. Both views are public: the global points ranking
//! and the per-case ranking for the active case.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::instrument;

use crate::error::ApiError;
use crate::logic;
use crate::protocol::{CurrentCaseLeaderboardOut, LeaderboardOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn global(State(state): State<Arc<AppState>>) -> Result<Json<LeaderboardOut>, ApiError> {
    let leaderboard = logic::global_leaderboard(&state).await?;
    Ok(Json(LeaderboardOut {
        total_users: leaderboard.len(),
        leaderboard,
    }))
}

#[instrument(level = "info", skip(state))]
pub async fn current_case(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurrentCaseLeaderboardOut>, ApiError> {
    let (case_id, case_name, leaderboard) = logic::current_case_leaderboard(&state).await?;
    Ok(Json(CurrentCaseLeaderboardOut {
        total_users: leaderboard.len(),
        leaderboard,
        case_id,
        case_name,
    }))
}
