//! Submission endpoints: grade-and-record, and a user's own history.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::logic;
use crate::protocol::{PageQuery, SubmissionListOut, SubmissionSummary, SubmitIn, SubmitOut};
use crate::state::AppState;
use crate::store::Page;

#[instrument(level = "info", skip(state, auth, input), fields(user = %auth.user_id))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(input): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
    let out = logic::submit_case(&state, &auth.user_id, input).await?;
    Ok(Json(out))
}

#[instrument(level = "info", skip(state, auth), fields(user = %auth.user_id))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<SubmissionListOut>, ApiError> {
    let page = Page::clamped(q.limit, q.offset, 10, 50);
    let submissions = state.store.submissions_for_user(&auth.user_id, page).await?;

    // Resolve each case name once, not per row.
    let mut case_names: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(submissions.len());
    for s in submissions {
        let case_name = if s.case_id.is_empty() {
            String::new()
        } else if let Some(name) = case_names.get(&s.case_id) {
            name.clone()
        } else {
            let name = state
                .store
                .get_case(&s.case_id)
                .await?
                .map(|c| c.name)
                .unwrap_or_default();
            case_names.insert(s.case_id.clone(), name.clone());
            name
        };
        rows.push(SubmissionSummary {
            id: s.id,
            case_id: s.case_id,
            case_name,
            score: s.score,
            accuracy: s.accuracy,
            submitted_at: s.submitted_at,
            status: "completed",
        });
    }

    Ok(Json(SubmissionListOut {
        count: rows.len(),
        submissions: rows,
        limit: page.limit,
        offset: page.offset,
    }))
}
