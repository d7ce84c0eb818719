use axum::{extract::State, Extension, Json};

use crate::progress::ProgressSummary;
use crate::session::SessionKey;
use crate::shared_state::AppState;

/// GET /progress
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Json<ProgressSummary> {
    Json(state.service.progress(&session))
}
