use axum::{extract::State, Json};

use crate::shared_state::AppState;
use crate::uploads::PublicConfig;

/// GET /public-config: upload limits the frontend validates against.
pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(state.service.policy().public_config())
}
