//! Concept registry endpoints: mastery, listing and per-file graphs.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::api::error::ApiError;
use crate::errors::ValidationError;
use crate::graph::CooccurrenceGraph;
use crate::registry::ConceptRecord;
use crate::session::SessionKey;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct MarkConceptRequest {
    #[validate(length(min = 1, max = 256))]
    pub concept: String,
}

#[derive(Debug, Serialize)]
pub struct ConceptsResponse {
    pub concepts: Vec<ConceptRecord>,
}

/// POST /mark_concept
///
/// Unknown sessions and concepts are soft errors: 200 with an `error` field.
pub async fn mark_concept(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    Json(req): Json<MarkConceptRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate().map_err(ValidationError::from)?;
    if req.concept.trim().is_empty() {
        return Err(ValidationError::invalid("Concept cannot be blank").into());
    }

    let body = match state.service.mark_mastered(&session, &req.concept) {
        Ok(()) => {
            info!("Session {} mastered '{}'", session, req.concept);
            json!({ "message": format!("Concept '{}' marked as mastered.", req.concept) })
        }
        Err(e) => json!({ "error": e.to_string() }),
    };
    Ok(Json(body))
}

/// GET /concepts
pub async fn list_concepts(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Json<ConceptsResponse> {
    Json(ConceptsResponse {
        concepts: state.service.concepts(&session),
    })
}

/// GET /graphs/:filename
pub async fn get_graph(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<CooccurrenceGraph>, ApiError> {
    state
        .service
        .graph(&filename)
        .map(|graph| Json((*graph).clone()))
        .ok_or_else(|| ApiError::not_found(format!("No graph for '{}'", filename)))
}
