//! Exercise generation and solution review via the LLM collaborator.
//!
//! Generation attaches the exercise to the session's registry; review is stateless.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::api::error::ApiError;
use crate::collaborators::Exercise;
use crate::errors::ValidationError;
use crate::session::SessionKey;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ExerciseRequest {
    #[validate(length(min = 1, max = 256))]
    pub concept: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SolutionSubmission {
    #[validate(length(min = 1, max = 256))]
    pub concept: String,
    #[validate(length(min = 1, max = 20000))]
    pub exercise: String,
    #[validate(length(min = 1, max = 20000))]
    pub solution: String,
}

fn require_concept(concept: &str) -> Result<(), ValidationError> {
    if concept.trim().is_empty() {
        return Err(ValidationError::invalid("Concept cannot be blank"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

/// POST /generate_exercise
pub async fn generate_exercise(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    Json(req): Json<ExerciseRequest>,
) -> Result<Json<Exercise>, ApiError> {
    req.validate().map_err(ValidationError::from)?;
    require_concept(&req.concept)?;

    match state.service.generate_exercise(&session, &req.concept).await {
        Ok(exercise) => {
            info!("Generated exercise for '{}' ({} chars)", req.concept, exercise.exercise.len());
            Ok(Json(exercise))
        }
        Err(e) => {
            warn!("Exercise generation failed for '{}': {}", req.concept, e);
            Err(e.into())
        }
    }
}

/// POST /check_solution
pub async fn check_solution(
    State(state): State<AppState>,
    Json(req): Json<SolutionSubmission>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    req.validate().map_err(ValidationError::from)?;
    require_concept(&req.concept)?;

    let feedback = state
        .service
        .check_solution(&req.concept, &req.exercise, &req.solution)
        .await
        .map_err(|e| {
            warn!("Solution review failed for '{}': {}", req.concept, e);
            ApiError::from(e)
        })?;
    Ok(Json(FeedbackResponse { feedback }))
}
