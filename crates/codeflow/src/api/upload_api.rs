//! Document upload endpoint.
//!
//! Flow: multipart `file` field -> validation -> stored on disk -> text ->
//! LLM concept extraction -> registry merge + co-occurrence graph.
//! Extraction failures still answer 200 with `partial: true`.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Extension, Json,
};
use tracing::{debug, info};

use crate::api::error::ApiError;
use crate::errors::ValidationError;
use crate::service::UploadOutcome;
use crate::session::SessionKey;
use crate::shared_state::AppState;

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// POST /upload
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    let upload_num = state.counters.inc_uploads();
    info!("Upload request #{} for session {}", upload_num, session);

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let outcome = state
            .service
            .upload(&session, &filename, content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(outcome));
    }

    Err(ValidationError::invalid("Missing 'file' field in multipart upload").into())
}
