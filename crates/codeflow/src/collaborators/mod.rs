//! Collaborator boundaries
//!
//! The registry and graph builder never talk to the outside world directly;
//! everything that may block or fail (the LLM, document decoding) sits behind
//! these traits so handlers and tests can swap implementations.

pub mod llm_client;
pub mod text_extractor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ExtractionError;

pub use llm_client::LlmClient;
pub use text_extractor::PlainTextExtractor;

/// Turns raw document text into a flat list of concept names.
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError>;
}

/// A generated practice exercise for one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub exercise: String,
    #[serde(default)]
    pub hint: String,
}

/// Generates exercises and reviews submitted solutions.
#[async_trait]
pub trait ExerciseGenerator: Send + Sync {
    async fn generate_exercise(&self, concept: &str) -> Result<Exercise, ExtractionError>;

    async fn check_solution(
        &self,
        concept: &str,
        exercise: &str,
        solution: &str,
    ) -> Result<String, ExtractionError>;
}

/// Recovers plain text from an uploaded file.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Parse a comma-separated concept response. Entries are trimmed, blanks
/// dropped, order and duplicates kept.
pub fn parse_concept_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
