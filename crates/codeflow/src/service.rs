//! Concept service
//!
//! Transport-agnostic operations behind the HTTP API. Owns the registry and
//! graph store and drives the collaborators. The only suspension points are
//! the collaborator calls; registry and graph writes happen afterwards, in
//! one short critical section each, and only once a document's full concept
//! list is available.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::collaborators::{ConceptExtractor, Exercise, ExerciseGenerator, TextExtractor};
use crate::errors::{ExtractionError, RegistryError, UploadError};
use crate::graph::{build_cooccurrence, CooccurrenceGraph, GraphStore};
use crate::metrics;
use crate::progress::{progress, ProgressSummary};
use crate::registry::{ConceptRecord, ConceptRegistry};
use crate::session::SessionKey;
use crate::uploads::UploadPolicy;

/// Successful upload: extracted concepts and the document's graph.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadReport {
    pub filename: String,
    pub concepts: Vec<String>,
    pub concept_links: CooccurrenceGraph,
}

/// Upload stored on disk but not processed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PartialUpload {
    pub filename: String,
    pub error: String,
    pub partial: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum UploadOutcome {
    Processed(UploadReport),
    Partial(PartialUpload),
}

impl UploadOutcome {
    fn partial(filename: String, error: &ExtractionError) -> Self {
        Self::Partial(PartialUpload {
            filename,
            error: error.to_string(),
            partial: true,
        })
    }
}

pub struct ConceptService {
    registry: Arc<ConceptRegistry>,
    graphs: Arc<GraphStore>,
    extractor: Arc<dyn ConceptExtractor>,
    exercises: Arc<dyn ExerciseGenerator>,
    text: Arc<dyn TextExtractor>,
    policy: UploadPolicy,
}

impl ConceptService {
    pub fn new(
        extractor: Arc<dyn ConceptExtractor>,
        exercises: Arc<dyn ExerciseGenerator>,
        text: Arc<dyn TextExtractor>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            registry: Arc::new(ConceptRegistry::new()),
            graphs: Arc::new(GraphStore::new()),
            extractor,
            exercises,
            text,
            policy,
        }
    }

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate, store, extract, ingest and graph one uploaded document.
    pub async fn upload(
        &self,
        session: &SessionKey,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadOutcome, UploadError> {
        let filename = self.policy.validate(filename, content_type, bytes.len())?;
        self.policy.store(&filename, bytes).await?;
        info!("Received '{}' ({} bytes) for session {}", filename, bytes.len(), session);

        let text = match self.text.extract_text(&filename, bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read '{}': {}", filename, e);
                metrics::inc_extraction_failure();
                return Ok(UploadOutcome::partial(filename, &e));
            }
        };

        let extracted = if text.trim().is_empty() {
            Vec::new()
        } else {
            match self.extractor.extract(&text).await {
                Ok(concepts) => concepts,
                Err(e) => {
                    warn!("Concept extraction failed for '{}': {}", filename, e);
                    metrics::inc_extraction_failure();
                    return Ok(UploadOutcome::partial(filename, &e));
                }
            }
        };

        let mut seen = HashSet::new();
        let concepts: Vec<String> = extracted
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();

        let created = self.registry.ingest(session, &filename, &concepts);
        let graph = build_cooccurrence(&text, &concepts);
        let graph = self.graphs.insert(&filename, graph);

        metrics::inc_documents_ingested();
        metrics::set_active_sessions(self.registry.session_count());
        info!(
            "Processed '{}': {} concept(s), {} new, {} linked",
            filename,
            concepts.len(),
            created,
            graph.len()
        );

        Ok(UploadOutcome::Processed(UploadReport {
            filename,
            concepts,
            concept_links: (*graph).clone(),
        }))
    }

    pub fn mark_mastered(&self, session: &SessionKey, concept: &str) -> Result<(), RegistryError> {
        self.registry.mark_mastered(session, concept)
    }

    /// Generate an exercise and attach it to the session's record for `concept`.
    pub async fn generate_exercise(
        &self,
        session: &SessionKey,
        concept: &str,
    ) -> Result<Exercise, ExtractionError> {
        let exercise = self.exercises.generate_exercise(concept).await?;
        self.registry
            .attach_exercise(session, concept, &exercise.exercise, &exercise.hint);
        metrics::set_active_sessions(self.registry.session_count());
        Ok(exercise)
    }

    /// Stateless review of a submitted solution.
    pub async fn check_solution(
        &self,
        concept: &str,
        exercise: &str,
        solution: &str,
    ) -> Result<String, ExtractionError> {
        self.exercises.check_solution(concept, exercise, solution).await
    }

    pub fn progress(&self, session: &SessionKey) -> ProgressSummary {
        progress(&self.registry, session)
    }

    pub fn concepts(&self, session: &SessionKey) -> Vec<ConceptRecord> {
        self.registry.snapshot(session)
    }

    pub fn graph(&self, filename: &str) -> Option<Arc<CooccurrenceGraph>> {
        self.graphs.get(filename)
    }
}
