//! API module - HTTP handlers over the concept service

pub mod concept_api;
pub mod config_api;
pub mod error;
pub mod exercise_api;
pub mod progress_api;
pub mod upload_api;

pub use concept_api::{get_graph, list_concepts, mark_concept, MarkConceptRequest};
pub use config_api::public_config;
pub use error::ApiError;
pub use exercise_api::{check_solution, generate_exercise, ExerciseRequest, SolutionSubmission};
pub use progress_api::get_progress;
pub use upload_api::upload_document;
