// codeflow/crates/codeflow/src/lib.rs

pub mod api;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod graph;
pub mod metrics;
pub mod progress;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod shared_state;
pub mod telemetry;
pub mod uploads;
pub mod utils;

// Public API exports
pub use config::Config;
pub use graph::{build_cooccurrence, CooccurrenceGraph, GraphStore};
pub use progress::ProgressSummary;
pub use registry::{Complexity, ConceptRecord, ConceptRegistry};
pub use server::{build_router, run_server};
pub use service::{ConceptService, UploadOutcome};
pub use session::SessionKey;
pub use shared_state::AppState;

// Collaborator seams
pub use collaborators::{
    ConceptExtractor, Exercise, ExerciseGenerator, LlmClient, PlainTextExtractor, TextExtractor,
};
