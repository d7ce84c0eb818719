//! Shared application state handed to every axum handler.
//!
//! Everything lives behind `Arc`, so cloning the state per request is cheap
//! and handlers reach the registry and graph store in-process.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::info;

use crate::{
    collaborators::{LlmClient, PlainTextExtractor},
    config::Config,
    service::ConceptService,
    uploads::UploadPolicy,
};

/// Lock-free request counters used for log correlation.
#[derive(Default)]
pub struct AtomicCounters {
    pub total_requests: AtomicUsize,
    pub uploads: AtomicUsize,
}

impl AtomicCounters {
    pub fn inc_total_requests(&self) -> usize {
        self.total_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn inc_uploads(&self) -> usize {
        self.uploads.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConceptService>,
    pub config: Arc<Config>,
    pub counters: Arc<AtomicCounters>,
}

impl AppState {
    pub fn new(config: Config, service: ConceptService) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            counters: Arc::new(AtomicCounters::default()),
        }
    }

    /// Wire the production collaborators: the LLM client and the plain-text extractor.
    pub fn from_config(config: Config) -> Self {
        info!("Initializing shared application state");
        let llm = Arc::new(LlmClient::from_config(&config));
        let service = ConceptService::new(
            llm.clone(),
            llm,
            Arc::new(PlainTextExtractor),
            UploadPolicy::from_config(&config),
        );
        Self::new(config, service)
    }
}
