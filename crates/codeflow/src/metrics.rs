
use prometheus::{Encoder, TextEncoder, Registry, IntCounter, IntCounterVec, IntGauge};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;
use tracing::warn;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();
static DOCUMENTS_INGESTED: OnceLock<IntCounter> = OnceLock::new();
static EXTRACTION_FAILURES: OnceLock<IntCounter> = OnceLock::new();

pub fn init_metrics() {
    if let Ok(counter) = IntCounterVec::new(
        prometheus::opts!("requests_total", "Total requests per route"),
        &["route", "status"],
    ) {
        if REQ_COUNTER.set(counter.clone()).is_ok() {
            REGISTRY.register(Box::new(counter)).ok();
        }
    }

    if let Ok(gauge) = IntGauge::new("active_sessions", "Sessions holding concept state") {
        if ACTIVE_SESSIONS.set(gauge.clone()).is_ok() {
            REGISTRY.register(Box::new(gauge)).ok();
        }
    }

    if let Ok(counter) = IntCounter::new("documents_ingested_total", "Documents fully processed") {
        if DOCUMENTS_INGESTED.set(counter.clone()).is_ok() {
            REGISTRY.register(Box::new(counter)).ok();
        }
    }

    if let Ok(counter) = IntCounter::new(
        "extraction_failures_total",
        "Uploads kept but left unprocessed",
    ) {
        if EXTRACTION_FAILURES.set(counter.clone()).is_ok() {
            REGISTRY.register(Box::new(counter)).ok();
        }
    }
}

pub fn inc_request(route: &str, status: StatusCode) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status.as_str()]).inc();
    }
}

pub fn set_active_sessions(count: usize) {
    if let Some(gauge) = ACTIVE_SESSIONS.get() {
        gauge.set(count as i64);
    }
}

pub fn inc_documents_ingested() {
    if let Some(counter) = DOCUMENTS_INGESTED.get() {
        counter.inc();
    }
}

pub fn inc_extraction_failure() {
    if let Some(counter) = EXTRACTION_FAILURES.get() {
        counter.inc();
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
