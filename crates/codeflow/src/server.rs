//! HTTP server startup and routing.
//!
//! All handlers share one `AppState`; concept state lives in-process, so the
//! only outbound network traffic is the LLM backend.

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::{
    api,
    config::Config,
    metrics,
    session::{self, SESSION_HEADER},
    shared_state::AppState,
};

/// Room for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::telemetry::init_tracing();
    metrics::init_metrics();
    cfg.print_config();

    let addr = cfg.api_addr()?;
    tokio::fs::create_dir_all(&cfg.upload_dir).await?;
    info!("Upload directory ready at {}", cfg.upload_dir.display());

    let state = AppState::from_config(cfg);
    let app = build_router(state);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/upload", post(api::upload_document))
        .route("/mark_concept", post(api::mark_concept))
        .route("/generate_exercise", post(api::generate_exercise))
        .route("/check_solution", post(api::check_solution))
        .route("/progress", get(api::get_progress))
        .route("/concepts", get(api::list_concepts))
        .route("/graphs/:filename", get(api::get_graph))
        .route("/public-config", get(api::public_config))
        .route("/healthz", get(|| async { "OK" }))
        .route("/metrics", get(metrics::get_metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(middleware::from_fn(session::session_layer))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            config.max_size_bytes() + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_seconds)))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping CORS origin {}: {}", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)])
        .allow_credentials(true)
}

async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let request_num = state.counters.inc_total_requests();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    debug!("Request #{} {} {}", request_num, req.method(), route);

    let response = next.run(req).await;
    metrics::inc_request(&route, response.status());
    response
}
