//! HydraDoc API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Startup: configuration, ontology validation, corpus indexing
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod shutdown;
mod state;

use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use hydradoc_common::{
    config::{AppConfig, ObservabilityConfig},
    embeddings::create_embedder,
    llm::create_generator,
    metrics,
    query::OntologyStore,
};
use hydradoc_context::QueryEngine;
use hydradoc_search::{BM25Retriever, HybridRetriever, PassageIndex, VectorRetriever};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env)
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting HydraDoc API Gateway v{}",
        hydradoc_common::VERSION
    );

    let config = Arc::new(config);

    // Initialize metrics
    init_metrics(&config.observability)?;

    // Ontology problems are fatal at startup
    let ontology = match &config.ontology.path {
        Some(path) => {
            info!(path = %path, "Loading ontology file");
            OntologyStore::from_json_file(path)
        }
        None => OntologyStore::builtin(),
    }
    .map_err(|e| {
        error!(error = %e, "Invalid ontology");
        e
    })?;
    let ontology = Arc::new(ontology);
    info!(
        hydraulic_concepts = ontology.hydraulic.len(),
        appliance_concepts = ontology.appliance.len(),
        rules = ontology.rules.len(),
        "Ontology loaded"
    );

    let embedder = create_embedder(&config.embedding)?;
    let generator = create_generator(&config.llm)?;

    // Build the passage index
    info!(path = %config.corpus.path, "Indexing corpus...");
    let index = Arc::new(
        PassageIndex::from_directory(
            &config.corpus.path,
            Some(embedder.clone()),
            config.embedding.batch_size,
        )
        .await?,
    );
    metrics::record_index_size(index.len());
    if index.is_empty() {
        warn!(path = %config.corpus.path, "Corpus is empty, every query will report no context");
    }

    let retriever = HybridRetriever::from_config(
        Arc::new(BM25Retriever::new(index.clone())),
        Arc::new(VectorRetriever::new(index.clone(), embedder)),
        &config.retrieval,
    );
    let engine = Arc::new(QueryEngine::from_config(
        &config,
        ontology.clone(),
        retriever,
        generator,
    ));

    // Create app state
    let state = AppState {
        config: config.clone(),
        engine,
        index,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // open connections get shutdown_timeout to drain once the signal arrives
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown::shutdown_signal().await;
            let _ = shutdown_tx.send(());
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = shutdown::drain_deadline(shutdown_rx, config.shutdown_timeout()) => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_secs,
                "Shutdown timed out, dropping open connections"
            );
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// JSON or plain log lines, filtered by `RUST_LOG` or the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Prometheus exporter on its own port, 0 disables it
fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    if config.metrics_port == 0 {
        info!("Prometheus metrics disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("query_duration_seconds".to_string()),
            metrics::QUERY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("generation_duration_seconds".to_string()),
            metrics::QUERY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("retrieval_duration_seconds".to_string()),
            metrics::RETRIEVAL_BUCKETS,
        )?
        .install()?;

    metrics::register_metrics();
    info!(port = config.metrics_port, "Prometheus metrics exporter listening");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limiter = middleware::rate_limit::RateLimit::from_config(&state.config.rate_limit);
    let request_timeout = state.config.request_timeout();
    let service = state.config.observability.service_name.clone();

    // API routes
    let mut api_routes = Router::new()
        .route("/query", post(handlers::query::query))
        .route("/expand", post(handlers::expand::expand))
        .route("/documents", get(handlers::documents::list_documents));

    if let Some(limiter) = limiter {
        api_routes = api_routes.layer(from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    // Compose the app
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(from_fn(middleware::track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(move |request: &Request| middleware::request_span(&service, request)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(middleware::request_timeout_layer(request_timeout)),
        )
        .with_state(state)
}
