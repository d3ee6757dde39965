use std::future::Future;
use std::io;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::error::expose_details;
use crate::handlers;
use crate::state::AppState;

/// Room for multipart framing on top of the largest accepted image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.engine.config().max_input_bytes * 4 / 3 + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/optimize", get(handlers::optimize_url).post(handlers::optimize_upload))
        .route("/pipeline", post(handlers::pipeline))
        .route("/stats", get(handlers::stats))
        .nest_service("/downloads", ServeDir::new(state.storage.root()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::map_response_with_state(state.clone(), expose_details))
                .layer(middleware::from_fn_with_state(state.clone(), require_api_key)),
        )
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
