//! Axum router configuration with middleware.
//!
//! Middleware: permissive CORS and request tracing. When `server.web_dir`
//! exists on disk, the built front-end is served from it; API routes and
//! `/health` take priority and unknown paths fall through to `index.html`.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use mailrag_core::store::EmailStore;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let web_dir = state.config.server.web_dir.clone();

    let mut router = Router::new()
        .route("/summarize", post(handlers::summarize::summarize))
        .route("/api/summarize", post(handlers::summarize::summarize))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| dir.exists()) {
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(web_dir.join("index.html")));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir.display(), "SPA static file serving enabled");
    }

    router
}

/// GET /health
///
/// Reports `degraded` when the store cannot be counted.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let body = match state.summarizer.store().count().await {
        Ok(stored_emails) => serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "stored_emails": stored_emails,
        }),
        Err(e) => serde_json::json!({
            "status": "degraded",
            "version": env!("CARGO_PKG_VERSION"),
            "error": e.to_string(),
        }),
    };
    axum::Json(body)
}
