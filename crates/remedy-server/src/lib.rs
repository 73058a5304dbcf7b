pub mod backends;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", post(routes::remediate::remediate))
        .route("/health", get(routes::health::health))
        .route("/api/remediate", post(routes::remediate::remediate))
        .route(
            "/api/actions/{action}",
            post(routes::remediate::remediate_action),
        )
        .route("/api/blocked", get(routes::remediate::list_blocked))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve on a pre-bound listener. Runs until the listener fails; callers
/// race it against their own shutdown signal.
///
/// Ledger timers persisted by a previous run are re-armed before the first
/// request is accepted.
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let recovered = app_state.orchestrator.ledger().recover().await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, recovered, "remediation service listening");

    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}
