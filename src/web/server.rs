use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub fn router(state: AppState, cors_allow_any: bool) -> Router {
    let app = Router::new()
        // Settings store
        .route("/public-settings", get(api::get_public_settings))
        .route("/admin/settings", post(api::post_admin_settings))
        // Rank / tier lookups
        .route("/api/health", get(api::health_check))
        .route("/api/ranks", get(api::get_ranks))
        .route("/api/rank", get(api::get_rank))
        .route("/api/status", get(api::get_status))
        // Notification endpoints
        .route("/api/notifications", get(api::get_notifications))
        .route("/api/notifications/pending", get(api::get_pending_notifications))
        .route("/api/notifications/acknowledge", post(api::post_acknowledge_notification))
        .with_state(state);

    if cors_allow_any {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

pub async fn start_server(state: AppState, host: &str, port: u16, cors_allow_any: bool) -> anyhow::Result<()> {
    let app = router(state, cors_allow_any);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Settings server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
