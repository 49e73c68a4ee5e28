use crate::http::{
    analytics_handler, dashboard_handler, get_settings_handler, report_handler,
    update_settings_handler, CorsConfig, DeskApiServices,
};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// JSON API routes only
pub fn api_router(services: DeskApiServices) -> Router {
    Router::new()
        .route("/api/report", post(report_handler))
        .route("/api/dashboard-data", get(dashboard_handler))
        .route("/api/analytics-data", get(analytics_handler))
        .route(
            "/api/settings",
            get(get_settings_handler).post(update_settings_handler),
        )
        .with_state(services)
}

/// Full application: API, the three pages and any other file under `public_dir`
pub fn build_router(services: DeskApiServices, public_dir: &Path, cors: &CorsConfig) -> Router {
    api_router(services)
        .route_service("/", ServeFile::new(public_dir.join("dashboard.html")))
        .route_service("/analytics", ServeFile::new(public_dir.join("analytics.html")))
        .route_service("/settings", ServeFile::new(public_dir.join("settings.html")))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors.to_layer())
        .layer(TraceLayer::new_for_http())
}
