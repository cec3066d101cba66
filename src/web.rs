//! Axum-based HTTP surface: status, sensors and the `update_state` command

use crate::registry::AccountSummary;
use crate::sensor::{BinarySensor, SensorView};
use crate::service::ServiceHandle;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[cfg(feature = "openapi")]
use utoipa::OpenApi;
#[cfg(feature = "openapi")]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub sensors: Arc<Vec<Arc<BinarySensor>>>,
    pub service: ServiceHandle,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
pub(crate) async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/version", responses(
    (status = 200, description = "Build version")
)))]
pub(crate) async fn version() -> impl IntoResponse {
    Json(serde_json::json!({ "version": env!("APP_VERSION") }))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/accounts", responses(
    (status = 200, description = "Configured accounts as of the last refresh cycle")
)))]
pub(crate) async fn accounts(State(state): State<AppState>) -> impl IntoResponse {
    let summaries: Vec<AccountSummary> = state.service.accounts();
    Json(summaries)
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/sensors", responses(
    (status = 200, description = "Binary sensor states")
)))]
pub(crate) async fn sensors(State(state): State<AppState>) -> impl IntoResponse {
    let views: Vec<SensorView> = state.sensors.iter().map(|s| s.view()).collect();
    Json(views)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/update_state", responses(
    (status = 200, description = "All accounts refreshed; per-account outcome"),
    (status = 503, description = "Refresh service not running")
)))]
pub(crate) async fn update_state(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.update_state().await {
        Ok(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

#[cfg(feature = "openapi")]
#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
pub(crate) async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(health, version, accounts, sensors, update_state, get_config_schema),
    tags((name = "kia-uvo", description = "Kia UVO poller API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/accounts", get(accounts))
        .route("/api/sensors", get(sensors))
        .route(
            &format!("/api/{}", crate::bootstrap::SERVICE_UPDATE_STATE),
            post(update_state),
        );

    #[cfg(feature = "openapi")]
    let router = router
        .route("/api/config/schema", get(get_config_schema))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
