/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{ApiError, ApiResult},
    rate_limit::rate_limit_middleware,
};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Embed routes opt out by setting their own framing header; everything
    // else is framed normally.
    let default_framing = SetResponseHeaderLayer::if_not_present(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .merge(crate::api::routes())
        .with_state(ctx.clone())
        .layer(middleware::from_fn_with_state(ctx, rate_limit_middleware))
        .layer(default_framing)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics handler
async fn metrics() -> String {
    crate::metrics::render_metrics()
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> ApiResult<()> {
    let addr = format!(
        "{}:{}",
        ctx.config.service.hostname, ctx.config.service.port
    );

    info!("Trustimonials listening on {}", addr);
    info!("   Public URL: {}", ctx.public_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // ConnectInfo gives the submission pipeline a client address to rate
    // limit on when no forwarding headers are present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
