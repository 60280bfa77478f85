//! Local recommendation endpoint stub.
//!
//! Development stand-in for the real backend: answers every analysis
//! request with the documented fallback policy (twice the larger measured
//! width) so the panel pipeline can be exercised end to end without
//! network access to production.

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use riaa_panel::recommend::{RecommendationRequest, RecommendationResponse};
use riaa_panel::widths::{universal_fallback, MeasuredWidths};

/// Build the stub router.
pub(crate) fn create_router() -> Router {
    Router::new()
        .route("/v1/image-recommendations", post(recommend))
        .route("/health", get(health))
        // The panel calls from a different browsing context.
        .layer(CorsLayer::permissive())
}

/// Serve the stub until the process is stopped.
pub(crate) async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "recommendation stub listening");
    axum::serve(listener, create_router()).await?;
    Ok(())
}

async fn recommend(Json(request): Json<RecommendationRequest>) -> Json<RecommendationResponse> {
    let widths = MeasuredWidths {
        desktop: request.widths.desktop,
        mobile: request.widths.mobile,
    };
    info!(
        element = request.element.label.as_deref().unwrap_or("unnamed"),
        desktop = widths.desktop,
        mobile = widths.mobile,
        "stub recommendation requested"
    );
    Json(RecommendationResponse {
        universal_upload_size: Some(universal_fallback(&widths)),
        desktop_render_size: Some(widths.desktop),
        mobile_render_size: Some(widths.mobile),
        explanation: Some(
            "Stub recommendation: twice the larger rendered width.".to_string(),
        ),
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
