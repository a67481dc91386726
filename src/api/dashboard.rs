/// Dashboard overview
use crate::{api::middleware::require_auth, context::AppContext, error::ApiResult};
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/dashboard/overview", get(overview))
}

/// GET /api/dashboard/overview - counts across the caller's resources
async fn overview(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let total_videos = ctx.testimonials.count_videos_by_creator(&user.id).await?;
    let total_spaces = ctx.spaces.count_for_owner(&user.id).await?;
    let total_testimonials = ctx.testimonials.count_by_creator(&user.id).await?;
    let active_share_links = ctx.links.count_active_for_owner(&user.id).await?;

    // Plan data comes from the billing system once one exists; the starter
    // plan is the only tier today
    let video_limit = 2;

    Ok(Json(json!({
        "overview": {
            "totalVideos": total_videos,
            "videoLimit": video_limit,
            "totalSpaces": total_spaces,
            "totalTestimonials": total_testimonials,
            "activeShareLinks": active_share_links,
            "planName": "Starter",
            "planFeatures": [
                "2 videos total",
                "basic widgets",
                "unlimited text testimonials",
                "custom branding"
            ],
            "videoUsagePercent": ((total_videos as f64 / video_limit as f64) * 100.0).round() as i64,
        }
    })))
}
