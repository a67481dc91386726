/// Testimonial routes: the space-scoped moderation inbox plus the legacy
/// link-sourced submission surface
use crate::{
    api::middleware::{optional_auth, require_auth},
    context::AppContext,
    db::models::{CollectedVia, Testimonial, TestimonialKind, UserRole},
    error::{ApiError, ApiResult},
    metrics,
    moderation::{ModerationAction, TestimonialStatus},
    store::testimonials::{InboxFilter, NewTestimonial},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/spaces/:space_id/testimonials",
            post(create_testimonial).get(list_testimonials),
        )
        .route(
            "/api/spaces/:space_id/testimonials/bulk",
            post(bulk_action),
        )
        .route(
            "/api/spaces/:space_id/testimonials/:testimonial_id/actions",
            post(apply_action),
        )
        .route(
            "/api/testimonials",
            post(submit_linked_testimonial).get(list_public),
        )
        .route("/api/testimonials/:testimonial_id", get(get_public))
}

fn dashboard_json(t: &Testimonial) -> serde_json::Value {
    json!({
        "id": t.id,
        "type": t.kind,
        "authorName": t.author_name,
        "authorEmail": t.author_email,
        "content": t.content,
        "rating": t.rating,
        "mediaUrl": t.media_url,
        "thumbnailUrl": t.thumbnail_url,
        "collectedVia": t.collected_via,
        "status": t.status,
        "questionResponses": t.question_responses,
        "submittedAt": t.submitted_at,
        "approvedAt": t.approved_at,
    })
}

/// Public shape: no submitter email, no metadata
fn public_json(t: &Testimonial) -> serde_json::Value {
    json!({
        "id": t.id,
        "type": t.kind,
        "authorName": t.author_name,
        "content": t.content,
        "rating": t.rating,
        "mediaUrl": t.media_url,
        "thumbnailUrl": t.thumbnail_url,
        "questionResponses": t.question_responses,
        "status": t.status,
        "submittedAt": t.submitted_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTestimonialRequest {
    #[serde(rename = "type")]
    kind: TestimonialKind,
    #[validate(length(max = 100, message = "Author name too long"))]
    author_name: Option<String>,
    #[validate(email(message = "Invalid email"))]
    author_email: Option<String>,
    #[validate(length(max = 2000, message = "Content too long"))]
    content: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be 1-5"))]
    rating: Option<i64>,
    #[validate(url(message = "Invalid media URL format"))]
    media_url: Option<String>,
    #[validate(url(message = "Invalid thumbnail URL format"))]
    thumbnail_url: Option<String>,
    collected_via: Option<CollectedVia>,
}

/// POST /api/spaces/:space_id/testimonials - authenticated create
async fn create_testimonial(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
    Json(req): Json<CreateTestimonialRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    let space = ctx
        .spaces
        .find_active_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let testimonial = ctx
        .testimonials
        .create(NewTestimonial {
            space_id: Some(space.id),
            kind: req.kind,
            author_name: req.author_name,
            author_email: req.author_email.map(|e| e.to_lowercase()),
            content: req.content,
            media_url: req.media_url,
            thumbnail_url: req.thumbnail_url,
            rating: req.rating,
            collected_via: req.collected_via.unwrap_or(CollectedVia::Import),
            created_by: Some(user.id),
            ..Default::default()
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "testimonial": dashboard_json(&testimonial) })),
    ))
}

#[derive(Debug, Deserialize)]
struct InboxQuery {
    filter: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /api/spaces/:space_id/testimonials - moderation inbox listing
async fn list_testimonials(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
    Query(query): Query<InboxQuery>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let space = ctx
        .spaces
        .find_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let filter = query
        .filter
        .as_deref()
        .map(InboxFilter::from_str)
        .unwrap_or_default();
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let testimonials = ctx
        .testimonials
        .list_for_space(&space.id, filter, page, limit)
        .await?;
    let total = ctx.testimonials.count_for_space(&space.id, filter).await?;

    Ok(Json(json!({
        "testimonials": testimonials.iter().map(dashboard_json).collect::<Vec<_>>(),
        "total": total,
        "page": page,
        "limit": limit,
    })))
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    action: ModerationAction,
}

/// POST /api/spaces/:space_id/testimonials/:testimonial_id/actions
async fn apply_action(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((space_id, testimonial_id)): Path<(String, String)>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let space = ctx
        .spaces
        .find_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let testimonial = ctx
        .testimonials
        .apply_action(&space.id, &testimonial_id, req.action)
        .await?;

    metrics::record_moderation_action(req.action.as_str());

    Ok(Json(json!({
        "message": format!("Testimonial {}d successfully", req.action.as_str()),
        "testimonial": {
            "id": testimonial.id,
            "status": testimonial.status,
        }
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkActionRequest {
    testimonial_ids: Vec<String>,
    action: ModerationAction,
}

/// POST /api/spaces/:space_id/testimonials/bulk - same transition applied
/// per document; ineligible ids are excluded from the count, not errors
async fn bulk_action(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
    Json(req): Json<BulkActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let space = ctx
        .spaces
        .find_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let modified = ctx
        .testimonials
        .bulk_apply(&space.id, &req.testimonial_ids, req.action)
        .await?;

    metrics::record_moderation_action(req.action.as_str());

    Ok(Json(json!({
        "message": format!("{} testimonials {}d successfully", modified, req.action.as_str()),
        "modifiedCount": modified,
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct LinkedSubmissionRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Author name is required and must be 1-100 characters"
    ))]
    author_name: String,
    #[validate(length(min = 10, max = 2000, message = "Content must be 10-2000 characters"))]
    content: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be 1-5"))]
    rating: Option<i64>,
    #[validate(email(message = "Invalid email format"))]
    author_email: Option<String>,
    source_link: Option<String>,
}

/// POST /api/testimonials - legacy submission citing a request-link slug
async fn submit_linked_testimonial(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<LinkedSubmissionRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let user = optional_auth(&ctx, &headers).await?;

    // Validity is checked before the counter increments; see
    // RequestLink::is_valid for the accepted race at the max-uses boundary
    if let Some(slug) = &req.source_link {
        let link = ctx.links.find_by_slug(slug).await?;
        if !link.map_or(false, |l| l.is_valid()) {
            metrics::record_submission("legacy-link", "rejected");
            return Err(ApiError::Validation(
                "Invalid or expired testimonial link".to_string(),
            ));
        }
    }

    let is_admin = user.as_ref().map_or(false, |u| u.role == UserRole::Admin);
    let status = if is_admin {
        TestimonialStatus::Approved
    } else {
        TestimonialStatus::Pending
    };

    let kind = if req.source_link.is_some() {
        TestimonialKind::Linked
    } else {
        TestimonialKind::Text
    };

    let testimonial = ctx
        .testimonials
        .create(NewTestimonial {
            kind,
            author_name: Some(req.author_name),
            author_email: req.author_email.map(|e| e.to_lowercase()),
            content: Some(req.content),
            rating: req.rating,
            collected_via: CollectedVia::Link,
            status,
            created_by: user.map(|u| u.id),
            source_link: req.source_link.clone(),
            ..Default::default()
        })
        .await?;

    if let Some(slug) = &req.source_link {
        ctx.links.increment_uses(slug).await?;
    }

    metrics::record_submission("legacy-link", "accepted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Testimonial submitted successfully",
            "testimonial": {
                "id": testimonial.id,
                "authorName": testimonial.author_name,
                "content": testimonial.content,
                "rating": testimonial.rating,
                "status": testimonial.status,
                "submittedAt": testimonial.submitted_at,
            }
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct PublicListQuery {
    status: Option<String>,
    rating: Option<i64>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /api/testimonials - approved-only for the public; admins may filter
/// by status
async fn list_public(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<PublicListQuery>,
) -> ApiResult<impl IntoResponse> {
    let user = optional_auth(&ctx, &headers).await?;
    let is_admin = user.map_or(false, |u| u.role == UserRole::Admin);

    let status = match (&query.status, is_admin) {
        (Some(status), true) => TestimonialStatus::from_str(status)?,
        _ => TestimonialStatus::Approved,
    };

    if let Some(rating) = query.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(
                "Rating filter must be 1-5".to_string(),
            ));
        }
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let testimonials = ctx
        .testimonials
        .list_by_status(status, query.rating, page, limit)
        .await?;
    let total = ctx.testimonials.count_by_status(status, query.rating).await?;

    Ok(Json(json!({
        "testimonials": testimonials.iter().map(public_json).collect::<Vec<_>>(),
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    })))
}

/// GET /api/testimonials/:testimonial_id - approved-only unless admin
async fn get_public(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(testimonial_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = optional_auth(&ctx, &headers).await?;
    let is_admin = user.map_or(false, |u| u.role == UserRole::Admin);

    let testimonial = ctx
        .testimonials
        .find_by_id(&testimonial_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Testimonial not found".to_string()))?;

    if !is_admin && testimonial.status != TestimonialStatus::Approved {
        // Indistinguishable from a missing id
        return Err(ApiError::NotFound("Testimonial not found".to_string()));
    }

    Ok(Json(json!({ "testimonial": public_json(&testimonial) })))
}
