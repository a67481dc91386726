/// Request link CRUD (legacy sharing mechanism)
use crate::{
    api::middleware::{can_access, require_auth},
    context::AppContext,
    db::models::RequestLink,
    error::{ApiError, ApiResult},
    store::links::{NewRequestLink, RequestLinkUpdate},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/links", post(create_link).get(list_links))
        .route(
            "/api/links/:link_id",
            get(get_link).put(update_link).delete(delete_link),
        )
}

fn validate_slug(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("slug");
        error.message = Some(
            "Slug can only contain lowercase letters, numbers, hyphens, and underscores".into(),
        );
        Err(error)
    }
}

fn link_json(ctx: &AppContext, link: &RequestLink) -> serde_json::Value {
    json!({
        "id": link.id,
        "slug": link.slug,
        "url": format!("{}/t/{}", ctx.config.service.frontend_url, link.slug),
        "templateId": link.template_id,
        "expiryDate": link.expiry_date,
        "maxUses": link.max_uses,
        "uses": link.uses,
        "isActive": link.is_active,
        "isValid": link.is_valid(),
        "createdAt": link.created_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateLinkRequest {
    #[validate(
        length(min = 3, max = 50, message = "Slug must be 3-50 characters"),
        custom(function = "validate_slug")
    )]
    slug: String,
    template_id: Option<String>,
    expiry_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Max uses must be a positive integer"))]
    max_uses: Option<i64>,
}

/// POST /api/links
async fn create_link(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<CreateLinkRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    if let Some(template_id) = &req.template_id {
        ctx.templates
            .find_accessible(template_id, &user.id)
            .await?
            .ok_or_else(|| {
                ApiError::Validation("Template not found or not accessible".to_string())
            })?;
    }

    let link = ctx
        .links
        .create(NewRequestLink {
            owner_id: user.id,
            slug: req.slug.to_lowercase(),
            template_id: req.template_id,
            expiry_date: req.expiry_date,
            max_uses: req.max_uses,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Request link created successfully",
            "link": link_json(&ctx, &link),
        })),
    ))
}

/// GET /api/links - the caller's links
async fn list_links(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let links = ctx.links.list_for_owner(&user.id).await?;

    Ok(Json(json!({
        "links": links.iter().map(|l| link_json(&ctx, l)).collect::<Vec<_>>(),
    })))
}

async fn load_owned_link(
    ctx: &AppContext,
    link_id: &str,
    headers: &HeaderMap,
) -> ApiResult<RequestLink> {
    let user = require_auth(ctx, headers).await?;

    let link = ctx
        .links
        .find_by_id(link_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Link not found".to_string()))?;

    if !can_access(&user, &link.owner_id) {
        return Err(ApiError::Authorization(
            "Not authorized to access this link".to_string(),
        ));
    }

    Ok(link)
}

/// GET /api/links/:link_id
async fn get_link(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let link = load_owned_link(&ctx, &link_id, &headers).await?;

    Ok(Json(json!({ "link": link_json(&ctx, &link) })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateLinkRequest {
    is_active: Option<bool>,
    expiry_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Max uses must be a positive integer"))]
    max_uses: Option<i64>,
}

/// PUT /api/links/:link_id
async fn update_link(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
    Json(req): Json<UpdateLinkRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let link = load_owned_link(&ctx, &link_id, &headers).await?;

    let link = ctx
        .links
        .update(
            &link.id,
            RequestLinkUpdate {
                is_active: req.is_active,
                expiry_date: req.expiry_date,
                max_uses: req.max_uses,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "Link updated successfully",
        "link": link_json(&ctx, &link),
    })))
}

/// DELETE /api/links/:link_id
async fn delete_link(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let link = load_owned_link(&ctx, &link_id, &headers).await?;

    ctx.links.delete(&link.id).await?;

    Ok(Json(json!({ "message": "Link deleted successfully" })))
}
