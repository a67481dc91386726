/// Dashboard space CRUD
use crate::{
    api::middleware::require_auth,
    context::AppContext,
    db::models::{CollectionType, ExtraField, Space, TestimonialKind, Theme},
    error::{ApiError, ApiResult},
    store::spaces::{NewSpace, SpaceUpdate},
    store::testimonials::InboxFilter,
};
use axum::{
    extract::{Path, Query, State},
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
        .route("/api/spaces", post(create_space).get(list_spaces))
        .route(
            "/api/spaces/:space_id",
            get(get_space).put(update_space).delete(delete_space),
        )
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(validation_error(
            "hex_color",
            "Button color must be a valid hex color",
        ))
    }
}

fn validate_questions(questions: &Vec<String>) -> Result<(), ValidationError> {
    if questions.is_empty() || questions.iter().any(|q| q.trim().is_empty()) {
        return Err(validation_error(
            "question_list",
            "At least one non-empty question is required",
        ));
    }
    if questions.iter().any(|q| q.len() > 100) {
        return Err(validation_error(
            "question_list",
            "Each question must be 1-100 characters",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateSpaceRequest {
    #[validate(length(min = 3, max = 60, message = "Name must be 3-60 characters"))]
    name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    description: Option<String>,
    #[validate(url(message = "Invalid logo URL"))]
    logo: Option<String>,
    #[validate(length(max = 80, message = "Header title cannot exceed 80 characters"))]
    header_title: Option<String>,
    #[validate(length(max = 300, message = "Header message cannot exceed 300 characters"))]
    header_message: Option<String>,
    #[validate(custom(function = "validate_questions"))]
    question_list: Vec<String>,
    #[serde(default)]
    collect_extras: Vec<ExtraField>,
    collection_type: Option<CollectionType>,
    theme: Option<Theme>,
    #[validate(custom(function = "validate_hex_color"))]
    button_color: Option<String>,
    #[validate(length(min = 2, max = 2, message = "Language must be 2 characters"))]
    language: Option<String>,
    auto_translate: Option<bool>,
    template_id: Option<String>,
    expiry_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Max uses must be a positive integer"))]
    max_uses: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateSpaceRequest {
    #[validate(length(min = 2, max = 80, message = "Name must be 2-80 characters"))]
    name: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    description: Option<String>,
    expiry_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Max uses must be a positive integer"))]
    max_uses: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn space_stats(ctx: &AppContext, space: &Space) -> ApiResult<serde_json::Value> {
    let videos = ctx
        .testimonials
        .count_for_space_kind(&space.id, TestimonialKind::Video)
        .await?;
    let testimonials = ctx
        .testimonials
        .count_for_space(&space.id, InboxFilter::All)
        .await?;
    let active_share_links = ctx.links.count_active_for_owner(&space.owner_id).await?;

    Ok(json!({
        "videos": videos,
        "testimonials": testimonials,
        "activeShareLinks": active_share_links,
    }))
}

/// POST /api/spaces - create a space
async fn create_space(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<CreateSpaceRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    // Referenced templates must be readable by the caller
    if let Some(template_id) = &req.template_id {
        ctx.templates
            .find_accessible(template_id, &user.id)
            .await?
            .ok_or_else(|| {
                ApiError::Validation("Template not found or not accessible".to_string())
            })?;
    }

    let space = ctx
        .spaces
        .create(NewSpace {
            owner_id: user.id,
            name: req.name,
            description: req.description,
            logo: req.logo,
            header_title: req.header_title,
            header_message: req.header_message,
            question_list: req
                .question_list
                .into_iter()
                .map(|q| q.trim().to_string())
                .collect(),
            collect_extras: req.collect_extras,
            collection_type: req.collection_type.unwrap_or_default(),
            theme: req.theme.unwrap_or_default(),
            button_color: req.button_color.unwrap_or_else(|| "#00A676".to_string()),
            language: req.language.unwrap_or_else(|| "en".to_string()),
            auto_translate: req.auto_translate.unwrap_or(false),
            template_id: req.template_id,
            expiry_date: req.expiry_date,
            max_uses: req.max_uses,
        })
        .await?;

    let public_link = format!("{}/t/{}", ctx.config.service.frontend_url, space.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Space created successfully",
            "space": {
                "id": space.id,
                "name": space.name,
                "description": space.description,
                "logo": space.logo,
                "headerTitle": space.header_title,
                "headerMessage": space.header_message,
                "questionList": space.question_list,
                "collectExtras": space.collect_extras,
                "collectionType": space.collection_type,
                "theme": space.theme,
                "buttonColor": space.button_color,
                "language": space.language,
                "autoTranslate": space.auto_translate,
                "createdAt": space.created_at,
                "stats": { "videos": 0, "testimonials": 0, "activeShareLinks": 0 },
                "templateId": space.template_id,
                "expiryDate": space.expiry_date,
                "maxUses": space.max_uses,
                "publicLink": public_link,
            }
        })),
    ))
}

/// GET /api/spaces - the caller's active spaces
async fn list_spaces(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(10).clamp(1, 100);

    let spaces = ctx.spaces.list_for_owner(&user.id, page, limit).await?;
    let total = ctx.spaces.count_for_owner(&user.id).await?;

    let mut summaries = Vec::with_capacity(spaces.len());
    for space in &spaces {
        let stats = space_stats(&ctx, space).await?;
        summaries.push(json!({
            "id": space.id,
            "name": space.name,
            "description": space.description,
            "createdAt": space.created_at,
            "stats": stats,
            "templateId": space.template_id,
            "expiryDate": space.expiry_date,
            "maxUses": space.max_uses,
        }));
    }

    Ok(Json(json!({
        "spaces": summaries,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    })))
}

/// GET /api/spaces/:space_id - space detail with credit readouts
async fn get_space(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let space = ctx
        .spaces
        .find_active_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let stats = space_stats(&ctx, &space).await?;
    let video_count = ctx
        .testimonials
        .count_for_space_kind(&space.id, TestimonialKind::Video)
        .await?;
    let text_count = ctx
        .testimonials
        .count_for_space_kind(&space.id, TestimonialKind::Text)
        .await?;

    Ok(Json(json!({
        "space": {
            "id": space.id,
            "name": space.name,
            "description": space.description,
            "logo": space.logo,
            "headerTitle": space.header_title,
            "headerMessage": space.header_message,
            "questionList": space.question_list,
            "collectExtras": space.collect_extras,
            "collectionType": space.collection_type,
            "theme": space.theme,
            "buttonColor": space.button_color,
            "language": space.language,
            "autoTranslate": space.auto_translate,
            "createdAt": space.created_at,
            "updatedAt": space.updated_at,
            "stats": stats,
        },
        "credits": {
            "videoCredits": (10 - video_count).max(0),
            "textCredits": (100 - text_count).max(0),
        }
    })))
}

/// PUT /api/spaces/:space_id - partial update
async fn update_space(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
    Json(req): Json<UpdateSpaceRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    let space = ctx
        .spaces
        .update(
            &space_id,
            &user.id,
            SpaceUpdate {
                name: req.name,
                description: req.description,
                expiry_date: req.expiry_date,
                max_uses: req.max_uses,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "Space updated successfully",
        "space": {
            "id": space.id,
            "name": space.name,
            "description": space.description,
            "createdAt": space.created_at,
            "templateId": space.template_id,
            "expiryDate": space.expiry_date,
            "maxUses": space.max_uses,
        }
    })))
}

/// DELETE /api/spaces/:space_id - soft delete
async fn delete_space(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    ctx.spaces.soft_delete(&space_id, &user.id).await?;

    Ok(Json(json!({ "message": "Space deleted successfully" })))
}
