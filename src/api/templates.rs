/// Template CRUD: reusable form configurations, shareable when public
use crate::{
    api::middleware::require_auth,
    context::AppContext,
    db::models::Template,
    error::{ApiError, ApiResult},
    store::templates::NewTemplate,
};
use axum::{
    extract::{Path, State},
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
        .route("/api/templates", post(create_template).get(list_templates))
        .route(
            "/api/templates/:template_id",
            get(get_template).delete(delete_template),
        )
}

fn template_json(template: &Template) -> serde_json::Value {
    json!({
        "id": template.id,
        "name": template.name,
        "formConfig": template.form_config,
        "emailSubject": template.email_subject,
        "emailBody": template.email_body,
        "isPublic": template.is_public,
        "createdAt": template.created_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTemplateRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Template name is required and must be 1-100 characters"
    ))]
    name: String,
    form_config: serde_json::Value,
    #[validate(length(max = 200, message = "Email subject cannot exceed 200 characters"))]
    email_subject: Option<String>,
    #[validate(length(max = 5000, message = "Email body cannot exceed 5000 characters"))]
    email_body: Option<String>,
    #[serde(default)]
    is_public: bool,
}

/// POST /api/templates
async fn create_template(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    let template = ctx
        .templates
        .create(NewTemplate {
            name: req.name,
            form_config: req.form_config,
            email_subject: req.email_subject,
            email_body: req.email_body,
            created_by: user.id,
            is_public: req.is_public,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Template created successfully",
            "template": template_json(&template),
        })),
    ))
}

/// GET /api/templates - the caller's templates plus public ones
async fn list_templates(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let templates = ctx.templates.list_visible(&user.id).await?;

    Ok(Json(json!({
        "templates": templates.iter().map(template_json).collect::<Vec<_>>(),
    })))
}

/// GET /api/templates/:template_id
async fn get_template(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(template_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    let template = ctx
        .templates
        .find_accessible(&template_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(Json(json!({ "template": template_json(&template) })))
}

/// DELETE /api/templates/:template_id - creator only
async fn delete_template(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(template_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;

    ctx.templates.delete(&template_id, &user.id).await?;

    Ok(Json(json!({ "message": "Template deleted successfully" })))
}
