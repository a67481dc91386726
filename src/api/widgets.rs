/// Widget CRUD and the dashboard preview, which shares the selection
/// engine with the public embed routes
use crate::{
    api::middleware::{can_access, require_auth},
    context::AppContext,
    db::models::{Widget, WidgetKind, WidgetStatus},
    error::{ApiError, ApiResult},
    widget::selection,
    widget::settings::WidgetSettings,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/spaces/:space_id/widgets",
            post(create_widget).get(list_widgets),
        )
        .route("/api/widgets/:widget_id/preview", get(preview_widget))
        .route(
            "/api/widgets/:widget_id",
            put(update_widget).delete(delete_widget),
        )
}

fn widget_json(widget: &Widget) -> serde_json::Value {
    json!({
        "id": widget.id,
        "name": widget.name,
        "type": widget.kind,
        "designTemplate": widget.design_template,
        "settings": widget.settings,
        "status": widget.status,
        "createdAt": widget.created_at,
        "updatedAt": widget.updated_at,
    })
}

/// Load a widget and enforce that the caller owns its parent space
async fn load_owned_widget(
    ctx: &AppContext,
    widget_id: &str,
    headers: &HeaderMap,
) -> ApiResult<Widget> {
    let user = require_auth(ctx, headers).await?;

    let widget = ctx
        .widgets
        .find_by_id(widget_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Widget not found".to_string()))?;

    let space = ctx
        .spaces
        .find_by_id(&widget.space_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Widget not found".to_string()))?;

    if !can_access(&user, &space.owner_id) {
        return Err(ApiError::Authorization("Access denied".to_string()));
    }

    Ok(widget)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateWidgetRequest {
    #[validate(length(
        min = 1,
        max = 60,
        message = "Widget name is required and must be 1-60 characters"
    ))]
    name: String,
    #[serde(rename = "type")]
    kind: WidgetKind,
    settings: serde_json::Value,
}

/// POST /api/spaces/:space_id/widgets
///
/// Settings are validated against the widget type before anything touches
/// the store; an invalid combination rejects the whole request.
async fn create_widget(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(space_id): Path<String>,
    Json(req): Json<CreateWidgetRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = require_auth(&ctx, &headers).await?;
    req.validate()?;

    let space = ctx
        .spaces
        .find_active_for_owner(&space_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

    let settings = WidgetSettings::parse(req.kind, req.settings)?;

    let widget = ctx
        .widgets
        .create(crate::store::widgets::NewWidget {
            space_id: space.id,
            name: req.name,
            settings,
            created_by: user.id,
            metadata: json!({}),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "widget": widget_json(&widget) })),
    ))
}

/// GET /api/spaces/:space_id/widgets
async fn list_widgets(
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

    let widgets = ctx.widgets.list_for_space(&space.id).await?;

    Ok(Json(json!({
        "widgets": widgets.iter().map(widget_json).collect::<Vec<_>>(),
    })))
}

/// GET /api/widgets/:widget_id/preview - the same selection the embed
/// routes perform, returned as JSON for the dashboard
async fn preview_widget(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(widget_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let widget = load_owned_widget(&ctx, &widget_id, &headers).await?;

    let approved = ctx
        .testimonials
        .list_approved_for_space(&widget.space_id)
        .await?;

    let selected = match &widget.settings {
        WidgetSettings::Wall(settings) => selection::select_wall(settings, approved),
        WidgetSettings::Single(settings) => selection::select_single(settings, approved)
            .into_iter()
            .collect(),
    };

    let testimonials: Vec<serde_json::Value> = selected
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "type": t.kind,
                "authorName": t.author_name,
                "content": t.content,
                "rating": t.rating,
                "mediaUrl": t.media_url,
                "thumbnailUrl": t.thumbnail_url,
                "questionResponses": t.question_responses,
                "submittedAt": t.submitted_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "widget": {
            "id": widget.id,
            "name": widget.name,
            "type": widget.kind,
            "designTemplate": widget.design_template,
            "settings": widget.settings,
        },
        "testimonials": testimonials,
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateWidgetRequest {
    #[validate(length(min = 1, max = 60, message = "Widget name must be 1-60 characters"))]
    name: Option<String>,
    settings: Option<serde_json::Value>,
    status: Option<WidgetStatus>,
}

/// PUT /api/widgets/:widget_id
async fn update_widget(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(widget_id): Path<String>,
    Json(req): Json<UpdateWidgetRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let widget = load_owned_widget(&ctx, &widget_id, &headers).await?;

    let settings = match req.settings {
        Some(raw) => Some(WidgetSettings::parse(widget.kind, raw)?),
        None => None,
    };

    let widget = ctx
        .widgets
        .update(
            &widget.id,
            crate::store::widgets::WidgetUpdate {
                name: req.name,
                settings,
                status: req.status,
            },
        )
        .await?;

    Ok(Json(json!({ "widget": widget_json(&widget) })))
}

/// DELETE /api/widgets/:widget_id - hard delete
async fn delete_widget(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(widget_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let widget = load_owned_widget(&ctx, &widget_id, &headers).await?;

    ctx.widgets.delete(&widget.id).await?;

    Ok(Json(json!({ "message": "Widget deleted successfully" })))
}
