/// Public embed routes
///
/// These endpoints serve iframe bodies to arbitrary third-party origins,
/// so every outcome - including every failure - is a rendered HTML page,
/// and framing is explicitly allowed from anywhere.
use crate::{
    context::AppContext,
    db::models::{Theme, Widget, WidgetKind},
    metrics,
    widget::settings::WidgetSettings,
    widget::{loader, render, selection},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/embed/wall/:widget_id", get(embed_wall))
        .route("/embed/single/:widget_id", get(embed_single))
        .route("/embed/config/:widget_file", get(embed_loader))
}

/// Build an embeddable HTML response
fn html_page(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/html"),
            (header::X_FRAME_OPTIONS, "ALLOWALL"),
        ],
        body,
    )
        .into_response()
}

fn not_found_page() -> Response {
    html_page(
        StatusCode::NOT_FOUND,
        render::render_message("Widget not found or not available"),
    )
}

fn error_page() -> Response {
    html_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        render::render_message("Error loading widget"),
    )
}

/// Resolve a widget for embedding. Missing, private, and wrong-type
/// widgets are deliberately indistinguishable so probing an id reveals
/// nothing.
async fn load_embeddable(
    ctx: &AppContext,
    widget_id: &str,
    kind: WidgetKind,
) -> Result<Widget, Response> {
    match ctx.widgets.find_by_id(widget_id).await {
        Ok(Some(widget)) if widget.kind == kind && widget.settings.is_public() => Ok(widget),
        Ok(_) => {
            metrics::record_embed_render(kind.as_str(), "not_found");
            Err(not_found_page())
        }
        Err(e) => {
            tracing::error!("Embed widget lookup failed: {}", e);
            metrics::record_embed_render(kind.as_str(), "error");
            Err(error_page())
        }
    }
}

/// Origin allow-list check. The request's Origin header (falling back to
/// Referer) must appear verbatim when a non-empty list is configured;
/// requests with neither header pass, since there is nothing to enforce on.
fn origin_allowed(widget: &Widget, headers: &HeaderMap) -> bool {
    let allowed = match widget.settings.access_control() {
        Some(ac) if !ac.allowed_origins.is_empty() => &ac.allowed_origins,
        _ => return true,
    };

    let origin = headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|v| v.to_str().ok());

    match origin {
        Some(origin) => allowed.iter().any(|o| o == origin),
        None => true,
    }
}

fn effective_theme(params: &HashMap<String, String>, settings: &WidgetSettings) -> Theme {
    params
        .get("theme")
        .map(|t| Theme::parse_lenient(t))
        .unwrap_or_else(|| settings.theme())
}

/// GET /embed/wall/:widget_id - wall-of-love iframe body
async fn embed_wall(
    State(ctx): State<AppContext>,
    Path(widget_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let widget = match load_embeddable(&ctx, &widget_id, WidgetKind::Wall).await {
        Ok(widget) => widget,
        Err(response) => return response,
    };

    if !origin_allowed(&widget, &headers) {
        metrics::record_embed_render("wall", "denied");
        return html_page(
            StatusCode::FORBIDDEN,
            render::render_message("Access denied"),
        );
    }

    let settings = match &widget.settings {
        WidgetSettings::Wall(s) => s.clone(),
        WidgetSettings::Single(_) => return not_found_page(),
    };
    let theme = effective_theme(&params, &widget.settings);

    let approved = match ctx.testimonials.list_approved_for_space(&widget.space_id).await {
        Ok(approved) => approved,
        Err(e) => {
            tracing::error!("Wall embed error: {}", e);
            metrics::record_embed_render("wall", "error");
            return error_page();
        }
    };

    let selected = selection::select_wall(&settings, approved);
    let display: Vec<_> = selected.iter().map(selection::sanitize).collect();

    metrics::record_embed_render("wall", "ok");
    html_page(
        StatusCode::OK,
        render::render_wall(&widget, &settings, &display, theme),
    )
}

/// GET /embed/single/:widget_id - featured-testimonial iframe body
async fn embed_single(
    State(ctx): State<AppContext>,
    Path(widget_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let widget = match load_embeddable(&ctx, &widget_id, WidgetKind::Single).await {
        Ok(widget) => widget,
        Err(response) => return response,
    };

    if !origin_allowed(&widget, &headers) {
        metrics::record_embed_render("single", "denied");
        return html_page(
            StatusCode::FORBIDDEN,
            render::render_message("Access denied"),
        );
    }

    let settings = match &widget.settings {
        WidgetSettings::Single(s) => s.clone(),
        WidgetSettings::Wall(_) => return not_found_page(),
    };
    let theme = effective_theme(&params, &widget.settings);

    let approved = match ctx.testimonials.list_approved_for_space(&widget.space_id).await {
        Ok(approved) => approved,
        Err(e) => {
            tracing::error!("Single embed error: {}", e);
            metrics::record_embed_render("single", "error");
            return error_page();
        }
    };

    let Some(testimonial) = selection::select_single(&settings, approved) else {
        metrics::record_embed_render("single", "empty");
        return html_page(
            StatusCode::NOT_FOUND,
            render::render_message("No testimonial available"),
        );
    };
    let display = selection::sanitize(&testimonial);

    metrics::record_embed_render("single", "ok");
    html_page(
        StatusCode::OK,
        render::render_single(&widget, &settings, &display, theme),
    )
}

/// GET /embed/config/:widget_id.js - the bootstrap loader script
async fn embed_loader(
    State(ctx): State<AppContext>,
    Path(widget_file): Path<String>,
) -> Response {
    let widget_id = widget_file.trim_end_matches(".js");

    let widget = match ctx.widgets.find_by_id(widget_id).await {
        Ok(Some(widget)) if widget.settings.is_public() => widget,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "application/javascript")],
                loader::NOT_FOUND_BODY.to_string(),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Loader script error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/javascript")],
                "// Error loading widget configuration".to_string(),
            )
                .into_response();
        }
    };

    let js = loader::loader_js(&widget.id, widget.kind, ctx.public_url());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        js,
    )
        .into_response()
}
