/// Public submission pipeline
///
/// Anonymous endpoints backing the hosted submission form: space config
/// lookup, the submission POST (JSON or multipart), and the legacy
/// slug-keyed request-link lookup.
use crate::{
    context::AppContext,
    db::models::{CollectedVia, CollectionType, QuestionResponse, TestimonialKind},
    error::{ApiError, ApiResult},
    metrics,
    moderation::TestimonialStatus,
    store::testimonials::NewTestimonial,
};
use axum::{
    extract::{ConnectInfo, FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/s/:space_id", get(get_space_config))
        .route("/s/:space_id/submissions", post(submit_testimonial))
        .route("/t/:slug", get(get_request_link))
}

/// GET /s/:space_id - space configuration for the external submission form
async fn get_space_config(
    State(ctx): State<AppContext>,
    Path(space_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let space = ctx
        .spaces
        .find_public(&space_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found or not active".to_string()))?;

    Ok(Json(json!({
        "space": {
            "id": space.id,
            "name": space.name,
            "description": space.description,
            "logo": space.logo,
            "headerTitle": space.header_title,
            "headerMessage": space.header_message,
            "questionList": space.question_list,
            "theme": space.theme,
            "buttonColor": space.button_color,
            "collectExtras": space.collect_extras,
            "collectionType": space.collection_type,
            "language": space.language,
            "autoTranslate": space.auto_translate,
        }
    })))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SubmissionPayload {
    #[validate(length(max = 100, message = "Name cannot exceed 100 characters"))]
    name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    email: Option<String>,
    #[validate(length(max = 2000, message = "Content cannot exceed 2000 characters"))]
    content: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    rating: Option<i64>,
    #[serde(default)]
    meta: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    question_responses: Vec<SubmittedResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmittedResponse {
    question: String,
    answer: String,
    rating: Option<i64>,
}

/// Best available client address: forwarding headers first, then the
/// connection peer
fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Read the payload from either a JSON body or a multipart form whose
/// `data` field carries the JSON. A `mediaFile` part is noted but its
/// contents are not stored here.
async fn read_payload(request: Request) -> ApiResult<(SubmissionPayload, bool)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::Validation("Invalid multipart body".to_string()))?;

        let mut payload = None;
        let mut has_media = false;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::Validation("Invalid multipart body".to_string()))?
        {
            let name = field.name().map(|n| n.to_string());
            match name.as_deref() {
                Some("data") => {
                    let text = field.text().await.map_err(|_| {
                        ApiError::Validation("Invalid submission data format".to_string())
                    })?;
                    payload = Some(serde_json::from_str(&text).map_err(|_| {
                        ApiError::Validation("Invalid submission data format".to_string())
                    })?);
                }
                Some("mediaFile") => {
                    // Upload storage is handled elsewhere; the presence of
                    // the part is what marks a video submission
                    has_media = true;
                    let _ = field.bytes().await;
                }
                _ => {}
            }
        }

        let payload = payload.ok_or_else(|| {
            ApiError::Validation("Invalid submission data format".to_string())
        })?;
        Ok((payload, has_media))
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), 256 * 1024)
            .await
            .map_err(|_| ApiError::Validation("Request body too large".to_string()))?;
        let payload = serde_json::from_slice(&bytes)
            .map_err(|_| ApiError::Validation("Invalid submission data format".to_string()))?;
        Ok((payload, false))
    }
}

fn validate_responses(responses: &[SubmittedResponse]) -> ApiResult<()> {
    let mut errors = Vec::new();

    for (index, response) in responses.iter().enumerate() {
        if response.question.trim().is_empty() || response.answer.trim().is_empty() {
            errors.push(format!("Question {} is missing question or answer", index + 1));
        }
        if response.answer.len() > 2000 {
            errors.push(format!("Question {} answer is too long", index + 1));
        }
        if let Some(rating) = response.rating {
            if !(1..=5).contains(&rating) {
                errors.push(format!("Question {} rating must be between 1 and 5", index + 1));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors.join("; ")))
    }
}

/// POST /s/:space_id/submissions - anonymous testimonial submission,
/// rate-limited per (IP, space)
async fn submit_testimonial(
    State(ctx): State<AppContext>,
    Path(space_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> ApiResult<impl IntoResponse> {
    let headers = request.headers().clone();
    let ip = client_ip(&headers, &addr);

    ctx.rate_limiter.check_submission(&ip, &space_id)?;

    let space = ctx
        .spaces
        .find_public(&space_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Space not found or not active".to_string()))?;

    let (payload, has_media) = read_payload(request).await?;
    payload.validate()?;

    let has_content = payload
        .content
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if !has_content && payload.question_responses.is_empty() {
        metrics::record_submission("link", "rejected");
        return Err(ApiError::Validation(
            "Either content or question responses are required".to_string(),
        ));
    }
    validate_responses(&payload.question_responses)?;

    let question_responses: Vec<QuestionResponse> = payload
        .question_responses
        .iter()
        .enumerate()
        .map(|(index, response)| QuestionResponse {
            question_index: index as u32,
            question: response.question.clone(),
            answer: response.answer.clone(),
            rating: response.rating,
        })
        .collect();

    // Synthesize body text from the answers when none was given directly
    let content = if has_content {
        payload.content.clone()
    } else {
        Some(
            question_responses
                .iter()
                .map(|r| format!("Q: {}\nA: {}", r.question, r.answer))
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    };

    let kind = if has_media && space.collection_type == CollectionType::TextAndVideo {
        TestimonialKind::Video
    } else {
        TestimonialKind::Text
    };

    let mut metadata = serde_json::Map::new();
    metadata.insert("ipAddress".to_string(), json!(ip));
    if let Some(agent) = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()) {
        metadata.insert("userAgent".to_string(), json!(agent));
    }
    if let Some(meta) = payload.meta {
        metadata.extend(meta);
    }

    let testimonial = ctx
        .testimonials
        .create(NewTestimonial {
            space_id: Some(space.id),
            kind,
            author_name: payload.name,
            author_email: payload.email.map(|e| e.to_lowercase()),
            content,
            rating: payload.rating,
            collected_via: CollectedVia::Link,
            status: TestimonialStatus::Pending,
            question_responses,
            metadata: serde_json::Value::Object(metadata),
            ..Default::default()
        })
        .await?;

    metrics::record_submission("link", "accepted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Testimonial submitted successfully",
            "submissionId": testimonial.id,
            "status": testimonial.status,
        })),
    ))
}

/// GET /t/:slug - legacy request-link configuration
async fn get_request_link(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let link = ctx
        .links
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Testimonial link not found".to_string()))?;

    if !link.is_valid() {
        return Err(ApiError::Gone(
            "This testimonial link has expired or reached its usage limit".to_string(),
        ));
    }

    let template = match &link.template_id {
        Some(id) => ctx.templates.find_by_id(id).await?,
        None => None,
    };
    let form_config = template
        .as_ref()
        .map(|t| t.form_config.clone())
        .unwrap_or_else(|| json!({ "fields": ["authorName", "content", "rating"] }));

    let owner = ctx.users.find_by_id(&link.owner_id).await?;

    Ok(Json(json!({
        "link": {
            "id": link.id,
            "slug": link.slug,
            "owner": owner.map(|o| json!({ "name": o.name, "email": o.email })),
            "template": template.map(|t| json!({ "id": t.id, "name": t.name })),
            "formConfig": form_config,
            "expiryDate": link.expiry_date,
            "maxUses": link.max_uses,
            "uses": link.uses,
            "isActive": link.is_active,
        }
    })))
}
