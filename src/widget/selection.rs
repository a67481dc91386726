/// Testimonial selection engine
///
/// Pure functions from (widget settings, approved testimonials) to the
/// ordered testimonials a widget displays. Shared by the dashboard preview
/// route and the public embed routes; the only non-determinism is the
/// request-time randomness of `random` ordering and `auto-random`
/// selection.
use crate::db::models::{QuestionResponse, Testimonial};
use crate::moderation::TestimonialStatus;
use crate::widget::settings::{SelectTestimonial, SingleSettings, SortOrder, WallSettings};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;

/// Default number of wall items when `itemsToShow` is unset
const DEFAULT_ITEMS_TO_SHOW: usize = 12;

/// How many question responses a wall card shows
pub const MAX_CARD_RESPONSES: usize = 2;

/// Select and order the testimonials a wall widget displays.
///
/// Input is expected to be the space's approved set; status is re-checked
/// here so the function is total over arbitrary input.
pub fn select_wall(settings: &WallSettings, testimonials: Vec<Testimonial>) -> Vec<Testimonial> {
    let mut selected: Vec<Testimonial> = testimonials
        .into_iter()
        .filter(|t| t.status == TestimonialStatus::Approved)
        .filter(|t| matches_filter(settings, t))
        .collect();

    match settings.sort_order.unwrap_or_default() {
        SortOrder::HighestRating => {
            selected.sort_by(|a, b| {
                b.rating
                    .unwrap_or(0)
                    .cmp(&a.rating.unwrap_or(0))
                    .then_with(|| b.submitted_at.cmp(&a.submitted_at))
            });
        }
        SortOrder::Random => {
            selected.shuffle(&mut rand::thread_rng());
        }
        SortOrder::Newest => {
            selected.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        }
    }

    let limit = settings
        .items_to_show
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_ITEMS_TO_SHOW);
    selected.truncate(limit);
    selected
}

fn matches_filter(settings: &WallSettings, testimonial: &Testimonial) -> bool {
    let Some(filter) = &settings.filter else {
        return true;
    };

    if let Some(min) = filter.min_rating {
        // A testimonial with no rating never satisfies a minimum
        match testimonial.rating {
            Some(r) if r >= min => {}
            _ => return false,
        }
    }

    if filter.has_media == Some(true)
        && testimonial.media_url.is_none()
        && testimonial.thumbnail_url.is_none()
    {
        return false;
    }

    true
}

/// Choose the one testimonial a single widget displays, or `None` when no
/// approved testimonial matches (the renderer then produces its explicit
/// "not available" document).
pub fn select_single(
    settings: &SingleSettings,
    testimonials: Vec<Testimonial>,
) -> Option<Testimonial> {
    let mut approved: Vec<Testimonial> = testimonials
        .into_iter()
        .filter(|t| t.status == TestimonialStatus::Approved)
        .collect();

    match settings.select_testimonial {
        SelectTestimonial::ManualSelect => {
            let id = settings.manual_testimonial_id.as_deref()?;
            approved.into_iter().find(|t| t.id == id)
        }
        SelectTestimonial::AutoLatest => {
            approved.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
            approved.into_iter().next()
        }
        SelectTestimonial::AutoRandom => {
            // Uniform choice at request time; deliberately not cached
            let index = if approved.is_empty() {
                return None;
            } else {
                rand::Rng::gen_range(&mut rand::thread_rng(), 0..approved.len())
            };
            Some(approved.swap_remove(index))
        }
    }
}

/// Testimonial view handed to the rendering engine: author and text fields
/// are HTML-escaped, the author defaults to "Anonymous".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTestimonial {
    pub id: String,
    pub author_name: String,
    pub content: String,
    pub rating: Option<i64>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub question_responses: Vec<QuestionResponse>,
    pub submitted_at: DateTime<Utc>,
}

/// Escape the five HTML metacharacters plus the forward slash.
///
/// The slash escape blocks naive `</script>` reconstruction in output that
/// is interpolated straight into documents served to third-party origins.
/// Ampersand is replaced first so no entity is re-escaped.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Mandatory sanitization before any handoff to the rendering engine.
pub fn sanitize(testimonial: &Testimonial) -> DisplayTestimonial {
    DisplayTestimonial {
        id: testimonial.id.clone(),
        author_name: escape_html(testimonial.author_name.as_deref().unwrap_or("Anonymous")),
        content: escape_html(testimonial.content.as_deref().unwrap_or("")),
        rating: testimonial.rating,
        media_url: testimonial.media_url.clone(),
        thumbnail_url: testimonial.thumbnail_url.clone(),
        question_responses: testimonial
            .question_responses
            .iter()
            .map(|r| QuestionResponse {
                question_index: r.question_index,
                question: escape_html(&r.question),
                answer: escape_html(&r.answer),
                rating: r.rating,
            })
            .collect(),
        submitted_at: testimonial.submitted_at,
    }
}
