/// Widget rendering engine
///
/// Produces complete, self-contained HTML documents (inline styles only)
/// served as iframe bodies by the embed routes. Every failure path gets a
/// rendered page as well, since the caller is a browser iframe with no
/// error handling of its own.
use crate::db::models::{Theme, Widget};
use crate::widget::selection::{escape_html, DisplayTestimonial, MAX_CARD_RESPONSES};
use crate::widget::settings::{Cta, SingleSettings, WallSettings};

/// Theme-dependent palette
struct Palette {
    body_bg: &'static str,
    text: &'static str,
    card_bg: &'static str,
    card_shadow: &'static str,
    card_border: &'static str,
    author: &'static str,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            body_bg: "#1a1a1a",
            text: "#ffffff",
            card_bg: "#2d2d2d",
            card_shadow: "0 2px 8px rgba(0,0,0,0.1)",
            card_border: "none",
            author: "#ffffff",
        },
        Theme::Minimal => Palette {
            body_bg: "#ffffff",
            text: "#333333",
            card_bg: "#ffffff",
            card_shadow: "none",
            card_border: "1px solid #e0e0e0",
            author: "#666666",
        },
        Theme::Light => Palette {
            body_bg: "#f8f9fa",
            text: "#333333",
            card_bg: "#ffffff",
            card_shadow: "0 2px 8px rgba(0,0,0,0.1)",
            card_border: "none",
            author: "#666666",
        },
    }
}

fn star_row(rating: i64) -> String {
    "★".repeat(rating.clamp(0, 5) as usize)
}

fn cta_html(cta: Option<&Cta>) -> String {
    match cta {
        Some(cta) if !cta.text.is_empty() => format!(
            r#"<div style="text-align: center; margin-top: 20px;">
      <a href="{url}" class="cta-button">{text}</a>
    </div>"#,
            url = escape_html(cta.url.as_deref().unwrap_or("#")),
            text = escape_html(&cta.text),
        ),
        _ => String::new(),
    }
}

/// Inline script that reports the document height to the host page so the
/// loader (widget::loader) can resize the iframe.
fn resize_script(widget_id: &str) -> String {
    format!(
        r#"<script>
    (function() {{
      function report() {{
        if (window.parent !== window) {{
          window.parent.postMessage({{
            type: 'trustimonials-resize',
            widgetId: '{widget_id}',
            height: document.body.scrollHeight
          }}, '*');
        }}
      }}
      window.addEventListener('load', report);
      window.addEventListener('resize', report);
    }})();
  </script>"#
    )
}

fn document(title: &str, css: &str, body: &str, resize: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
{css}
    </style>
  </head>
  <body>
{body}
{resize}
  </body>
</html>"#
    )
}

/// Render a wall-of-love widget document
pub fn render_wall(
    widget: &Widget,
    settings: &WallSettings,
    testimonials: &[DisplayTestimonial],
    theme: Theme,
) -> String {
    let palette = palette(theme);
    let spacing = settings.spacing_and_gutter.as_ref();
    let gap = spacing.and_then(|s| s.gap_px).unwrap_or(16);
    let radius = spacing.and_then(|s| s.card_radius_px).unwrap_or(8);

    let css = format!(
        r#"      * {{ margin: 0; padding: 0; box-sizing: border-box; }}
      body {{
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: {body_bg};
        color: {text};
        padding: 16px;
      }}
      .wall-container {{ max-width: 100%; margin: 0 auto; }}
      .testimonials-grid {{
        display: grid;
        grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
        gap: {gap}px;
      }}
      .testimonial-card {{
        background: {card_bg};
        border-radius: {radius}px;
        padding: 20px;
        box-shadow: {card_shadow};
        border: {card_border};
      }}
      .testimonial-content {{ margin-bottom: 12px; line-height: 1.5; }}
      .testimonial-author {{ font-weight: 600; color: {author}; margin-bottom: 8px; }}
      .testimonial-rating {{ color: #ffc107; margin-bottom: 8px; }}
      .cta-button {{
        background: #00A676;
        color: white;
        padding: 8px 16px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        text-decoration: none;
        display: inline-block;
        margin-top: 12px;
      }}
      .cta-button:hover {{ background: #007A53; }}"#,
        body_bg = palette.body_bg,
        text = palette.text,
        card_bg = palette.card_bg,
        author = palette.author,
        card_shadow = palette.card_shadow,
        card_border = palette.card_border,
    );

    let cards: String = testimonials
        .iter()
        .map(|t| {
            let author = if settings.show_author {
                format!(
                    r#"<div class="testimonial-author">{}</div>"#,
                    t.author_name
                )
            } else {
                String::new()
            };

            let rating = match (settings.show_rating, t.rating) {
                (true, Some(r)) => format!(
                    r#"<div class="testimonial-rating">{}</div>"#,
                    star_row(r)
                ),
                _ => String::new(),
            };

            let responses: String = t
                .question_responses
                .iter()
                .take(MAX_CARD_RESPONSES)
                .map(|r| {
                    format!(
                        r#"<div style="margin-bottom: 8px;">
              <strong>Q:</strong> {question}<br>
              <strong>A:</strong> {answer}
            </div>"#,
                        question = r.question,
                        answer = r.answer,
                    )
                })
                .collect();
            let responses = if responses.is_empty() {
                String::new()
            } else {
                format!(r#"<div class="question-responses">{responses}</div>"#)
            };

            format!(
                r#"<div class="testimonial-card">
          {author}
          {rating}
          <div class="testimonial-content">{content}</div>
          {responses}
        </div>"#,
                content = t.content,
            )
        })
        .collect();

    let body = format!(
        r#"    <div class="wall-container">
      <div class="testimonials-grid">
        {cards}
      </div>
      {cta}
    </div>"#,
        cta = cta_html(settings.cta.as_ref()),
    );

    document(
        &escape_html(&widget.name),
        &css,
        &body,
        &resize_script(&widget.id),
    )
}

/// Render a single-testimonial widget document
pub fn render_single(
    widget: &Widget,
    settings: &SingleSettings,
    testimonial: &DisplayTestimonial,
    theme: Theme,
) -> String {
    let palette = palette(theme);

    let css = format!(
        r#"      * {{ margin: 0; padding: 0; box-sizing: border-box; }}
      body {{
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: {body_bg};
        color: {text};
        padding: 16px;
      }}
      .single-container {{ max-width: 100%; margin: 0 auto; }}
      .testimonial-card {{
        background: {card_bg};
        border-radius: 8px;
        padding: 24px;
        box-shadow: {card_shadow};
        border: {card_border};
        text-align: center;
      }}
      .testimonial-content {{
        font-size: 18px;
        line-height: 1.6;
        margin-bottom: 16px;
        font-style: italic;
      }}
      .testimonial-author {{ font-weight: 600; color: {author}; margin-bottom: 8px; }}
      .testimonial-rating {{ color: #ffc107; margin-bottom: 8px; }}
      .cta-button {{
        background: #00A676;
        color: white;
        padding: 12px 24px;
        border: none;
        border-radius: 6px;
        cursor: pointer;
        text-decoration: none;
        display: inline-block;
        margin-top: 16px;
      }}
      .cta-button:hover {{ background: #007A53; }}"#,
        body_bg = palette.body_bg,
        text = palette.text,
        card_bg = palette.card_bg,
        author = palette.author,
        card_shadow = palette.card_shadow,
        card_border = palette.card_border,
    );

    let author = if settings.show_author_details {
        format!(
            r#"<div class="testimonial-author">— {}</div>"#,
            testimonial.author_name
        )
    } else {
        String::new()
    };

    let rating = match (settings.show_rating, testimonial.rating) {
        (true, Some(r)) => format!(
            r#"<div class="testimonial-rating">{}</div>"#,
            star_row(r)
        ),
        _ => String::new(),
    };

    let date = if settings.show_date {
        format!(
            r#"<div style="color: #999; font-size: 14px;">{}</div>"#,
            testimonial.submitted_at.format("%-m/%-d/%Y")
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"    <div class="single-container">
      <div class="testimonial-card">
        <div class="testimonial-content">"{content}"</div>
        {author}
        {rating}
        {date}
      </div>
      {cta}
    </div>"#,
        content = testimonial.content,
        cta = cta_html(settings.cta.as_ref()),
    );

    document(
        &escape_html(&widget.name),
        &css,
        &body,
        &resize_script(&widget.id),
    )
}

/// Minimal standalone page for every embed failure path (not found, access
/// denied, no testimonial, internal error)
pub fn render_message(message: &str) -> String {
    format!(
        r#"<html>
  <body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; text-align: center;">
    <p>{}</p>
  </body>
</html>"#,
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{QuestionResponse, WidgetKind, WidgetStatus};
    use crate::widget::settings::WidgetSettings;
    use chrono::{TimeZone, Utc};

    fn wall_widget(settings: serde_json::Value) -> (Widget, WallSettings) {
        let parsed = WidgetSettings::parse(WidgetKind::Wall, settings).unwrap();
        let wall = match &parsed {
            WidgetSettings::Wall(s) => s.clone(),
            _ => unreachable!(),
        };
        let widget = Widget {
            id: "w1".to_string(),
            space_id: "space1".to_string(),
            name: "Homepage wall".to_string(),
            kind: WidgetKind::Wall,
            design_template: parsed.design_template().to_string(),
            settings: parsed,
            status: WidgetStatus::Active,
            created_by: "u1".to_string(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (widget, wall)
    }

    fn single_widget(settings: serde_json::Value) -> (Widget, SingleSettings) {
        let parsed = WidgetSettings::parse(WidgetKind::Single, settings).unwrap();
        let single = match &parsed {
            WidgetSettings::Single(s) => s.clone(),
            _ => unreachable!(),
        };
        let widget = Widget {
            id: "w2".to_string(),
            space_id: "space1".to_string(),
            name: "Featured quote".to_string(),
            kind: WidgetKind::Single,
            design_template: parsed.design_template().to_string(),
            settings: parsed,
            status: WidgetStatus::Active,
            created_by: "u1".to_string(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (widget, single)
    }

    fn display(content: &str, rating: Option<i64>) -> DisplayTestimonial {
        DisplayTestimonial {
            id: "t1".to_string(),
            author_name: "Ada".to_string(),
            content: content.to_string(),
            rating,
            media_url: None,
            thumbnail_url: None,
            question_responses: vec![],
            submitted_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_wall_renders_content_and_author() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "showAuthor": true
        }));
        let html = render_wall(&widget, &settings, &[display("Works great", None)], Theme::Light);

        assert!(html.contains("Works great"));
        assert!(html.contains("Ada"));
        assert!(html.contains("testimonials-grid"));
        assert!(html.contains("minmax(300px, 1fr)"));
    }

    #[test]
    fn test_wall_hides_author_when_disabled() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards"
        }));
        let html = render_wall(&widget, &settings, &[display("Body", None)], Theme::Light);
        assert!(!html.contains("testimonial-author\">Ada"));
    }

    #[test]
    fn test_wall_star_count_matches_rating() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "showRating": true
        }));
        let html = render_wall(&widget, &settings, &[display("Body", Some(3))], Theme::Light);
        assert!(html.contains("★★★"));
        assert!(!html.contains("★★★★"));
    }

    #[test]
    fn test_wall_rating_hidden_when_absent() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "showRating": true
        }));
        let html = render_wall(&widget, &settings, &[display("Body", None)], Theme::Light);
        assert!(!html.contains("testimonial-rating"));
    }

    #[test]
    fn test_wall_spacing_defaults() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards"
        }));
        let html = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(html.contains("gap: 16px"));
        assert!(html.contains("border-radius: 8px"));
    }

    #[test]
    fn test_wall_spacing_overrides() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "spacingAndGutter": { "gapPx": 24, "cardRadiusPx": 12 }
        }));
        let html = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(html.contains("gap: 24px"));
        assert!(html.contains("border-radius: 12px"));
    }

    #[test]
    fn test_wall_limits_question_responses_to_two() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards"
        }));
        let mut t = display("Body", None);
        t.question_responses = (0..4)
            .map(|i| QuestionResponse {
                question_index: i,
                question: format!("Question {}", i),
                answer: format!("Answer {}", i),
                rating: None,
            })
            .collect();

        let html = render_wall(&widget, &settings, &[t], Theme::Light);
        assert!(html.contains("Question 0"));
        assert!(html.contains("Question 1"));
        assert!(!html.contains("Question 2"));
    }

    #[test]
    fn test_theme_palettes() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards"
        }));

        let dark = render_wall(&widget, &settings, &[], Theme::Dark);
        assert!(dark.contains("background: #1a1a1a"));
        assert!(dark.contains("background: #2d2d2d"));

        let minimal = render_wall(&widget, &settings, &[], Theme::Minimal);
        assert!(minimal.contains("box-shadow: none"));
        assert!(minimal.contains("border: 1px solid #e0e0e0"));

        let light = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(light.contains("background: #f8f9fa"));
    }

    #[test]
    fn test_cta_only_renders_with_text() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "cta": { "text": "Leave a review", "url": "https://example.com/review" }
        }));
        let html = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(html.contains("Leave a review"));
        assert!(html.contains("cta-button"));

        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards",
            "cta": { "text": "" }
        }));
        let html = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(!html.contains("cta-button\">"));
    }

    #[test]
    fn test_single_renders_quoted_content_and_stars() {
        let (widget, settings) = single_widget(serde_json::json!({
            "designTemplate": "hero",
            "selectTestimonial": "auto-latest",
            "showRating": true
        }));
        let html = render_single(&widget, &settings, &display("Great tool", Some(4)), Theme::Light);

        assert!(html.contains(r#""Great tool""#));
        assert!(html.contains("★★★★"));
        assert!(!html.contains("★★★★★"));
    }

    #[test]
    fn test_single_author_prefixed_with_dash() {
        let (widget, settings) = single_widget(serde_json::json!({
            "designTemplate": "card-compact",
            "selectTestimonial": "auto-latest",
            "showAuthorDetails": true
        }));
        let html = render_single(&widget, &settings, &display("Body", None), Theme::Light);
        assert!(html.contains("— Ada"));
    }

    #[test]
    fn test_single_shows_date_when_enabled() {
        let (widget, settings) = single_widget(serde_json::json!({
            "designTemplate": "card-compact",
            "selectTestimonial": "auto-latest",
            "showDate": true
        }));
        let html = render_single(&widget, &settings, &display("Body", None), Theme::Light);
        assert!(html.contains("6/1/2025"));
    }

    #[test]
    fn test_documents_carry_resize_reporter() {
        let (widget, settings) = wall_widget(serde_json::json!({
            "designTemplate": "grid-cards"
        }));
        let html = render_wall(&widget, &settings, &[], Theme::Light);
        assert!(html.contains("trustimonials-resize"));
        assert!(html.contains("widgetId: 'w1'"));
    }

    #[test]
    fn test_message_page_is_minimal_and_centered() {
        let html = render_message("Widget not found or not available");
        assert!(html.contains("Widget not found or not available"));
        assert!(html.contains("text-align: center"));
        assert!(!html.contains("<script"));
    }
}
