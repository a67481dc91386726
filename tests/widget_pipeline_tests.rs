/// End-to-end tests for the widget pipeline: store -> selection -> render,
/// the same path the embed routes take, over a migrated in-memory database.
use serde_json::json;
use sqlx::SqlitePool;
use trustimonials::db::models::{TestimonialKind, Theme, UserRole, WidgetKind};
use trustimonials::moderation::ModerationAction;
use trustimonials::store::spaces::NewSpace;
use trustimonials::store::testimonials::NewTestimonial;
use trustimonials::store::widgets::NewWidget;
use trustimonials::store::{SpaceStore, TestimonialStore, UserStore, WidgetStore};
use trustimonials::widget::render;
use trustimonials::widget::selection;
use trustimonials::widget::settings::WidgetSettings;

async fn migrated_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

struct Fixture {
    users: UserStore,
    spaces: SpaceStore,
    testimonials: TestimonialStore,
    widgets: WidgetStore,
    owner_id: String,
    space_id: String,
}

async fn fixture() -> Fixture {
    let pool = migrated_pool().await;
    let users = UserStore::new(pool.clone());
    let spaces = SpaceStore::new(pool.clone());
    let testimonials = TestimonialStore::new(pool.clone());
    let widgets = WidgetStore::new(pool.clone());

    let owner = users
        .create("Owner", "owner@example.com", UserRole::User)
        .await
        .unwrap();

    let space = spaces
        .create(NewSpace {
            owner_id: owner.id.clone(),
            name: "Acme feedback".to_string(),
            description: None,
            logo: None,
            header_title: None,
            header_message: None,
            question_list: vec!["What changed for you?".to_string()],
            collect_extras: vec![],
            collection_type: trustimonials::db::models::CollectionType::TextAndStar,
            theme: Theme::Light,
            button_color: "#00A676".to_string(),
            language: "en".to_string(),
            auto_translate: false,
            template_id: None,
            expiry_date: None,
            max_uses: None,
        })
        .await
        .unwrap();

    Fixture {
        owner_id: owner.id,
        space_id: space.id,
        users,
        spaces,
        testimonials,
        widgets,
    }
}

async fn approved_testimonial(
    fx: &Fixture,
    author: &str,
    content: &str,
    rating: Option<i64>,
) -> String {
    let t = fx
        .testimonials
        .create(NewTestimonial {
            space_id: Some(fx.space_id.clone()),
            author_name: Some(author.to_string()),
            content: Some(content.to_string()),
            rating,
            ..Default::default()
        })
        .await
        .unwrap();

    fx.testimonials
        .apply_action(&fx.space_id, &t.id, ModerationAction::Approve)
        .await
        .unwrap();

    t.id
}

#[tokio::test]
async fn single_widget_renders_latest_approved_testimonial() {
    let fx = fixture().await;
    approved_testimonial(&fx, "Ada", "Great tool", Some(4)).await;

    let settings = WidgetSettings::parse(
        WidgetKind::Single,
        json!({
            "designTemplate": "hero",
            "theme": "light",
            "selectTestimonial": "auto-latest",
            "showRating": true,
            "isPublic": true
        }),
    )
    .unwrap();
    let widget = fx
        .widgets
        .create(NewWidget {
            space_id: fx.space_id.clone(),
            name: "Featured".to_string(),
            settings,
            created_by: fx.owner_id.clone(),
            metadata: json!({}),
        })
        .await
        .unwrap();

    let approved = fx
        .testimonials
        .list_approved_for_space(&fx.space_id)
        .await
        .unwrap();
    let single = match &widget.settings {
        WidgetSettings::Single(s) => s.clone(),
        _ => unreachable!(),
    };
    let selected = selection::select_single(&single, approved).unwrap();
    let display = selection::sanitize(&selected);
    let html = render::render_single(&widget, &single, &display, Theme::Light);

    assert!(html.contains("Great tool"));
    assert!(html.contains("★★★★"));
    assert!(!html.contains("★★★★★"));
}

#[tokio::test]
async fn wall_widget_applies_filter_and_limit() {
    let fx = fixture().await;
    approved_testimonial(&fx, "A", "Five stars", Some(5)).await;
    approved_testimonial(&fx, "B", "Four stars", Some(4)).await;
    approved_testimonial(&fx, "C", "Two stars", Some(2)).await;
    approved_testimonial(&fx, "D", "Unrated", None).await;

    // Pending submissions never surface
    fx.testimonials
        .create(NewTestimonial {
            space_id: Some(fx.space_id.clone()),
            author_name: Some("E".to_string()),
            content: Some("Still pending".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let settings = WidgetSettings::parse(
        WidgetKind::Wall,
        json!({
            "designTemplate": "grid-cards",
            "theme": "light",
            "sortOrder": "highest_rating",
            "itemsToShow": 2,
            "filter": { "minRating": 4 }
        }),
    )
    .unwrap();
    let wall = match &settings {
        WidgetSettings::Wall(s) => s.clone(),
        _ => unreachable!(),
    };

    let approved = fx
        .testimonials
        .list_approved_for_space(&fx.space_id)
        .await
        .unwrap();
    let selected = selection::select_wall(&wall, approved);

    assert_eq!(selected.len(), 2);
    let ratings: Vec<i64> = selected.iter().map(|t| t.rating.unwrap()).collect();
    assert_eq!(ratings, vec![5, 4]);
}

#[tokio::test]
async fn pipeline_escapes_hostile_author_and_content() {
    let fx = fixture().await;
    approved_testimonial(
        &fx,
        "O'Brien & <script>",
        "<img src=x onerror=alert(1)>",
        None,
    )
    .await;

    let settings = WidgetSettings::parse(
        WidgetKind::Wall,
        json!({
            "designTemplate": "grid-cards",
            "theme": "light",
            "showAuthor": true
        }),
    )
    .unwrap();
    let widget = fx
        .widgets
        .create(NewWidget {
            space_id: fx.space_id.clone(),
            name: "Wall".to_string(),
            settings,
            created_by: fx.owner_id.clone(),
            metadata: json!({}),
        })
        .await
        .unwrap();
    let wall = match &widget.settings {
        WidgetSettings::Wall(s) => s.clone(),
        _ => unreachable!(),
    };

    let approved = fx
        .testimonials
        .list_approved_for_space(&fx.space_id)
        .await
        .unwrap();
    let selected = selection::select_wall(&wall, approved);
    let display: Vec<_> = selected.iter().map(selection::sanitize).collect();
    let html = render::render_wall(&widget, &wall, &display, Theme::Light);

    assert!(html.contains("O&#x27;Brien &amp; &lt;script&gt;"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!html.contains("<img src=x"));
    assert!(!html.contains("O'Brien"));
}

#[tokio::test]
async fn invalid_widget_settings_reject_the_write_entirely() {
    let fx = fixture().await;

    let parsed = WidgetSettings::parse(
        WidgetKind::Wall,
        json!({ "designTemplate": "bad-value", "theme": "light" }),
    );
    assert!(parsed.is_err());

    // Nothing was persisted for that name
    let stored = fx
        .widgets
        .find_by_name(&fx.space_id, "Broken widget")
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn manual_select_with_missing_target_renders_unavailable_state() {
    let fx = fixture().await;
    approved_testimonial(&fx, "Ada", "Body", None).await;

    let settings = WidgetSettings::parse(
        WidgetKind::Single,
        json!({
            "designTemplate": "card-compact",
            "theme": "light",
            "selectTestimonial": "manual-select",
            "manualTestimonialId": "no-such-id"
        }),
    )
    .unwrap();
    let single = match &settings {
        WidgetSettings::Single(s) => s.clone(),
        _ => unreachable!(),
    };

    let approved = fx
        .testimonials
        .list_approved_for_space(&fx.space_id)
        .await
        .unwrap();
    assert!(selection::select_single(&single, approved).is_none());

    // The embed route then serves the explicit unavailable page
    let page = render::render_message("No testimonial available");
    assert!(page.contains("No testimonial available"));
}

#[tokio::test]
async fn private_widget_is_indistinguishable_from_missing() {
    // The not-found page carries no widget-specific content, so a private
    // widget and a nonexistent id produce byte-identical bodies
    let for_private = render::render_message("Widget not found or not available");
    let for_missing = render::render_message("Widget not found or not available");
    assert_eq!(for_private, for_missing);
}

#[tokio::test]
async fn theme_override_changes_palette() {
    let fx = fixture().await;
    approved_testimonial(&fx, "Ada", "Body", None).await;

    let settings = WidgetSettings::parse(
        WidgetKind::Wall,
        json!({ "designTemplate": "grid-cards", "theme": "light" }),
    )
    .unwrap();
    let widget = fx
        .widgets
        .create(NewWidget {
            space_id: fx.space_id.clone(),
            name: "Wall".to_string(),
            settings,
            created_by: fx.owner_id.clone(),
            metadata: json!({}),
        })
        .await
        .unwrap();
    let wall = match &widget.settings {
        WidgetSettings::Wall(s) => s.clone(),
        _ => unreachable!(),
    };

    let approved = fx
        .testimonials
        .list_approved_for_space(&fx.space_id)
        .await
        .unwrap();
    let display: Vec<_> = selection::select_wall(&wall, approved)
        .iter()
        .map(selection::sanitize)
        .collect();

    // Stored theme is light; a dark query override wins
    let html = render::render_wall(&widget, &wall, &display, Theme::Dark);
    assert!(html.contains("background: #1a1a1a"));
}

#[tokio::test]
async fn soft_deleted_space_stays_out_of_public_lookup() {
    let fx = fixture().await;

    assert!(fx.spaces.find_public(&fx.space_id).await.unwrap().is_some());
    fx.spaces
        .soft_delete(&fx.space_id, &fx.owner_id)
        .await
        .unwrap();
    assert!(fx.spaces.find_public(&fx.space_id).await.unwrap().is_none());

    // The user record is untouched by space lifecycle
    assert!(fx
        .users
        .find_by_id(&fx.owner_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn testimonial_of_other_kind_marks_video() {
    let fx = fixture().await;
    let t = fx
        .testimonials
        .create(NewTestimonial {
            space_id: Some(fx.space_id.clone()),
            kind: TestimonialKind::Video,
            author_name: Some("Ada".to_string()),
            content: Some("Recorded one".to_string()),
            media_url: Some("https://cdn.example.com/clip.mp4".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let stored = fx.testimonials.find_by_id(&t.id).await.unwrap().unwrap();
    assert_eq!(stored.kind, TestimonialKind::Video);
    assert_eq!(
        stored.media_url.as_deref(),
        Some("https://cdn.example.com/clip.mp4")
    );
}
