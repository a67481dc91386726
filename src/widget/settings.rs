/// Typed widget settings
///
/// Settings are stored as JSON but parsed into per-type variants so the
/// type-specific rules (template and theme membership, item ranges, the
/// manual-select/manualTestimonialId pairing) are enforced before any
/// write reaches the store. A rejected parse rejects the write entirely.
use crate::db::models::{Theme, WidgetKind};
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WallTemplate {
    GridCards,
    Masonry,
    Carousel,
}

impl WallTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            WallTemplate::GridCards => "grid-cards",
            WallTemplate::Masonry => "masonry",
            WallTemplate::Carousel => "carousel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingleTemplate {
    CardCompact,
    Hero,
    QuoteOverlay,
}

impl SingleTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SingleTemplate::CardCompact => "card-compact",
            SingleTemplate::Hero => "hero",
            SingleTemplate::QuoteOverlay => "quote-overlay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    HighestRating,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectTestimonial {
    ManualSelect,
    AutoLatest,
    AutoRandom,
}

/// Optional narrowing applied to a wall widget's approved testimonials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_media: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingAndGutter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_radius_px: Option<u32>,
}

/// Call-to-action block rendered below the testimonials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cta {
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Origin allow-list for the embed routes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControl {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSettings {
    pub design_template: WallTemplate,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_to_show: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<WallFilter>,
    #[serde(default)]
    pub show_author: bool,
    #[serde(default)]
    pub show_rating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_and_gutter: Option<SpacingAndGutter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<Cta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control: Option<AccessControl>,
}

impl WallSettings {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(n) = self.items_to_show {
            if !(1..=50).contains(&n) {
                return Err(ApiError::Validation(
                    "Items to show must be between 1 and 50".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSettings {
    pub design_template: SingleTemplate,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub is_public: bool,
    pub select_testimonial: SelectTestimonial,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_testimonial_id: Option<String>,
    #[serde(default)]
    pub show_author_details: bool,
    #[serde(default)]
    pub show_rating: bool,
    #[serde(default)]
    pub show_date: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<Cta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control: Option<AccessControl>,
}

impl SingleSettings {
    pub fn validate(&self) -> ApiResult<()> {
        if self.select_testimonial == SelectTestimonial::ManualSelect
            && self
                .manual_testimonial_id
                .as_deref()
                .map_or(true, |id| id.is_empty())
        {
            return Err(ApiError::Validation(
                "Manual testimonial ID is required when using manual-select".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings variant matching the widget's type
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WidgetSettings {
    Wall(WallSettings),
    Single(SingleSettings),
}

impl WidgetSettings {
    /// Parse and validate raw settings JSON against a widget type.
    /// Any violation rejects the whole value; nothing partial survives.
    pub fn parse(kind: WidgetKind, raw: serde_json::Value) -> ApiResult<Self> {
        match kind {
            WidgetKind::Wall => {
                let settings: WallSettings = serde_json::from_value(raw).map_err(|e| {
                    ApiError::Validation(format!("Invalid settings for wall widget: {}", e))
                })?;
                settings.validate()?;
                Ok(WidgetSettings::Wall(settings))
            }
            WidgetKind::Single => {
                let settings: SingleSettings = serde_json::from_value(raw).map_err(|e| {
                    ApiError::Validation(format!("Invalid settings for single widget: {}", e))
                })?;
                settings.validate()?;
                Ok(WidgetSettings::Single(settings))
            }
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetSettings::Wall(_) => WidgetKind::Wall,
            WidgetSettings::Single(_) => WidgetKind::Single,
        }
    }

    pub fn design_template(&self) -> &'static str {
        match self {
            WidgetSettings::Wall(s) => s.design_template.as_str(),
            WidgetSettings::Single(s) => s.design_template.as_str(),
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            WidgetSettings::Wall(s) => s.theme,
            WidgetSettings::Single(s) => s.theme,
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            WidgetSettings::Wall(s) => s.is_public,
            WidgetSettings::Single(s) => s.is_public,
        }
    }

    pub fn access_control(&self) -> Option<&AccessControl> {
        match self {
            WidgetSettings::Wall(s) => s.access_control.as_ref(),
            WidgetSettings::Single(s) => s.access_control.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wall_settings() {
        let raw = json!({
            "designTemplate": "grid-cards",
            "theme": "dark",
            "itemsToShow": 6,
            "sortOrder": "highest_rating",
            "filter": { "minRating": 4, "hasMedia": true },
            "showAuthor": true
        });

        let settings = WidgetSettings::parse(WidgetKind::Wall, raw).unwrap();
        match settings {
            WidgetSettings::Wall(s) => {
                assert_eq!(s.design_template, WallTemplate::GridCards);
                assert_eq!(s.theme, Theme::Dark);
                assert_eq!(s.items_to_show, Some(6));
                assert_eq!(s.sort_order, Some(SortOrder::HighestRating));
                assert!(s.is_public);
                assert_eq!(s.filter.unwrap().min_rating, Some(4));
            }
            _ => panic!("expected wall settings"),
        }
    }

    #[test]
    fn test_wall_rejects_unknown_design_template() {
        let raw = json!({ "designTemplate": "bad-value", "theme": "light" });
        assert!(WidgetSettings::parse(WidgetKind::Wall, raw).is_err());
    }

    #[test]
    fn test_wall_rejects_items_out_of_range() {
        for n in [0, 51] {
            let raw = json!({
                "designTemplate": "masonry",
                "theme": "light",
                "itemsToShow": n
            });
            assert!(WidgetSettings::parse(WidgetKind::Wall, raw).is_err());
        }
    }

    #[test]
    fn test_wall_rejects_unknown_sort_order() {
        let raw = json!({
            "designTemplate": "carousel",
            "theme": "minimal",
            "sortOrder": "oldest"
        });
        assert!(WidgetSettings::parse(WidgetKind::Wall, raw).is_err());
    }

    #[test]
    fn test_single_requires_manual_id_for_manual_select() {
        let raw = json!({
            "designTemplate": "hero",
            "theme": "light",
            "selectTestimonial": "manual-select"
        });
        assert!(WidgetSettings::parse(WidgetKind::Single, raw).is_err());

        let raw = json!({
            "designTemplate": "hero",
            "theme": "light",
            "selectTestimonial": "manual-select",
            "manualTestimonialId": "t1"
        });
        assert!(WidgetSettings::parse(WidgetKind::Single, raw).is_ok());
    }

    #[test]
    fn test_single_rejects_missing_selection_method() {
        let raw = json!({ "designTemplate": "card-compact", "theme": "light" });
        assert!(WidgetSettings::parse(WidgetKind::Single, raw).is_err());
    }

    #[test]
    fn test_wall_settings_do_not_parse_as_single() {
        let raw = json!({ "designTemplate": "grid-cards", "theme": "light" });
        assert!(WidgetSettings::parse(WidgetKind::Single, raw).is_err());
    }

    #[test]
    fn test_theme_defaults_to_light() {
        let raw = json!({ "designTemplate": "grid-cards" });
        let settings = WidgetSettings::parse(WidgetKind::Wall, raw).unwrap();
        assert_eq!(settings.theme(), Theme::Light);
    }

    #[test]
    fn test_settings_round_trip() {
        let raw = json!({
            "designTemplate": "quote-overlay",
            "theme": "minimal",
            "selectTestimonial": "auto-random",
            "showDate": true,
            "cta": { "text": "Try it", "url": "https://example.com" }
        });
        let settings = WidgetSettings::parse(WidgetKind::Single, raw).unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["designTemplate"], "quote-overlay");
        assert_eq!(json["selectTestimonial"], "auto-random");
        assert_eq!(json["cta"]["text"], "Try it");
    }
}
