/// Entity records shared by the store managers
use crate::error::{ApiError, ApiResult};
use crate::moderation::TestimonialStatus;
use crate::widget::settings::WidgetSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dashboard user (thin record; credential handling lives outside this service)
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub api_token: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ApiError::Validation(format!("Invalid user role: {}", s))),
        }
    }
}

/// Visual theme shared by spaces and widget settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Minimal,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Minimal => "minimal",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "minimal" => Ok(Theme::Minimal),
            _ => Err(ApiError::Validation(format!("Invalid theme: {}", s))),
        }
    }

    /// Query-parameter parse: an unrecognized value falls back to the
    /// default palette rather than failing the embed render.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Theme::Light)
    }
}

/// What a space collects from submitters beyond the testimonial itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraField {
    Name,
    Email,
    Title,
    Social,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionType {
    TextOnly,
    TextAndStar,
    #[default]
    TextAndVideo,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::TextOnly => "text-only",
            CollectionType::TextAndStar => "text-and-star",
            CollectionType::TextAndVideo => "text-and-video",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "text-only" => Ok(CollectionType::TextOnly),
            "text-and-star" => Ok(CollectionType::TextAndStar),
            "text-and-video" => Ok(CollectionType::TextAndVideo),
            _ => Err(ApiError::Validation(format!(
                "Invalid collection type: {}",
                s
            ))),
        }
    }
}

/// A tenant-owned collection configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub header_title: Option<String>,
    pub header_message: Option<String>,
    pub question_list: Vec<String>,
    pub collect_extras: Vec<ExtraField>,
    pub collection_type: CollectionType,
    pub theme: Theme,
    pub button_color: String,
    pub language: String,
    pub auto_translate: bool,
    pub template_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reusable form configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub form_config: serde_json::Value,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub created_by: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Legacy slug-keyed public submission link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLink {
    pub id: String,
    pub owner_id: String,
    pub slug: String,
    pub template_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub uses: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RequestLink {
    /// Whether the link still accepts submissions.
    ///
    /// The check is evaluated before the use counter is incremented, not
    /// atomically with it; concurrent submissions near the max-uses
    /// boundary may both pass. Documented, accepted behavior.
    pub fn is_valid(&self) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(expiry) = self.expiry_date {
            if expiry < Utc::now() {
                return false;
            }
        }
        if let Some(max) = self.max_uses {
            if self.uses >= max {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialKind {
    Video,
    Text,
    Linked,
}

impl TestimonialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestimonialKind::Video => "video",
            TestimonialKind::Text => "text",
            TestimonialKind::Linked => "linked",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "video" => Ok(TestimonialKind::Video),
            "text" => Ok(TestimonialKind::Text),
            "linked" => Ok(TestimonialKind::Linked),
            _ => Err(ApiError::Validation(format!(
                "Invalid testimonial type: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectedVia {
    #[default]
    Link,
    Embed,
    Import,
    Social,
}

impl CollectedVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectedVia::Link => "link",
            CollectedVia::Embed => "embed",
            CollectedVia::Import => "import",
            CollectedVia::Social => "social",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "link" => Ok(CollectedVia::Link),
            "embed" => Ok(CollectedVia::Embed),
            "import" => Ok(CollectedVia::Import),
            "social" => Ok(CollectedVia::Social),
            _ => Err(ApiError::Validation(format!(
                "Invalid collection channel: {}",
                s
            ))),
        }
    }
}

/// One structured answer to a space question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question_index: u32,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
}

/// One piece of feedback attached to a space (or a legacy request link)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub space_id: Option<String>,
    pub kind: TestimonialKind,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub rating: Option<i64>,
    pub collected_via: CollectedVia,
    pub status: TestimonialStatus,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub source_link: Option<String>,
    pub question_responses: Vec<QuestionResponse>,
    pub metadata: serde_json::Value,
}

impl Testimonial {
    /// A displayable testimonial has body text or at least one answered question
    pub fn is_displayable(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
            || !self.question_responses.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Wall,
    Single,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Wall => "wall",
            WidgetKind::Single => "single",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "wall" => Ok(WidgetKind::Wall),
            "single" => Ok(WidgetKind::Single),
            _ => Err(ApiError::Validation(format!("Invalid widget type: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    #[default]
    Active,
    Disabled,
}

impl WidgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetStatus::Active => "active",
            WidgetStatus::Disabled => "disabled",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "active" => Ok(WidgetStatus::Active),
            "disabled" => Ok(WidgetStatus::Disabled),
            _ => Err(ApiError::Validation(format!("Invalid widget status: {}", s))),
        }
    }
}

/// A published, embeddable rendering of a space's approved testimonials
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub space_id: String,
    pub name: String,
    pub kind: WidgetKind,
    pub design_template: String,
    pub settings: WidgetSettings,
    pub status: WidgetStatus,
    pub created_by: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
