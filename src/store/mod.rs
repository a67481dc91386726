/// Store managers: typed access to the six entities over SQLite.
///
/// Each manager owns a pool clone and is constructed once in `AppContext`,
/// then injected into handlers through axum state. Handlers never touch SQL
/// directly, which keeps them testable against an in-memory database.

pub mod links;
pub mod spaces;
pub mod templates;
pub mod testimonials;
pub mod users;
pub mod widgets;

pub use links::RequestLinkStore;
pub use spaces::SpaceStore;
pub use templates::TemplateStore;
pub use testimonials::TestimonialStore;
pub use users::UserStore;
pub use widgets::WidgetStore;

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};

/// Parse an RFC 3339 TEXT column
pub(crate) fn parse_datetime(value: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("Invalid timestamp: {}", e)))
}

/// Parse an optional RFC 3339 TEXT column
pub(crate) fn parse_opt_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
