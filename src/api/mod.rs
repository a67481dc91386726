/// API routes and handlers
pub mod dashboard;
pub mod embed;
pub mod links;
pub mod middleware;
pub mod public;
pub mod spaces;
pub mod templates;
pub mod testimonials;
pub mod widgets;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(embed::routes())
        .merge(public::routes())
        .merge(spaces::routes())
        .merge(testimonials::routes())
        .merge(widgets::routes())
        .merge(links::routes())
        .merge(templates::routes())
        .merge(dashboard::routes())
}
