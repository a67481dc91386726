/// Trustimonials - testimonial collection and embed service
///
/// A multi-tenant backend for collecting, moderating, and embedding
/// customer testimonials: spaces, submission links, a moderation inbox,
/// and embeddable wall/single widgets.

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod metrics;
pub mod moderation;
pub mod rate_limit;
pub mod server;
pub mod store;
pub mod widget;
