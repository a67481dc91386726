/// Widget pipeline: typed settings, testimonial selection, HTML rendering,
/// and the embed bootstrap script.
pub mod loader;
pub mod render;
pub mod selection;
pub mod settings;
