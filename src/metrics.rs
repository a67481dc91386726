/// Metrics and telemetry
///
/// Prometheus-compatible counters for the public pipeline:
/// - Embed renders by widget type and outcome
/// - Public submissions by channel
/// - Moderation actions

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, Encoder, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Embed documents served, by widget type and outcome
    pub static ref EMBED_RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "embed_renders_total",
        "Total number of embed documents served",
        &["widget_type", "outcome"]
    )
    .unwrap();

    /// Public testimonial submissions, by channel and outcome
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "submissions_total",
        "Total number of public testimonial submissions",
        &["channel", "outcome"]
    )
    .unwrap();

    /// Moderation actions applied
    pub static ref MODERATION_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "moderation_actions_total",
        "Total number of moderation actions applied",
        &["action"]
    )
    .unwrap();
}

/// Render all metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_embed_render(widget_type: &str, outcome: &str) {
    EMBED_RENDERS_TOTAL
        .with_label_values(&[widget_type, outcome])
        .inc();
}

pub fn record_submission(channel: &str, outcome: &str) {
    SUBMISSIONS_TOTAL
        .with_label_values(&[channel, outcome])
        .inc();
}

pub fn record_moderation_action(action: &str) {
    MODERATION_ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_as_text() {
        record_embed_render("wall", "ok");
        record_submission("link", "accepted");
        record_moderation_action("approve");

        let output = render_metrics();
        assert!(output.contains("embed_renders_total"));
        assert!(output.contains("submissions_total"));
        assert!(output.contains("moderation_actions_total"));
    }
}
