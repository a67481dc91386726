/// Embed bootstrap script
///
/// The per-widget loader a site owner pastes into their page. It injects an
/// iframe pointing at the embed route for the widget and resizes it from
/// `trustimonials-resize` messages posted by the rendered document. The
/// script performs no data fetching of its own.
use crate::db::models::WidgetKind;

/// Body served when the widget is missing or private
pub const NOT_FOUND_BODY: &str = "// Widget not found";

/// Generate the loader script for one widget.
///
/// `base_url` is the externally reachable service URL the iframe loads
/// from (config.service.public_url).
pub fn loader_js(widget_id: &str, kind: WidgetKind, base_url: &str) -> String {
    let widget_type = kind.as_str();
    format!(
        r#"(function() {{
  var widgetId = '{widget_id}';
  var widgetType = '{widget_type}';
  var containerId = 'trustimonials-' + widgetType + '-' + widgetId;
  var container = document.getElementById(containerId);

  if (!container) {{
    console.error('Trustimonials widget container not found: ' + containerId);
    return;
  }}

  var iframe = document.createElement('iframe');
  iframe.src = '{base_url}/embed/' + widgetType + '/' + widgetId;
  iframe.width = '100%';
  iframe.height = '400';
  iframe.frameBorder = '0';
  iframe.loading = 'lazy';
  iframe.style.border = 'none';

  container.appendChild(iframe);

  // Listen for resize messages
  window.addEventListener('message', function(event) {{
    if (event.data.type === 'trustimonials-resize' && event.data.widgetId === widgetId) {{
      iframe.height = event.data.height + 'px';
    }}
  }});
}})();
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_targets_conventional_container() {
        let js = loader_js("abc123", WidgetKind::Wall, "https://widgets.example.com");
        assert!(js.contains("'trustimonials-' + widgetType + '-' + widgetId"));
        assert!(js.contains("var widgetId = 'abc123'"));
        assert!(js.contains("var widgetType = 'wall'"));
    }

    #[test]
    fn test_loader_iframe_points_at_embed_route() {
        let js = loader_js("abc123", WidgetKind::Single, "https://widgets.example.com");
        assert!(js.contains("'https://widgets.example.com/embed/' + widgetType + '/' + widgetId"));
        assert!(js.contains("var widgetType = 'single'"));
    }

    #[test]
    fn test_loader_listens_for_resize_messages() {
        let js = loader_js("abc123", WidgetKind::Wall, "http://localhost:5000");
        assert!(js.contains("trustimonials-resize"));
        assert!(js.contains("iframe.height = event.data.height + 'px'"));
    }

    #[test]
    fn test_loader_degrades_without_container() {
        let js = loader_js("abc123", WidgetKind::Wall, "http://localhost:5000");
        assert!(js.contains("console.error"));
        assert!(js.contains("return;"));
    }
}
