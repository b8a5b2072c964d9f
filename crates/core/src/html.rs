//! HTML markup for overlay layers.

use flipbook_protocol::{OverlayElement, OverlayLayer, Placement, Rect};

/// Class of the element wrapping a page's hotspot anchors.
pub const LAYER_CLASS: &str = "hotspot-layer";

/// Selects the anchors written by [`render_overlay_layer`] and nothing else a
/// page fragment may contain.
pub const LAYER_HOTSPOT_SELECTOR: &str = ".hotspot-layer .hotspot";

/// Render a layer as `<div class="hotspot-layer">` with one anchor per element.
///
/// Each anchor carries `data-index`, its position in the layer, which is how
/// clicks are mapped back to a hotspot.
pub fn render_overlay_layer(layer: &OverlayLayer) -> String {
    let mut html = String::with_capacity(64 + layer.len() * 160);
    html.push_str(&format!(
        r#"<div class="{LAYER_CLASS}" data-page="{}">"#,
        layer.page_number
    ));
    for (index, element) in layer.elements.iter().enumerate() {
        render_element(&mut html, index, element);
    }
    html.push_str("</div>");
    html
}

fn render_element(html: &mut String, index: usize, element: &OverlayElement) {
    let action = &element.action;
    let mut class = format!("hotspot {}", element.shape);
    if action.media_type.is_some() {
        class.push_str(" enhanced-hotspot");
    }
    html.push_str(&format!(
        r#"<a class="{}" data-index="{index}""#,
        escape(class.trim_end())
    ));

    match element.placement {
        Placement::Percent(pct) => {
            html.push_str(&format!(r#" style="{}""#, css_box(pct, "%")));
        }
        Placement::Pixel { relative, pixels } => {
            html.push_str(&format!(
                r#" data-rel-x="{}" data-rel-y="{}" data-rel-w="{}" data-rel-h="{}" style="{}""#,
                relative.x,
                relative.y,
                relative.width,
                relative.height,
                css_box(pixels, "px"),
            ));
        }
    }

    // Media hotspots are handled by the click dispatcher; plain ones navigate.
    if action.media_type.is_some() {
        attr(html, "data-url", action.href.as_deref());
        attr(html, "data-target", action.target.as_deref());
    } else {
        attr(html, "href", action.href.as_deref());
        attr(html, "target", action.target.as_deref());
    }
    attr(html, "onclick", action.on_click.as_deref());
    attr(html, "data-media-type", action.media_type.map(|m| m.as_str()));
    attr(html, "data-description", action.description.as_deref());
    if let Some(w) = action.popup_width {
        html.push_str(&format!(r#" data-popup-width="{w}""#));
    }
    if let Some(h) = action.popup_height {
        html.push_str(&format!(r#" data-popup-height="{h}""#));
    }
    if let Some(ratio) = &action.aspect_ratio {
        html.push_str(&format!(r#" data-aspect-ratio="{ratio}""#));
    }
    html.push_str("></a>");
}

fn css_box(r: Rect, unit: &str) -> String {
    format!(
        "left:{}{unit};top:{}{unit};width:{}{unit};height:{}{unit}",
        r.x, r.y, r.width, r.height
    )
}

fn attr(html: &mut String, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        html.push_str(&format!(r#" {name}="{}""#, escape(v)));
    }
}

/// Escape text for use in element content or a quoted attribute value.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
