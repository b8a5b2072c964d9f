use serde::{Deserialize, Serialize};

use crate::outline::OutlineItem;

/// Raw `hotspotsData`: page-number keys to arrays of descriptors.
///
/// Kept as untyped JSON so a single malformed descriptor can be dropped
/// without rejecting the whole configuration.
pub type HotspotsData = serde_json::Map<String, serde_json::Value>;

/// The configuration object injected into the page as `window.APP_CONFIG`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub project_title: Option<String>,
    /// Continuous-scroll manifest: fragment URLs in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_to_load: Option<Vec<String>>,
    /// Single-page manifest: fragment URL plus natural page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_data: Option<Vec<PageData>>,
    /// Double-page manifest: page count, fragments at `pages/page-{n}.html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspots_data: Option<HotspotsData>,
    /// Author-supplied script text, injected once at startup without
    /// sandboxing. This is an extension point, not a security boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_popups: Option<String>,
    #[serde(default)]
    pub outline_behavior: OutlineBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_icon_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outline: Vec<OutlineItem>,
}

pub const DEFAULT_CONTROL_ICON_SIZE: u32 = 24;

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn control_icon_size(&self) -> u32 {
        self.control_icon_size
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_CONTROL_ICON_SIZE)
    }

    /// The trusted popup script, if any non-empty one was injected.
    pub fn trusted_script(&self) -> Option<&str> {
        self.js_popups.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// One entry of the single-page manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub url: String,
    pub width: f64,
    pub height: f64,
}

/// Sidebar persistence and visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineBehavior {
    /// Remember the user's choice and collapse on content interaction.
    #[default]
    AutoHide,
    /// Always start expanded; never persist a collapsed state.
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = AppConfig::from_json("{}").unwrap();
        assert!(cfg.project_title.is_none());
        assert_eq!(cfg.outline_behavior, OutlineBehavior::AutoHide);
        assert_eq!(cfg.control_icon_size(), 24);
        assert!(cfg.trusted_script().is_none());
    }

    #[test]
    fn camel_case_fields() {
        let json = r#"{
            "projectTitle": "My Book",
            "pagesData": [{"url": "pages/p1.html", "width": 800, "height": 1131}],
            "hotspotsData": {"1": []},
            "jsPopups": "console.log(1)",
            "outlineBehavior": "fixed",
            "controlIconSize": 32
        }"#;
        let cfg = AppConfig::from_json(json).unwrap();
        assert_eq!(cfg.project_title.as_deref(), Some("My Book"));
        assert_eq!(cfg.outline_behavior, OutlineBehavior::Fixed);
        assert_eq!(cfg.control_icon_size(), 32);
        assert_eq!(cfg.trusted_script(), Some("console.log(1)"));
        let pages = cfg.pages_data.unwrap_or_default();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "pages/p1.html");
        assert!(cfg.hotspots_data.is_some_and(|h| h.contains_key("1")));
    }

    #[test]
    fn unknown_behavior_is_rejected() {
        assert!(AppConfig::from_json(r#"{"outlineBehavior":"sometimes"}"#).is_err());
    }

    #[test]
    fn zero_icon_size_falls_back() {
        let cfg = AppConfig::from_json(r#"{"controlIconSize":0}"#).unwrap();
        assert_eq!(cfg.control_icon_size(), DEFAULT_CONTROL_ICON_SIZE);
    }
}
