use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// One hotspot as it appears in `hotspotsData`.
///
/// `rect` is in absolute pixels of the page's natural image. The media
/// fields are optional extras used by the popup layer; plain link hotspots
/// carry none of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotDescriptor {
    #[serde(default = "default_shape")]
    pub shape: String,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, rename = "onclick", skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

fn default_shape() -> String {
    "rect".to_string()
}

/// What a hotspot's `href` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Link,
    Video,
    VideoUrl,
    Audio,
    Image,
    Pdf,
}

impl MediaType {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video | Self::VideoUrl)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Video => "video",
            Self::VideoUrl => "video_url",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }
}

/// Popup aspect ratio: `"free"` or `"W:H"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectRatio {
    #[default]
    Free,
    Fixed { w: u32, h: u32 },
}

impl AspectRatio {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "free" {
            return Some(Self::Free);
        }
        let (w, h) = s.split_once(':')?;
        let w: u32 = w.trim().parse().ok()?;
        let h: u32 = h.trim().parse().ok()?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self::Fixed { w, h })
    }

    /// CSS class hook used by the modal, e.g. `aspect-ratio-16-9`.
    pub fn css_class(&self) -> Option<String> {
        match self {
            Self::Free => None,
            Self::Fixed { w, h } => Some(format!("aspect-ratio-{w}-{h}")),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Fixed { w, h } => write!(f, "{w}:{h}"),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AspectRatio::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid aspect ratio: {s}")))
    }
}
