use serde::{Deserialize, Serialize};

use crate::hotspot::{AspectRatio, MediaType};
use crate::types::{Rect, Size};

/// A complete overlay layer for one page.
///
/// The core emits one layer per mounted page. Hosts consume it as a whole:
/// a layer replaces any previous layer on the same page element, never
/// merges with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayer {
    pub page_number: u32,
    pub elements: Vec<OverlayElement>,
}

impl OverlayLayer {
    /// Pixel rects of every element inside a container of the given size.
    ///
    /// Percent placements are resolved against `container`; pixel
    /// placements are returned as last computed.
    pub fn resolve(&self, container: Size) -> Vec<Rect> {
        self.elements
            .iter()
            .map(|e| e.placement.resolve(container))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A single clickable hotspot element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayElement {
    pub shape: String,
    pub placement: Placement,
    pub action: HotspotAction,
}

/// How an overlay element is positioned inside its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// CSS percentages of the page box. Resize-proof without recomputation.
    Percent(Rect),
    /// Absolute CSS pixels derived from stored relative percentages and the
    /// container size at the last layout pass.
    Pixel { relative: Rect, pixels: Rect },
}

impl Placement {
    pub fn resolve(&self, container: Size) -> Rect {
        match self {
            Self::Percent(pct) => pct.from_percent_in(container),
            Self::Pixel { pixels, .. } => *pixels,
        }
    }
}

/// Navigation and media attributes carried by an overlay element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HotspotAction {
    pub href: Option<String>,
    pub target: Option<String>,
    pub on_click: Option<String>,
    pub media_type: Option<MediaType>,
    pub description: Option<String>,
    pub popup_width: Option<u32>,
    pub popup_height: Option<u32>,
    pub aspect_ratio: Option<AspectRatio>,
}
