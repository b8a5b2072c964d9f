use std::collections::BTreeMap;

use flipbook_protocol::{HotspotAction, HotspotDescriptor, HotspotsData, Rect};

/// One interactive region on one page, in natural-image pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotRecord {
    /// 1-indexed page this hotspot belongs to.
    pub page_number: u32,
    /// Styling tag (`rect`, `circle`, …). Never affects geometry.
    pub shape: String,
    /// Absolute pixels relative to the page's natural image size.
    pub rect: Rect,
    pub action: HotspotAction,
}

impl HotspotRecord {
    fn from_descriptor(page_number: u32, d: HotspotDescriptor) -> Option<Self> {
        let r = d.rect;
        if !r.is_finite() || r.width < 0.0 || r.height < 0.0 {
            return None;
        }
        Some(Self {
            page_number,
            shape: d.shape,
            rect: r,
            action: HotspotAction {
                href: d.href,
                target: d.target,
                on_click: d.on_click,
                media_type: d.media_type,
                description: d.description,
                popup_width: d.popup_width,
                popup_height: d.popup_height,
                aspect_ratio: d.aspect_ratio,
            },
        })
    }
}

/// Page number → hotspots on that page, in declaration order.
///
/// Built once from configuration and never mutated afterwards. Declaration
/// order is kept so overlapping regions stack deterministically.
#[derive(Debug, Clone, Default)]
pub struct HotspotIndex {
    pages: BTreeMap<u32, Vec<HotspotRecord>>,
}

impl HotspotIndex {
    /// Hotspots for `page`, or an empty slice.
    pub fn for_page(&self, page: u32) -> &[HotspotRecord] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_page(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Pages that carry at least one hotspot, ascending.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Total number of hotspots across all pages.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Build the hotspot index from the raw `hotspotsData` object.
///
/// Returns `None` (no hotspots) when the input is absent or empty or
/// contains nothing usable. Malformed entries are dropped one by
/// one: a bad page key drops that page, a bad descriptor drops only itself.
pub fn build_index(raw: Option<&HotspotsData>) -> Option<HotspotIndex> {
    let raw = raw?;
    let mut pages: BTreeMap<u32, Vec<HotspotRecord>> = BTreeMap::new();

    for (key, value) in raw {
        let Some(page) = parse_page_key(key) else {
            log::warn!("hotspots: ignoring non-page key {key:?}");
            continue;
        };
        let Some(items) = value.as_array() else {
            log::warn!("hotspots: page {page} is not an array, ignoring");
            continue;
        };

        for (i, item) in items.iter().enumerate() {
            let record = serde_json::from_value::<HotspotDescriptor>(item.clone())
                .ok()
                .and_then(|d| HotspotRecord::from_descriptor(page, d));
            match record {
                Some(r) => pages.entry(page).or_default().push(r),
                None => log::warn!("hotspots: dropping malformed descriptor {i} on page {page}"),
            }
        }
    }

    if pages.is_empty() {
        return None;
    }
    log::debug!(
        "hotspots: indexed {} hotspots on {} pages",
        pages.values().map(Vec::len).sum::<usize>(),
        pages.len()
    );
    Some(HotspotIndex { pages })
}

fn parse_page_key(key: &str) -> Option<u32> {
    key.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> HotspotsData {
        match value {
            serde_json::Value::Object(map) => map,
            _ => HotspotsData::new(),
        }
    }

    #[test]
    fn absent_and_empty_input_yield_sentinel() {
        assert!(build_index(None).is_none());
        assert!(build_index(Some(&HotspotsData::new())).is_none());
    }

    #[test]
    fn preserves_declaration_order() {
        let data = raw(json!({
            "2": [
                {"shape": "rect", "href": "a",
                 "rect": {"x": 0, "y": 0, "width": 10, "height": 10}},
                {"shape": "circle", "href": "b",
                 "rect": {"x": 5, "y": 5, "width": 10, "height": 10}}
            ]
        }));
        let index = build_index(Some(&data)).unwrap();
        let hrefs: Vec<_> = index
            .for_page(2)
            .iter()
            .map(|h| h.action.href.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(hrefs, vec!["a", "b"]);
        assert_eq!(index.for_page(2)[1].shape, "circle");
        assert!(index.for_page(1).is_empty());
    }

    #[test]
    fn drops_malformed_entries_individually() {
        let data = raw(json!({
            "1": [
                {"shape": "rect"},
                {"shape": "rect", "rect": {"x": 1, "y": 1, "width": -4, "height": 2}},
                {"shape": "rect", "rect": {"x": 1, "y": 1, "width": 4, "height": 2}}
            ],
            "cover": [{"shape": "rect", "rect": {"x": 0, "y": 0, "width": 1, "height": 1}}],
            "0": [{"shape": "rect", "rect": {"x": 0, "y": 0, "width": 1, "height": 1}}],
            "3": "not a list"
        }));
        let index = build_index(Some(&data)).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.pages().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn all_malformed_is_no_hotspots() {
        let data = raw(json!({ "1": [{"shape": "rect"}], "2": [] }));
        assert!(build_index(Some(&data)).is_none());
    }

    #[test]
    fn page_with_empty_list_has_no_entry() {
        let data = raw(json!({
            "1": [],
            "2": [{"rect": {"x": 0, "y": 0, "width": 1, "height": 1}}]
        }));
        let index = build_index(Some(&data)).unwrap();
        assert!(!index.has_page(1));
        assert!(index.has_page(2));
    }
}
