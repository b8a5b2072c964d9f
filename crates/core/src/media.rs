//! Click dispatch for media hotspots: audio playback, the embedded media
//! modal, and popup windows.

use flipbook_protocol::{AspectRatio, HotspotAction, MediaType, Point, Size};
use serde::Serialize;

pub const DEFAULT_POPUP_WIDTH: u32 = 800;
pub const DEFAULT_POPUP_HEIGHT: u32 = 600;

/// Share of the viewport the modal may use when no popup size is given.
pub const MODAL_VIEWPORT_SHARE: f64 = 0.8;

/// Identifies one hotspot: its page and its position in that page's layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HotspotRef {
    pub page: u32,
    pub index: usize,
}

impl HotspotRef {
    pub fn new(page: u32, index: usize) -> Self {
        Self { page, index }
    }
}

/// Everything the modal player needs to show one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalItem {
    pub url: String,
    pub media_type: Option<MediaType>,
    /// Render the video player rather than an image or iframe.
    pub is_video: bool,
    pub description: Option<String>,
    pub popup_width: Option<u32>,
    pub popup_height: Option<u32>,
    pub aspect_ratio: AspectRatio,
    /// Class for the modal content box, e.g. `aspect-ratio-16-9`.
    pub content_class: Option<String>,
    /// Click position the open animation grows from.
    pub origin: Point,
}

impl ModalItem {
    fn from_hotspot(url: &str, hotspot: &HotspotAction, origin: Point) -> Self {
        let aspect_ratio = hotspot.aspect_ratio.unwrap_or_default();
        Self {
            url: url.to_owned(),
            media_type: hotspot.media_type,
            is_video: hotspot.media_type.is_some_and(|m| m.is_video()),
            description: hotspot.description.clone(),
            popup_width: hotspot.popup_width,
            popup_height: hotspot.popup_height,
            content_class: aspect_ratio.css_class(),
            aspect_ratio,
            origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaAction {
    /// Stop whatever is playing and play `url`.
    PlayAudio { url: String },
    /// The clicked audio hotspot was already playing; pause it.
    PauseAudio,
    OpenModal(ModalItem),
    OpenWindow {
        url: String,
        /// `_self` or `_blank`.
        target: &'static str,
        /// `window.open` feature string for `popup` targets.
        features: Option<String>,
    },
}

/// Result of a hotspot click.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDispatch {
    /// Pause the shared audio element before running `action`.
    pub pause_audio: bool,
    pub action: MediaAction,
}

/// Media click state: at most one audio hotspot plays at a time.
///
/// Audio is tracked per hotspot, so two hotspots sharing a URL are distinct.
#[derive(Debug, Clone, Default)]
pub struct MediaPlayer {
    playing: Option<HotspotRef>,
}

impl MediaPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The audio hotspot currently playing.
    pub fn playing(&self) -> Option<HotspotRef> {
        self.playing
    }

    /// Handle a click on media hotspot `at` at `click` (viewport coordinates).
    ///
    /// Returns `None` for hotspots without a URL.
    pub fn dispatch(
        &mut self,
        at: HotspotRef,
        hotspot: &HotspotAction,
        click: Point,
    ) -> Option<MediaDispatch> {
        let url = hotspot.href.as_deref().filter(|u| !u.is_empty())?;
        let was_playing = self.playing.take();
        let pause_audio = was_playing.is_some();

        let action = if hotspot.media_type == Some(MediaType::Audio) {
            if was_playing == Some(at) {
                MediaAction::PauseAudio
            } else {
                self.playing = Some(at);
                MediaAction::PlayAudio { url: url.to_owned() }
            }
        } else if hotspot.target.as_deref() == Some("embed") {
            MediaAction::OpenModal(ModalItem::from_hotspot(url, hotspot, click))
        } else {
            open_window(url, hotspot)
        };
        Some(MediaDispatch {
            pause_audio,
            action,
        })
    }

    /// The audio element paused or ended on its own.
    pub fn on_audio_stopped(&mut self) {
        self.playing = None;
    }
}

fn open_window(url: &str, hotspot: &HotspotAction) -> MediaAction {
    let target = hotspot.target.as_deref();
    let features = (target == Some("popup")).then(|| {
        format!(
            "width={},height={},resizable=yes,scrollbars=yes",
            hotspot.popup_width.unwrap_or(DEFAULT_POPUP_WIDTH),
            hotspot.popup_height.unwrap_or(DEFAULT_POPUP_HEIGHT),
        )
    });
    MediaAction::OpenWindow {
        url: url.to_owned(),
        target: if target == Some("_self") { "_self" } else { "_blank" },
        features,
    }
}

/// Size of the modal player box.
///
/// The bounding box is the popup size if given, otherwise 80 % of the
/// viewport. A fixed aspect ratio is fitted inside it, width first.
pub fn modal_size(item: &ModalItem, viewport: Size) -> Size {
    let max_w = item
        .popup_width
        .map_or(viewport.width * MODAL_VIEWPORT_SHARE, f64::from);
    let max_h = item
        .popup_height
        .map_or(viewport.height * MODAL_VIEWPORT_SHARE, f64::from);

    match item.aspect_ratio {
        AspectRatio::Free => Size::new(max_w, max_h),
        AspectRatio::Fixed { w, h } => {
            let (rw, rh) = (f64::from(w), f64::from(h));
            let mut width = max_w;
            let mut height = width * rh / rw;
            if height > max_h {
                height = max_h;
                width = height * rw / rh;
            }
            Size::new(width, height)
        }
    }
}

/// `m:ss` for the player's time display.
pub fn format_time(seconds: f64) -> String {
    if seconds.is_nan() || seconds < 0.0 {
        return "0:00".into();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Inline style for player control icons.
pub fn icon_style(size: u32) -> String {
    format!("width:{size}px;height:{size}px")
}
