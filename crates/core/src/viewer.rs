//! One flipbook viewer: per-variant policy plus the feature controllers.

use flipbook_protocol::{AppConfig, Point, Size};
use serde::Serialize;
use thiserror::Error;

use crate::debounce::{
    DOUBLE_PAGE_RESIZE_MS, Debouncer, HOTSPOT_UPDATE_DELAY_MS, SINGLE_PAGE_RESIZE_MS,
};
use crate::hotspot::build_index;
use crate::layout::{double_page_size, single_page_size};
use crate::loader::DEFAULT_ASPECT_RATIO;
use crate::media::{HotspotRef, MediaDispatch, MediaPlayer};
use crate::navigation::{KeyboardNavigator, NavButton, PageFlipController};
use crate::outline::{OutlineLink, OutlineLinkStyle, render_outline_with};
use crate::overlay::{
    OverlayEngine, PageSurface, PositioningStrategy, RenderOutcome, RenderedPage, update_hotspots,
};
use crate::sidebar::{KeyValueStore, NavigateOutcome, Sidebar, SidebarChange};
use crate::zoom::ZoomPan;

/// Scroll offset above which the back-to-top button shows.
pub const BACK_TO_TOP_THRESHOLD: f64 = 200.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerVariant {
    /// Pages stacked vertically and appended as they load.
    ContinuousScroll,
    /// One page per view; all fragments fetched before display.
    SinglePage,
    /// Two-page spreads; pages fetched when the flip library asks for them.
    DoublePage,
}

impl ViewerVariant {
    pub fn positioning(self) -> PositioningStrategy {
        match self {
            Self::SinglePage => PositioningStrategy::Pixel,
            Self::ContinuousScroll | Self::DoublePage => PositioningStrategy::Percent,
        }
    }

    /// Viewports strictly wider than this are desktop.
    pub fn breakpoint(self) -> f64 {
        match self {
            Self::ContinuousScroll => 768.0,
            Self::SinglePage | Self::DoublePage => 992.0,
        }
    }

    pub fn is_desktop(self, viewport_width: f64) -> bool {
        viewport_width > self.breakpoint()
    }

    pub fn is_page_turn(self) -> bool {
        !matches!(self, Self::ContinuousScroll)
    }

    pub fn default_storage_suffix(self) -> &'static str {
        match self {
            Self::ContinuousScroll => "default",
            Self::SinglePage => "default_single",
            Self::DoublePage => "default_modular",
        }
    }

    pub fn resize_debounce_ms(self) -> Option<u64> {
        match self {
            Self::ContinuousScroll => None,
            Self::SinglePage => Some(SINGLE_PAGE_RESIZE_MS),
            Self::DoublePage => Some(DOUBLE_PAGE_RESIZE_MS),
        }
    }

    pub fn outline_link_style(self) -> OutlineLinkStyle {
        match self {
            Self::ContinuousScroll => OutlineLinkStyle::HashPrefix("#page-"),
            Self::SinglePage => OutlineLinkStyle::HashPrefix("#page/"),
            Self::DoublePage => OutlineLinkStyle::DataPage,
        }
    }
}

/// Which optional page elements exist. A feature whose anchor is missing is
/// skipped; the others still start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchors {
    pub sidebar_toggle: bool,
    pub sidebar: bool,
    pub outline_nav: bool,
    pub content: bool,
    pub book: bool,
    pub back_to_top: bool,
    pub prev_button: bool,
    pub next_button: bool,
    /// `#enhancer-root` for the media modal.
    pub enhancer_root: bool,
    /// The UI framework the media modal renders with is loaded.
    pub ui_framework: bool,
}

impl Anchors {
    pub fn all() -> Self {
        Self {
            sidebar_toggle: true,
            sidebar: true,
            outline_nav: true,
            content: true,
            book: true,
            back_to_top: true,
            prev_button: true,
            next_button: true,
            enhancer_root: true,
            ui_framework: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Sidebar,
    Zoom,
    Keyboard,
    NavButtons,
    BackToTop,
    MediaPopups,
}

/// A resize that was applied to the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeOutcome {
    pub size: Size,
    /// Run [`Viewer::update_hotspots`] after this many milliseconds, once
    /// the flip library has re-rendered at the new size.
    pub update_hotspots_after_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Window,
    Content,
}

#[derive(Debug, Clone, Default)]
pub struct BackToTop {
    visible: bool,
}

impl BackToTop {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Narrow viewports scroll the window, wider ones the content pane.
    pub fn scroll_target(viewport_width: f64) -> ScrollTarget {
        if ViewerVariant::ContinuousScroll.is_desktop(viewport_width) {
            ScrollTarget::Content
        } else {
            ScrollTarget::Window
        }
    }

    /// Returns the new visibility when it changed.
    pub fn on_scroll(&mut self, offset: f64) -> Option<bool> {
        let visible = offset > BACK_TO_TOP_THRESHOLD;
        (visible != self.visible).then(|| {
            self.visible = visible;
            visible
        })
    }
}

/// State of one viewer instance.
///
/// Owns every controller; the page-flip library is passed in per call since
/// the host owns it.
#[derive(Debug)]
pub struct Viewer<S> {
    config: AppConfig,
    variant: ViewerVariant,
    store: S,
    overlay: OverlayEngine,
    sidebar: Option<Sidebar>,
    zoom: Option<ZoomPan>,
    keyboard: Option<KeyboardNavigator>,
    nav_buttons: bool,
    back_to_top: Option<BackToTop>,
    media: Option<MediaPlayer>,
    resize: Option<Debouncer>,
    aspect_hw: f64,
}

impl<S: KeyValueStore> Viewer<S> {
    pub fn from_json(
        json: &str,
        variant: ViewerVariant,
        anchors: Anchors,
        viewport_width: f64,
        store: S,
    ) -> Result<Self, ConfigError> {
        let config = AppConfig::from_json(json)?;
        Ok(Self::new(config, variant, anchors, viewport_width, store))
    }

    pub fn new(
        config: AppConfig,
        variant: ViewerVariant,
        anchors: Anchors,
        viewport_width: f64,
        store: S,
    ) -> Self {
        let overlay = OverlayEngine::new(
            build_index(config.hotspots_data.as_ref()),
            variant.positioning(),
        );

        let sidebar =
            feature(Feature::Sidebar, anchors.sidebar_toggle && anchors.sidebar).then(|| {
                Sidebar::init(
                    config.project_title.as_deref(),
                    config.outline_behavior,
                    variant,
                    viewport_width,
                    &store,
                )
            });
        let zoom = feature(Feature::Zoom, variant == ViewerVariant::DoublePage && anchors.book)
            .then(ZoomPan::new);
        let keyboard = feature(Feature::Keyboard, variant.is_page_turn() && anchors.book)
            .then(KeyboardNavigator::new);
        let nav_buttons = feature(
            Feature::NavButtons,
            variant == ViewerVariant::SinglePage && anchors.prev_button && anchors.next_button,
        );
        let back_to_top = feature(
            Feature::BackToTop,
            variant == ViewerVariant::ContinuousScroll && anchors.back_to_top,
        )
        .then(BackToTop::default);
        let media = feature(Feature::MediaPopups, anchors.enhancer_root && anchors.ui_framework)
            .then(MediaPlayer::new);

        Self {
            resize: variant.resize_debounce_ms().map(Debouncer::new),
            config,
            variant,
            store,
            overlay,
            sidebar,
            zoom,
            keyboard,
            nav_buttons,
            back_to_top,
            media,
            aspect_hw: DEFAULT_ASPECT_RATIO,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn variant(&self) -> ViewerVariant {
        self.variant
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn overlay(&self) -> &OverlayEngine {
        &self.overlay
    }

    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.sidebar.as_ref()
    }

    pub fn zoom(&self) -> Option<&ZoomPan> {
        self.zoom.as_ref()
    }

    pub fn back_to_top(&self) -> Option<&BackToTop> {
        self.back_to_top.as_ref()
    }

    pub fn media(&self) -> Option<&MediaPlayer> {
        self.media.as_ref()
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Sidebar => self.sidebar.is_some(),
            Feature::Zoom => self.zoom.is_some(),
            Feature::Keyboard => self.keyboard.is_some(),
            Feature::NavButtons => self.nav_buttons,
            Feature::BackToTop => self.back_to_top.is_some(),
            Feature::MediaPopups => self.media.is_some(),
        }
    }

    /// The `jsPopups` payload, to be injected once as script text.
    pub fn trusted_script(&self) -> Option<&str> {
        self.config.trusted_script()
    }

    pub fn outline_html(&self) -> String {
        render_outline_with(&self.config.outline, self.variant.outline_link_style())
    }

    // --- overlays ---

    pub fn render_page<P: PageSurface + ?Sized>(
        &self,
        surface: &mut P,
        page: u32,
    ) -> RenderOutcome {
        self.overlay.render_for_page(surface, page)
    }

    pub fn update_hotspots<P: RenderedPage>(&self, view: &[u32], pages: &mut [P]) -> usize {
        if self.overlay.strategy() != PositioningStrategy::Pixel {
            return 0;
        }
        update_hotspots(view, pages)
    }

    /// Delay before [`update_hotspots`](Self::update_hotspots) should run
    /// after a resize or turn. `None` when placements need no recompute.
    fn hotspot_update_delay(&self) -> Option<u64> {
        (self.overlay.strategy() == PositioningStrategy::Pixel).then_some(HOTSPOT_UPDATE_DELAY_MS)
    }

    /// A page turn finished. Returns when to recompute pixel hotspots.
    pub fn on_turned(&self) -> Option<u64> {
        self.hotspot_update_delay()
    }

    // --- sizing ---

    /// Record the page aspect ratio (height / width) measured by the probe.
    pub fn set_aspect_ratio(&mut self, aspect_hw: f64) {
        if aspect_hw.is_finite() && aspect_hw > 0.0 {
            self.aspect_hw = aspect_hw;
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_hw
    }

    pub fn book_size(&self, container: Size, viewport_width: f64) -> Option<Size> {
        match self.variant {
            ViewerVariant::ContinuousScroll => None,
            ViewerVariant::SinglePage => Some(single_page_size(
                viewport_width,
                container,
                self.config.pages_data.as_deref().and_then(<[_]>::first),
            )),
            ViewerVariant::DoublePage => Some(double_page_size(container, self.aspect_hw)),
        }
    }

    /// A window resize event at `now_ms`. Returns the time the book should
    /// be re-measured.
    pub fn on_resize(&mut self, now_ms: u64) -> Option<u64> {
        self.resize.as_mut().map(|d| d.trigger(now_ms))
    }

    /// Apply a due resize. Returns the new book size when one was applied.
    pub fn poll_resize<F: PageFlipController + ?Sized>(
        &mut self,
        now_ms: u64,
        container: Size,
        viewport_width: f64,
        flip: &mut F,
    ) -> Option<ResizeOutcome> {
        if !self.resize.as_mut().is_some_and(|d| d.poll(now_ms)) || !flip.is_ready() {
            return None;
        }
        let size = self.book_size(container, viewport_width)?;
        flip.resize(size);
        Some(ResizeOutcome {
            size,
            update_hotspots_after_ms: self.hotspot_update_delay(),
        })
    }

    // --- sidebar ---

    pub fn toggle_sidebar(&mut self) -> Option<SidebarChange> {
        let store = &mut self.store;
        self.sidebar.as_mut()?.toggle(store)
    }

    pub fn on_content_pointer_down(&mut self) -> Option<SidebarChange> {
        let store = &mut self.store;
        self.sidebar.as_mut()?.on_content_pointer_down(store)
    }

    pub fn on_document_click(&mut self) -> Option<SidebarChange> {
        let store = &mut self.store;
        self.sidebar.as_mut()?.on_document_click(store)
    }

    pub fn on_turn_start(&mut self) -> Option<SidebarChange> {
        let store = &mut self.store;
        self.sidebar.as_mut()?.on_turn_start(store)
    }

    pub fn on_outline_click<F: PageFlipController + ?Sized>(
        &mut self,
        href: Option<&str>,
        data_page: Option<&str>,
        viewport_width: f64,
        flip: &mut F,
    ) -> NavigateOutcome {
        let Some(sidebar) = self.sidebar.as_mut() else {
            return NavigateOutcome::Ignored;
        };
        let link = OutlineLink::parse(href, data_page);
        // Viewers without zoom still go through the same reset path.
        let mut scratch = ZoomPan::new();
        let zoom = self.zoom.as_mut().unwrap_or(&mut scratch);
        sidebar.navigate(&link, viewport_width, flip, zoom)
    }

    pub fn toggle_accordion(&mut self, viewport_width: f64) -> bool {
        self.sidebar
            .as_mut()
            .is_some_and(|s| s.toggle_accordion(viewport_width))
    }

    // --- zoom ---

    pub fn on_wheel<F: PageFlipController + ?Sized>(
        &mut self,
        delta_y: f64,
        inside_book: bool,
        flip: &mut F,
    ) -> bool {
        self.zoom
            .as_mut()
            .is_some_and(|z| z.wheel(delta_y, inside_book, flip))
    }

    pub fn on_pointer_down(&mut self, page: Point) -> bool {
        self.zoom.as_mut().is_some_and(|z| z.pointer_down(page))
    }

    pub fn on_pointer_move<F: PageFlipController + ?Sized>(
        &mut self,
        page: Point,
        flip: &mut F,
    ) -> bool {
        self.zoom.as_mut().is_some_and(|z| z.pointer_move(page, flip))
    }

    pub fn on_pointer_up(&mut self) -> bool {
        self.zoom.as_mut().is_some_and(ZoomPan::pointer_up)
    }

    pub fn zoom_css(&self) -> Option<String> {
        self.zoom.as_ref().map(ZoomPan::css)
    }

    // --- navigation ---

    pub fn on_key<F: PageFlipController + ?Sized>(
        &mut self,
        key: &str,
        focus: Option<&str>,
        flip: &mut F,
    ) -> bool {
        self.keyboard
            .as_ref()
            .is_some_and(|k| k.handle_key(key, focus, flip))
    }

    pub fn on_nav_button<F: PageFlipController + ?Sized>(
        &mut self,
        button: NavButton,
        flip: &mut F,
    ) -> bool {
        self.nav_buttons && button.press(flip)
    }

    // --- back to top / media ---

    pub fn on_scroll(&mut self, offset: f64) -> Option<bool> {
        self.back_to_top.as_mut()?.on_scroll(offset)
    }

    /// Click on hotspot `index` of `page`, in layer order.
    pub fn on_media_click(
        &mut self,
        page: u32,
        index: usize,
        click: Point,
    ) -> Option<MediaDispatch> {
        let record = self.overlay.index()?.for_page(page).get(index)?;
        self.media
            .as_mut()?
            .dispatch(HotspotRef::new(page, index), &record.action, click)
    }

    pub fn on_audio_stopped(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.on_audio_stopped();
        }
    }
}

fn feature(feature: Feature, anchors_present: bool) -> bool {
    if !anchors_present {
        log::debug!("viewer: {feature:?} skipped, anchor not found");
    }
    anchors_present
}
