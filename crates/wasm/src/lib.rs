mod dom;

use std::collections::HashMap;

use flipbook_core::loader::{self, AspectProbe};
use flipbook_core::media::{MediaAction, MediaDispatch, modal_size};
use flipbook_core::overlay::PendingOverlay;
use flipbook_core::viewer::{BackToTop, ScrollTarget};
use flipbook_core::{
    Anchors, NavButton, PageFlipController, PositioningStrategy, RenderOutcome, Viewer,
    ViewerVariant,
};
use flipbook_protocol::{AppConfig, OverlayLayer, Point, Size};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

pub use dom::PageFlip;
use dom::{BrowserFetcher, BrowserStore, DomPage, ElementSink, Flip, MountedPage};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(feature = "console-logging")]
    {
        console_log::init_with_level(log::Level::Debug).ok();
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

fn parse_variant(variant: &str) -> Result<ViewerVariant, JsError> {
    match variant {
        "scroll" => Ok(ViewerVariant::ContinuousScroll),
        "single" => Ok(ViewerVariant::SinglePage),
        "double" => Ok(ViewerVariant::DoublePage),
        _ => Err(JsError::new(&format!("unknown viewer variant: {variant}"))),
    }
}

/// Look up the elements each feature hangs off.
fn detect_anchors(variant: ViewerVariant) -> Anchors {
    let Some(window) = web_sys::window() else {
        return Anchors::default();
    };
    let Some(document) = window.document() else {
        return Anchors::default();
    };
    let by_id = |id: &str| document.get_element_by_id(id).is_some();
    let global =
        |name: &str| js_sys::Reflect::has(&window, &JsValue::from_str(name)).unwrap_or(false);

    Anchors {
        sidebar_toggle: by_id("sidebar-toggle"),
        sidebar: document.query_selector(".sidebar").ok().flatten().is_some(),
        outline_nav: by_id("outline-nav"),
        content: by_id(match variant {
            ViewerVariant::ContinuousScroll => "content-container",
            ViewerVariant::SinglePage | ViewerVariant::DoublePage => "viewer-container",
        }),
        book: by_id("flipbook"),
        back_to_top: by_id("back-to-top-btn"),
        prev_button: by_id("prev-page"),
        next_button: by_id("next-page"),
        enhancer_root: by_id("enhancer-root"),
        ui_framework: global("React") && global("ReactDOM"),
    }
}

/// One viewer on the page. The page-flip library stays in JS and is passed
/// to every call that may turn, resize or lock it.
#[wasm_bindgen]
pub struct FlipbookViewer {
    viewer: Viewer<BrowserStore>,
    /// Overlays waiting for their page image to decode.
    pending: HashMap<u32, PendingOverlay>,
    /// Attached pixel layers, kept for relayout.
    layers: HashMap<u32, OverlayLayer>,
}

#[wasm_bindgen]
impl FlipbookViewer {
    /// `variant` is `"scroll"`, `"single"` or `"double"`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        variant: &str,
        viewport_width: f64,
    ) -> Result<FlipbookViewer, JsError> {
        let variant = parse_variant(variant)?;
        let viewer = Viewer::from_json(
            config_json,
            variant,
            detect_anchors(variant),
            viewport_width,
            BrowserStore::open(),
        )
        .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            viewer,
            pending: HashMap::new(),
            layers: HashMap::new(),
        })
    }

    #[wasm_bindgen(js_name = outlineHtml)]
    pub fn outline_html(&self) -> String {
        self.viewer.outline_html()
    }

    /// Contents of `jsPopups`, for a `<script>` element.
    #[wasm_bindgen(js_name = trustedScript)]
    pub fn trusted_script(&self) -> Option<String> {
        self.viewer.trusted_script().map(str::to_owned)
    }

    #[wasm_bindgen(js_name = iconStyle)]
    pub fn icon_style(&self) -> String {
        flipbook_core::media::icon_style(self.viewer.config().control_icon_size())
    }

    // --- sidebar ---

    /// `undefined` when the sidebar feature is off.
    #[wasm_bindgen(js_name = sidebarCollapsed)]
    pub fn sidebar_collapsed(&self) -> Option<bool> {
        self.viewer.sidebar().map(|s| s.is_collapsed())
    }

    /// `undefined` when the sidebar is pinned open or the feature is off.
    #[wasm_bindgen(js_name = toggleSidebar)]
    pub fn toggle_sidebar(&mut self) -> Result<Option<String>, JsError> {
        self.viewer.toggle_sidebar().map(|c| to_json(&c)).transpose()
    }

    #[wasm_bindgen(js_name = onContentPointerDown)]
    pub fn on_content_pointer_down(&mut self) -> Result<Option<String>, JsError> {
        self.viewer.on_content_pointer_down().map(|c| to_json(&c)).transpose()
    }

    #[wasm_bindgen(js_name = onDocumentClick)]
    pub fn on_document_click(&mut self) -> Result<Option<String>, JsError> {
        self.viewer.on_document_click().map(|c| to_json(&c)).transpose()
    }

    #[wasm_bindgen(js_name = onTurnStart)]
    pub fn on_turn_start(&mut self) -> Result<Option<String>, JsError> {
        self.viewer.on_turn_start().map(|c| to_json(&c)).transpose()
    }

    #[wasm_bindgen(js_name = onOutlineClick)]
    pub fn on_outline_click(
        &mut self,
        href: Option<String>,
        data_page: Option<String>,
        viewport_width: f64,
        flip: &PageFlip,
    ) -> Result<String, JsError> {
        let outcome = self.viewer.on_outline_click(
            href.as_deref(),
            data_page.as_deref(),
            viewport_width,
            &mut Flip(flip),
        );
        to_json(&outcome)
    }

    #[wasm_bindgen(js_name = toggleAccordion)]
    pub fn toggle_accordion(&mut self, viewport_width: f64) -> bool {
        self.viewer.toggle_accordion(viewport_width)
    }

    // --- zoom and navigation ---

    #[wasm_bindgen(js_name = onWheel)]
    pub fn on_wheel(&mut self, delta_y: f64, inside_book: bool, flip: &PageFlip) -> bool {
        self.viewer.on_wheel(delta_y, inside_book, &mut Flip(flip))
    }

    #[wasm_bindgen(js_name = onPointerDown)]
    pub fn on_pointer_down(&mut self, page_x: f64, page_y: f64) -> bool {
        self.viewer.on_pointer_down(Point::new(page_x, page_y))
    }

    #[wasm_bindgen(js_name = onPointerMove)]
    pub fn on_pointer_move(&mut self, page_x: f64, page_y: f64, flip: &PageFlip) -> bool {
        self.viewer
            .on_pointer_move(Point::new(page_x, page_y), &mut Flip(flip))
    }

    #[wasm_bindgen(js_name = onPointerUp)]
    pub fn on_pointer_up(&mut self) -> bool {
        self.viewer.on_pointer_up()
    }

    /// CSS `transform` for the book element.
    #[wasm_bindgen(js_name = zoomCss)]
    pub fn zoom_css(&self) -> Option<String> {
        self.viewer.zoom_css()
    }

    /// `focus` is the tag name of the focused element, if any.
    #[wasm_bindgen(js_name = onKey)]
    pub fn on_key(&mut self, key: &str, focus: Option<String>, flip: &PageFlip) -> bool {
        self.viewer.on_key(key, focus.as_deref(), &mut Flip(flip))
    }

    /// `direction` is `"prev"` or `"next"`.
    #[wasm_bindgen(js_name = onNavButton)]
    pub fn on_nav_button(&mut self, direction: &str, flip: &PageFlip) -> Result<bool, JsError> {
        let button = match direction {
            "prev" => NavButton::Previous,
            "next" => NavButton::Next,
            _ => return Err(JsError::new(&format!("unknown nav button: {direction}"))),
        };
        Ok(self.viewer.on_nav_button(button, &mut Flip(flip)))
    }

    /// New back-to-top visibility, when it changed.
    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&mut self, offset: f64) -> Option<bool> {
        self.viewer.on_scroll(offset)
    }

    // --- sizing ---

    #[wasm_bindgen(js_name = setAspectRatio)]
    pub fn set_aspect_ratio(&mut self, aspect_hw: f64) {
        self.viewer.set_aspect_ratio(aspect_hw);
    }

    #[wasm_bindgen(js_name = bookSize)]
    pub fn book_size(
        &self,
        container_width: f64,
        container_height: f64,
        viewport_width: f64,
    ) -> Result<Option<String>, JsError> {
        self.viewer
            .book_size(Size::new(container_width, container_height), viewport_width)
            .map(|s| to_json(&s))
            .transpose()
    }

    /// Returns the time (ms) at which `pollResize` should run.
    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&mut self, now_ms: f64) -> Option<f64> {
        self.viewer.on_resize(now_ms as u64).map(|t| t as f64)
    }

    /// The applied size as JSON, with `updateHotspotsAfterMs` set when
    /// `updateHotspots` should run afterwards.
    #[wasm_bindgen(js_name = pollResize)]
    pub fn poll_resize(
        &mut self,
        now_ms: f64,
        container_width: f64,
        container_height: f64,
        viewport_width: f64,
        flip: &PageFlip,
    ) -> Result<Option<String>, JsError> {
        self.viewer
            .poll_resize(
                now_ms as u64,
                Size::new(container_width, container_height),
                viewport_width,
                &mut Flip(flip),
            )
            .map(|outcome| to_json(&outcome))
            .transpose()
    }

    /// A page turn finished. Returns the delay (ms) before `updateHotspots`
    /// should run, or `undefined` when no update is needed.
    #[wasm_bindgen(js_name = onTurned)]
    pub fn on_turned(&self) -> Option<f64> {
        self.viewer.on_turned().map(|ms| ms as f64)
    }

    // --- overlays ---

    /// Attach the hotspot layer for `page` to `element`. Returns
    /// `"rendered"`, `"skipped"` or `"deferred"`; a deferred page finishes in
    /// `imageLoaded`.
    #[wasm_bindgen(js_name = renderPage)]
    pub fn render_page(&mut self, element: &Element, page: u32) -> String {
        if self.pending.remove(&page).is_some() {
            log::debug!("overlay: page {page} re-rendered before its image loaded");
        }
        let mut surface = DomPage::new(element);
        let outcome = match self.viewer.render_page(&mut surface, page) {
            RenderOutcome::Rendered(_) => "rendered",
            RenderOutcome::Skipped(_) => "skipped",
            RenderOutcome::Deferred(pending) => {
                self.pending.insert(page, pending);
                "deferred"
            }
        };
        self.keep_layer(page, surface.attached);
        outcome.to_owned()
    }

    /// The primary image of a deferred page finished loading.
    #[wasm_bindgen(js_name = imageLoaded)]
    pub fn image_loaded(&mut self, element: &Element, page: u32) -> bool {
        let Some(pending) = self.pending.remove(&page) else {
            return false;
        };
        let Some(natural) = dom::natural_image_size(element) else {
            log::warn!("overlay: page {page} image has no natural size");
            return false;
        };
        let mut surface = DomPage::new(element);
        let attached = pending.complete(&mut surface, natural);
        self.keep_layer(page, surface.attached);
        attached
    }

    /// Recompute pixel hotspots of the visible pages inside `book`.
    #[wasm_bindgen(js_name = updateHotspots)]
    pub fn update_hotspots(&mut self, flip: &PageFlip, book: &Element) -> usize {
        let view = Flip(flip).view();
        let mut mounted: Vec<MountedPage<'_>> = self
            .layers
            .iter_mut()
            .filter(|(number, _)| view.contains(*number))
            .filter_map(|(&number, layer)| {
                let element = book
                    .query_selector(&format!(".turn-page[page_num='{number}']"))
                    .ok()
                    .flatten()?
                    .dyn_into()
                    .ok()?;
                Some(MountedPage { number, element, layer })
            })
            .collect();
        let updated = self.viewer.update_hotspots(&view, &mut mounted);
        for page in &mounted {
            page.apply_styles();
        }
        updated
    }

    // --- media ---

    /// Click on hotspot `index` of `page` at viewport position `(x, y)`.
    ///
    /// Returns the dispatch as JSON, with `modalSize` filled in for modal
    /// actions.
    #[wasm_bindgen(js_name = onHotspotClick)]
    pub fn on_hotspot_click(
        &mut self,
        page: u32,
        index: usize,
        x: f64,
        y: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Result<Option<String>, JsError> {
        let Some(dispatch) = self.viewer.on_media_click(page, index, Point::new(x, y)) else {
            log::debug!("media: no action for hotspot {index} on page {page}");
            return Ok(None);
        };

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Reply<'a> {
            #[serde(flatten)]
            dispatch: &'a MediaDispatch,
            modal_size: Option<Size>,
        }
        let viewport = Size::new(viewport_width, viewport_height);
        let modal = match &dispatch.action {
            MediaAction::OpenModal(item) => Some(modal_size(item, viewport)),
            _ => None,
        };
        to_json(&Reply {
            dispatch: &dispatch,
            modal_size: modal,
        })
        .map(Some)
    }

    #[wasm_bindgen(js_name = onAudioStopped)]
    pub fn on_audio_stopped(&mut self) {
        self.viewer.on_audio_stopped();
    }
}

impl FlipbookViewer {
    fn keep_layer(&mut self, page: u32, attached: Option<OverlayLayer>) {
        match attached {
            Some(layer) if self.viewer.overlay().strategy() == PositioningStrategy::Pixel => {
                self.layers.insert(page, layer);
            }
            Some(_) => {}
            None => {
                self.layers.remove(&page);
            }
        }
    }
}

/// `"window"` or `"content"`: what the back-to-top button scrolls.
#[wasm_bindgen(js_name = backToTopTarget)]
pub fn back_to_top_target(viewport_width: f64) -> String {
    match BackToTop::scroll_target(viewport_width) {
        ScrollTarget::Window => "window",
        ScrollTarget::Content => "content",
    }
    .to_owned()
}

#[wasm_bindgen(js_name = formatTime)]
pub fn format_time(seconds: f64) -> String {
    flipbook_core::media::format_time(seconds)
}

/// Page height / width from a decoded probe image, or the default ratio.
#[wasm_bindgen(js_name = aspectRatioFromImage)]
pub fn aspect_ratio_from_image(natural_width: f64, natural_height: f64) -> f64 {
    let size = Size::new(natural_width, natural_height);
    loader::resolve_aspect_ratio(size.is_usable().then_some(size))
}

// --- loading ---

/// Append every `pagesToLoad` fragment to `container` in order. Returns the
/// load report as JSON.
#[wasm_bindgen(js_name = loadScrollPages)]
pub async fn load_scroll_pages(
    config_json: String,
    container: Option<Element>,
) -> Result<String, JsError> {
    let config = AppConfig::from_json(&config_json).map_err(|e| JsError::new(&e.to_string()))?;
    let mut sink = container.map(ElementSink);
    let report =
        loader::load_sequential(config.pages_to_load.as_deref(), &BrowserFetcher, sink.as_mut())
            .await;
    to_json(&report)
}

/// Fetch every `pagesData` fragment before the book is built.
#[wasm_bindgen(js_name = loadSinglePages)]
pub async fn load_single_pages(config_json: String) -> Result<String, JsError> {
    let config = AppConfig::from_json(&config_json).map_err(|e| JsError::new(&e.to_string()))?;
    let pages = config.pages_data.unwrap_or_default();
    let batch = loader::load_batch(&pages, &BrowserFetcher).await;
    to_json(&batch)
}

/// Fetch the pages the flip library reported missing.
#[wasm_bindgen(js_name = loadMissingPages)]
pub async fn load_missing_pages(pages: Vec<u32>) -> Result<String, JsError> {
    let loaded = loader::load_missing(&pages, &BrowserFetcher).await;
    to_json(&loaded)
}

/// URL of the image to measure for the page aspect ratio, or `undefined` to
/// use the default.
#[wasm_bindgen(js_name = probeAspectRatio)]
pub async fn probe_aspect_ratio(total_pages: u32) -> Option<String> {
    match loader::probe_aspect_ratio(total_pages, &BrowserFetcher).await {
        AspectProbe::Image(url) => Some(url),
        AspectProbe::Default => None,
    }
}
