//! Browser implementations of the core host traits.

use flipbook_core::html::{LAYER_CLASS, LAYER_HOTSPOT_SELECTOR, render_overlay_layer};
use flipbook_core::overlay::ImageState;
use flipbook_core::{
    FetchError, FragmentFetcher, FragmentSink, KeyValueStore, MemoryStore, PageFlipController,
    PageSurface, RenderedPage,
};
use flipbook_protocol::{OverlayLayer, Placement, Size};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlElement, HtmlImageElement};

#[wasm_bindgen]
extern "C" {
    /// Adapter the page script wraps around the page-flip library.
    pub type PageFlip;

    #[wasm_bindgen(method, js_name = isReady)]
    fn js_is_ready(this: &PageFlip) -> bool;
    #[wasm_bindgen(method, js_name = next)]
    fn js_next(this: &PageFlip);
    #[wasm_bindgen(method, js_name = previous)]
    fn js_previous(this: &PageFlip);
    #[wasm_bindgen(method, js_name = turnTo)]
    fn js_turn_to(this: &PageFlip, page: u32);
    #[wasm_bindgen(method, js_name = hasPage)]
    fn js_has_page(this: &PageFlip, page: u32) -> bool;
    #[wasm_bindgen(method, js_name = resize)]
    fn js_resize(this: &PageFlip, width: f64, height: f64);
    #[wasm_bindgen(method, js_name = setDisabled)]
    fn js_set_disabled(this: &PageFlip, disabled: bool);
    #[wasm_bindgen(method, js_name = view)]
    fn js_view(this: &PageFlip) -> js_sys::Array;
}

/// Borrowed [`PageFlip`] seen through the core controller trait.
pub(crate) struct Flip<'a>(pub &'a PageFlip);

impl PageFlipController for Flip<'_> {
    fn is_ready(&self) -> bool {
        self.0.js_is_ready()
    }

    fn next(&mut self) {
        self.0.js_next();
    }

    fn previous(&mut self) {
        self.0.js_previous();
    }

    fn turn_to(&mut self, page: u32) {
        self.0.js_turn_to(page);
    }

    fn has_page(&self, page: u32) -> bool {
        self.0.js_has_page(page)
    }

    fn resize(&mut self, size: Size) {
        self.0.js_resize(size.width, size.height);
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.0.js_set_disabled(disabled);
    }

    fn view(&self) -> Vec<u32> {
        self.0
            .js_view()
            .iter()
            .filter_map(|v| JsValue::as_f64(&v))
            .filter(|n| *n >= 0.0)
            .map(|n| n as u32)
            .collect()
    }
}

/// `localStorage`, or process memory when the browser refuses access.
#[derive(Debug)]
pub(crate) enum BrowserStore {
    Local(web_sys::Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn open() -> Self {
        match web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            Some(storage) => Self::Local(storage),
            None => {
                log::warn!("storage: localStorage unavailable, sidebar state will not persist");
                Self::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Local(storage) => storage.get_item(key).ok().flatten(),
            Self::Memory(memory) => memory.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self {
            Self::Local(storage) => {
                if let Err(e) = storage.set_item(key, value) {
                    log::warn!("storage: could not write {key}: {e:?}");
                }
            }
            Self::Memory(memory) => memory.set(key, value),
        }
    }
}

/// `window.fetch` for page fragments.
pub(crate) struct BrowserFetcher;

impl FragmentFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let network = |e: JsValue| FetchError::Network {
            url: url.to_owned(),
            message: format!("{e:?}"),
        };
        let body = |e: JsValue| FetchError::Body {
            url: url.to_owned(),
            message: format!("{e:?}"),
        };

        let window = web_sys::window().ok_or_else(|| network(JsValue::from_str("no window")))?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(network)?;
        if !response.ok() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: response.status(),
            });
        }
        let text = JsFuture::from(response.text().map_err(body)?).await.map_err(body)?;
        text.as_string()
            .ok_or_else(|| body(JsValue::from_str("response body is not text")))
    }
}

/// Appends fragments to the end of a container element.
pub(crate) struct ElementSink(pub Element);

impl FragmentSink for ElementSink {
    fn append_html(&mut self, html: &str) {
        if let Err(e) = self.0.insert_adjacent_html("beforeend", html) {
            log::error!("loader: could not insert fragment: {e:?}");
        }
    }
}

/// A page element hotspot layers are attached to.
///
/// Keeps a copy of the last attached layer so pixel placements can be
/// recomputed later.
pub(crate) struct DomPage<'a> {
    element: &'a Element,
    pub attached: Option<OverlayLayer>,
}

impl<'a> DomPage<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self {
            element,
            attached: None,
        }
    }
}

impl PageSurface for DomPage<'_> {
    fn clear_overlay(&mut self) {
        for layer in query_all(self.element, &format!(".{LAYER_CLASS}")) {
            layer.remove();
        }
        self.attached = None;
    }

    fn primary_image(&self) -> Option<ImageState> {
        let img: HtmlImageElement =
            self.element.query_selector("img").ok().flatten()?.dyn_into().ok()?;
        if img.complete() && img.natural_width() > 0 {
            Some(ImageState::Ready(Size::new(
                f64::from(img.natural_width()),
                f64::from(img.natural_height()),
            )))
        } else {
            Some(ImageState::Loading)
        }
    }

    fn container_size(&self) -> Size {
        self.element
            .dyn_ref::<HtmlElement>()
            .map(|e| Size::new(f64::from(e.offset_width()), f64::from(e.offset_height())))
            .unwrap_or_default()
    }

    fn attach_overlay(&mut self, layer: OverlayLayer) {
        if let Err(e) = self
            .element
            .insert_adjacent_html("beforeend", &render_overlay_layer(&layer))
        {
            log::error!(
                "overlay: could not attach layer to page {}: {e:?}",
                layer.page_number
            );
            return;
        }
        self.attached = Some(layer);
    }
}

/// Natural size of the first image in `element`, once it has decoded.
pub(crate) fn natural_image_size(element: &Element) -> Option<Size> {
    let img: HtmlImageElement =
        element.query_selector("img").ok().flatten()?.dyn_into().ok()?;
    let size = Size::new(f64::from(img.natural_width()), f64::from(img.natural_height()));
    size.is_usable().then_some(size)
}

/// A page mounted in the book, paired with its stored pixel layer.
pub(crate) struct MountedPage<'a> {
    pub number: u32,
    pub element: HtmlElement,
    pub layer: &'a mut OverlayLayer,
}

impl RenderedPage for MountedPage<'_> {
    fn page_number(&self) -> u32 {
        self.number
    }

    fn container_size(&self) -> Size {
        Size::new(
            f64::from(self.element.offset_width()),
            f64::from(self.element.offset_height()),
        )
    }

    fn overlay_mut(&mut self) -> Option<&mut OverlayLayer> {
        Some(&mut *self.layer)
    }
}

impl MountedPage<'_> {
    /// Write the current pixel placements to the hotspot elements, in
    /// layer order. Only anchors inside the hotspot layer are touched.
    pub fn apply_styles(&self) {
        let anchors = query_all(&self.element, LAYER_HOTSPOT_SELECTOR);
        for (anchor, element) in anchors.into_iter().zip(&self.layer.elements) {
            let Placement::Pixel { pixels, .. } = element.placement else {
                continue;
            };
            let Ok(anchor) = anchor.dyn_into::<HtmlElement>() else {
                continue;
            };
            let style = anchor.style();
            for (prop, value) in [
                ("left", pixels.x),
                ("top", pixels.y),
                ("width", pixels.width),
                ("height", pixels.height),
            ] {
                if let Err(e) = style.set_property(prop, &format!("{value}px")) {
                    log::warn!("overlay: could not set {prop} on page {}: {e:?}", self.number);
                }
            }
        }
    }
}

pub(crate) fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}
