//! Hotspot overlay engine.
//!
//! Turns natural-pixel hotspot rects into overlay layers that stay aligned
//! with the page artwork whatever size the page is rendered at. The viewer
//! variant picks one of two positioning strategies:
//!
//! * [`PositioningStrategy::Percent`]: CSS percentages computed once from the
//!   natural image size. The browser keeps them aligned on resize.
//! * [`PositioningStrategy::Pixel`]: relative percentages stored on each
//!   element, resolved to pixels against the page container when the layer
//!   is attached and again by [`pixel::update_hotspots`] after every resize
//!   and page turn.

pub mod pixel;

use flipbook_protocol::{OverlayElement, OverlayLayer, Placement, Rect, Size};

use crate::hotspot::{HotspotIndex, HotspotRecord};

pub use pixel::{RenderedPage, relayout, update_hotspots};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositioningStrategy {
    Percent,
    Pixel,
}

/// Natural-size state of a page's primary image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageState {
    /// Decoded; natural size known (may still be zero for broken images).
    Ready(Size),
    /// Still loading; natural size not yet available.
    Loading,
}

/// The page element an overlay is mounted on.
///
/// Implemented by the host over the real DOM, and by fakes in tests.
pub trait PageSurface {
    /// Remove every overlay layer currently attached to this page.
    fn clear_overlay(&mut self);

    /// State of the page's primary image, or `None` when it has none.
    fn primary_image(&self) -> Option<ImageState>;

    /// Current rendered size of the page container. Zero before layout.
    fn container_size(&self) -> Size;

    fn attach_overlay(&mut self, layer: OverlayLayer);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoHotspots,
    NoImage,
}

/// Result of [`OverlayEngine::render_for_page`].
#[derive(Debug)]
#[must_use]
pub enum RenderOutcome {
    /// A layer with this many elements was attached.
    Rendered(usize),
    /// Nothing to do; the page was left without an overlay.
    Skipped(SkipReason),
    /// The image is still loading. Complete this from its load event.
    Deferred(PendingOverlay),
}

/// A render waiting for its page image to finish loading.
///
/// [`PendingOverlay::complete`] consumes the value, so a deferred render can
/// run at most once.
#[derive(Debug)]
#[must_use]
pub struct PendingOverlay {
    page_number: u32,
    records: Vec<HotspotRecord>,
    strategy: PositioningStrategy,
}

impl PendingOverlay {
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Finish the render once the image reports its natural size.
    ///
    /// Returns `false` (and attaches nothing) if the image came back with no
    /// usable size.
    pub fn complete<S: PageSurface + ?Sized>(self, surface: &mut S, natural: Size) -> bool {
        let container = surface.container_size();
        let Some(layer) =
            build_layer(self.page_number, &self.records, natural, container, self.strategy)
        else {
            log::debug!(
                "overlay: page {} image loaded without a usable size",
                self.page_number
            );
            return false;
        };
        surface.clear_overlay();
        surface.attach_overlay(layer);
        true
    }
}

/// Owns the hotspot index and the positioning strategy of one viewer.
#[derive(Debug, Clone)]
pub struct OverlayEngine {
    index: Option<HotspotIndex>,
    strategy: PositioningStrategy,
}

impl OverlayEngine {
    pub fn new(index: Option<HotspotIndex>, strategy: PositioningStrategy) -> Self {
        Self { index, strategy }
    }

    pub fn strategy(&self) -> PositioningStrategy {
        self.strategy
    }

    pub fn index(&self) -> Option<&HotspotIndex> {
        self.index.as_ref()
    }

    /// Mount the overlay for `page_number` on `surface`.
    pub fn render_for_page<S: PageSurface + ?Sized>(
        &self,
        surface: &mut S,
        page_number: u32,
    ) -> RenderOutcome {
        render_for_page(surface, page_number, self.index.as_ref(), self.strategy)
    }
}

/// Remove any stale overlay from `surface`, then mount a fresh one.
///
/// Re-rendering a page always replaces its layer; a page without hotspots
/// ends up with no layer at all.
pub fn render_for_page<S: PageSurface + ?Sized>(
    surface: &mut S,
    page_number: u32,
    index: Option<&HotspotIndex>,
    strategy: PositioningStrategy,
) -> RenderOutcome {
    surface.clear_overlay();

    let records = index.map(|i| i.for_page(page_number)).unwrap_or(&[]);
    if records.is_empty() {
        return RenderOutcome::Skipped(SkipReason::NoHotspots);
    }
    let Some(image) = surface.primary_image() else {
        return RenderOutcome::Skipped(SkipReason::NoImage);
    };

    match image {
        ImageState::Ready(natural) if natural.width > 0.0 => {
            let container = surface.container_size();
            match build_layer(page_number, records, natural, container, strategy) {
                Some(layer) => {
                    let n = layer.len();
                    surface.attach_overlay(layer);
                    RenderOutcome::Rendered(n)
                }
                None => defer(page_number, records, strategy),
            }
        }
        // Zero width means the browser has not decoded the image yet.
        ImageState::Ready(_) | ImageState::Loading => defer(page_number, records, strategy),
    }
}

fn defer(
    page_number: u32,
    records: &[HotspotRecord],
    strategy: PositioningStrategy,
) -> RenderOutcome {
    log::debug!("overlay: page {page_number} image not ready, deferring");
    RenderOutcome::Deferred(PendingOverlay {
        page_number,
        records: records.to_vec(),
        strategy,
    })
}

/// Convert records to overlay elements against the natural image size.
///
/// Pixel placements are resolved against `container` right away; a container
/// that has not been laid out yet leaves them at zero until the next
/// [`update_hotspots`] pass.
fn build_layer(
    page_number: u32,
    records: &[HotspotRecord],
    natural: Size,
    container: Size,
    strategy: PositioningStrategy,
) -> Option<OverlayLayer> {
    if records.is_empty() {
        return None;
    }
    let elements = records
        .iter()
        .map(|h| {
            let relative = h.rect.to_percent_of(natural)?;
            let placement = match strategy {
                PositioningStrategy::Percent => Placement::Percent(relative),
                PositioningStrategy::Pixel => Placement::Pixel {
                    relative,
                    pixels: if container.is_usable() {
                        relative.from_percent_in(container)
                    } else {
                        Rect::default()
                    },
                },
            };
            Some(OverlayElement {
                shape: h.shape.clone(),
                placement,
                action: h.action.clone(),
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(OverlayLayer {
        page_number,
        elements,
    })
}
