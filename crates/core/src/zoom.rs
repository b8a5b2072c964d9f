//! Wheel zoom and drag-to-pan on the book element.

use flipbook_protocol::Point;

use crate::navigation::PageFlipController;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 4.0;
pub const ZOOM_FACTOR: f64 = 1.1;

/// The CSS transform applied to the book element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Point,
    pub scale: f64,
}

impl Transform {
    pub fn css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.translate.x, self.translate.y, self.scale
        )
    }
}

/// Zoom and pan state of one viewer.
///
/// Page turning is disabled on the flip controller while zoomed and
/// re-enabled as soon as the scale returns to [`MIN_SCALE`].
#[derive(Debug, Clone)]
pub struct ZoomPan {
    scale: f64,
    pan: Point,
    /// Pointer position minus pan at drag start; `Some` while dragging.
    drag_origin: Option<Point>,
}

impl Default for ZoomPan {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoomPan {
    pub fn new() -> Self {
        Self {
            scale: MIN_SCALE,
            pan: Point::ORIGIN,
            drag_origin: None,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Whether the book is zoomed in (the `zoomable` class is on).
    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_SCALE
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Handle a wheel event. Returns `false` when the event was outside the
    /// book and should be left to the browser.
    pub fn wheel<F: PageFlipController + ?Sized>(
        &mut self,
        delta_y: f64,
        inside_book: bool,
        flip: &mut F,
    ) -> bool {
        if !inside_book {
            return false;
        }
        if delta_y < 0.0 {
            self.scale *= ZOOM_FACTOR;
        } else {
            self.scale /= ZOOM_FACTOR;
        }
        self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        self.apply(flip);
        true
    }

    /// Start panning. Ignored unless zoomed.
    pub fn pointer_down(&mut self, page: Point) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.drag_origin = Some(Point::new(page.x - self.pan.x, page.y - self.pan.y));
        true
    }

    pub fn pointer_move<F: PageFlipController + ?Sized>(
        &mut self,
        page: Point,
        flip: &mut F,
    ) -> bool {
        let Some(origin) = self.drag_origin else {
            return false;
        };
        self.pan = Point::new(page.x - origin.x, page.y - origin.y);
        self.apply(flip);
        true
    }

    pub fn pointer_up(&mut self) -> bool {
        self.drag_origin.take().is_some()
    }

    /// Return to scale 1 with no pan. No-op when not zoomed.
    pub fn reset<F: PageFlipController + ?Sized>(&mut self, flip: &mut F) {
        if self.is_zoomed() {
            self.scale = MIN_SCALE;
            self.pan = Point::ORIGIN;
            self.apply(flip);
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translate: self.pan,
            scale: self.scale,
        }
    }

    pub fn css(&self) -> String {
        self.transform().css()
    }

    fn apply<F: PageFlipController + ?Sized>(&mut self, flip: &mut F) {
        let zoomed = self.scale > MIN_SCALE;
        if !zoomed {
            self.scale = MIN_SCALE;
            self.pan = Point::ORIGIN;
            self.drag_origin = None;
        }
        if flip.is_ready() {
            flip.set_disabled(zoomed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::fake::FakeFlip;

    #[test]
    fn clamped_to_range() {
        let mut zoom = ZoomPan::new();
        let mut flip = FakeFlip::ready(4);
        for _ in 0..50 {
            zoom.wheel(-1.0, true, &mut flip);
        }
        assert_eq!(zoom.scale(), MAX_SCALE);
        for _ in 0..50 {
            zoom.wheel(1.0, true, &mut flip);
        }
        assert_eq!(zoom.scale(), MIN_SCALE);
    }

    #[test]
    fn zooming_disables_turning_and_unzooming_restores() {
        let mut zoom = ZoomPan::new();
        let mut flip = FakeFlip::ready(4);
        zoom.wheel(-100.0, true, &mut flip);
        assert!(zoom.is_zoomed());
        assert!(flip.disabled);

        assert!(zoom.pointer_down(Point::new(10.0, 10.0)));
        zoom.pointer_move(Point::new(40.0, 30.0), &mut flip);
        assert_eq!(zoom.pan(), Point::new(30.0, 20.0));
        assert!(zoom.pointer_up());

        zoom.wheel(100.0, true, &mut flip);
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.pan(), Point::ORIGIN);
        assert!(!flip.disabled);
    }

    #[test]
    fn pan_requires_zoom() {
        let mut zoom = ZoomPan::new();
        let mut flip = FakeFlip::ready(4);
        assert!(!zoom.pointer_down(Point::new(5.0, 5.0)));
        assert!(!zoom.pointer_move(Point::new(50.0, 50.0), &mut flip));
        assert_eq!(zoom.pan(), Point::ORIGIN);
    }

    #[test]
    fn wheel_outside_book_is_ignored() {
        let mut zoom = ZoomPan::new();
        let mut flip = FakeFlip::ready(4);
        assert!(!zoom.wheel(-1.0, false, &mut flip));
        assert_eq!(zoom.scale(), 1.0);
    }

    #[test]
    fn reset_and_css() {
        let mut zoom = ZoomPan::new();
        let mut flip = FakeFlip::ready(4);
        zoom.wheel(-1.0, true, &mut flip);
        zoom.pointer_down(Point::new(0.0, 0.0));
        zoom.pointer_move(Point::new(12.0, -3.0), &mut flip);
        assert!(zoom.css().starts_with("translate(12px, -3px) scale("));

        zoom.reset(&mut flip);
        assert_eq!(zoom.css(), "translate(0px, 0px) scale(1)");
        assert!(!zoom.is_dragging());
        assert!(!flip.disabled);
    }
}
