//! Book sizing for the page-turn viewers.

use flipbook_protocol::{PageData, Size};

/// Viewports at or below this width use the narrow single-page layout.
pub const SINGLE_PAGE_NARROW_MAX: f64 = 992.0;

/// Size of a two-page spread inside `container`.
///
/// The spread may use 95 % of the container in each direction. Pages are
/// sized from the available width first and shrunk to the available height
/// if they would not fit. `aspect_hw` is page height / width. The returned
/// width covers both pages.
pub fn double_page_size(container: Size, aspect_hw: f64) -> Size {
    let available_w = container.width * 0.95;
    let available_h = container.height * 0.95;

    let mut page_w = available_w / 2.0;
    let mut page_h = page_w * aspect_hw;
    if page_h > available_h {
        page_h = available_h;
        page_w = page_h / aspect_hw;
    }
    Size::new((page_w * 2.0).floor(), page_h.floor())
}

/// Size of the single-page book.
///
/// Narrow viewports use the full container width. Wider ones use 90 % of
/// the container height, capped at 95 % of its width. The aspect ratio comes
/// from the first manifest entry; without one the book has zero size.
pub fn single_page_size(
    viewport_width: f64,
    container: Size,
    first_page: Option<&PageData>,
) -> Size {
    let Some(aspect_wh) = first_page
        .map(|p| Size::new(p.width, p.height))
        .and_then(|s| s.is_usable().then(|| s.width / s.height))
    else {
        return Size::default();
    };

    let (width, height) = if viewport_width <= SINGLE_PAGE_NARROW_MAX {
        (container.width, container.width / aspect_wh)
    } else {
        let mut h = container.height * 0.9;
        let mut w = h * aspect_wh;
        if w > container.width * 0.95 {
            w = container.width * 0.95;
            h = w / aspect_wh;
        }
        (w, h)
    };
    Size::new(width.floor(), height.floor())
}
