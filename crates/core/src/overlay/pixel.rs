use flipbook_protocol::{OverlayLayer, Placement, Size};

/// A page currently mounted by the page-flip library.
pub trait RenderedPage {
    fn page_number(&self) -> u32;

    /// Current rendered size of the page container, read fresh on every call.
    fn container_size(&self) -> Size;

    fn overlay_mut(&mut self) -> Option<&mut OverlayLayer>;
}

/// Recompute pixel placements of every page in `view` from its current
/// container size.
///
/// `view` is the list of page numbers the flip library reports as visible.
/// Page `0` stands for the empty half of a cover spread and is skipped, as
/// are pages whose container has no width yet. Returns the number of
/// elements repositioned.
pub fn update_hotspots<P: RenderedPage>(view: &[u32], pages: &mut [P]) -> usize {
    let mut updated = 0;
    for &number in view {
        if number == 0 {
            continue;
        }
        let Some(page) = pages.iter_mut().find(|p| p.page_number() == number) else {
            continue;
        };
        let container = page.container_size();
        if !container.is_usable() {
            continue;
        }
        if let Some(layer) = page.overlay_mut() {
            updated += relayout(layer, container);
        }
    }
    updated
}

/// Resolve the pixel placements of one layer against `container`.
///
/// Percent placements are left untouched; the browser positions those.
pub fn relayout(layer: &mut OverlayLayer, container: Size) -> usize {
    let mut n = 0;
    for element in &mut layer.elements {
        if let Placement::Pixel { relative, pixels } = &mut element.placement {
            *pixels = relative.from_percent_in(container);
            n += 1;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipbook_protocol::{HotspotAction, OverlayElement, Rect};

    struct Page {
        number: u32,
        size: Size,
        layer: Option<OverlayLayer>,
    }

    impl RenderedPage for Page {
        fn page_number(&self) -> u32 {
            self.number
        }

        fn container_size(&self) -> Size {
            self.size
        }

        fn overlay_mut(&mut self) -> Option<&mut OverlayLayer> {
            self.layer.as_mut()
        }
    }

    fn pixel_layer(page: u32) -> OverlayLayer {
        OverlayLayer {
            page_number: page,
            elements: vec![OverlayElement {
                shape: "rect".into(),
                placement: Placement::Pixel {
                    relative: Rect::new(10.0, 20.0, 30.0, 40.0),
                    pixels: Rect::default(),
                },
                action: HotspotAction::default(),
            }],
        }
    }

    fn pixels_of(page: &Page) -> Rect {
        page.layer
            .as_ref()
            .map(|l| l.resolve(page.size)[0])
            .unwrap_or_default()
    }

    #[test]
    fn recomputes_from_current_container() {
        let mut pages = vec![Page {
            number: 3,
            size: Size::new(500.0, 700.0),
            layer: Some(pixel_layer(3)),
        }];
        assert_eq!(update_hotspots(&[3], &mut pages), 1);
        assert_eq!(pixels_of(&pages[0]), Rect::new(50.0, 140.0, 150.0, 280.0));

        pages[0].size = Size::new(1000.0, 1400.0);
        update_hotspots(&[3], &mut pages);
        assert_eq!(pixels_of(&pages[0]), Rect::new(100.0, 280.0, 300.0, 560.0));
    }

    #[test]
    fn skips_cover_placeholder_and_hidden_pages() {
        let mut pages = vec![
            Page {
                number: 1,
                size: Size::new(0.0, 0.0),
                layer: Some(pixel_layer(1)),
            },
            Page {
                number: 2,
                size: Size::new(100.0, 100.0),
                layer: Some(pixel_layer(2)),
            },
        ];
        assert_eq!(update_hotspots(&[0, 1], &mut pages), 0);
        assert_eq!(update_hotspots(&[2, 9], &mut pages), 1);
    }

    #[test]
    fn percent_placements_are_left_alone() {
        let mut layer = OverlayLayer {
            page_number: 1,
            elements: vec![OverlayElement {
                shape: "rect".into(),
                placement: Placement::Percent(Rect::new(1.0, 1.0, 1.0, 1.0)),
                action: HotspotAction::default(),
            }],
        };
        assert_eq!(relayout(&mut layer, Size::new(100.0, 100.0)), 0);
        assert_eq!(
            layer.elements[0].placement,
            Placement::Percent(Rect::new(1.0, 1.0, 1.0, 1.0))
        );
    }
}
