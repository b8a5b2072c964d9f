//! Keyboard and button navigation over the page-flip library.

use flipbook_protocol::Size;

/// The page-flip library, seen from the viewer.
///
/// The host implements this over the real library; every method is a no-op
/// or `false` until the library has been initialized on the book element.
pub trait PageFlipController {
    /// Whether the library has been initialized on the book element.
    fn is_ready(&self) -> bool;
    fn next(&mut self);
    fn previous(&mut self);
    fn turn_to(&mut self, page: u32);
    fn has_page(&self, page: u32) -> bool;
    fn resize(&mut self, size: Size);
    /// Block or allow page turning (used while zoomed).
    fn set_disabled(&mut self, disabled: bool);
    /// Page numbers currently displayed. `0` is the empty side of a cover.
    fn view(&self) -> Vec<u32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavButton {
    Previous,
    Next,
}

impl NavButton {
    pub fn press<F: PageFlipController + ?Sized>(self, flip: &mut F) -> bool {
        if !flip.is_ready() {
            return false;
        }
        match self {
            NavButton::Previous => flip.previous(),
            NavButton::Next => flip.next(),
        }
        true
    }
}

/// Arrow-key page turning.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyboardNavigator;

impl KeyboardNavigator {
    pub fn new() -> Self {
        Self
    }

    /// Handle a `keydown` with the given `key` value while the element with
    /// tag name `focus` has focus. Returns whether a turn was requested.
    pub fn handle_key<F: PageFlipController + ?Sized>(
        &self,
        key: &str,
        focus: Option<&str>,
        flip: &mut F,
    ) -> bool {
        if focus.is_some_and(is_text_entry) {
            return false;
        }
        let button = match key {
            "ArrowLeft" => NavButton::Previous,
            "ArrowRight" => NavButton::Next,
            _ => return false,
        };
        button.press(flip)
    }
}

fn is_text_entry(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("textarea")
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Records every call made on it.
    #[derive(Debug, Default)]
    pub struct FakeFlip {
        pub ready: bool,
        pub page: u32,
        pub pages: u32,
        pub disabled: bool,
        pub size: Option<Size>,
        pub turns: Vec<u32>,
    }

    impl FakeFlip {
        pub fn ready(pages: u32) -> Self {
            Self {
                ready: true,
                page: 1,
                pages,
                ..Default::default()
            }
        }
    }

    impl PageFlipController for FakeFlip {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn next(&mut self) {
            if !self.disabled && self.page < self.pages {
                self.page += 1;
            }
        }

        fn previous(&mut self) {
            if !self.disabled && self.page > 1 {
                self.page -= 1;
            }
        }

        fn turn_to(&mut self, page: u32) {
            self.turns.push(page);
            if !self.disabled && self.has_page(page) {
                self.page = page;
            }
        }

        fn has_page(&self, page: u32) -> bool {
            page >= 1 && page <= self.pages
        }

        fn resize(&mut self, size: Size) {
            self.size = Some(size);
        }

        fn set_disabled(&mut self, disabled: bool) {
            self.disabled = disabled;
        }

        fn view(&self) -> Vec<u32> {
            vec![self.page]
        }
    }
}
