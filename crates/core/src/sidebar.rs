//! Outline sidebar: visibility, persistence, and outline navigation.

use std::collections::HashMap;
use std::sync::LazyLock;

use flipbook_protocol::OutlineBehavior;
use regex::Regex;
use serde::Serialize;

use crate::navigation::PageFlipController;
use crate::outline::OutlineLink;
use crate::viewer::ViewerVariant;
use crate::zoom::ZoomPan;

pub const COLLAPSED: &str = "collapsed";
pub const EXPANDED: &str = "expanded";

/// Delay before the page-turn variants re-measure after a visibility change,
/// matching the sidebar's CSS transition.
pub const RELAYOUT_DELAY_MS: u32 = 350;

#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("BUG: invalid WHITESPACE_RE regex literal"));

/// Persistent string storage (`localStorage` in the browser).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, used when the browser refuses storage access.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }
}

/// `sidebarState__{title}` with whitespace runs collapsed to `_`.
pub fn storage_key(project_title: Option<&str>, variant: ViewerVariant) -> String {
    let suffix = match project_title {
        Some(title) if !title.is_empty() => WHITESPACE_RE.replace_all(title, "_").into_owned(),
        _ => variant.default_storage_suffix().to_owned(),
    };
    format!("sidebarState__{suffix}")
}

/// A visibility change the host has to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarChange {
    pub collapsed: bool,
    /// Re-measure the book this many milliseconds from now.
    pub relayout_after_ms: Option<u32>,
}

/// What the host should do after an outline link click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum NavigateOutcome {
    /// A page turn was requested.
    Turned(u32),
    /// Smooth-scroll to the element with this id.
    ScrollTo(String),
    /// Let the browser follow the link.
    FollowLink,
    /// Unknown page or unusable link; nothing happens.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Sidebar {
    key: String,
    behavior: OutlineBehavior,
    variant: ViewerVariant,
    collapsed: bool,
    /// The next turn-start was requested from the outline.
    outline_navigating: bool,
    accordion_open: bool,
}

impl Sidebar {
    /// Restore the initial visibility.
    ///
    /// Under `fixed` the sidebar always starts expanded and nothing is read
    /// or written. Under `auto_hide` a stored `"collapsed"` wins; otherwise the
    /// sidebar is expanded on desktop and collapsed on narrow viewports.
    pub fn init<S: KeyValueStore + ?Sized>(
        project_title: Option<&str>,
        behavior: OutlineBehavior,
        variant: ViewerVariant,
        viewport_width: f64,
        store: &S,
    ) -> Self {
        let key = storage_key(project_title, variant);
        let collapsed = match behavior {
            OutlineBehavior::Fixed => false,
            OutlineBehavior::AutoHide => {
                if store.get(&key).as_deref() == Some(COLLAPSED) {
                    true
                } else {
                    !variant.is_desktop(viewport_width)
                }
            }
        };
        log::debug!("sidebar: {key} starts {}", if collapsed { COLLAPSED } else { EXPANDED });
        Self {
            key,
            behavior,
            variant,
            collapsed,
            outline_navigating: false,
            accordion_open: false,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn behavior(&self) -> OutlineBehavior {
        self.behavior
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_accordion_open(&self) -> bool {
        self.accordion_open
    }

    /// The toggle button was clicked.
    ///
    /// The double-page viewer pins the sidebar open under `fixed`; the other
    /// variants still toggle for the session without persisting.
    pub fn toggle<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Option<SidebarChange> {
        if self.behavior == OutlineBehavior::Fixed && self.variant == ViewerVariant::DoublePage {
            return None;
        }
        Some(self.set_collapsed(!self.collapsed, store))
    }

    /// Pointer pressed on the page content.
    pub fn on_content_pointer_down<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Option<SidebarChange> {
        self.auto_hide(store)
    }

    /// A click reached the document without being stopped by the sidebar or
    /// its toggle. Only the double-page viewer hides on these.
    pub fn on_document_click<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Option<SidebarChange> {
        if self.variant != ViewerVariant::DoublePage {
            return None;
        }
        self.auto_hide(store)
    }

    /// The page-flip library started a turn.
    ///
    /// Only the double-page viewer hides on a turn. Turns requested from the
    /// outline do not hide the sidebar; the flag is consumed by the first
    /// turn-start after the click.
    pub fn on_turn_start<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Option<SidebarChange> {
        if std::mem::take(&mut self.outline_navigating)
            || self.variant != ViewerVariant::DoublePage
        {
            return None;
        }
        self.auto_hide(store)
    }

    /// An outline link was clicked.
    pub fn navigate<F: PageFlipController + ?Sized>(
        &mut self,
        link: &OutlineLink,
        viewport_width: f64,
        flip: &mut F,
        zoom: &mut ZoomPan,
    ) -> NavigateOutcome {
        match link {
            OutlineLink::Page(page) => {
                if !flip.is_ready() || !flip.has_page(*page) {
                    log::debug!("sidebar: outline page {page} not in book");
                    return NavigateOutcome::Ignored;
                }
                self.outline_navigating = true;
                zoom.reset(flip);
                flip.turn_to(*page);
                NavigateOutcome::Turned(*page)
            }
            OutlineLink::Anchor(id) => {
                if self.variant.is_desktop(viewport_width) {
                    NavigateOutcome::ScrollTo(id.clone())
                } else {
                    NavigateOutcome::FollowLink
                }
            }
            OutlineLink::None => NavigateOutcome::Ignored,
        }
    }

    /// Outline title clicked. Expands or folds the outline list on narrow
    /// page-turn viewports; returns whether anything changed.
    pub fn toggle_accordion(&mut self, viewport_width: f64) -> bool {
        if !self.variant.is_page_turn() || self.variant.is_desktop(viewport_width) {
            return false;
        }
        self.accordion_open = !self.accordion_open;
        true
    }

    fn auto_hide<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Option<SidebarChange> {
        if self.behavior == OutlineBehavior::Fixed || self.collapsed {
            return None;
        }
        Some(self.set_collapsed(true, store))
    }

    fn set_collapsed<S: KeyValueStore + ?Sized>(
        &mut self,
        collapsed: bool,
        store: &mut S,
    ) -> SidebarChange {
        self.collapsed = collapsed;
        if self.behavior == OutlineBehavior::AutoHide {
            store.set(&self.key, if collapsed { COLLAPSED } else { EXPANDED });
        }
        SidebarChange {
            collapsed,
            relayout_after_ms: self.variant.is_page_turn().then_some(RELAYOUT_DELAY_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::fake::FakeFlip;

    fn auto_hide(variant: ViewerVariant, viewport_width: f64, store: &MemoryStore) -> Sidebar {
        Sidebar::init(None, OutlineBehavior::AutoHide, variant, viewport_width, store)
    }

    #[test]
    fn key_from_title() {
        assert_eq!(
            storage_key(Some("My  Big\tBook"), ViewerVariant::SinglePage),
            "sidebarState__My_Big_Book"
        );
        assert_eq!(
            storage_key(None, ViewerVariant::ContinuousScroll),
            "sidebarState__default"
        );
        assert_eq!(
            storage_key(Some(""), ViewerVariant::SinglePage),
            "sidebarState__default_single"
        );
        assert_eq!(
            storage_key(None, ViewerVariant::DoublePage),
            "sidebarState__default_modular"
        );
    }

    #[test]
    fn fixed_ignores_storage_and_never_persists() {
        let mut store = MemoryStore::new();
        store.set("sidebarState__Book", COLLAPSED);
        let mut sidebar = Sidebar::init(
            Some("Book"),
            OutlineBehavior::Fixed,
            ViewerVariant::SinglePage,
            500.0,
            &store,
        );
        assert!(!sidebar.is_collapsed());

        let mut store = MemoryStore::new();
        let change = sidebar.toggle(&mut store).expect("single page still toggles");
        assert!(change.collapsed);
        assert_eq!(store.get("sidebarState__Book"), None);
        sidebar.toggle(&mut store);

        assert_eq!(sidebar.on_content_pointer_down(&mut store), None);
        assert_eq!(sidebar.on_document_click(&mut store), None);
        assert_eq!(sidebar.on_turn_start(&mut store), None);
        assert!(!sidebar.is_collapsed());
    }

    #[test]
    fn fixed_double_page_is_pinned_open() {
        let mut store = MemoryStore::new();
        let mut sidebar = Sidebar::init(
            None,
            OutlineBehavior::Fixed,
            ViewerVariant::DoublePage,
            1200.0,
            &store,
        );
        assert_eq!(sidebar.toggle(&mut store), None);
        assert_eq!(sidebar.on_document_click(&mut store), None);
        assert_eq!(sidebar.on_turn_start(&mut store), None);
        assert!(!sidebar.is_collapsed());
        assert_eq!(store.get("sidebarState__default_modular"), None);
    }

    #[test]
    fn only_double_page_hides_on_turn_and_document_click() {
        let mut store = MemoryStore::new();
        let mut single = Sidebar::init(
            None,
            OutlineBehavior::AutoHide,
            ViewerVariant::SinglePage,
            1200.0,
            &store,
        );
        assert_eq!(single.on_turn_start(&mut store), None);
        assert_eq!(single.on_document_click(&mut store), None);
        assert!(!single.is_collapsed());
        assert!(single.on_content_pointer_down(&mut store).is_some());
        assert!(single.is_collapsed());

        let mut double = Sidebar::init(
            None,
            OutlineBehavior::AutoHide,
            ViewerVariant::DoublePage,
            1200.0,
            &store,
        );
        assert!(double.on_document_click(&mut store).is_some());
    }

    #[test]
    fn auto_hide_defaults_by_viewport() {
        let store = MemoryStore::new();
        let wide = auto_hide(ViewerVariant::SinglePage, 1200.0, &store);
        let narrow = auto_hide(ViewerVariant::SinglePage, 500.0, &store);
        assert!(!wide.is_collapsed());
        assert!(narrow.is_collapsed());
    }

    #[test]
    fn breakpoints_differ_per_variant() {
        let store = MemoryStore::new();
        let scroll = auto_hide(ViewerVariant::ContinuousScroll, 800.0, &store);
        let double = auto_hide(ViewerVariant::DoublePage, 800.0, &store);
        assert!(!scroll.is_collapsed());
        assert!(double.is_collapsed());
    }

    #[test]
    fn stored_collapsed_wins_on_desktop() {
        let mut store = MemoryStore::new();
        store.set("sidebarState__default", COLLAPSED);
        let sidebar = auto_hide(ViewerVariant::ContinuousScroll, 1600.0, &store);
        assert!(sidebar.is_collapsed());
    }

    #[test]
    fn toggle_persists_and_requests_relayout() {
        let mut store = MemoryStore::new();
        let mut sidebar = auto_hide(ViewerVariant::DoublePage, 1200.0, &store);
        let change = sidebar.toggle(&mut store);
        assert_eq!(
            change,
            Some(SidebarChange {
                collapsed: true,
                relayout_after_ms: Some(350)
            })
        );
        assert_eq!(store.get("sidebarState__default_modular").as_deref(), Some(COLLAPSED));
        sidebar.toggle(&mut store);
        assert_eq!(store.get("sidebarState__default_modular").as_deref(), Some(EXPANDED));
    }

    #[test]
    fn scroll_variant_has_no_relayout() {
        let mut store = MemoryStore::new();
        let mut sidebar = auto_hide(ViewerVariant::ContinuousScroll, 1200.0, &store);
        let change = sidebar.on_content_pointer_down(&mut store);
        assert_eq!(
            change,
            Some(SidebarChange {
                collapsed: true,
                relayout_after_ms: None
            })
        );
        assert_eq!(sidebar.on_content_pointer_down(&mut store), None);
    }

    #[test]
    fn outline_turn_does_not_auto_hide() {
        let mut store = MemoryStore::new();
        let mut sidebar = auto_hide(ViewerVariant::DoublePage, 1200.0, &store);
        let mut flip = FakeFlip::ready(10);
        let mut zoom = ZoomPan::new();
        zoom.wheel(-1.0, true, &mut flip);

        let outcome = sidebar.navigate(&OutlineLink::Page(7), 1200.0, &mut flip, &mut zoom);
        assert_eq!(outcome, NavigateOutcome::Turned(7));
        assert_eq!(flip.page, 7);
        assert!(!zoom.is_zoomed());

        assert_eq!(sidebar.on_turn_start(&mut store), None);
        assert!(!sidebar.is_collapsed());
        assert!(sidebar.on_turn_start(&mut store).is_some());
        assert!(sidebar.is_collapsed());
    }

    #[test]
    fn unknown_page_is_ignored() {
        let store = MemoryStore::new();
        let mut sidebar = auto_hide(ViewerVariant::SinglePage, 1200.0, &store);
        let mut flip = FakeFlip::ready(3);
        let mut zoom = ZoomPan::new();
        let outcome = sidebar.navigate(&OutlineLink::Page(9), 1200.0, &mut flip, &mut zoom);
        assert_eq!(outcome, NavigateOutcome::Ignored);
        assert!(flip.turns.is_empty());
    }

    #[test]
    fn anchors_scroll_on_desktop_only() {
        let store = MemoryStore::new();
        let mut sidebar = auto_hide(ViewerVariant::ContinuousScroll, 1200.0, &store);
        let mut flip = FakeFlip::default();
        let mut zoom = ZoomPan::new();
        let link = OutlineLink::Anchor("chapter-2".into());
        assert_eq!(
            sidebar.navigate(&link, 1200.0, &mut flip, &mut zoom),
            NavigateOutcome::ScrollTo("chapter-2".into())
        );
        assert_eq!(
            sidebar.navigate(&link, 600.0, &mut flip, &mut zoom),
            NavigateOutcome::FollowLink
        );
    }

    #[test]
    fn accordion_only_on_narrow_page_turn() {
        let store = MemoryStore::new();
        let mut single = auto_hide(ViewerVariant::SinglePage, 500.0, &store);
        assert!(single.toggle_accordion(500.0));
        assert!(single.is_accordion_open());
        assert!(!single.toggle_accordion(1200.0));

        let mut scroll = auto_hide(ViewerVariant::ContinuousScroll, 500.0, &store);
        assert!(!scroll.toggle_accordion(500.0));
    }
}
