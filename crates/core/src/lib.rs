pub mod debounce;
pub mod hotspot;
pub mod html;
pub mod layout;
pub mod loader;
pub mod media;
pub mod navigation;
pub mod outline;
pub mod overlay;
pub mod sidebar;
pub mod viewer;
pub mod zoom;

pub use hotspot::{HotspotIndex, HotspotRecord, build_index};
pub use loader::{FetchError, FragmentFetcher, FragmentSink};
pub use navigation::{KeyboardNavigator, NavButton, PageFlipController};
pub use overlay::{OverlayEngine, PageSurface, PositioningStrategy, RenderOutcome, RenderedPage};
pub use sidebar::{KeyValueStore, MemoryStore, Sidebar};
pub use viewer::{Anchors, ConfigError, ResizeOutcome, Viewer, ViewerVariant};
pub use zoom::ZoomPan;
