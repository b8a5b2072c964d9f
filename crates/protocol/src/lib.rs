pub mod config;
pub mod hotspot;
pub mod outline;
pub mod overlay;
pub mod types;

pub use config::{AppConfig, HotspotsData, OutlineBehavior, PageData};
pub use hotspot::{AspectRatio, HotspotDescriptor, MediaType};
pub use outline::OutlineItem;
pub use overlay::{HotspotAction, OverlayElement, OverlayLayer, Placement};
pub use types::{Point, Rect, Size};
