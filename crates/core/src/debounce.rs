/// Resize debounce window of the single-page viewer.
pub const SINGLE_PAGE_RESIZE_MS: u64 = 200;
/// Resize debounce window of the double-page viewer.
pub const DOUBLE_PAGE_RESIZE_MS: u64 = 100;
/// Delay between a resize or turn and the hotspot pixel update.
pub const HOTSPOT_UPDATE_DELAY_MS: u64 = 10;

/// Trailing-edge debouncer driven by the host's clock.
///
/// Every [`trigger`](Self::trigger) pushes the deadline out; [`poll`](Self::poll)
/// fires once when the deadline has passed and then disarms.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    /// Record an event at `now_ms`; returns the new deadline.
    pub fn trigger(&mut self, now_ms: u64) -> u64 {
        let deadline = now_ms.saturating_add(self.window_ms);
        self.deadline = Some(deadline);
        deadline
    }

    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(d) if now_ms >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
