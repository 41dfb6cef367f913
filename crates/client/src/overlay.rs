use std::sync::Arc;

use tracing::debug;

/// Background scrolling of the page behind the overlay.
pub trait ScrollLock: Send + Sync {
    fn set_suppressed(&self, suppressed: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState<T> {
    Closed,
    Open(T),
}

/// Detail view for one item, shown above the list.
pub struct DetailOverlay<T> {
    state: OverlayState<T>,
    scroll: Arc<dyn ScrollLock>,
}

impl<T> DetailOverlay<T> {
    pub fn new(scroll: Arc<dyn ScrollLock>) -> Self {
        DetailOverlay {
            state: OverlayState::Closed,
            scroll,
        }
    }

    /// Show `item`. If already open, the item is swapped in place.
    pub fn open(&mut self, item: T) {
        if matches!(self.state, OverlayState::Closed) {
            self.scroll.set_suppressed(true);
            debug!("Detail overlay opened");
        }
        self.state = OverlayState::Open(item);
    }

    pub fn close(&mut self) {
        if let OverlayState::Open(_) = self.state {
            self.state = OverlayState::Closed;
            self.scroll.set_suppressed(false);
            debug!("Detail overlay closed");
        }
    }

    pub fn state(&self) -> &OverlayState<T> {
        &self.state
    }

    pub fn current(&self) -> Option<&T> {
        match &self.state {
            OverlayState::Open(item) => Some(item),
            OverlayState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingScroll {
        pub calls: Mutex<Vec<bool>>,
    }

    impl ScrollLock for RecordingScroll {
        fn set_suppressed(&self, suppressed: bool) {
            self.calls.lock().push(suppressed);
        }
    }

    fn overlay() -> (DetailOverlay<&'static str>, Arc<RecordingScroll>) {
        let scroll = Arc::new(RecordingScroll::default());
        (DetailOverlay::new(scroll.clone()), scroll)
    }

    #[test]
    fn test_open_then_close_toggles_scroll() {
        let (mut overlay, scroll) = overlay();
        overlay.open("alien");
        assert_eq!(overlay.state(), &OverlayState::Open("alien"));
        overlay.close();
        assert_eq!(overlay.state(), &OverlayState::Closed);
        assert_eq!(*scroll.calls.lock(), vec![true, false]);
    }

    #[test]
    fn test_open_while_open_swaps_item() {
        let (mut overlay, scroll) = overlay();
        overlay.open("alien");
        overlay.open("brazil");
        assert_eq!(overlay.current(), Some(&"brazil"));
        assert_eq!(*scroll.calls.lock(), vec![true]);
    }

    #[test]
    fn test_close_while_closed_is_noop() {
        let (mut overlay, scroll) = overlay();
        overlay.close();
        assert!(!overlay.is_open());
        assert!(scroll.calls.lock().is_empty());
    }
}
