//! Modal overlay state and the global shortcuts that drive it.
//!
//! The store is never touched from here: opening and closing surfaces is
//! pure presentation state.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// A modal surface stacked over the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Global session search.
    Search,
    /// First-run onboarding wizard.
    Onboarding,
}

/// A key plus modifier state, already normalized by the windowing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    /// Cmd on macOS, Ctrl elsewhere.
    pub primary: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

impl KeyChord {
    /// `Cmd/Ctrl+Shift+F`: open global search.
    pub fn search_palette() -> Self {
        Self {
            key: Key::Char('f'),
            primary: true,
            shift: true,
        }
    }

    /// Bare `Esc`.
    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            primary: false,
            shift: false,
        }
    }
}

struct ControllerInner {
    stack: Mutex<Vec<Overlay>>,
    changes: watch::Sender<u64>,
}

/// Tracks which overlays are open and handles the global shortcuts.
#[derive(Clone)]
pub struct OverlayController {
    inner: Arc<ControllerInner>,
}

impl OverlayController {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(ControllerInner {
                stack: Mutex::new(Vec::new()),
                changes,
            }),
        }
    }

    /// The topmost overlay, if any.
    pub fn current(&self) -> Option<Overlay> {
        self.inner.stack.lock().unwrap().last().copied()
    }

    /// Opens an overlay on top of the stack. Reopening the current top is a
    /// no-op.
    pub fn open(&self, overlay: Overlay) {
        let mut stack = self.inner.stack.lock().unwrap();
        if stack.last() == Some(&overlay) {
            return;
        }
        stack.push(overlay);
        drop(stack);
        self.notify();
    }

    /// Closes the topmost overlay.
    pub fn close_top(&self) -> Option<Overlay> {
        let closed = self.inner.stack.lock().unwrap().pop();
        if closed.is_some() {
            self.notify();
        }
        closed
    }

    /// Routes a global key chord.
    ///
    /// Returns true when the chord was consumed: `Cmd/Ctrl+Shift+F` opens
    /// search while no modal is open, `Esc` closes the topmost surface.
    pub fn handle_key(&self, chord: &KeyChord) -> bool {
        if *chord == KeyChord::escape() {
            return self.close_top().is_some();
        }
        if *chord == KeyChord::search_palette() && self.current().is_none() {
            self.open(Overlay::Search);
            return true;
        }
        false
    }

    /// Subscribes to overlay-stack changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|tick| *tick += 1);
    }
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_shortcut_opens_search() {
        let overlay = OverlayController::new();
        assert!(overlay.handle_key(&KeyChord::search_palette()));
        assert_eq!(overlay.current(), Some(Overlay::Search));
    }

    #[test]
    fn test_search_shortcut_ignored_while_modal_open() {
        let overlay = OverlayController::new();
        overlay.open(Overlay::Onboarding);
        assert!(!overlay.handle_key(&KeyChord::search_palette()));
        assert_eq!(overlay.current(), Some(Overlay::Onboarding));
    }

    #[test]
    fn test_escape_closes_topmost() {
        let overlay = OverlayController::new();
        overlay.open(Overlay::Search);
        assert!(overlay.handle_key(&KeyChord::escape()));
        assert_eq!(overlay.current(), None);
        // nothing left to close
        assert!(!overlay.handle_key(&KeyChord::escape()));
    }

    #[test]
    fn test_unbound_chord_is_not_consumed() {
        let overlay = OverlayController::new();
        let chord = KeyChord {
            key: Key::Char('f'),
            primary: true,
            shift: false,
        };
        assert!(!overlay.handle_key(&chord));
        assert_eq!(overlay.current(), None);
    }
}
