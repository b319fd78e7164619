//! Screen-size notifications.
//!
//! The controller only cares whether the viewport counts as small, so every
//! source reduces to a two-valued [`ScreenSize`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::window;

use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenSize {
    Small,
    #[default]
    Other,
}

pub type ScreenListener = Box<dyn FnMut(ScreenSize)>;

pub trait ScreenSource {
    fn current(&self) -> ScreenSize;

    /// Register `listener` for future changes. It is not called with the
    /// current size.
    fn subscribe(&self, listener: ScreenListener) -> Subscription;
}

/// Classify a viewport width in CSS pixels.
pub fn classify(width: f64, small_max_width: u32) -> ScreenSize {
    if width <= f64::from(small_max_width) {
        ScreenSize::Small
    } else {
        ScreenSize::Other
    }
}

/// Window-width breakpoint driven by `resize` events.
#[derive(Debug, Clone, Copy)]
pub struct BreakpointScreen {
    small_max_width: u32,
}

impl BreakpointScreen {
    pub fn new(small_max_width: u32) -> Self {
        Self { small_max_width }
    }

    fn measure(small_max_width: u32) -> ScreenSize {
        window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|width| width.as_f64())
            .map(|width| classify(width, small_max_width))
            .unwrap_or_default()
    }
}

impl ScreenSource for BreakpointScreen {
    fn current(&self) -> ScreenSize {
        Self::measure(self.small_max_width)
    }

    fn subscribe(&self, mut listener: ScreenListener) -> Subscription {
        let Some(win) = window() else {
            return Subscription::new(|| {});
        };
        let small_max_width = self.small_max_width;
        let last = Cell::new(self.current());
        let closure = Closure::<dyn FnMut()>::new(move || {
            let size = Self::measure(small_max_width);
            if size != last.replace(size) {
                listener(size);
            }
        });
        if let Err(err) = win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref()) {
            log::warn!("tabs: cannot listen for resize: {:?}", err);
            return Subscription::new(|| {});
        }
        Subscription::new(move || {
            let _ = win.remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        })
    }
}

type SharedListener = Rc<RefCell<ScreenListener>>;

#[derive(Default)]
struct ManualState {
    size: ScreenSize,
    next_id: u64,
    listeners: Vec<(u64, SharedListener)>,
}

/// Screen source driven by hand, e.g. from an app-level layout signal or a
/// test.
#[derive(Clone, Default)]
pub struct ManualScreen {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScreen {
    pub fn new(size: ScreenSize) -> Self {
        let screen = Self::default();
        screen.state.borrow_mut().size = size;
        screen
    }

    /// Record a new size and notify every listener.
    pub fn set(&self, size: ScreenSize) {
        let listeners: Vec<SharedListener> = {
            let mut state = self.state.borrow_mut();
            state.size = size;
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            (&mut *listener.borrow_mut())(size);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl ScreenSource for ManualScreen {
    fn current(&self) -> ScreenSize {
        self.state.borrow().size
    }

    fn subscribe(&self, listener: ScreenListener) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, Rc::new(RefCell::new(listener))));
            id
        };
        let state: Weak<RefCell<ManualState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().listeners.retain(|(l, _)| *l != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_breakpoint() {
        assert_eq!(classify(320.0, 767), ScreenSize::Small);
        assert_eq!(classify(767.0, 767), ScreenSize::Small);
        assert_eq!(classify(768.0, 767), ScreenSize::Other);
        assert_eq!(classify(1440.0, 767), ScreenSize::Other);
    }

    #[test]
    fn test_manual_screen_notifies_until_unsubscribed() {
        let screen = ManualScreen::new(ScreenSize::Other);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = screen.subscribe(Box::new(move |size| sink.borrow_mut().push(size)));

        screen.set(ScreenSize::Small);
        assert_eq!(screen.current(), ScreenSize::Small);
        drop(sub);
        screen.set(ScreenSize::Other);

        assert_eq!(*seen.borrow(), vec![ScreenSize::Small]);
        assert_eq!(screen.listener_count(), 0);
    }
}
