//! The slice of the DOM the tab controller needs.
//!
//! `WebDom` talks to the real document through `web_sys`; `MemoryDom` keeps a
//! small element tree in memory so the controller can be driven from native
//! tests. Outside this crate's tests it needs the `memory-dom` feature.

#[cfg(any(test, feature = "memory-dom"))]
pub mod memory;
pub mod web;

#[cfg(any(test, feature = "memory-dom"))]
pub use memory::{HashWrite, MemoryDom, NodeId};
pub use web::WebDom;

use crate::error::TabsError;
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Click,
    Change,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Click => "click",
            DomEvent::Change => "change",
        }
    }
}

/// What a listener sees of a dispatched event.
#[derive(Debug)]
pub struct DomEventContext<E> {
    target: E,
    default_prevented: bool,
}

impl<E> DomEventContext<E> {
    pub fn new(target: E) -> Self {
        Self {
            target,
            default_prevented: false,
        }
    }

    /// The element the listener matched: the delegate match for delegated
    /// listeners, the event target otherwise.
    pub fn target(&self) -> &E {
        &self.target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub type EventHandler<E> = Box<dyn FnMut(&mut DomEventContext<E>)>;

/// Element access used by the controller and the dropdown.
///
/// Mutations that can't fail in a sane document return `()`; implementations
/// log failures instead of surfacing them.
pub trait TabDom: Clone + 'static {
    type Element: Clone + 'static;

    /// `a` descendants of `container`, in document order.
    fn anchors(&self, container: &Self::Element) -> Vec<Self::Element>;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    fn attribute(&self, el: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&self, el: &Self::Element, name: &str, value: &str);

    fn has_class(&self, el: &Self::Element, class: &str) -> bool;
    fn add_class(&self, el: &Self::Element, class: &str);
    fn remove_class(&self, el: &Self::Element, class: &str);

    /// Show (restore the default display) or hide an element.
    fn set_visible(&self, el: &Self::Element, visible: bool);

    /// Text content of `el`, skipping every descendant carrying `marker_class`.
    fn text_excluding(&self, el: &Self::Element, marker_class: &str) -> String;

    fn create_element(&self, tag: &str) -> Result<Self::Element, TabsError>;
    fn set_text(&self, el: &Self::Element, text: &str);
    fn append_child(&self, parent: &Self::Element, child: &Self::Element) -> Result<(), TabsError>;

    /// Put `wrapper` where `el` is and move `el` inside it.
    fn wrap(&self, el: &Self::Element, wrapper: &Self::Element) -> Result<(), TabsError>;

    /// Current value of a form control.
    fn value(&self, el: &Self::Element) -> String;
    fn set_value(&self, el: &Self::Element, value: &str);
    fn set_selected(&self, option: &Self::Element, selected: bool);

    /// Current URL fragment including the leading `#`, or empty.
    fn location_hash(&self) -> String;
    fn set_location_hash(&self, hash: &str);

    /// Listen for `event` on `el`. With `delegate`, only events coming from a
    /// descendant matching that selector reach `handler`.
    fn listen(
        &self,
        el: &Self::Element,
        event: DomEvent,
        delegate: Option<&str>,
        handler: EventHandler<Self::Element>,
    ) -> Result<Subscription, TabsError>;
}

/// Fragments compare percent-decoded, since `location.hash` encodes what an
/// `href` attribute may carry raw.
pub fn decode_fragment(fragment: &str) -> String {
    urlencoding::decode(fragment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fragment() {
        assert_eq!(decode_fragment("#tab-1"), "#tab-1");
        assert_eq!(decode_fragment("#caf%C3%A9"), "#café");
        assert_eq!(decode_fragment("#%FF"), "#%FF");
    }

    #[test]
    fn test_event_context_prevent_default() {
        let mut ctx = DomEventContext::new(7u32);
        assert!(!ctx.default_prevented());
        ctx.prevent_default();
        assert!(ctx.default_prevented());
        assert_eq!(*ctx.target(), 7);
    }
}
