//! [`TabDom`] over the live browser document.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element, Event, HtmlElement, HtmlOptionElement, HtmlSelectElement, Node};

use super::{DomEvent, DomEventContext, EventHandler, TabDom};
use crate::error::TabsError;
use crate::subscription::Subscription;

#[derive(Clone, Copy, Debug, Default)]
pub struct WebDom;

impl WebDom {
    fn document() -> Option<Document> {
        window().and_then(|w| w.document())
    }

    /// First element matching `selector`.
    pub fn query(&self, selector: &str) -> Result<Element, TabsError> {
        let document = Self::document()
            .ok_or_else(|| TabsError::Dom("window.document is unavailable".to_string()))?;
        document
            .query_selector(selector)
            .map_err(TabsError::dom)?
            .ok_or_else(|| TabsError::ContainerNotFound(selector.to_string()))
    }
}

impl TabDom for WebDom {
    type Element = Element;

    fn anchors(&self, container: &Element) -> Vec<Element> {
        let list = match container.query_selector_all("a") {
            Ok(list) => list,
            Err(err) => {
                log::warn!("tabs: anchor lookup failed: {:?}", err);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        Self::document()?.get_element_by_id(id)
    }

    fn attribute(&self, el: &Element, name: &str) -> Option<String> {
        el.get_attribute(name)
    }

    fn set_attribute(&self, el: &Element, name: &str, value: &str) {
        if let Err(err) = el.set_attribute(name, value) {
            log::warn!("tabs: cannot set {}={:?}: {:?}", name, value, err);
        }
    }

    fn has_class(&self, el: &Element, class: &str) -> bool {
        el.class_list().contains(class)
    }

    fn add_class(&self, el: &Element, class: &str) {
        if let Err(err) = el.class_list().add_1(class) {
            log::warn!("tabs: cannot add class {:?}: {:?}", class, err);
        }
    }

    fn remove_class(&self, el: &Element, class: &str) {
        if let Err(err) = el.class_list().remove_1(class) {
            log::warn!("tabs: cannot remove class {:?}: {:?}", class, err);
        }
    }

    fn set_visible(&self, el: &Element, visible: bool) {
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = html.style();
        let result = if visible {
            // пустой display отдаёт решение CSS
            style.remove_property("display").map(|_| ())
        } else {
            style.set_property("display", "none")
        };
        if let Err(err) = result {
            log::warn!("tabs: cannot toggle visibility: {:?}", err);
        }
    }

    fn text_excluding(&self, el: &Element, marker_class: &str) -> String {
        // Работаем с глубокой копией, живой якорь сохраняет скрытый текст
        let copy = match el.clone_node_with_deep(true).map(|n| n.dyn_into::<Element>()) {
            Ok(Ok(copy)) => copy,
            _ => return el.text_content().unwrap_or_default().trim().to_string(),
        };
        if let Ok(hidden) = copy.query_selector_all(&format!(".{}", marker_class)) {
            for i in 0..hidden.length() {
                if let Some(node) = hidden.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    node.remove();
                }
            }
        }
        copy.text_content().unwrap_or_default().trim().to_string()
    }

    fn create_element(&self, tag: &str) -> Result<Element, TabsError> {
        Self::document()
            .ok_or_else(|| TabsError::Dom("window.document is unavailable".to_string()))?
            .create_element(tag)
            .map_err(TabsError::dom)
    }

    fn set_text(&self, el: &Element, text: &str) {
        el.set_text_content(Some(text));
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), TabsError> {
        parent.append_child(child).map(|_| ()).map_err(TabsError::dom)
    }

    fn wrap(&self, el: &Element, wrapper: &Element) -> Result<(), TabsError> {
        if let Some(parent) = el.parent_node() {
            let anchor: &Node = el.as_ref();
            parent
                .insert_before(wrapper, Some(anchor))
                .map_err(TabsError::dom)?;
        }
        wrapper.append_child(el).map(|_| ()).map_err(TabsError::dom)
    }

    fn value(&self, el: &Element) -> String {
        match el.dyn_ref::<HtmlSelectElement>() {
            Some(select) => select.value(),
            None => el.get_attribute("value").unwrap_or_default(),
        }
    }

    fn set_value(&self, el: &Element, value: &str) {
        match el.dyn_ref::<HtmlSelectElement>() {
            Some(select) => select.set_value(value),
            None => self.set_attribute(el, "value", value),
        }
    }

    fn set_selected(&self, option: &Element, selected: bool) {
        if let Some(option) = option.dyn_ref::<HtmlOptionElement>() {
            option.set_selected(selected);
        }
    }

    fn location_hash(&self) -> String {
        window()
            .and_then(|w| w.location().hash().ok())
            .unwrap_or_default()
    }

    fn set_location_hash(&self, hash: &str) {
        if let Some(w) = window() {
            if let Err(err) = w.location().set_hash(hash) {
                log::warn!("tabs: cannot set location hash {:?}: {:?}", hash, err);
            }
        }
    }

    fn listen(
        &self,
        el: &Element,
        event: DomEvent,
        delegate: Option<&str>,
        mut handler: EventHandler<Element>,
    ) -> Result<Subscription, TabsError> {
        let container = el.clone();
        let delegate = delegate.map(str::to_owned);

        let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let matched = match &delegate {
                Some(selector) => match target.closest(selector) {
                    Ok(Some(hit)) => {
                        let node: &Node = hit.as_ref();
                        // сам контейнер и всё, что снаружи, не считаем
                        if container.is_same_node(Some(node)) || !container.contains(Some(node)) {
                            return;
                        }
                        hit
                    }
                    _ => return,
                },
                None => target,
            };
            let mut ctx = DomEventContext::new(matched);
            handler(&mut ctx);
            if ctx.default_prevented() {
                ev.prevent_default();
            }
        });

        el.add_event_listener_with_callback(event.name(), closure.as_ref().unchecked_ref())
            .map_err(TabsError::dom)?;

        let el = el.clone();
        Ok(Subscription::new(move || {
            let _ = el.remove_event_listener_with_callback(event.name(), closure.as_ref().unchecked_ref());
        }))
    }
}
