//! `<select>` fallback shown instead of the anchor row on small screens.
//!
//! Generated markup, inserted as a sibling of the tab container:
//!
//! ```html
//! <span>
//!   <!-- tab container -->
//!   <div class="w-select--tab">
//!     <div class="select select--tab">
//!       <select><option value="#tab-1">Tab 1</option>...</select>
//!     </div>
//!   </div>
//! </span>
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::TabsConfig;
use crate::controller::TabController;
use crate::dom::{DomEvent, DomEventContext, TabDom};
use crate::error::TabsError;
use crate::registry::TabRegistry;
use crate::screen::{ScreenSize, ScreenSource};

pub const OUTER_WRAPPER_CLASS: &str = "w-select--tab";
pub const INNER_WRAPPER_CLASS: &str = "select select--tab";

#[derive(Debug, Clone)]
pub struct ResponsiveDropdown<E> {
    /// Outermost generated element; shown and hidden as a whole.
    pub wrapper: E,
    pub select: E,
}

impl<E: Clone + 'static> ResponsiveDropdown<E> {
    /// Build the select from the registry, one option per entry.
    pub fn build<D: TabDom<Element = E>>(
        dom: &D,
        registry: &TabRegistry<E>,
        config: &TabsConfig,
    ) -> Result<Self, TabsError> {
        let select = dom.create_element("select")?;
        for entry in registry.iter() {
            let option = dom.create_element("option")?;
            dom.set_attribute(&option, "value", &entry.key);
            dom.set_text(&option, &dom.text_excluding(&entry.anchor, &config.a11y_class));
            dom.append_child(&select, &option)?;
            if dom.has_class(&entry.anchor, &config.tab_state) {
                dom.set_selected(&option, true);
            }
        }

        let inner = dom.create_element("div")?;
        dom.set_attribute(&inner, "class", INNER_WRAPPER_CLASS);
        dom.append_child(&inner, &select)?;

        let wrapper = dom.create_element("div")?;
        dom.set_attribute(&wrapper, "class", OUTER_WRAPPER_CLASS);
        dom.append_child(&wrapper, &inner)?;

        Ok(Self { wrapper, select })
    }

    pub fn sync<D: TabDom<Element = E>>(&self, dom: &D, key: &str) {
        dom.set_value(&self.select, key);
    }

    /// Small screens get the select, everything else the anchor row.
    pub fn adjust<D: TabDom<Element = E>>(&self, dom: &D, container: &E, size: ScreenSize) {
        let small = size == ScreenSize::Small;
        dom.set_visible(&self.wrapper, small);
        dom.set_visible(container, !small);
    }
}

/// Build the dropdown next to the controller's container and bind it to the
/// controller and to `screen`.
pub(crate) fn wire<D: TabDom>(
    inner: &Rc<RefCell<TabController<D>>>,
    screen: &dyn ScreenSource,
) -> Result<(), TabsError> {
    let mut controller = inner.borrow_mut();
    let dom = controller.dom().clone();
    let container = controller.container().clone();

    let dropdown = ResponsiveDropdown::build(&dom, controller.registry(), controller.config())?;
    // span держит контейнер и select рядом, в том же месте документа
    let span = dom.create_element("span")?;
    dom.wrap(&container, &span)?;
    dom.append_child(&span, &dropdown.wrapper)?;

    let weak: Weak<RefCell<TabController<D>>> = Rc::downgrade(inner);
    let change = dom.listen(
        &dropdown.select,
        DomEvent::Change,
        None,
        Box::new(move |ctx: &mut DomEventContext<D::Element>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Ok(mut controller) = inner.try_borrow_mut() else {
                log::warn!("tabs: ignoring dropdown change while the controller is busy");
                return;
            };
            let key = controller.dom().value(ctx.target());
            controller.open(&key);
        }),
    )?;

    dropdown.adjust(&dom, &container, screen.current());

    let weak: Weak<RefCell<TabController<D>>> = Rc::downgrade(inner);
    let resize = screen.subscribe(Box::new(move |size| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        match inner.try_borrow() {
            Ok(controller) => controller.adjust_to(size),
            Err(_) => log::warn!("tabs: ignoring screen change while the controller is busy"),
        };
    }));

    controller.install_dropdown(dropdown, [change, resize]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TabsBuilder;
    use crate::dom::{MemoryDom, NodeId};
    use crate::screen::ManualScreen;

    struct Page {
        dom: MemoryDom,
        tabs: NodeId,
        anchors: Vec<NodeId>,
        panels: Vec<NodeId>,
    }

    fn page() -> Page {
        let dom = MemoryDom::new();
        let tabs = dom.element(dom.body(), "div", &[("id", "js-tabs")]);
        let mut anchors = Vec::new();
        let mut panels = Vec::new();
        for (id, label) in [("overview", "Overview"), ("specs", "Specs"), ("reviews", "Reviews")] {
            let href = format!("#{}", id);
            let anchor = dom.element(tabs, "a", &[("href", href.as_str())]);
            dom.set_text(&anchor, label);
            anchors.push(anchor);
        }
        let hint = dom.element(anchors[1], "span", &[("class", "a11y")]);
        dom.set_text(&hint, " (tab)");
        for id in ["overview", "specs", "reviews"] {
            panels.push(dom.element(dom.body(), "div", &[("id", id), ("class", "tab")]));
        }
        Page {
            dom,
            tabs,
            anchors,
            panels,
        }
    }

    fn options(dom: &MemoryDom, select: NodeId) -> Vec<(String, String, bool)> {
        dom.children(select)
            .into_iter()
            .map(|o| {
                (
                    dom.attribute(&o, "value").unwrap_or_default(),
                    dom.text(o),
                    dom.is_selected(o),
                )
            })
            .collect()
    }

    #[test]
    fn test_build_strips_a11y_text_and_marks_selection() {
        let page = page();
        page.dom.add_class(&page.anchors[2], "is-active");
        let anchors: Vec<(String, NodeId)> = page
            .anchors
            .iter()
            .map(|a| (page.dom.attribute(a, "href").unwrap(), *a))
            .collect();
        let registry = TabRegistry::build(&page.dom, &anchors);

        let dropdown = ResponsiveDropdown::build(&page.dom, &registry, &TabsConfig::default()).unwrap();

        assert_eq!(
            options(&page.dom, dropdown.select),
            vec![
                ("#overview".to_string(), "Overview".to_string(), false),
                ("#specs".to_string(), "Specs".to_string(), false),
                ("#reviews".to_string(), "Reviews".to_string(), true),
            ]
        );
        assert_eq!(page.dom.classes(dropdown.wrapper), vec!["w-select--tab"]);
        let inner = page.dom.children(dropdown.wrapper)[0];
        assert_eq!(page.dom.classes(inner), vec!["select", "select--tab"]);
        assert_eq!(page.dom.children(inner), vec![dropdown.select]);
    }

    #[test]
    fn test_dropdown_inserted_as_sibling_of_container() {
        let page = page();
        let screen = ManualScreen::new(ScreenSize::Other);
        let tabs = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .screen(&screen)
            .attach()
            .unwrap();

        let dropdown = tabs.with(|c| c.dropdown().cloned()).flatten().unwrap();
        let span = page.dom.parent(page.tabs).unwrap();
        assert_eq!(page.dom.tag(span), "span");
        assert_eq!(page.dom.children(span), vec![page.tabs, dropdown.wrapper]);
        assert_eq!(page.dom.parent(span), Some(page.dom.body()));
    }

    #[test]
    fn test_screen_size_toggles_dropdown_and_row() {
        let page = page();
        let screen = ManualScreen::new(ScreenSize::Small);
        let tabs = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .screen(&screen)
            .attach()
            .unwrap();
        let dropdown = tabs.with(|c| c.dropdown().cloned()).flatten().unwrap();

        // Applied immediately from the current size.
        assert!(page.dom.is_visible(dropdown.wrapper));
        assert!(!page.dom.is_visible(page.tabs));

        screen.set(ScreenSize::Other);
        assert!(!page.dom.is_visible(dropdown.wrapper));
        assert!(page.dom.is_visible(page.tabs));

        screen.set(ScreenSize::Small);
        assert!(page.dom.is_visible(dropdown.wrapper));
        assert!(!page.dom.is_visible(page.tabs));
    }

    #[test]
    fn test_select_change_opens_tab_and_activation_syncs_select() {
        let page = page();
        let screen = ManualScreen::new(ScreenSize::Small);
        let tabs = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .screen(&screen)
            .attach()
            .unwrap();
        let select = tabs.with(|c| c.dropdown().map(|d| d.select)).flatten().unwrap();
        assert_eq!(page.dom.value(&select), "#overview");

        page.dom.change(select, "#reviews");
        assert_eq!(tabs.active().as_deref(), Some("#reviews"));
        assert!(page.dom.has_class(&page.anchors[2], "is-active"));
        assert!(page.dom.has_class(&page.panels[2], "is-active"));
        assert!(!page.dom.has_class(&page.panels[0], "is-active"));

        page.dom.click(page.anchors[1]);
        assert_eq!(page.dom.value(&select), "#specs");
    }

    #[test]
    fn test_unknown_select_value_is_ignored() {
        let page = page();
        let screen = ManualScreen::new(ScreenSize::Small);
        let tabs = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .screen(&screen)
            .attach()
            .unwrap();
        let select = tabs.with(|c| c.dropdown().map(|d| d.select)).flatten().unwrap();

        page.dom.change(select, "#nowhere");
        assert_eq!(tabs.active().as_deref(), Some("#overview"));
    }

    #[test]
    fn test_responsive_without_screen_source_fails() {
        let page = page();
        let result = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .attach();
        assert!(matches!(result, Err(TabsError::ScreenSourceUnavailable)));
        // Nothing was touched.
        assert_eq!(page.dom.parent(page.tabs), Some(page.dom.body()));
        assert!(!page.dom.has_class(&page.anchors[0], "is-active"));
    }

    #[test]
    fn test_dropping_tabs_unsubscribes_from_screen() {
        let page = page();
        let screen = ManualScreen::new(ScreenSize::Other);
        let tabs = TabsBuilder::new(page.dom.clone(), page.tabs)
            .config(TabsConfig::default().with_responsive(true))
            .screen(&screen)
            .attach()
            .unwrap();
        assert_eq!(screen.listener_count(), 1);
        assert_eq!(page.dom.listener_count(), 2);

        drop(tabs);
        assert_eq!(screen.listener_count(), 0);
        assert_eq!(page.dom.listener_count(), 0);
        screen.set(ScreenSize::Small);
    }
}
