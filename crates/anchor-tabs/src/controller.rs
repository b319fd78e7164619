//! Tab controller: one active key over a registry of anchors and panels.
//!
//! Construction scans the container, picks the initial tab (marked anchor,
//! else the first one, overridden by the URL fragment when `hash` is on) and
//! binds a delegated click listener. After that only [`TabController::open`]
//! changes state, and it always deactivates before it activates, so callbacks
//! observe exactly one active entry.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::TabsConfig;
use crate::dom::{DomEvent, DomEventContext, TabDom};
use crate::dropdown::{self, ResponsiveDropdown};
use crate::error::TabsError;
use crate::registry::{anchor_key, TabEntry, TabRegistry};
use crate::screen::{ScreenSize, ScreenSource};
use crate::subscription::Subscription;

/// Called after every successful activation.
pub type OnChange<D> = Rc<dyn Fn(&TabController<D>)>;

/// Opens requested from `on_change` that are replayed after the one in
/// progress. Beyond this the callbacks are assumed to ping-pong.
const MAX_CHAINED_OPENS: usize = 16;

/// Part of the state that handles read while the controller is borrowed,
/// i.e. from inside `on_change`.
#[derive(Debug, Default)]
struct Shared {
    active: RefCell<Option<String>>,
    // open(), пришедший во время on_change; выполняется после текущего
    pending: RefCell<Option<String>>,
}

pub struct TabController<D: TabDom> {
    this: Weak<RefCell<TabController<D>>>,
    shared: Rc<Shared>,
    dom: D,
    container: D::Element,
    registry: TabRegistry<D::Element>,
    active: Option<String>,
    config: TabsConfig,
    on_change: Option<OnChange<D>>,
    dropdown: Option<ResponsiveDropdown<D::Element>>,
    subscriptions: Vec<Subscription>,
}

impl<D: TabDom> TabController<D> {
    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn container(&self) -> &D::Element {
        &self.container
    }

    pub fn registry(&self) -> &TabRegistry<D::Element> {
        &self.registry
    }

    pub fn config(&self) -> &TabsConfig {
        &self.config
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.registry.keys()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn dropdown(&self) -> Option<&ResponsiveDropdown<D::Element>> {
        self.dropdown.as_ref()
    }

    /// Non-owning handle to this controller, usable from `on_change`.
    pub fn handle(&self) -> WeakTabs<D> {
        WeakTabs {
            inner: self.this.clone(),
            shared: self.shared.clone(),
        }
    }

    /// Switch to `key`. Ignored when `key` is already active or unknown.
    ///
    /// Opens requested through a handle while this one runs (from
    /// `on_change`) are applied afterwards; of several, the last one wins.
    pub fn open(&mut self, key: &str) {
        self.switch_to(key);
        for _ in 0..MAX_CHAINED_OPENS {
            let next = self.shared.pending.borrow_mut().take();
            let Some(next) = next else {
                return;
            };
            self.switch_to(&next);
        }
        let dropped = self.shared.pending.borrow_mut().take();
        if let Some(key) = dropped {
            log::warn!("tabs: dropping open({}), on_change keeps switching tabs", key);
        }
    }

    fn switch_to(&mut self, key: &str) {
        if self.active.as_deref() == Some(key) || !self.registry.contains(key) {
            return;
        }
        if let Some(previous) = self.active.take() {
            self.deactivate(&previous);
        }
        self.activate(key);
    }

    fn activate(&mut self, key: &str) {
        let Some(entry) = self.registry.get(key).cloned() else {
            return;
        };
        log::debug!("tabs: activate {}", key);

        self.dom.add_class(&entry.anchor, &self.config.tab_state);
        if let Some(target) = &entry.target {
            self.dom.add_class(target, &self.config.target_state);
            self.dom.set_visible(target, true);
        }
        self.active = Some(entry.key.clone());
        *self.shared.active.borrow_mut() = Some(entry.key.clone());

        if self.config.hash {
            self.write_hash(&entry);
        }
        if let Some(dropdown) = &self.dropdown {
            dropdown.sync(&self.dom, key);
        }
        if let Some(on_change) = self.on_change.clone() {
            on_change(self);
        }
    }

    fn deactivate(&self, key: &str) {
        let Some(entry) = self.registry.get(key) else {
            return;
        };
        self.dom.remove_class(&entry.anchor, &self.config.tab_state);
        if let Some(target) = &entry.target {
            self.dom.remove_class(target, &self.config.target_state);
            self.dom.set_visible(target, false);
        }
    }

    /// Write the fragment with the panel's id cleared, so the browser has
    /// nothing to scroll to, then put the id back.
    fn write_hash(&self, entry: &TabEntry<D::Element>) {
        match &entry.target {
            Some(target) => {
                let id = self
                    .dom
                    .attribute(target, "id")
                    .unwrap_or_else(|| entry.key[1..].to_string());
                // без id браузеру некуда прокручивать
                self.dom.set_attribute(target, "id", "");
                self.dom.set_location_hash(&entry.key);
                self.dom.set_attribute(target, "id", &id);
            }
            None => self.dom.set_location_hash(&entry.key),
        }
    }

    pub(crate) fn adjust_to(&self, size: ScreenSize) {
        if let Some(dropdown) = &self.dropdown {
            dropdown.adjust(&self.dom, &self.container, size);
        }
    }

    pub(crate) fn install_dropdown(
        &mut self,
        dropdown: ResponsiveDropdown<D::Element>,
        subscriptions: impl IntoIterator<Item = Subscription>,
    ) {
        self.dropdown = Some(dropdown);
        self.subscriptions.extend(subscriptions);
    }

    /// Initial key from markup, then the URL fragment if enabled. A key
    /// displaced by the fragment is deactivated so its markup class goes.
    fn initial_key(&self, from_markup: Option<String>) -> Option<String> {
        if !self.config.hash {
            return from_markup;
        }
        let hash = self.dom.location_hash();
        match self.registry.find_fragment(&hash) {
            Some(hashed) => {
                if let Some(displaced) = from_markup.as_deref() {
                    self.deactivate(displaced);
                }
                Some(hashed.to_string())
            }
            None => from_markup,
        }
    }
}

impl<D: TabDom> std::fmt::Debug for TabController<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabController")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("config", &self.config)
            .field("responsive", &self.dropdown.is_some())
            .finish()
    }
}

/// Collects what [`TabController`] needs and attaches it to a container.
pub struct TabsBuilder<'a, D: TabDom> {
    dom: D,
    container: D::Element,
    config: TabsConfig,
    on_change: Option<OnChange<D>>,
    screen: Option<&'a dyn ScreenSource>,
}

impl<'a, D: TabDom> TabsBuilder<'a, D> {
    pub fn new(dom: D, container: D::Element) -> Self {
        Self {
            dom,
            container,
            config: TabsConfig::default(),
            on_change: None,
            screen: None,
        }
    }

    pub fn config(mut self, config: TabsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_change(self, callback: impl Fn(&TabController<D>) + 'static) -> Self {
        self.on_change_rc(Rc::new(callback))
    }

    pub fn on_change_rc(mut self, callback: OnChange<D>) -> Self {
        self.on_change = Some(callback);
        self
    }

    /// Screen-size source; required when `responsive` is set.
    pub fn screen(mut self, screen: &'a dyn ScreenSource) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn attach(self) -> Result<Tabs<D>, TabsError> {
        let TabsBuilder {
            dom,
            container,
            config,
            on_change,
            screen,
        } = self;

        let screen = match (config.responsive, screen) {
            (true, None) => return Err(TabsError::ScreenSourceUnavailable),
            (true, Some(screen)) => Some(screen),
            (false, _) => None,
        };

        let anchors: Vec<(String, D::Element)> = dom
            .anchors(&container)
            .into_iter()
            .filter_map(|anchor| match anchor_key(&dom, &anchor) {
                Some(key) => Some((key, anchor)),
                None => {
                    log::warn!("tabs: skipping anchor without a fragment href");
                    None
                }
            })
            .collect();
        let registry = TabRegistry::build(&dom, &anchors);
        let from_markup = anchors
            .iter()
            .find(|(_, anchor)| dom.has_class(anchor, &config.tab_state))
            .or_else(|| anchors.first())
            .map(|(key, _)| key.clone());

        let shared = Rc::new(Shared::default());
        let inner = Rc::new_cyclic(|this| {
            RefCell::new(TabController {
                this: this.clone(),
                shared: shared.clone(),
                dom: dom.clone(),
                container: container.clone(),
                registry,
                active: None,
                config,
                on_change,
                dropdown: None,
                subscriptions: Vec::new(),
            })
        });

        if let Some(screen) = screen {
            dropdown::wire(&inner, screen)?;
        }

        {
            let mut controller = inner.borrow_mut();
            let initial = controller.initial_key(from_markup);
            log::debug!(
                "tabs: attached with {} entries, initial {:?}",
                controller.len(),
                initial
            );
            if let Some(key) = initial {
                controller.open(&key);
            }
        }

        let weak: Weak<RefCell<TabController<D>>> = Rc::downgrade(&inner);
        let click = dom.listen(
            &container,
            DomEvent::Click,
            Some("a"),
            Box::new(move |ctx: &mut DomEventContext<D::Element>| {
                ctx.prevent_default();
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let Ok(mut controller) = inner.try_borrow_mut() else {
                    log::warn!("tabs: ignoring click while the controller is busy");
                    return;
                };
                if let Some(key) = controller.dom.attribute(ctx.target(), "href") {
                    controller.open(&key);
                }
            }),
        )?;
        inner.borrow_mut().subscriptions.push(click);

        Ok(Tabs { inner, shared })
    }
}

/// Open `key` now, or queue it when the controller is mid-change.
fn open_or_defer<D: TabDom>(inner: &RefCell<TabController<D>>, shared: &Shared, key: &str) {
    match inner.try_borrow_mut() {
        Ok(mut controller) => controller.open(key),
        Err(_) => {
            log::debug!("tabs: deferring open({}) until the current change ends", key);
            *shared.pending.borrow_mut() = Some(key.to_string());
        }
    }
}

/// Handle to an attached controller. Dropping the last handle unbinds every
/// listener the controller registered.
///
/// Every method is safe to call from `on_change`: `active` reads a copy kept
/// outside the controller, `open` is deferred and `with` returns `None`.
pub struct Tabs<D: TabDom> {
    inner: Rc<RefCell<TabController<D>>>,
    shared: Rc<Shared>,
}

impl<D: TabDom> Clone for Tabs<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<D: TabDom> Tabs<D> {
    pub fn open(&self, key: &str) {
        open_or_defer(&self.inner, &self.shared, key);
    }

    pub fn active(&self) -> Option<String> {
        self.shared.active.borrow().clone()
    }

    /// Run `f` against the controller; `None` while it is mid-change.
    pub fn with<R>(&self, f: impl FnOnce(&TabController<D>) -> R) -> Option<R> {
        let result = match self.inner.try_borrow() {
            Ok(controller) => f(&controller),
            Err(_) => {
                log::warn!("tabs: controller is busy, use the on_change argument instead");
                return None;
            }
        };
        // open() изнутри f был отложен
        let pending = self.shared.pending.borrow_mut().take();
        if let Some(key) = pending {
            self.open(&key);
        }
        Some(result)
    }

    pub fn downgrade(&self) -> WeakTabs<D> {
        WeakTabs {
            inner: Rc::downgrade(&self.inner),
            shared: self.shared.clone(),
        }
    }
}

/// Handle that does not keep the controller alive.
pub struct WeakTabs<D: TabDom> {
    inner: Weak<RefCell<TabController<D>>>,
    shared: Rc<Shared>,
}

impl<D: TabDom> Clone for WeakTabs<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<D: TabDom> WeakTabs<D> {
    pub fn upgrade(&self) -> Option<Tabs<D>> {
        let inner = self.inner.upgrade()?;
        Some(Tabs {
            inner,
            shared: self.shared.clone(),
        })
    }

    /// Last activated key, kept after the controller is gone.
    pub fn active(&self) -> Option<String> {
        self.shared.active.borrow().clone()
    }

    /// No-op once every [`Tabs`] handle is dropped.
    pub fn open(&self, key: &str) {
        if let Some(inner) = self.inner.upgrade() {
            open_or_defer(&inner, &self.shared, key);
        }
    }
}
