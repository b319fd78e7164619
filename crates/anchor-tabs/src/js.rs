//! JS-facing entry point: `attach("#js-tabs", { hash: true, onChange() {} })`.

use std::cell::OnceCell;
use std::rc::Rc;

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::config::TabsConfig;
use crate::controller::{OnChange, TabController, Tabs, TabsBuilder, WeakTabs};
use crate::dom::WebDom;
use crate::error::TabsError;
use crate::screen::BreakpointScreen;

const ON_CHANGE: &str = "onChange";

/// Attached tabs, as seen from JS.
#[wasm_bindgen]
pub struct TabsHandle {
    tabs: Tabs<WebDom>,
}

#[wasm_bindgen]
impl TabsHandle {
    pub fn open(&self, key: &str) {
        self.tabs.open(key);
    }

    pub fn active(&self) -> Option<String> {
        self.tabs.active()
    }

    /// Unbind every listener. Generated markup stays in place.
    pub fn destroy(self) {
        drop(self.tabs);
    }
}

/// `this` of a JS `onChange`. Does not keep the tabs alive.
#[wasm_bindgen]
pub struct TabsContext {
    tabs: WeakTabs<WebDom>,
    container: Element,
}

#[wasm_bindgen]
impl TabsContext {
    #[wasm_bindgen(getter)]
    pub fn active(&self) -> Option<String> {
        self.tabs.active()
    }

    #[wasm_bindgen(getter)]
    pub fn container(&self) -> Element {
        self.container.clone()
    }

    /// Applied after the current change when called from `onChange`.
    pub fn open(&self, key: &str) {
        self.tabs.open(key);
    }
}

/// Bridge a JS callback: called with no arguments and `this` set to a
/// [`TabsContext`] shared by every call.
fn bridge(callback: Function) -> OnChange<WebDom> {
    let context: OnceCell<JsValue> = OnceCell::new();
    Rc::new(move |controller: &TabController<WebDom>| {
        let this = context.get_or_init(|| {
            TabsContext {
                tabs: controller.handle(),
                container: controller.container().clone(),
            }
            .into()
        });
        if let Err(err) = callback.call0(this) {
            log::warn!("tabs: onChange threw: {:?}", err);
        }
    })
}

/// Attach tabs to the first element matching `selector`.
#[wasm_bindgen]
pub fn attach(selector: &str, options: JsValue) -> Result<TabsHandle, JsValue> {
    let container = WebDom.query(selector)?;
    let (config, on_change) = read_options(&options)?;
    let tabs = attach_to(container, config, on_change.map(bridge))?;
    Ok(TabsHandle { tabs })
}

/// Attach to an element already in hand, measuring the screen by window
/// width when `responsive` is set.
pub fn attach_to(
    container: Element,
    config: TabsConfig,
    on_change: Option<OnChange<WebDom>>,
) -> Result<Tabs<WebDom>, TabsError> {
    let screen = BreakpointScreen::new(config.small_max_width);
    let mut builder = TabsBuilder::new(WebDom, container).config(config).screen(&screen);
    if let Some(callback) = on_change {
        builder = builder.on_change_rc(callback);
    }
    builder.attach()
}

/// Split the options object into the serde part and the callback. The
/// callback is removed from a copy first, since functions don't deserialize.
fn read_options(options: &JsValue) -> Result<(TabsConfig, Option<Function>), TabsError> {
    if options.is_undefined() || options.is_null() {
        return Ok((TabsConfig::default(), None));
    }
    let source: &Object = options
        .dyn_ref::<Object>()
        .ok_or_else(|| TabsError::InvalidConfig("options must be an object".to_string()))?;

    let key = JsValue::from_str(ON_CHANGE);
    let on_change = Reflect::get(source, &key)
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());

    let copy = Object::assign(&Object::new(), source);
    Reflect::delete_property(&copy, &key).map_err(TabsError::dom)?;
    let config: TabsConfig = serde_wasm_bindgen::from_value(copy.into())
        .map_err(|err| TabsError::InvalidConfig(err.to_string()))?;

    Ok((config, on_change))
}
