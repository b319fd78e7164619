use std::rc::Rc;

use leptos::prelude::*;

use crate::config::TabsConfig;
use crate::controller::{OnChange, TabController, Tabs};
use crate::dom::WebDom;
use crate::js::attach_to;

/// One tab of [`AnchorTabs`].
#[derive(Clone)]
pub struct TabPane {
    /// Panel id, without the leading `#`.
    pub id: String,
    pub label: String,
    pub content: ViewFn,
}

impl TabPane {
    pub fn new(id: impl Into<String>, label: impl Into<String>, content: impl Into<ViewFn>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Renders an anchor row and its panels, then hands them to a
/// [`TabController`](crate::controller::TabController) once mounted.
///
/// The controller is released with the component's reactive owner.
#[component]
pub fn AnchorTabs(
    /// Tabs in display order
    panes: Vec<TabPane>,
    /// Controller options
    #[prop(optional)]
    config: Option<TabsConfig>,
    /// Id of the pane open at start; defaults to the first one
    #[prop(optional, into)]
    active: Option<String>,
    /// Additional CSS classes for the anchor row
    #[prop(optional, into)]
    class: MaybeProp<String>,
    /// Receives the key (`#id`) of each newly opened pane
    #[prop(optional)]
    on_change: Option<Callback<String>>,
) -> impl IntoView {
    let config = config.unwrap_or_default();
    // ключ вида "#id", как в href якоря
    let on_change = on_change.map(|callback| -> OnChange<WebDom> {
        Rc::new(move |controller: &TabController<WebDom>| {
            if let Some(key) = controller.active() {
                callback.run(key.to_string());
            }
        })
    });
    let container = NodeRef::<leptos::html::Div>::new();
    let handle: StoredValue<Option<Tabs<WebDom>>, LocalStorage> = StoredValue::new_local(None);

    let initial = active.or_else(|| panes.first().map(|pane| pane.id.clone()));
    let tab_state = config.tab_state.clone();

    Effect::new(move |_| {
        let Some(el) = container.get() else {
            return;
        };
        if handle.with_value(|tabs| tabs.is_some()) {
            return;
        }
        let el: web_sys::Element = el.into();
        match attach_to(el, config.clone(), on_change.clone()) {
            Ok(tabs) => handle.set_value(Some(tabs)),
            Err(err) => log::error!("Failed to attach tabs: {}", err),
        }
    });

    let anchors = panes
        .iter()
        .map(|pane| {
            let href = format!("#{}", pane.id);
            let anchor_class = if initial.as_deref() == Some(pane.id.as_str()) {
                tab_state.clone()
            } else {
                String::new()
            };
            view! { <a href=href class=anchor_class>{pane.label.clone()}</a> }
        })
        .collect_view();

    let panels = panes
        .into_iter()
        .map(|pane| {
            let style = if initial.as_deref() == Some(pane.id.as_str()) {
                ""
            } else {
                "display: none"
            };
            view! {
                <div id=pane.id class="tab" style=style>
                    {pane.content.run()}
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="anchor-tabs">
            <div
                node_ref=container
                class=move || format!("tabs {}", class.get().unwrap_or_default())
            >
                {anchors}
            </div>
            {panels}
        </div>
    }
}
