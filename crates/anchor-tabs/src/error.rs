use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised while attaching a tab controller.
///
/// Once attached, the controller never fails: unknown keys are ignored and
/// DOM hiccups are logged.
#[derive(Debug, Error)]
pub enum TabsError {
    #[error("tab container not found: {0}")]
    ContainerNotFound(String),

    #[error("responsive tabs need a screen-size source")]
    ScreenSourceUnavailable,

    #[error("invalid tabs options: {0}")]
    InvalidConfig(String),

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

impl TabsError {
    pub(crate) fn dom(err: JsValue) -> Self {
        match err.as_string() {
            Some(message) => TabsError::Dom(message),
            None => TabsError::Dom(format!("{:?}", err)),
        }
    }
}

impl From<TabsError> for JsValue {
    fn from(err: TabsError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
