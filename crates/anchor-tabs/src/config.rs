//! Options accepted by the tab controller.
//!
//! The same struct is filled from a JS options object (through
//! `serde-wasm-bindgen`) or built directly in Rust. Every field has a default,
//! so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_STATE_CLASS: &str = "is-active";
pub const DEFAULT_A11Y_CLASS: &str = "a11y";
pub const DEFAULT_SMALL_MAX_WIDTH: u32 = 767;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabsConfig {
    /// Mirror the active key into the URL fragment.
    pub hash: bool,
    /// Class added to the active anchor.
    pub tab_state: String,
    /// Class added to the active panel.
    pub target_state: String,
    /// Fall back to a `<select>` on small screens.
    pub responsive: bool,
    /// Marker class of screen-reader-only text, dropped from option labels.
    pub a11y_class: String,
    /// Widest viewport, in CSS pixels, still classified as small.
    pub small_max_width: u32,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            hash: false,
            tab_state: DEFAULT_STATE_CLASS.to_string(),
            target_state: DEFAULT_STATE_CLASS.to_string(),
            responsive: false,
            a11y_class: DEFAULT_A11Y_CLASS.to_string(),
            small_max_width: DEFAULT_SMALL_MAX_WIDTH,
        }
    }
}

impl TabsConfig {
    pub fn with_hash(mut self, hash: bool) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    pub fn with_tab_state(mut self, class: impl Into<String>) -> Self {
        self.tab_state = class.into();
        self
    }

    pub fn with_target_state(mut self, class: impl Into<String>) -> Self {
        self.target_state = class.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: TabsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TabsConfig::default());
        assert!(!config.hash);
        assert!(!config.responsive);
        assert_eq!(config.tab_state, "is-active");
        assert_eq!(config.target_state, "is-active");
        assert_eq!(config.a11y_class, "a11y");
        assert_eq!(config.small_max_width, 767);
    }

    #[test]
    fn test_camel_case_options() {
        let config: TabsConfig = serde_json::from_str(
            r#"{"hash": true, "tabState": "tab--on", "targetState": "pane--on", "responsive": true, "a11yClass": "sr-only", "smallMaxWidth": 600}"#,
        )
        .unwrap();
        assert!(config.hash);
        assert!(config.responsive);
        assert_eq!(config.tab_state, "tab--on");
        assert_eq!(config.target_state, "pane--on");
        assert_eq!(config.a11y_class, "sr-only");
        assert_eq!(config.small_max_width, 600);
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let config: TabsConfig = serde_json::from_str(r#"{"speed": 300}"#).unwrap();
        assert_eq!(config, TabsConfig::default());
    }
}
