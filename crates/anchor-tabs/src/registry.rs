//! Tab registry: fragment key → anchor and panel.

use std::collections::HashMap;

use crate::dom::{decode_fragment, TabDom};

#[derive(Debug, Clone)]
pub struct TabEntry<E> {
    /// The anchor's href as written, e.g. `"#tab-1"`.
    pub key: String,
    pub anchor: E,
    /// Panel whose id matches the key; `None` when the document has none.
    pub target: Option<E>,
}

/// Ordered mapping from key to entry. Membership is fixed once built.
#[derive(Debug, Clone)]
pub struct TabRegistry<E> {
    entries: Vec<TabEntry<E>>,
    index: HashMap<String, usize>,
}

impl<E> Default for TabRegistry<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

/// Key of an anchor, if its href is a fragment identifier.
pub fn anchor_key<D: TabDom>(dom: &D, anchor: &D::Element) -> Option<String> {
    dom.attribute(anchor, "href")
        .filter(|href| href.starts_with('#') && href.len() > 1)
}

impl<E: Clone> TabRegistry<E> {
    /// Register every fragment anchor in `anchors`, resolving panels by id.
    pub fn build<D: TabDom<Element = E>>(dom: &D, anchors: &[(String, E)]) -> Self {
        let mut registry = Self::default();
        for (key, anchor) in anchors {
            let id = decode_fragment(&key[1..]);
            let target = dom.element_by_id(&id);
            if target.is_none() {
                log::warn!("tabs: no panel with id {:?} for anchor {}", id, key);
            }
            registry.insert(TabEntry {
                key: key.clone(),
                anchor: anchor.clone(),
                target,
            });
        }
        registry
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn insert(&mut self, entry: TabEntry<E>) {
        match self.index.get(&entry.key) {
            // дубликат href: побеждает последний якорь
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TabEntry<E>> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Registered key matching a URL fragment, compared percent-decoded.
    pub fn find_fragment(&self, fragment: &str) -> Option<&str> {
        if fragment.len() < 2 {
            return None;
        }
        if self.contains(fragment) {
            return Some(&self.entries[self.index[fragment]].key);
        }
        let wanted = decode_fragment(fragment);
        self.entries
            .iter()
            .find(|entry| decode_fragment(&entry.key) == wanted)
            .map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabEntry<E>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeId};

    fn entry(key: &str, anchor: u32) -> TabEntry<u32> {
        TabEntry {
            key: key.to_string(),
            anchor,
            target: None,
        }
    }

    #[test]
    fn test_duplicate_key_last_wins_in_first_position() {
        let mut registry = TabRegistry::default();
        registry.insert(entry("#a", 1));
        registry.insert(entry("#b", 2));
        registry.insert(entry("#a", 3));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("#a").map(|e| e.anchor), Some(3));
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["#a", "#b"]);
    }

    #[test]
    fn test_find_fragment_decodes() {
        let mut registry = TabRegistry::default();
        registry.insert(entry("#café", 1));
        registry.insert(entry("#plain", 2));

        assert_eq!(registry.find_fragment("#plain"), Some("#plain"));
        assert_eq!(registry.find_fragment("#caf%C3%A9"), Some("#café"));
        assert_eq!(registry.find_fragment("#missing"), None);
        assert_eq!(registry.find_fragment("#"), None);
        assert_eq!(registry.find_fragment(""), None);
    }

    #[test]
    fn test_build_resolves_panels() {
        let dom = MemoryDom::new();
        let nav = dom.element(dom.body(), "nav", &[]);
        let first = dom.element(nav, "a", &[("href", "#one")]);
        let second = dom.element(nav, "a", &[("href", "#two")]);
        dom.element(nav, "a", &[("href", "/elsewhere")]);
        let panel = dom.element(dom.body(), "div", &[("id", "one")]);

        let anchors: Vec<(String, NodeId)> = dom
            .anchors(&nav)
            .into_iter()
            .filter_map(|a| anchor_key(&dom, &a).map(|key| (key, a)))
            .collect();
        let registry = TabRegistry::build(&dom, &anchors);

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("/elsewhere"));
        assert_eq!(registry.get("#one").and_then(|e| e.target), Some(panel));
        assert_eq!(registry.get("#one").map(|e| e.anchor), Some(first));
        assert_eq!(registry.get("#two").map(|e| e.anchor), Some(second));
        assert_eq!(registry.get("#two").and_then(|e| e.target), None);
    }
}
