//! In-memory element tree implementing [`TabDom`].
//!
//! Only what the tab controller touches is modelled: tags, attributes,
//! classes, text, visibility, select values, the URL fragment and bubbling
//! click/change events. Delegate selectors are matched by tag name.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::{DomEvent, DomEventContext, EventHandler, TabDom};
use crate::error::TabsError;
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One write to the URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashWrite {
    pub hash: String,
    /// Element a browser would have scrolled to: the one whose id matched
    /// the fragment at the moment of the write.
    pub scrolled_to: Option<NodeId>,
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    hidden: bool,
    selected: bool,
}

type SharedHandler = Rc<RefCell<EventHandler<NodeId>>>;

struct Listener {
    id: u64,
    node: NodeId,
    event: DomEvent,
    delegate: Option<String>,
    handler: SharedHandler,
}

#[derive(Default)]
struct Tree {
    nodes: Vec<Node>,
    listeners: Vec<Listener>,
    next_listener: u64,
    hash: String,
    hash_writes: Vec<HashWrite>,
}

impl Tree {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        id
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// `id` followed by its ancestors up to the root.
    fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }

    fn collect_text(&self, id: NodeId, marker_class: &str, out: &mut String) {
        let node = self.node(id);
        if node.classes.iter().any(|c| c == marker_class) {
            return;
        }
        out.push_str(&node.text);
        for child in &node.children {
            self.collect_text(*child, marker_class, out);
        }
    }

    fn find_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|n| self.node(*n).attributes.get("id").map(String::as_str) == Some(id))
    }
}

/// Shared handle to an in-memory document. Clones see the same tree.
#[derive(Clone)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
    body: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut tree = Tree::default();
        let body = tree.push("body");
        Self {
            tree: Rc::new(RefCell::new(tree)),
            body,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element.
    pub fn create(&self, tag: &str) -> NodeId {
        self.tree.borrow_mut().push(tag)
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = tree.push(tag);
        for (name, value) in attributes {
            set_attr(tree.node_mut(id), name, value);
        }
        tree.append(parent, id);
        id
    }

    pub fn append(&self, parent: NodeId, child: NodeId) {
        self.tree.borrow_mut().append(parent, child);
    }

    pub fn tag(&self, el: NodeId) -> String {
        self.tree.borrow().node(el).tag.clone()
    }

    pub fn parent(&self, el: NodeId) -> Option<NodeId> {
        self.tree.borrow().node(el).parent
    }

    pub fn children(&self, el: NodeId) -> Vec<NodeId> {
        self.tree.borrow().node(el).children.clone()
    }

    pub fn classes(&self, el: NodeId) -> Vec<String> {
        self.tree.borrow().node(el).classes.clone()
    }

    pub fn is_visible(&self, el: NodeId) -> bool {
        !self.tree.borrow().node(el).hidden
    }

    pub fn is_selected(&self, option: NodeId) -> bool {
        self.tree.borrow().node(option).selected
    }

    pub fn text(&self, el: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        let node = tree.node(el);
        out.push_str(&node.text);
        for child in &node.children {
            tree.collect_text(*child, "", &mut out);
        }
        out
    }

    pub fn set_hash(&self, hash: &str) {
        self.tree.borrow_mut().hash = hash.to_string();
    }

    pub fn hash_writes(&self) -> Vec<HashWrite> {
        self.tree.borrow().hash_writes.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.tree.borrow().listeners.len()
    }

    /// Dispatch a click on `el`. Returns whether a listener prevented the
    /// default action.
    pub fn click(&self, el: NodeId) -> bool {
        self.dispatch(el, DomEvent::Click)
    }

    /// Set a control's value as a user would, then dispatch `change`.
    pub fn change(&self, el: NodeId, value: &str) -> bool {
        self.set_value(&el, value);
        self.dispatch(el, DomEvent::Change)
    }

    fn dispatch(&self, target: NodeId, event: DomEvent) -> bool {
        let matched: Vec<(SharedHandler, NodeId)> = {
            let tree = self.tree.borrow();
            let path = tree.path(target);
            let mut matched = Vec::new();
            for node in &path {
                for listener in tree.listeners.iter().filter(|l| l.node == *node && l.event == event) {
                    match &listener.delegate {
                        None => matched.push((listener.handler.clone(), target)),
                        Some(tag) => {
                            let hit = path
                                .iter()
                                .take_while(|n| *n != node)
                                .find(|n| tree.node(**n).tag == *tag);
                            if let Some(hit) = hit {
                                matched.push((listener.handler.clone(), *hit));
                            }
                        }
                    }
                }
            }
            matched
        };

        let mut prevented = false;
        for (handler, hit) in matched {
            let mut ctx = DomEventContext::new(hit);
            (&mut *handler.borrow_mut())(&mut ctx);
            prevented |= ctx.default_prevented();
        }
        prevented
    }
}

fn set_attr(node: &mut Node, name: &str, value: &str) {
    if name == "class" {
        node.classes = value.split_whitespace().map(String::from).collect();
    } else {
        node.attributes.insert(name.to_string(), value.to_string());
    }
}

impl TabDom for MemoryDom {
    type Element = NodeId;

    fn anchors(&self, container: &NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let anchors = tree
            .descendants(*container)
            .into_iter()
            .filter(|n| tree.node(*n).tag == "a")
            .collect();
        anchors
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.borrow().find_by_id(self.body, id)
    }

    fn attribute(&self, el: &NodeId, name: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let node = tree.node(*el);
        if name == "class" {
            return Some(node.classes.join(" "));
        }
        node.attributes.get(name).cloned()
    }

    fn set_attribute(&self, el: &NodeId, name: &str, value: &str) {
        set_attr(self.tree.borrow_mut().node_mut(*el), name, value);
    }

    fn has_class(&self, el: &NodeId, class: &str) -> bool {
        self.tree.borrow().node(*el).classes.iter().any(|c| c == class)
    }

    fn add_class(&self, el: &NodeId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let classes = &mut tree.node_mut(*el).classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, el: &NodeId, class: &str) {
        self.tree.borrow_mut().node_mut(*el).classes.retain(|c| c != class);
    }

    fn set_visible(&self, el: &NodeId, visible: bool) {
        self.tree.borrow_mut().node_mut(*el).hidden = !visible;
    }

    fn text_excluding(&self, el: &NodeId, marker_class: &str) -> String {
        let tree = self.tree.borrow();
        let node = tree.node(*el);
        let mut out = node.text.clone();
        for child in &node.children {
            tree.collect_text(*child, marker_class, &mut out);
        }
        out.trim().to_string()
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, TabsError> {
        Ok(self.create(tag))
    }

    fn set_text(&self, el: &NodeId, text: &str) {
        self.tree.borrow_mut().node_mut(*el).text = text.to_string();
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), TabsError> {
        self.append(*parent, *child);
        Ok(())
    }

    fn wrap(&self, el: &NodeId, wrapper: &NodeId) -> Result<(), TabsError> {
        let mut tree = self.tree.borrow_mut();
        tree.detach(*wrapper);
        if let Some(parent) = tree.node(*el).parent {
            let index = tree
                .node(parent)
                .children
                .iter()
                .position(|c| c == el)
                .ok_or_else(|| TabsError::Dom("element missing from its parent".to_string()))?;
            tree.node_mut(parent).children[index] = *wrapper;
            tree.node_mut(*wrapper).parent = Some(parent);
            tree.node_mut(*el).parent = None;
        }
        tree.append(*wrapper, *el);
        Ok(())
    }

    fn value(&self, el: &NodeId) -> String {
        let tree = self.tree.borrow();
        let node = tree.node(*el);
        if node.tag != "select" {
            return node.attributes.get("value").cloned().unwrap_or_default();
        }
        let options: Vec<&Node> = node.children.iter().map(|c| tree.node(*c)).collect();
        let value = options
            .iter()
            .find(|o| o.selected)
            .or_else(|| options.first())
            .and_then(|o| o.attributes.get("value").cloned())
            .unwrap_or_default();
        value
    }

    fn set_value(&self, el: &NodeId, value: &str) {
        let mut tree = self.tree.borrow_mut();
        if tree.node(*el).tag != "select" {
            set_attr(tree.node_mut(*el), "value", value);
            return;
        }
        let options = tree.node(*el).children.clone();
        for option in options {
            let node = tree.node_mut(option);
            node.selected = node.attributes.get("value").map(String::as_str) == Some(value);
        }
    }

    fn set_selected(&self, option: &NodeId, selected: bool) {
        let mut tree = self.tree.borrow_mut();
        if selected {
            // A single-choice select keeps one selected option.
            if let Some(parent) = tree.node(*option).parent {
                let siblings = tree.node(parent).children.clone();
                for sibling in siblings {
                    tree.node_mut(sibling).selected = false;
                }
            }
        }
        tree.node_mut(*option).selected = selected;
    }

    fn location_hash(&self) -> String {
        self.tree.borrow().hash.clone()
    }

    fn set_location_hash(&self, hash: &str) {
        let mut tree = self.tree.borrow_mut();
        let normalized = if hash.is_empty() || hash.starts_with('#') {
            hash.to_string()
        } else {
            format!("#{}", hash)
        };
        let scrolled_to = normalized
            .strip_prefix('#')
            .filter(|id| !id.is_empty())
            .and_then(|id| tree.find_by_id(self.body, id));
        tree.hash = normalized.clone();
        tree.hash_writes.push(HashWrite {
            hash: normalized,
            scrolled_to,
        });
    }

    fn listen(
        &self,
        el: &NodeId,
        event: DomEvent,
        delegate: Option<&str>,
        handler: EventHandler<NodeId>,
    ) -> Result<Subscription, TabsError> {
        let id = {
            let mut tree = self.tree.borrow_mut();
            let id = tree.next_listener;
            tree.next_listener += 1;
            tree.listeners.push(Listener {
                id,
                node: *el,
                event,
                delegate: delegate.map(|d| d.to_ascii_lowercase()),
                handler: Rc::new(RefCell::new(handler)),
            });
            id
        };
        let tree: Weak<RefCell<Tree>> = Rc::downgrade(&self.tree);
        Ok(Subscription::new(move || {
            if let Some(tree) = tree.upgrade() {
                tree.borrow_mut().listeners.retain(|l| l.id != id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_wrap_keeps_position() {
        let dom = MemoryDom::new();
        let body = dom.body();
        let first = dom.element(body, "div", &[("id", "first")]);
        let middle = dom.element(body, "div", &[("id", "middle")]);
        let last = dom.element(body, "div", &[("id", "last")]);

        let span = dom.create("span");
        dom.wrap(&middle, &span).unwrap();

        assert_eq!(dom.children(body), vec![first, span, last]);
        assert_eq!(dom.children(span), vec![middle]);
        assert_eq!(dom.parent(middle), Some(span));
    }

    #[test]
    fn test_delegated_click_matches_closest_descendant() {
        let dom = MemoryDom::new();
        let list = dom.element(dom.body(), "ul", &[]);
        let item = dom.element(list, "li", &[]);
        let anchor = dom.element(item, "a", &[("href", "#x")]);
        let label = dom.element(anchor, "span", &[]);

        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let _sub = dom
            .listen(
                &list,
                DomEvent::Click,
                Some("a"),
                Box::new(move |ctx: &mut DomEventContext<NodeId>| {
                    sink.set(Some(*ctx.target()));
                    ctx.prevent_default();
                }),
            )
            .unwrap();

        assert!(dom.click(label));
        assert_eq!(seen.get(), Some(anchor));

        seen.set(None);
        assert!(!dom.click(item));
        assert_eq!(seen.get(), None);
    }

    #[test]
    fn test_dropping_subscription_unbinds() {
        let dom = MemoryDom::new();
        let button = dom.element(dom.body(), "button", &[]);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let sub = dom
            .listen(&button, DomEvent::Click, None, Box::new(move |_: &mut DomEventContext<NodeId>| {
                    counter.set(counter.get() + 1)
                }))
            .unwrap();

        dom.click(button);
        drop(sub);
        dom.click(button);

        assert_eq!(calls.get(), 1);
        assert_eq!(dom.listener_count(), 0);
    }

    #[test]
    fn test_text_excluding_marker() {
        let dom = MemoryDom::new();
        let anchor = dom.element(dom.body(), "a", &[]);
        dom.set_text(&anchor, "Details ");
        let hidden = dom.element(anchor, "span", &[("class", "a11y")]);
        dom.set_text(&hidden, "(current)");

        assert_eq!(dom.text_excluding(&anchor, "a11y"), "Details");
        assert_eq!(dom.text(anchor), "Details (current)");
    }

    #[test]
    fn test_select_value_follows_options() {
        let dom = MemoryDom::new();
        let select = dom.element(dom.body(), "select", &[]);
        let one = dom.element(select, "option", &[("value", "#one")]);
        let two = dom.element(select, "option", &[("value", "#two")]);

        assert_eq!(dom.value(&select), "#one");
        dom.set_value(&select, "#two");
        assert!(!dom.is_selected(one));
        assert!(dom.is_selected(two));
        assert_eq!(dom.value(&select), "#two");
    }

    #[test]
    fn test_hash_write_records_scroll_target() {
        let dom = MemoryDom::new();
        let panel = dom.element(dom.body(), "div", &[("id", "pane")]);

        dom.set_location_hash("#pane");
        dom.set_attribute(&panel, "id", "");
        dom.set_location_hash("#pane");

        let writes = dom.hash_writes();
        assert_eq!(writes[0].scrolled_to, Some(panel));
        assert_eq!(writes[1].scrolled_to, None);
        assert_eq!(dom.location_hash(), "#pane");
    }
}
