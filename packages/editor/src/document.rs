//! # Document Model
//!
//! The editable subtree of a page, modelled as an owned element tree.
//!
//! Every element that enters a [`Document`] is given a [`NodeKey`]. Keys are
//! allocated monotonically and never reused within a document, so a key held
//! across a restore simply stops resolving instead of pointing at a
//! different element.
//!
//! Elements carry two kinds of state:
//!
//! ```text
//! content   tag, id, classes, text, children    serialized
//! runtime   key, affordance (editable, hidden,  derived by the reconciler,
//!           control marker)                     never serialized
//! ```
//!
//! Injected controls live in the tree as ordinary children flagged with a
//! [`Control`] marker. Serialization and content queries skip them.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::selector::SelectorList;
use crate::EditorError;

/// Runtime identity of an element within one loaded document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u64);

impl NodeKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl FromStr for NodeKey {
    type Err = std::num::ParseIntError;

    /// Accepts both the display form (`n12`) and a bare number (`12`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits.strip_prefix('n').unwrap_or(digits);
        digits.parse().map(NodeKey)
    }
}

/// Marker for an interactive control injected by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Control {
    /// Removes its parent item
    Delete,
    /// Prompts for and appends a sub-item using the add-control rule at `rule`
    AddSubItem { rule: usize },
}

/// Derived interactive state of an element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affordance {
    pub editable: bool,
    pub hidden: bool,
    pub control: Option<Control>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(skip)]
    pub(crate) key: NodeKey,

    pub tag: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub children: Vec<Element>,

    #[serde(skip)]
    pub affordance: Affordance,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            key: NodeKey::default(),
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: None,
            children: Vec::new(),
            affordance: Affordance::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn with_control(mut self, control: Control) -> Self {
        self.affordance.control = Some(control);
        self
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_control(&self) -> bool {
        self.affordance.control.is_some()
    }

    pub fn control(&self) -> Option<Control> {
        self.affordance.control
    }

    /// Children that are part of the content, skipping injected controls
    pub fn content_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(|child| !child.is_control())
    }

    pub fn has_child_tag(&self, tag: &str) -> bool {
        self.content_children()
            .any(|child| child.tag.eq_ignore_ascii_case(tag))
    }

    /// Whether any content descendant has the given tag
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.content_children()
            .any(|child| child.tag.eq_ignore_ascii_case(tag) || child.contains_tag(tag))
    }

    /// First content descendant with the given tag, in document order
    pub fn find_tag(&self, tag: &str) -> Option<&Element> {
        for child in self.content_children() {
            if child.tag.eq_ignore_ascii_case(tag) {
                return Some(child);
            }
            if let Some(found) = child.find_tag(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of the element and its content descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in self.content_children() {
            child.collect_text(out);
        }
    }

    /// Drop every injected control in this subtree
    pub(crate) fn strip_controls(&mut self) {
        self.children.retain(|child| !child.is_control());
        for child in &mut self.children {
            child.strip_controls();
        }
    }
}

struct ContentChildren<'a>(&'a [Element]);

impl Serialize for ContentChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().filter(|child| !child.is_control()))
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_children = self.content_children().next().is_some();
        let len = 1
            + usize::from(self.id.is_some())
            + usize::from(!self.classes.is_empty())
            + usize::from(self.text.is_some())
            + usize::from(has_children);

        let mut state = serializer.serialize_struct("Element", len)?;
        state.serialize_field("tag", &self.tag)?;
        if let Some(id) = &self.id {
            state.serialize_field("id", id)?;
        }
        if !self.classes.is_empty() {
            state.serialize_field("classes", &self.classes)?;
        }
        if let Some(text) = &self.text {
            state.serialize_field("text", text)?;
        }
        if has_children {
            state.serialize_field("children", &ContentChildren(&self.children))?;
        }
        state.end()
    }
}

/// Render-tree view of an element including its runtime state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub key: NodeKey,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub editable: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<Control>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

impl From<&Element> for NodeView {
    fn from(element: &Element) -> Self {
        Self {
            key: element.key,
            tag: element.tag.clone(),
            id: element.id.clone(),
            classes: element.classes.clone(),
            text: element.text.clone(),
            editable: element.affordance.editable,
            hidden: element.affordance.hidden,
            control: element.affordance.control,
            children: element.children.iter().map(NodeView::from).collect(),
        }
    }
}

/// The editable subtree plus its key allocator
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    next_key: u64,
}

impl Document {
    pub fn new(root: Element) -> Self {
        let mut doc = Self {
            root: Element::new("div"),
            next_key: 1,
        };
        doc.replace_root(root);
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let root: Element = serde_json::from_str(json)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Swap in new content. Every element gets a fresh key, so keys handed
    /// out before the swap no longer resolve.
    pub fn replace_root(&mut self, mut root: Element) {
        self.adopt(&mut root);
        self.root = root;
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: NodeKey) -> Option<&Element> {
        let path = self.index_path(key)?;
        let mut current = &self.root;
        for index in path {
            current = &current.children[index];
        }
        Some(current)
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> Option<&mut Element> {
        let path = self.index_path(key)?;
        let mut current = &mut self.root;
        for index in path {
            current = &mut current.children[index];
        }
        Some(current)
    }

    pub fn parent_key(&self, key: NodeKey) -> Option<NodeKey> {
        let mut path = self.index_path(key)?;
        path.pop()?;
        let mut current = &self.root;
        for index in path {
            current = &current.children[index];
        }
        Some(current.key)
    }

    /// First content element carrying `id`
    pub fn find_by_id(&self, id: &str) -> Option<NodeKey> {
        let mut found = None;
        self.walk(|element, _| {
            if found.is_none() && !element.is_control() && element.id.as_deref() == Some(id) {
                found = Some(element.key);
            }
        });
        found
    }

    /// Content descendants of the root matching `selectors`, in document order
    pub fn select(&self, selectors: &SelectorList) -> Vec<NodeKey> {
        let mut matched = Vec::new();
        let mut ancestors = vec![&self.root];
        collect_matches(&self.root, &mut ancestors, selectors, &mut matched);
        matched
    }

    /// Content descendants of `scope` matching `selectors`. Ancestors above
    /// the scope still take part in matching descendant combinators.
    pub fn select_within(&self, scope: NodeKey, selectors: &SelectorList) -> Vec<NodeKey> {
        let Some(path) = self.index_path(scope) else {
            return Vec::new();
        };

        let mut ancestors = vec![&self.root];
        let mut current = &self.root;
        for index in path {
            current = &current.children[index];
            ancestors.push(current);
        }

        let mut matched = Vec::new();
        collect_matches(current, &mut ancestors, selectors, &mut matched);
        matched
    }

    /// Keys of every content element matching `selectors`, for membership tests
    pub fn select_set(&self, selectors: &SelectorList) -> HashSet<NodeKey> {
        self.select(selectors).into_iter().collect()
    }

    /// Detach an element and its subtree. The root cannot be removed.
    pub fn remove(&mut self, key: NodeKey) -> Option<Element> {
        let mut path = self.index_path(key)?;
        let index = path.pop()?;
        let mut parent = &mut self.root;
        for step in path {
            parent = &mut parent.children[step];
        }
        Some(parent.children.remove(index))
    }

    /// Insert `element` under `parent` at `index` (clamped to the child
    /// count). Returns the key given to the inserted element.
    pub fn insert_child(&mut self, parent: NodeKey, index: usize, mut element: Element) -> Option<NodeKey> {
        if !self.contains(parent) {
            return None;
        }
        self.adopt(&mut element);
        let key = element.key;

        let parent = self.get_mut(parent)?;
        let index = index.min(parent.children.len());
        parent.children.insert(index, element);
        Some(key)
    }

    pub fn append_child(&mut self, parent: NodeKey, element: Element) -> Option<NodeKey> {
        self.insert_child(parent, usize::MAX, element)
    }

    /// Pre-order traversal of every element, controls included, with its
    /// ancestor chain from the root down
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a Element, &[&'a Element])) {
        let mut ancestors = Vec::new();
        walk_element(&self.root, &mut ancestors, &mut visit);
    }

    /// Pre-order traversal of every element, controls included
    pub fn walk_mut(&mut self, mut visit: impl FnMut(&mut Element)) {
        walk_element_mut(&mut self.root, &mut visit);
    }

    /// Number of elements in the tree, controls included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    pub fn view(&self) -> NodeView {
        NodeView::from(&self.root)
    }

    fn adopt(&mut self, element: &mut Element) {
        element.key = NodeKey(self.next_key);
        self.next_key += 1;
        for child in &mut element.children {
            self.adopt(child);
        }
    }

    fn index_path(&self, key: NodeKey) -> Option<Vec<usize>> {
        fn search(element: &Element, key: NodeKey, path: &mut Vec<usize>) -> bool {
            if element.key == key {
                return true;
            }
            for (index, child) in element.children.iter().enumerate() {
                path.push(index);
                if search(child, key, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.root, key, &mut path).then_some(path)
    }
}

fn collect_matches<'a>(
    element: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    selectors: &SelectorList,
    matched: &mut Vec<NodeKey>,
) {
    for child in element.content_children() {
        if selectors.matches(child, ancestors) {
            matched.push(child.key);
        }
        ancestors.push(child);
        collect_matches(child, ancestors, selectors, matched);
        ancestors.pop();
    }
}

fn walk_element<'a>(
    element: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    visit: &mut impl FnMut(&'a Element, &[&'a Element]),
) {
    visit(element, ancestors.as_slice());
    ancestors.push(element);
    for child in &element.children {
        walk_element(child, ancestors, visit);
    }
    ancestors.pop();
}

fn walk_element_mut(element: &mut Element, visit: &mut impl FnMut(&mut Element)) {
    visit(element);
    for child in &mut element.children {
        walk_element_mut(child, visit);
    }
}
