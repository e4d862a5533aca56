//! # Content Mutations
//!
//! Structural edits to the document content.
//!
//! ## Mutation Semantics
//!
//! ### AddItem
//! - Clones the first item matching the selector inside the container
//! - Controls are stripped from the clone and text fields are reset to the
//!   placeholder, except `+` labels and fields holding an icon
//! - The clone is appended as the container's last child
//!
//! ### DeleteItem
//! - Removes the element and all descendants
//! - The root cannot be removed
//!
//! ### AddSubItem
//! - Creates a leaf with the rule's item tag
//! - Inserted just before the container's add control for that rule
//!
//! ### SetText
//! - Atomic replacement of the element's own text
//! - Only allowed on elements that are currently editable
//!
//! Mutations never touch affordances; the session reconciles afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Control, Document, Element, NodeKey};
use crate::rules::RuleSet;
use crate::selector::{SelectorError, SelectorList};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    /// Clone a template row into a container
    #[serde(rename_all = "camelCase")]
    AddItem {
        container_id: String,
        item_selector: String,
    },

    /// Remove an item and its subtree
    #[serde(rename_all = "camelCase")]
    DeleteItem { node: NodeKey },

    /// Append a sub-item ahead of a container's add control
    #[serde(rename_all = "camelCase")]
    AddSubItem {
        container: NodeKey,
        rule: usize,
        text: String,
    },

    /// Replace the text of an editable element
    #[serde(rename_all = "camelCase")]
    SetText { node: NodeKey, text: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("No item matching {selector:?} in container {container:?}")]
    TemplateNotFound { container: String, selector: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Node {0} is an injected control")]
    ControlNode(NodeKey),

    #[error("The document root cannot be removed")]
    RootRemoval,

    #[error("Node {0} is not editable")]
    NotEditable(NodeKey),

    #[error("Unknown add-control rule: {0}")]
    UnknownRule(usize),

    #[error("Node {node} is not a container for add-control rule {rule}")]
    NotAContainer { node: NodeKey, rule: usize },

    #[error("Value is empty")]
    EmptyValue,

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Outcome of a successful mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationResult {
    /// Key of the element the mutation created, if any
    pub created: Option<NodeKey>,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddItem { .. } => "add_item",
            Mutation::DeleteItem { .. } => "delete_item",
            Mutation::AddSubItem { .. } => "add_sub_item",
            Mutation::SetText { .. } => "set_text",
        }
    }

    /// Whether the mutation changes tree structure (as opposed to text)
    pub fn is_structural(&self) -> bool {
        !matches!(self, Mutation::SetText { .. })
    }

    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document, rules: &RuleSet) -> Result<MutationResult, MutationError> {
        self.validate(doc, rules)?;

        match self {
            Mutation::AddItem {
                container_id,
                item_selector,
            } => Self::apply_add_item(doc, rules, container_id, item_selector),

            Mutation::DeleteItem { node } => {
                doc.remove(*node).ok_or(MutationError::NodeNotFound(*node))?;
                Ok(MutationResult::default())
            }

            Mutation::AddSubItem {
                container,
                rule,
                text,
            } => Self::apply_add_sub_item(doc, rules, *container, *rule, text),

            Mutation::SetText { node, text } => {
                let element = doc
                    .get_mut(*node)
                    .ok_or(MutationError::NodeNotFound(*node))?;
                element.text = Some(text.clone());
                Ok(MutationResult::default())
            }
        }
    }

    /// Check the mutation against the current document without changing it
    pub fn validate(&self, doc: &Document, rules: &RuleSet) -> Result<(), MutationError> {
        match self {
            Mutation::AddItem {
                container_id,
                item_selector,
            } => {
                Self::find_template(doc, container_id, item_selector)?;
            }

            Mutation::DeleteItem { node } => {
                if *node == doc.root().key() {
                    return Err(MutationError::RootRemoval);
                }
                Self::content_node(doc, *node)?;
            }

            Mutation::AddSubItem {
                container,
                rule,
                text,
            } => {
                if text.is_empty() {
                    return Err(MutationError::EmptyValue);
                }
                let spec = rules
                    .add_controls
                    .get(*rule)
                    .ok_or(MutationError::UnknownRule(*rule))?;
                Self::content_node(doc, *container)?;
                if !doc.select(&spec.container).contains(container) {
                    return Err(MutationError::NotAContainer {
                        node: *container,
                        rule: *rule,
                    });
                }
            }

            Mutation::SetText { node, .. } => {
                let element = Self::content_node(doc, *node)?;
                if !element.affordance.editable {
                    return Err(MutationError::NotEditable(*node));
                }
            }
        }

        Ok(())
    }

    fn content_node(doc: &Document, key: NodeKey) -> Result<&Element, MutationError> {
        let element = doc.get(key).ok_or(MutationError::NodeNotFound(key))?;
        if element.is_control() {
            return Err(MutationError::ControlNode(key));
        }
        Ok(element)
    }

    fn find_template(
        doc: &Document,
        container_id: &str,
        item_selector: &str,
    ) -> Result<(NodeKey, NodeKey), MutationError> {
        let container = doc
            .find_by_id(container_id)
            .ok_or_else(|| MutationError::ContainerNotFound(container_id.to_string()))?;
        let selector = SelectorList::parse(item_selector)?;
        let template = doc
            .select_within(container, &selector)
            .first()
            .copied()
            .ok_or_else(|| MutationError::TemplateNotFound {
                container: container_id.to_string(),
                selector: item_selector.to_string(),
            })?;
        Ok((container, template))
    }

    fn apply_add_item(
        doc: &mut Document,
        rules: &RuleSet,
        container_id: &str,
        item_selector: &str,
    ) -> Result<MutationResult, MutationError> {
        let (container, template) = Self::find_template(doc, container_id, item_selector)?;
        let template = doc
            .get(template)
            .cloned()
            .ok_or(MutationError::NodeNotFound(template))?;

        let row = blank_row(template, rules);
        let created = doc
            .append_child(container, row)
            .ok_or(MutationError::NodeNotFound(container))?;

        Ok(MutationResult {
            created: Some(created),
        })
    }

    fn apply_add_sub_item(
        doc: &mut Document,
        rules: &RuleSet,
        container: NodeKey,
        rule: usize,
        text: &str,
    ) -> Result<MutationResult, MutationError> {
        let spec = rules
            .add_controls
            .get(rule)
            .ok_or(MutationError::UnknownRule(rule))?;

        let index = doc
            .get(container)
            .ok_or(MutationError::NodeNotFound(container))?
            .children
            .iter()
            .position(|child| child.control() == Some(Control::AddSubItem { rule }))
            .unwrap_or(usize::MAX);

        let item = Element::new(spec.item_tag.as_str()).with_text(text);
        let created = doc
            .insert_child(container, index, item)
            .ok_or(MutationError::NodeNotFound(container))?;

        Ok(MutationResult {
            created: Some(created),
        })
    }
}

/// Turn a copy of an existing row into an empty one
fn blank_row(mut template: Element, rules: &RuleSet) -> Element {
    template.strip_controls();

    let mut scratch = Document::new(template);
    let root = scratch.root().key();
    for key in scratch.select_within(root, &rules.placeholder_fields) {
        // Fields nested in an already reset field are gone
        let Some(field) = scratch.get_mut(key) else {
            continue;
        };
        if field.text_content().trim() == "+" || field.contains_tag("i") {
            continue;
        }
        field.text = Some(rules.placeholder.clone());
        field.children.clear();
    }

    scratch.into_root()
}
