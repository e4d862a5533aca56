//! # Affordance Rules
//!
//! Declarative description of which content gets which interactive
//! affordance. [`AffordanceRules`] is the serde form read from
//! configuration; [`RuleSet`] is the compiled form with parsed selectors
//! that the reconciler and mutations work from.
//!
//! The defaults describe a resume page: timeline items, project cards,
//! skill cards and certifications.

use serde::{Deserialize, Serialize};

use crate::document::{Control, Element};
use crate::selector::SelectorList;
use crate::EditorError;

/// Per-container "add sub-item" control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddControlRule {
    /// Containers that receive the control
    pub container: String,

    /// Class identifying the injected control
    pub control_class: String,

    /// Shown as `Enter {prompt}:` when the control is activated
    pub prompt: String,

    /// Tag of the created item and of the control itself
    pub item_tag: String,

    #[serde(default)]
    pub label: String,
}

/// Persisted button that clones a template row into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowButtonRule {
    pub button_id: String,
    pub container_id: String,
    pub item_selector: String,
}

/// Legacy content repair applied to stored state on load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeRule {
    pub selector: String,

    /// Child tag that must exist to hold the editable text
    pub wrapper: String,

    #[serde(default = "default_icon_tag")]
    pub icon_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordanceRules {
    #[serde(default = "default_editable")]
    pub editable: String,

    #[serde(default = "default_deletable")]
    pub deletable: String,

    /// Fields reset to the placeholder when a row is cloned
    #[serde(default = "default_placeholder_fields")]
    pub placeholder_fields: String,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Elements with this class are only shown while controls are shown
    #[serde(default = "default_edit_only_class")]
    pub edit_only_class: String,

    #[serde(default = "default_add_controls")]
    pub add_controls: Vec<AddControlRule>,

    #[serde(default = "default_row_buttons")]
    pub row_buttons: Vec<RowButtonRule>,

    #[serde(default = "default_normalize")]
    pub normalize: Vec<NormalizeRule>,
}

fn default_editable() -> String {
    "h1, h2, h3, p, span:not(.add-tag), li, a:not(.social-link), .cert-item".to_string()
}

fn default_deletable() -> String {
    ".timeline-item, .project-card, .skill-card, .cert-item, \
     .skill-card li, .timeline-content li, .project-tags span"
        .to_string()
}

fn default_placeholder_fields() -> String {
    "h3, p, span, li".to_string()
}

fn default_placeholder() -> String {
    "New text...".to_string()
}

fn default_edit_only_class() -> String {
    "admin-only".to_string()
}

fn default_icon_tag() -> String {
    "i".to_string()
}

fn default_add_controls() -> Vec<AddControlRule> {
    vec![
        AddControlRule {
            container: ".skill-card ul".to_string(),
            control_class: "add-skill-item".to_string(),
            prompt: "skill".to_string(),
            item_tag: "li".to_string(),
            label: "Add skill".to_string(),
        },
        AddControlRule {
            container: ".timeline-content ul".to_string(),
            control_class: "add-resp-item".to_string(),
            prompt: "responsibility".to_string(),
            item_tag: "li".to_string(),
            label: "Add resp".to_string(),
        },
        AddControlRule {
            container: ".project-tags".to_string(),
            control_class: "add-tag".to_string(),
            prompt: "tag name (e.g., Python)".to_string(),
            item_tag: "span".to_string(),
            label: String::new(),
        },
    ]
}

fn default_row_buttons() -> Vec<RowButtonRule> {
    [
        ("add-experience", "timeline-container", ".timeline-item"),
        ("add-project", "projects-container", ".project-card"),
        ("add-skill-card", "skills-container", ".skill-card"),
        ("add-cert", "certs-container", ".cert-item"),
    ]
    .into_iter()
    .map(|(button_id, container_id, item_selector)| RowButtonRule {
        button_id: button_id.to_string(),
        container_id: container_id.to_string(),
        item_selector: item_selector.to_string(),
    })
    .collect()
}

fn default_normalize() -> Vec<NormalizeRule> {
    vec![NormalizeRule {
        selector: ".cert-item".to_string(),
        wrapper: "span".to_string(),
        icon_tag: default_icon_tag(),
    }]
}

impl Default for AffordanceRules {
    fn default() -> Self {
        Self {
            editable: default_editable(),
            deletable: default_deletable(),
            placeholder_fields: default_placeholder_fields(),
            placeholder: default_placeholder(),
            edit_only_class: default_edit_only_class(),
            add_controls: default_add_controls(),
            row_buttons: default_row_buttons(),
            normalize: default_normalize(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledAddControl {
    pub container: SelectorList,
    pub control_class: String,
    pub prompt: String,
    pub item_tag: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct CompiledRowButton {
    pub button_id: String,
    pub container_id: String,
    pub item_selector: SelectorList,
}

#[derive(Debug, Clone)]
pub struct CompiledNormalize {
    pub selector: SelectorList,
    pub wrapper: String,
    pub icon_tag: String,
}

/// Affordance rules with every selector parsed
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub editable: SelectorList,
    pub deletable: SelectorList,
    pub placeholder_fields: SelectorList,
    pub placeholder: String,
    pub edit_only_class: String,
    pub add_controls: Vec<CompiledAddControl>,
    pub row_buttons: Vec<CompiledRowButton>,
    pub normalize: Vec<CompiledNormalize>,
}

impl RuleSet {
    pub fn compile(rules: &AffordanceRules) -> Result<Self, EditorError> {
        let add_controls = rules
            .add_controls
            .iter()
            .map(|rule| {
                if rule.item_tag.trim().is_empty() || rule.control_class.trim().is_empty() {
                    return Err(EditorError::Config(format!(
                        "add control for {:?} needs an itemTag and a controlClass",
                        rule.container
                    )));
                }
                Ok(CompiledAddControl {
                    container: SelectorList::parse(&rule.container)?,
                    control_class: rule.control_class.clone(),
                    prompt: rule.prompt.clone(),
                    item_tag: rule.item_tag.clone(),
                    label: rule.label.clone(),
                })
            })
            .collect::<Result<Vec<_>, EditorError>>()?;

        let row_buttons = rules
            .row_buttons
            .iter()
            .map(|rule| {
                Ok(CompiledRowButton {
                    button_id: rule.button_id.clone(),
                    container_id: rule.container_id.clone(),
                    item_selector: SelectorList::parse(&rule.item_selector)?,
                })
            })
            .collect::<Result<Vec<_>, EditorError>>()?;

        let normalize = rules
            .normalize
            .iter()
            .map(|rule| {
                Ok(CompiledNormalize {
                    selector: SelectorList::parse(&rule.selector)?,
                    wrapper: rule.wrapper.clone(),
                    icon_tag: rule.icon_tag.clone(),
                })
            })
            .collect::<Result<Vec<_>, EditorError>>()?;

        Ok(Self {
            editable: SelectorList::parse(&rules.editable)?,
            deletable: SelectorList::parse(&rules.deletable)?,
            placeholder_fields: SelectorList::parse(&rules.placeholder_fields)?,
            placeholder: rules.placeholder.clone(),
            edit_only_class: rules.edit_only_class.clone(),
            add_controls,
            row_buttons,
            normalize,
        })
    }

    pub fn row_button(&self, button_id: &str) -> Option<&CompiledRowButton> {
        self.row_buttons
            .iter()
            .find(|rule| rule.button_id == button_id)
    }

    /// `<div class="delete-btn admin-only"><i class="fas fa-times"></i></div>`
    pub fn delete_control(&self) -> Element {
        Element::new("div")
            .with_class("delete-btn")
            .with_class(self.edit_only_class.as_str())
            .with_child(icon("fa-times"))
            .with_control(Control::Delete)
    }

    /// Trailing control that appends a sub-item for add-control rule `rule`
    pub fn add_control(&self, rule: usize) -> Option<Element> {
        let spec = self.add_controls.get(rule)?;
        let mut control = Element::new(spec.item_tag.as_str())
            .with_class(spec.control_class.as_str())
            .with_class(self.edit_only_class.as_str())
            .with_child(icon("fa-plus"));
        if !spec.label.is_empty() {
            control = control.with_text(spec.label.as_str());
        }
        Some(control.with_control(Control::AddSubItem { rule }))
    }
}

fn icon(name: &str) -> Element {
    Element::new("i").with_class("fas").with_class(name)
}
