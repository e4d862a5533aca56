//! # Affordance Reconciliation
//!
//! Re-derives every interactive affordance from the content alone. Runs
//! after open, after every restore, after every structural mutation and
//! whenever edit mode or access changes.
//!
//! ## Passes
//!
//! ```text
//! DeleteControls     one delete control per deletable item, none elsewhere
//! AddControls        one add control per container and rule, after the content
//! EditOnlyVisibility controls and edit-only elements hidden unless shown
//! Editability        editable matches are editable in edit mode only
//! ```
//!
//! Passes only look at the current tree, so running the pipeline twice in
//! a row changes nothing the second time.

use std::collections::HashSet;
use std::fmt::Debug;

use tracing::{debug, instrument};

use crate::document::{Control, Document, NodeKey};
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileContext {
    pub edit_mode: bool,

    /// Edit mode with an elevated gate
    pub show_controls: bool,
}

/// Counts describing the reconciled tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Delete controls present after reconciliation
    pub delete_controls: usize,

    /// Add controls present after reconciliation
    pub add_controls: usize,

    /// Elements whose visibility follows the controls
    pub edit_only: usize,

    pub hidden: usize,

    pub editable: usize,

    /// Controls inserted, removed or moved during this run
    pub changes: usize,
}

/// One step of the reconciliation pipeline
pub trait AffordancePass: Debug {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        ctx: ReconcileContext,
        report: &mut ReconcileReport,
    );
}

#[derive(Debug)]
pub struct DeleteControls;

impl AffordancePass for DeleteControls {
    fn name(&self) -> &'static str {
        "delete-controls"
    }

    fn apply(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        _ctx: ReconcileContext,
        report: &mut ReconcileReport,
    ) {
        let deletable = doc.select_set(&rules.deletable);
        let mut missing: Vec<NodeKey> = Vec::new();
        let mut present = 0;
        let mut removed = 0;

        doc.walk_mut(|element| {
            if element.is_control() {
                return;
            }

            let wanted = deletable.contains(&element.key);
            let mut seen = false;
            let before = element.children.len();
            element.children.retain(|child| {
                if child.control() != Some(Control::Delete) {
                    return true;
                }
                if wanted && !seen {
                    seen = true;
                    return true;
                }
                false
            });
            removed += before - element.children.len();

            if seen {
                present += 1;
            } else if wanted {
                missing.push(element.key);
            }
        });

        let mut added = 0;
        for key in missing {
            if doc.append_child(key, rules.delete_control()).is_some() {
                added += 1;
            }
        }

        report.delete_controls = present + added;
        report.changes += added + removed;
    }
}

#[derive(Debug)]
pub struct AddControls;

impl AffordancePass for AddControls {
    fn name(&self) -> &'static str {
        "add-controls"
    }

    fn apply(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        _ctx: ReconcileContext,
        report: &mut ReconcileReport,
    ) {
        let containers: Vec<HashSet<NodeKey>> = rules
            .add_controls
            .iter()
            .map(|rule| doc.select_set(&rule.container))
            .collect();

        let mut missing: Vec<(NodeKey, usize)> = Vec::new();
        let mut present = 0;
        let mut removed = 0;
        let mut moved = 0;

        doc.walk_mut(|element| {
            if element.is_control() {
                return;
            }

            let key = element.key;
            let mut seen = vec![false; containers.len()];
            let before = element.children.len();
            element.children.retain(|child| match child.control() {
                Some(Control::AddSubItem { rule }) => {
                    let wanted = containers
                        .get(rule)
                        .is_some_and(|set| set.contains(&key));
                    if wanted && !seen[rule] {
                        seen[rule] = true;
                        true
                    } else {
                        false
                    }
                }
                _ => true,
            });
            removed += before - element.children.len();

            // Add controls sit after the last content child
            if let Some(last) = element.children.iter().rposition(|c| !c.is_control()) {
                let misplaced: Vec<usize> = element.children[..last]
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| matches!(child.control(), Some(Control::AddSubItem { .. })))
                    .map(|(index, _)| index)
                    .collect();
                for index in misplaced.into_iter().rev() {
                    let control = element.children.remove(index);
                    element.children.push(control);
                    moved += 1;
                }
            }

            for (rule, set) in containers.iter().enumerate() {
                if !set.contains(&key) {
                    continue;
                }
                if seen[rule] {
                    present += 1;
                } else {
                    missing.push((key, rule));
                }
            }
        });

        let mut added = 0;
        for (key, rule) in missing {
            let Some(control) = rules.add_control(rule) else {
                continue;
            };
            if doc.append_child(key, control).is_some() {
                added += 1;
            }
        }

        report.add_controls = present + added;
        report.changes += added + removed + moved;
    }
}

#[derive(Debug)]
pub struct EditOnlyVisibility;

impl AffordancePass for EditOnlyVisibility {
    fn name(&self) -> &'static str {
        "edit-only-visibility"
    }

    fn apply(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        ctx: ReconcileContext,
        report: &mut ReconcileReport,
    ) {
        let hidden = !ctx.show_controls;
        let mut edit_only = 0;
        let mut hidden_count = 0;

        doc.walk_mut(|element| {
            if element.is_control() || element.has_class(&rules.edit_only_class) {
                element.affordance.hidden = hidden;
                edit_only += 1;
            }
            if element.affordance.hidden {
                hidden_count += 1;
            }
        });

        report.edit_only = edit_only;
        report.hidden = hidden_count;
    }
}

#[derive(Debug)]
pub struct Editability;

impl AffordancePass for Editability {
    fn name(&self) -> &'static str {
        "editability"
    }

    fn apply(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        ctx: ReconcileContext,
        report: &mut ReconcileReport,
    ) {
        let matches = if ctx.edit_mode {
            doc.select_set(&rules.editable)
        } else {
            HashSet::new()
        };
        let mut editable = 0;

        doc.walk_mut(|element| {
            element.affordance.editable = matches.contains(&element.key);
            if element.affordance.editable {
                editable += 1;
            }
        });

        report.editable = editable;
    }
}

/// Ordered pipeline of affordance passes
#[derive(Debug)]
pub struct Reconciler {
    passes: Vec<Box<dyn AffordancePass>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(DeleteControls),
                Box::new(AddControls),
                Box::new(EditOnlyVisibility),
                Box::new(Editability),
            ],
        }
    }

    /// Pipeline without any passes
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn with_pass(mut self, pass: Box<dyn AffordancePass>) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    #[instrument(level = "debug", skip(self, doc, rules), fields(passes = self.passes.len()))]
    pub fn reconcile(
        &self,
        doc: &mut Document,
        rules: &RuleSet,
        ctx: ReconcileContext,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for pass in &self.passes {
            pass.apply(doc, rules, ctx, &mut report);
        }

        debug!(
            delete_controls = report.delete_controls,
            add_controls = report.add_controls,
            editable = report.editable,
            changes = report.changes,
            "[livedit.reconcile] affordances derived"
        );
        report
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
