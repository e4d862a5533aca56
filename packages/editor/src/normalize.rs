//! Repairs content saved by older builds, where some items kept their text
//! directly instead of inside an editable wrapper.

use tracing::debug;

use crate::document::{Document, Element};
use crate::rules::RuleSet;

/// Rebuild every element matched by a normalize rule that has no wrapper
/// child as `[icon?, <wrapper>text</wrapper>]`. Returns the number of
/// elements rebuilt.
pub fn normalize_legacy(doc: &mut Document, rules: &RuleSet) -> usize {
    let mut repaired = 0;

    for rule in &rules.normalize {
        for key in doc.select(&rule.selector) {
            let Some(element) = doc.get(key) else {
                continue;
            };
            if element.contains_tag(&rule.wrapper) {
                continue;
            }

            let icon = element.find_tag(&rule.icon_tag).cloned();
            let text = element.text_content().trim().to_string();

            if let Some(element) = doc.get_mut(key) {
                element.children.clear();
                element.text = None;
            }
            if let Some(icon) = icon {
                doc.append_child(key, icon);
            }
            doc.append_child(key, Element::new(rule.wrapper.as_str()).with_text(text));
            repaired += 1;
        }
    }

    if repaired > 0 {
        debug!(repaired, "[livedit.normalize] rebuilt legacy items");
    }
    repaired
}
