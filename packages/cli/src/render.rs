use colored::Colorize;
use livedit_editor::{Control, Element, SessionEvent};

/// Indented outline of an element tree, one line per node
pub fn outline(root: &Element, show_hidden: bool) -> Vec<String> {
    let mut lines = Vec::new();
    push_element(root, 0, show_hidden, &mut lines);
    lines
}

fn push_element(element: &Element, depth: usize, show_hidden: bool, lines: &mut Vec<String>) {
    if element.affordance.hidden && !show_hidden {
        return;
    }

    let mut line = format!(
        "{}{} {}",
        "  ".repeat(depth),
        element.key().to_string().dimmed(),
        label(element).cyan()
    );

    if let Some(control) = element.control() {
        line.push(' ');
        line.push_str(&describe(control).magenta().to_string());
    }
    if let Some(text) = &element.text {
        line.push_str(&format!(" {:?}", text));
    }
    if element.affordance.editable {
        line.push_str(&format!(" {}", "✎".green()));
    }
    if element.affordance.hidden {
        line.push_str(&format!(" {}", "(hidden)".dimmed()));
    }
    lines.push(line);

    // icons inside controls are noise
    if element.is_control() {
        return;
    }
    for child in &element.children {
        push_element(child, depth + 1, show_hidden, lines);
    }
}

fn label(element: &Element) -> String {
    let mut label = element.tag.clone();
    if let Some(id) = &element.id {
        label.push('#');
        label.push_str(id);
    }
    for class in &element.classes {
        label.push('.');
        label.push_str(class);
    }
    label
}

fn describe(control: Control) -> String {
    match control {
        Control::Delete => "[delete]".to_string(),
        Control::AddSubItem { rule } => format!("[add #{}]", rule),
    }
}

/// One status line per session event
pub fn event_line(event: &SessionEvent) -> String {
    match event {
        SessionEvent::AvailabilityChanged(availability) => format!(
            "{} undo {} redo {}",
            "·".dimmed(),
            on_off(availability.can_undo),
            on_off(availability.can_redo)
        ),
        SessionEvent::EditModeChanged { edit_mode } => format!(
            "{} edit mode {}",
            "✎".bright_blue(),
            on_off(*edit_mode)
        ),
        SessionEvent::Persisted { bytes } => {
            format!("{} saved {} bytes", "✓".green(), bytes)
        }
        SessionEvent::PersistFailed { reason } => {
            format!("{} save failed: {}", "✗".red(), reason)
        }
        SessionEvent::StoredStateDiscarded { reason } => format!(
            "{} saved state discarded, using template: {}",
            "⚠️".yellow(),
            reason
        ),
    }
}

fn on_off(value: bool) -> String {
    if value {
        "on".green().to_string()
    } else {
        "off".dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedit_editor::{Availability, Document};

    #[test]
    fn test_outline_lists_every_visible_node() {
        colored::control::set_override(false);
        let doc = Document::new(
            Element::new("ul")
                .with_id("list")
                .with_child(Element::new("li").with_class("item").with_text("Rust")),
        );

        let lines = outline(doc.root(), false);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("ul#list"));
        assert!(lines[1].starts_with("  n"));
        assert!(lines[1].ends_with("li.item \"Rust\""));
    }

    #[test]
    fn test_event_lines() {
        colored::control::set_override(false);
        let line = event_line(&SessionEvent::AvailabilityChanged(Availability {
            can_undo: true,
            can_redo: false,
        }));
        assert_eq!(line, "· undo on redo off");

        let line = event_line(&SessionEvent::Persisted { bytes: 12 });
        assert_eq!(line, "✓ saved 12 bytes");
    }
}
