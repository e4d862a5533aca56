//! Integration tests for the editing session

use std::time::Duration;

use anyhow::Result;
use livedit_editor::{
    Answer, Availability, Control, Document, DurableStore, EditSession, EditorConfig, FileStore,
    KeyChord, MemoryStore, NodeKey, Outcome, SessionEvent, SharedGate, Snapshot, StaticGate,
};

const RESUME: &str = include_str!("fixtures/resume.json");

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn open<S: DurableStore>(store: S) -> Result<EditSession<S>> {
    let template = Document::from_json(RESUME)?;
    Ok(EditSession::open(
        EditorConfig::default(),
        template,
        store,
        StaticGate(true),
        Duration::ZERO,
    )?)
}

fn select(session: &EditSession<impl DurableStore>, selector: &str) -> Vec<NodeKey> {
    session
        .document()
        .select(&selector.parse().expect("valid selector"))
}

fn count_controls(session: &EditSession<impl DurableStore>, wanted: fn(Control) -> bool) -> usize {
    let mut count = 0;
    session.document().walk(|element, _| {
        if element.control().is_some_and(wanted) {
            count += 1;
        }
    });
    count
}

fn find_control(session: &EditSession<impl DurableStore>, parent: NodeKey, control: Control) -> NodeKey {
    session
        .document()
        .get(parent)
        .and_then(|element| element.children.iter().find(|c| c.control() == Some(control)))
        .map(|c| c.key())
        .expect("control attached")
}

#[test]
fn test_first_mutation_on_empty_history() -> Result<()> {
    let mut session = open(MemoryStore::new())?;

    assert_eq!(session.add_item("skills-container", ".skill-card"), Outcome::Committed);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().cursor(), Some(0));

    assert!(!session.undo());
    assert_eq!(session.history().cursor(), Some(0));
    assert_eq!(select(&session, ".skill-card").len(), 2);

    // the settle snapshot matches the current state and is dropped
    assert_eq!(session.tick(ms(600)), Outcome::Unchanged);
    assert_eq!(session.history().len(), 1);
    Ok(())
}

#[test]
fn test_undo_then_push_truncates_branch() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.add_item("skills-container", ".skill-card");
    session.add_item("projects-container", ".project-card");
    let states: Vec<Snapshot> = session.history().iter().cloned().collect();
    assert_eq!(states.len(), 3);

    assert!(session.undo());
    let tags = select(&session, ".project-tags")[0];
    assert_eq!(session.add_sub_item(tags, &mut Answer::new("Zig")), Outcome::Committed);

    let history: Vec<&Snapshot> = session.history().iter().collect();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0], &states[0]);
    assert_eq!(history[1], &states[1]);
    assert_ne!(history[2], &states[2]);
    assert_eq!(session.history().cursor(), Some(2));

    assert!(!session.redo());
    assert_eq!(session.history().cursor(), Some(2));
    Ok(())
}

#[test]
fn test_debounced_typing_commits_once() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.set_edit_mode(true);
    let heading = select(&session, "h1")[0];

    for (step, text) in ["A", "Ad", "Ada", "Ada L"].iter().enumerate() {
        let now = ms(1_000 + step as u64 * 100);
        assert_eq!(session.input_text(heading, text, now), Outcome::Deferred);
        assert_eq!(session.tick(now), Outcome::Unchanged);
    }

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.next_deadline(), Some(ms(1_800)));
    assert_eq!(session.tick(ms(1_800)), Outcome::Committed);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.tick(ms(5_000)), Outcome::Unchanged);
    Ok(())
}

#[test]
fn test_blur_before_pause_commits_once() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.set_edit_mode(true);
    let heading = select(&session, "h1")[0];

    session.input_text(heading, "Ada Lovelace", ms(1_000));
    assert_eq!(session.blur(), Outcome::Committed);
    assert!(!session.has_pending_edit());
    assert_eq!(session.tick(ms(2_000)), Outcome::Unchanged);
    assert_eq!(session.blur(), Outcome::Unchanged);
    assert_eq!(session.history().len(), 2);
    Ok(())
}

#[test]
fn test_controls_rebuilt_after_restore() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.set_edit_mode(true);

    let is_delete = |control: Control| control == Control::Delete;
    let is_add = |control: Control| matches!(control, Control::AddSubItem { .. });
    assert_eq!(count_controls(&session, is_delete), 10);
    assert_eq!(count_controls(&session, is_add), 3);

    session.add_item("skills-container", ".skill-card");
    // new card, its two items
    assert_eq!(count_controls(&session, is_delete), 13);
    assert_eq!(count_controls(&session, is_add), 4);

    let before_undo = select(&session, "h1");
    assert!(session.undo());
    assert_eq!(count_controls(&session, is_delete), 10);
    assert_eq!(count_controls(&session, is_add), 3);

    // restore hands out fresh keys
    assert!(!session.document().contains(before_undo[0]));

    // every control is visible and nothing inside it is editable
    session.document().walk(|element, ancestors| {
        if element.is_control() {
            assert!(!element.affordance.hidden);
        }
        if element.is_control() || ancestors.iter().any(|a| a.is_control()) {
            assert!(!element.affordance.editable);
        }
    });
    Ok(())
}

#[test]
fn test_restore_of_current_state_is_a_no_op() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.set_edit_mode(true);
    let view = session.document().view();
    let report = session.last_report();

    // undo then redo lands on the same snapshot
    session.add_item("certs-container", ".cert-item");
    assert!(session.undo());

    let after = session.reconcile();
    assert_eq!(after.delete_controls, report.delete_controls);
    assert_eq!(after.add_controls, report.add_controls);
    assert_eq!(after.changes, 0);
    assert_eq!(session.document().view().children.len(), view.children.len());
    Ok(())
}

#[test]
fn test_row_button_and_delete_control() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();

    let button = session.document().find_by_id("add-cert").expect("row button");
    assert_eq!(session.activate(button, &mut Answer::cancel()), Outcome::Ignored);

    session.set_edit_mode(true);
    let button = session.document().find_by_id("add-cert").expect("row button");
    assert_eq!(session.activate(button, &mut Answer::cancel()), Outcome::Committed);

    let certs = select(&session, ".cert-item");
    assert_eq!(certs.len(), 2);
    let text = session
        .document()
        .get(certs[1])
        .map(|cert| cert.text_content())
        .unwrap_or_default();
    assert_eq!(text, "New text...");

    let delete = find_control(&session, certs[1], Control::Delete);
    assert_eq!(session.activate(delete, &mut Answer::cancel()), Outcome::Committed);
    assert_eq!(select(&session, ".cert-item").len(), 1);
    assert_eq!(session.history().len(), 3);

    // the control went away with its item
    assert_eq!(session.activate(delete, &mut Answer::cancel()), Outcome::Ignored);
    Ok(())
}

#[test]
fn test_add_control_prompts_and_inserts_before_itself() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.set_edit_mode(true);

    let list = select(&session, ".timeline-content ul")[0];
    let add = find_control(&session, list, Control::AddSubItem { rule: 1 });

    let mut messages = Vec::new();
    let mut prompt = |message: &str| {
        messages.push(message.to_string());
        Some("Mentored two interns".to_string())
    };
    assert_eq!(session.activate(add, &mut prompt), Outcome::Committed);
    assert_eq!(messages, vec!["Enter responsibility:"]);

    let list = session.document().get(list).expect("list survives");
    let texts: Vec<_> = list
        .content_children()
        .map(|item| item.text.clone().unwrap_or_default())
        .collect();
    assert_eq!(texts.last().map(String::as_str), Some("Mentored two interns"));
    assert_eq!(
        list.children.last().and_then(|c| c.control()),
        Some(Control::AddSubItem { rule: 1 })
    );

    // new item is editable and deletable right away
    let item = list.content_children().last().expect("new item");
    assert!(item.affordance.editable);
    assert!(item.children.iter().any(|c| c.control() == Some(Control::Delete)));
    Ok(())
}

#[test]
fn test_keyboard_shortcuts() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.add_item("skills-container", ".skill-card");

    let undo: KeyChord = "ctrl+z".parse()?;
    let redo: KeyChord = "ctrl+shift+z".parse()?;
    assert!(!session.handle_key(&undo));

    session.set_edit_mode(true);
    assert!(session.handle_key(&undo));
    assert_eq!(session.history().cursor(), Some(0));

    // consumed even when there is nothing left to undo
    assert!(session.handle_key(&undo));
    assert_eq!(session.history().cursor(), Some(0));

    assert!(session.handle_key(&redo));
    assert_eq!(session.history().cursor(), Some(1));
    assert!(session.handle_key(&"meta+y".parse()?));
    assert_eq!(session.history().cursor(), Some(1));
    Ok(())
}

#[test]
fn test_availability_events() -> Result<()> {
    let mut session = open(MemoryStore::new())?;
    session.settle();
    session.add_item("skills-container", ".skill-card");
    session.undo();
    session.undo();

    let availability: Vec<Availability> = session
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::AvailabilityChanged(availability) => Some(availability),
            _ => None,
        })
        .collect();

    assert_eq!(
        availability,
        vec![
            Availability { can_undo: false, can_redo: false },
            Availability { can_undo: true, can_redo: false },
            Availability { can_undo: false, can_redo: true },
            Availability { can_undo: false, can_redo: true },
        ]
    );
    Ok(())
}

#[test]
fn test_state_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let mut session = open(FileStore::open(dir.path())?)?;
    session.settle();
    session.add_item("projects-container", ".project-card");
    session.undo();
    session.redo();
    drop(session);

    let mut reopened = open(FileStore::open(dir.path())?)?;
    assert_eq!(select(&reopened, ".project-card").len(), 2);
    assert!(reopened.history().is_empty());
    assert!(reopened.drain_events().is_empty());
    Ok(())
}

#[test]
fn test_leaving_edit_mode_persists_pending_text() -> Result<()> {
    let gate = SharedGate::new(true);
    let template = Document::from_json(RESUME)?;
    let mut session = EditSession::open(
        EditorConfig::default(),
        template,
        MemoryStore::new(),
        gate.clone(),
        Duration::ZERO,
    )?;
    session.settle();
    session.set_edit_mode(true);
    let tagline = select(&session, ".tagline")[0];
    session.input_text(tagline, "Compiler engineer", ms(100));

    gate.revoke();
    assert!(!session.refresh_access());
    assert!(!session.has_pending_edit());
    assert_eq!(session.history().len(), 2);
    let stored = session.persisted_state().unwrap_or_default();
    assert!(stored.contains("Compiler engineer"));

    // controls are hidden again
    let is_any = |_: Control| true;
    assert!(count_controls(&session, is_any) > 0);
    session.document().walk(|element, _| {
        if element.is_control() {
            assert!(element.affordance.hidden);
        }
    });
    Ok(())
}

#[test]
fn test_legacy_state_is_normalized_on_load() -> Result<()> {
    let legacy = r#"{"tag":"main","children":[
        {"tag":"div","id":"certs-container","children":[
            {"tag":"div","classes":["cert-item"],"text":" AWS Solutions Architect ","children":[
                {"tag":"i","classes":["fas","fa-award"]}
            ]}
        ]}
    ]}"#;
    let mut store = MemoryStore::new();
    store.save("livedit_content", legacy)?;

    let session = open(store)?;
    let cert = select(&session, ".cert-item")[0];
    let cert = session.document().get(cert).expect("cert");
    let tags: Vec<_> = cert.content_children().map(|c| c.tag.as_str()).collect();
    assert_eq!(tags, vec!["i", "span"]);
    assert_eq!(cert.text_content(), "AWS Solutions Architect");
    Ok(())
}

#[test]
fn test_persist_failure_is_reported() -> Result<()> {
    let mut session = open(MemoryStore::with_quota(64))?;
    assert_eq!(session.settle(), Outcome::Committed);
    assert_eq!(session.add_item("skills-container", ".skill-card"), Outcome::Committed);
    assert_eq!(session.history().len(), 2);

    let failures = session
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::PersistFailed { .. }))
        .count();
    assert_eq!(failures, 2);
    assert!(session.undo());
    Ok(())
}
