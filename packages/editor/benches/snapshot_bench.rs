use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use livedit_editor::{
    AffordanceRules, Document, EditSession, EditorConfig, Element, MemoryStore, ReconcileContext,
    Reconciler, RuleSet, SelectorList, Snapshot, StaticGate,
};

fn large_resume(cards: usize) -> Document {
    let mut container = Element::new("div").with_id("skills-container");
    for n in 0..cards {
        let mut list = Element::new("ul");
        for item in 0..6 {
            list = list.with_child(Element::new("li").with_text(format!("Skill {}.{}", n, item)));
        }
        container = container.with_child(
            Element::new("div")
                .with_class("skill-card")
                .with_child(Element::new("h3").with_text(format!("Group {}", n)))
                .with_child(list),
        );
    }
    Document::new(Element::new("main").with_child(container))
}

fn rules() -> RuleSet {
    RuleSet::compile(&AffordanceRules::default()).expect("default rules compile")
}

fn parse_selector_list(c: &mut Criterion) {
    let source = "h1, h2, h3, p, span:not(.add-tag), li, a:not(.social-link), .cert-item";

    c.bench_function("parse_selector_list", |b| {
        b.iter(|| SelectorList::parse(black_box(source)))
    });
}

fn capture_snapshot(c: &mut Criterion) {
    let doc = large_resume(40);

    c.bench_function("capture_snapshot", |b| {
        b.iter(|| Snapshot::capture(black_box(&doc)))
    });
}

fn restore_snapshot(c: &mut Criterion) {
    let mut doc = large_resume(40);
    let snapshot = Snapshot::capture(&doc).expect("capture");

    c.bench_function("restore_snapshot", |b| {
        b.iter(|| snapshot.restore(black_box(&mut doc)))
    });
}

fn reconcile_edit_mode(c: &mut Criterion) {
    let rules = rules();
    let reconciler = Reconciler::new();
    let ctx = ReconcileContext {
        edit_mode: true,
        show_controls: true,
    };
    let mut doc = large_resume(40);
    reconciler.reconcile(&mut doc, &rules, ctx);

    c.bench_function("reconcile_steady_state", |b| {
        b.iter(|| reconciler.reconcile(black_box(&mut doc), &rules, ctx))
    });
}

fn add_then_undo(c: &mut Criterion) {
    let mut session = EditSession::open(
        EditorConfig::default(),
        large_resume(10),
        MemoryStore::new(),
        StaticGate(true),
        Duration::ZERO,
    )
    .expect("session opens");
    session.settle();

    c.bench_function("add_then_undo", |b| {
        b.iter(|| {
            session.add_item("skills-container", ".skill-card");
            session.undo()
        })
    });
}

criterion_group!(
    benches,
    parse_selector_list,
    capture_snapshot,
    restore_snapshot,
    reconcile_edit_mode,
    add_then_undo
);
criterion_main!(benches);
