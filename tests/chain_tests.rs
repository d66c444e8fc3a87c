//! Continuation chain tests
//!
//! Ordering, synchronous attach after settle, cooperative pause and resume.

mod common;

use common::*;
use module_loader::{EntryStatus, LoaderError, ModuleState};

#[test]
fn test_entries_run_in_registration_order() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let (first, second, third) = (log.clone(), log.clone(), log.clone());

    let id = loader
        .declare("A", &[], ["~/a.js"])
        .unwrap()
        .then(move |_| first.push("first"))
        .ready(move |_| second.push("second"))
        .then(move |_| third.push("third"))
        .id();

    loader.load(id);
    assert!(log.entries().is_empty());

    fetcher.complete("/static/a.js");
    loader.pump();
    assert_eq!(log.entries(), vec!["first", "second", "third"]);
}

#[test]
fn test_attach_after_ready_runs_before_returning() {
    let (mut loader, fetcher) = test_loader();
    let id = loader.declare("A", &[], ["~/a.js"]).unwrap().id();
    loader.load(id);
    fetcher.complete("/static/a.js");
    loader.pump();
    assert_eq!(loader.state(id), ModuleState::Ready);

    let log = CallLog::default();
    let late = log.clone();
    let handle = loader.attach(id, move |ctx| {
        assert!(ctx.is_ready());
        late.push(ctx.module().to_string());
    });

    assert_eq!(log.entries(), vec!["A"]);
    assert_eq!(loader.entry_status(handle), Some(EntryStatus::Ran));
}

#[test]
fn test_pause_halts_chain_and_resume_continues() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let (first, second, third) = (log.clone(), log.clone(), log.clone());

    let c = loader.declare("C", &[], ["~/c.js"]).unwrap().id();
    let h1 = loader.attach(c, move |ctx| {
        first.push("first");
        ctx.pause();
    });
    let h2 = loader.attach(c, move |_| second.push("second"));
    let h3 = loader.attach(c, move |_| third.push("third"));

    loader.load(c);
    fetcher.complete("/static/c.js");
    loader.pump();

    assert_eq!(log.entries(), vec!["first"]);
    assert!(loader.descriptor(c).chain().is_paused());
    assert_eq!(loader.descriptor(c).chain().cursor(), 1);
    assert_eq!(loader.entry_status(h1), Some(EntryStatus::Paused));
    assert_eq!(loader.entry_status(h2), Some(EntryStatus::Pending));

    assert!(loader.resume(c));
    assert_eq!(log.entries(), vec!["first", "second", "third"]);
    assert_eq!(loader.entry_status(h2), Some(EntryStatus::Ran));
    assert_eq!(loader.entry_status(h3), Some(EntryStatus::Ran));

    assert!(!loader.resume(c));
    assert_eq!(log.entries().len(), 3);
}

#[test]
fn test_attach_while_paused_waits_for_resume() {
    let (mut loader, _) = test_loader();
    let log = CallLog::default();
    let (first, late) = (log.clone(), log.clone());

    let id = loader
        .declare("bundle", &[], Vec::<module_loader::ResourceReference>::new())
        .unwrap()
        .then(move |ctx| {
            first.push("first");
            ctx.pause();
        })
        .id();
    loader.load(id);
    assert_eq!(log.entries(), vec!["first"]);

    loader.attach(id, move |_| late.push("late"));
    assert_eq!(log.entries(), vec!["first"]);

    loader.resume(id);
    assert_eq!(log.entries(), vec!["first", "late"]);
}

#[test]
fn test_pause_is_per_module() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let (x_log, y_log) = (log.clone(), log.clone());

    let x = loader
        .declare("X", &[], ["~/x.js"])
        .unwrap()
        .then(|ctx| ctx.pause())
        .then(move |_| x_log.push("x"))
        .id();
    let y = loader
        .declare("Y", &[], ["~/y.js"])
        .unwrap()
        .then(move |_| y_log.push("y"))
        .id();

    loader.load(x);
    loader.load(y);
    fetcher.complete_all();
    loader.pump();

    assert_eq!(log.entries(), vec!["y"]);
    assert!(loader.descriptor(x).chain().is_paused());
    assert!(!loader.descriptor(y).chain().is_paused());

    loader.resume(x);
    assert_eq!(log.entries(), vec!["y", "x"]);
}

#[test]
fn test_ready_entries_skipped_on_failure() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let (on_ready, on_settle) = (log.clone(), log.clone());

    let mut handle = loader.declare("A", &[], ["~/a.js"]).unwrap();
    let ready = handle.attach_ready(move |_| on_ready.push("ready"));
    let then = handle.attach(move |ctx| {
        let message = match ctx.error() {
            Some(LoaderError::ResourceLoad { reason, .. }) => reason.clone(),
            other => format!("unexpected {:?}", other),
        };
        on_settle.push(message);
    });
    let id = handle.id();

    loader.load(id);
    fetcher.fail("/static/a.js", "500 Internal Server Error");
    loader.pump();

    assert_eq!(log.entries(), vec!["500 Internal Server Error"]);
    assert_eq!(loader.entry_status(ready), Some(EntryStatus::Skipped));
    assert_eq!(loader.entry_status(then), Some(EntryStatus::Ran));
}

#[test]
fn test_entry_attached_during_drain_runs_in_same_pass() {
    let (mut loader, _) = test_loader();
    let log = CallLog::default();
    let (outer, inner) = (log.clone(), log.clone());

    let id = loader
        .declare("bundle", &[], Vec::<module_loader::ResourceReference>::new())
        .unwrap()
        .then(move |ctx| {
            outer.push("outer");
            let id = ctx.module_id();
            ctx.loader().attach(id, move |_| inner.push("inner"));
        })
        .id();

    loader.load(id);
    assert_eq!(log.entries(), vec!["outer", "inner"]);
}

#[test]
fn test_continuation_can_load_another_module() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let seen = log.clone();

    loader.declare("lazy", &[], ["~/lazy.js"]).unwrap();
    let id = loader
        .declare("A", &[], ["~/a.js"])
        .unwrap()
        .ready(move |ctx| {
            let lazy = ctx.loader().lookup("lazy").unwrap();
            let state = ctx.loader().load(lazy);
            seen.push(state.to_string());
        })
        .id();

    loader.load(id);
    fetcher.complete("/static/a.js");
    loader.pump();

    assert_eq!(log.entries(), vec!["self-loading"]);
    assert_eq!(fetcher.fetch_count("/static/lazy.js"), 1);
}

#[test]
fn test_pause_and_resume_inside_same_entry() {
    let (mut loader, _) = test_loader();
    let log = CallLog::default();
    let (first, second) = (log.clone(), log.clone());

    let id = loader
        .declare("bundle", &[], Vec::<module_loader::ResourceReference>::new())
        .unwrap()
        .then(move |ctx| {
            ctx.pause();
            let id = ctx.module_id();
            ctx.loader().resume(id);
            first.push("first");
        })
        .then(move |_| second.push("second"))
        .id();

    loader.load(id);
    assert_eq!(log.entries(), vec!["first", "second"]);
}

#[test]
fn test_dependency_chain_runs_before_dependent_settles() {
    let (mut loader, fetcher) = test_loader();
    let log = CallLog::default();
    let (dep_log, app_log) = (log.clone(), log.clone());

    loader
        .declare("core", &[], ["~/core.js"])
        .unwrap()
        .ready(move |_| dep_log.push("core"));
    let app = loader
        .declare("app", &["core"], ["~/app.js"])
        .unwrap()
        .ready(move |_| app_log.push("app"))
        .id();

    loader.load(app);
    fetcher.complete("/static/core.js");
    loader.pump();
    assert_eq!(log.entries(), vec!["core"]);

    fetcher.complete("/static/app.js");
    loader.pump();
    assert_eq!(log.entries(), vec!["core", "app"]);
}
