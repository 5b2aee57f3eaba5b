//! Highlight session lifecycle tests
//!
//! Degradation, stale-result handling, disposal and the background worker.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{edit, engine_missing_artifact, engine_with, ready_session, single_job, CountingRuntime};
use hilite::commands::Cmd;
use hilite::messages::SyntaxMsg;
use hilite::syntax::{
    DocumentId, HighlightEngine, HighlightError, HighlightSession, LanguageId, SessionState,
    SyntaxWorker,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

// ========================================================================
// Graceful degradation
// ========================================================================

#[test]
fn test_missing_artifact_degrades_to_plain_text() {
    let engine = engine_missing_artifact(LanguageId::JavaScript);
    let mut session = ready_session(&engine, LanguageId::JavaScript, "let a = 1;");

    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.is_degraded());
    assert!(session.decorations().is_empty());
    assert!(matches!(
        session.disabled_reason(),
        Some(HighlightError::GrammarLoad { .. })
    ));

    // Later edits are accepted without scheduling work or panicking
    for text in ["let a = 2;", "let a = 3;", ""] {
        assert!(session.update(SyntaxMsg::edit(text)).is_none());
    }
    assert_eq!(session.revision(), 3);
    assert!(session.decorations().is_empty());
}

#[test]
fn test_bootstrap_failure_degrades_every_session() {
    let runtime = Arc::new(CountingRuntime::failing_bootstrap());
    let engine = engine_with(Arc::clone(&runtime));

    for (id, language, text) in [
        (1, LanguageId::Rust, "fn main() {}"),
        (2, LanguageId::Json, "{\"a\": 1}"),
    ] {
        let (mut session, cmd) =
            HighlightSession::attach(DocumentId(id), language, text, &engine).unwrap();
        assert!(session.run_to_completion(cmd, &engine));

        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_degraded());
        assert!(session.decorations().is_empty());
        assert!(matches!(
            session.disabled_reason(),
            Some(HighlightError::Bootstrap { .. })
        ));
        assert!(session.update(SyntaxMsg::edit("")).is_none());
    }

    // The failed bootstrap is shared, not retried per document
    assert_eq!(runtime.bootstraps(), 1);
    assert_eq!(runtime.loads(), 0);
}

#[test]
fn test_degradation_is_per_language() {
    let engine = engine_missing_artifact(LanguageId::Python);
    let broken = ready_session(&engine, LanguageId::Python, "x = 1");
    let working = ready_session(&engine, LanguageId::Go, "package main");

    assert!(broken.is_degraded());
    assert!(!working.is_degraded());
    assert!(!working.decorations().is_empty());
}

#[test]
fn test_grammar_failure_logged_once_across_documents() {
    let runtime = Arc::new(CountingRuntime::failing(&[LanguageId::Css]));
    let engine = engine_with(Arc::clone(&runtime));

    for id in 0..4 {
        let (mut session, cmd) =
            HighlightSession::attach(DocumentId(id), LanguageId::Css, "a { color: red; }", &engine)
                .unwrap();
        session.run_to_completion(cmd, &engine);
        assert!(session.is_degraded());
    }
    assert_eq!(runtime.loads(), 1);
}

#[test]
fn test_language_change_recovers_from_degradation() {
    let engine = engine_missing_artifact(LanguageId::TypeScript);
    let mut session = ready_session(&engine, LanguageId::TypeScript, "let x = 1;");
    assert!(session.is_degraded());

    let cmd = session
        .update(SyntaxMsg::LanguageChanged(LanguageId::JavaScript))
        .unwrap();
    session.run_to_completion(cmd, &engine);

    assert!(!session.is_degraded());
    assert_eq!(session.decorations().language, Some(LanguageId::JavaScript));
    assert!(!session.decorations().is_empty());
}

#[test]
fn test_unknown_language_is_rejected_at_mount() {
    let engine = HighlightEngine::new(
        hilite::syntax::GrammarCatalog::default(),
        Arc::new(hilite::syntax::BundledRuntime),
        "ts-",
    );
    let result = HighlightSession::attach(DocumentId(1), LanguageId::Rust, "fn f() {}", &engine);
    assert!(matches!(
        result,
        Err(HighlightError::UnsupportedLanguage { .. })
    ));
}

// ========================================================================
// Revisions and stale results
// ========================================================================

#[test]
fn test_bootstrap_publishes_nothing_until_complete() {
    let engine = HighlightEngine::bundled();
    let (mut session, cmd) =
        HighlightSession::attach(DocumentId(1), LanguageId::Rust, "fn main() {}", &engine).unwrap();

    assert_eq!(session.state(), SessionState::Bootstrapping);
    assert!(session.decorations().is_empty());

    // Edits during bootstrap wait for it
    assert!(session.update(SyntaxMsg::edit("fn main() { 1 }")).is_none());
    assert_eq!(session.state(), SessionState::Bootstrapping);

    session.run_to_completion(cmd, &engine);
    assert_eq!(session.state(), SessionState::Ready);
    let set = session.decorations();
    assert_eq!(set.revision, 1);
    assert!(set.ranges().iter().any(|r| r.class() == "ts-number"
        || r.class().starts_with("ts-constant")));
}

#[test]
fn test_stale_result_discarded_and_latest_text_wins() {
    let engine = HighlightEngine::bundled();
    let mut session = ready_session(&engine, LanguageId::JavaScript, "let a = 1;");

    let first = single_job(session.update(SyntaxMsg::edit("let a = 'b';")));
    assert!(session.update(SyntaxMsg::edit("let a = 'bc';")).is_none());
    assert!(session.update(SyntaxMsg::edit("let a = 'bcd';")).is_none());

    let first_outcome = first.run(&engine);
    assert_eq!(first_outcome.revision, 1);

    // Stale: nothing published, one job for the newest text
    let next = single_job(session.update(SyntaxMsg::ParseCompleted(first_outcome)));
    assert_eq!(next.revision, 3);
    assert_eq!(&*next.text, "let a = 'bcd';");
    assert!(next.is_incremental(), "stale tree seeds the next parse");
    assert_eq!(session.decorations().revision, 0);

    let cmd = session.update(SyntaxMsg::ParseCompleted(next.run(&engine)));
    assert!(cmd.unwrap().needs_redraw());

    let set = session.decorations();
    assert_eq!(set.revision, 3);
    let full = engine
        .highlight_text("let a = 'bcd';", LanguageId::JavaScript)
        .unwrap();
    assert_eq!(set.ranges(), full.ranges());
}

#[test]
fn test_reparsing_keeps_previous_decorations_visible() {
    let engine = HighlightEngine::bundled();
    let mut session = ready_session(&engine, LanguageId::Go, "package main\n");
    let before = session.decorations();

    let job = single_job(session.update(SyntaxMsg::edit("package main\n\nfunc f() {}\n")));
    assert_eq!(session.state(), SessionState::Reparsing);
    assert!(Arc::ptr_eq(&before, &session.decorations()));

    session.update(SyntaxMsg::ParseCompleted(job.run(&engine)));
    assert!(session.decorations().len() > before.len());
}

#[test]
fn test_edits_match_full_highlight() {
    let engine = HighlightEngine::bundled();
    let mut session = ready_session(&engine, LanguageId::Python, "def f():\n    pass\n");

    let texts = [
        "def f():\n    return 1\n",
        "def f(x):\n    return x + 1\n",
        "class A:\n    def f(self, x):\n        return x + 1\n",
    ];
    for text in texts {
        edit(&mut session, &engine, text);
        let full = engine.highlight_text(text, LanguageId::Python).unwrap();
        assert_eq!(session.decorations().ranges(), full.ranges(), "{text:?}");
    }
}

// ========================================================================
// Disposal
// ========================================================================

#[test]
fn test_dispose_with_job_in_flight() {
    let engine = HighlightEngine::bundled();
    let mut session = ready_session(&engine, LanguageId::C, "int x;");
    let job = single_job(session.update(SyntaxMsg::edit("int x = 1;")));

    session.dispose();
    assert_eq!(session.state(), SessionState::Disposed);
    assert!(!job.is_alive());

    assert!(session
        .update(SyntaxMsg::ParseCompleted(job.run(&engine)))
        .is_none());
    assert!(session.decorations().is_empty());
    assert!(session
        .update(SyntaxMsg::LanguageChanged(LanguageId::Cpp))
        .is_none());
}

// ========================================================================
// Background worker
// ========================================================================

#[test]
fn test_worker_drives_session() {
    let engine = Arc::new(HighlightEngine::bundled());
    let (worker, results) = SyntaxWorker::spawn(Arc::clone(&engine)).unwrap();

    let (mut session, cmd) = HighlightSession::attach(
        DocumentId(3),
        LanguageId::Java,
        "class A { int x = 1; }",
        &engine,
    )
    .unwrap();
    worker.process_cmd(cmd);

    let mut edits = vec![
        "class A { int x = 2; }",
        "class A { String s = \"x\"; }",
    ];
    edits.reverse();

    // Feed edits while jobs are in flight, then drain until idle
    loop {
        if let Some(text) = edits.pop() {
            if let Some(cmd) = session.update(SyntaxMsg::edit(text)) {
                worker.process_cmd(cmd);
            }
        }
        if !session.is_parse_in_flight() && edits.is_empty() {
            break;
        }
        if session.is_parse_in_flight() {
            let outcome = results.recv_timeout(RECV_TIMEOUT).expect("worker result");
            if let Some(cmd) = session.update(SyntaxMsg::ParseCompleted(outcome)) {
                worker.process_cmd(cmd);
            }
        }
    }

    assert_eq!(session.state(), SessionState::Ready);
    let set = session.decorations();
    assert_eq!(set.revision, 2);
    assert!(set.ranges().iter().any(|r| r.class() == "ts-string"));
}

#[test]
fn test_worker_drops_results_for_disposed_session() {
    let runtime = Arc::new(CountingRuntime::slow(Duration::from_millis(100)));
    let engine = Arc::new(engine_with(Arc::clone(&runtime)));
    let (worker, results) = SyntaxWorker::spawn(Arc::clone(&engine)).unwrap();

    let (mut session, cmd) =
        HighlightSession::attach(DocumentId(9), LanguageId::Bash, "echo hi", &engine).unwrap();
    assert!(!worker.process_cmd(cmd));

    // Dispose while the worker is stalled inside bootstrap
    std::thread::sleep(Duration::from_millis(20));
    session.dispose();

    drop(worker);
    assert!(results.try_recv().is_err());
}

#[test]
fn test_worker_shutdown_after_receiver_dropped() {
    let engine = Arc::new(HighlightEngine::bundled());
    let (worker, results) = SyntaxWorker::spawn(Arc::clone(&engine)).unwrap();
    drop(results);

    let (_session, cmd) =
        HighlightSession::attach(DocumentId(1), LanguageId::Toml, "a = 1", &engine).unwrap();
    worker.process_cmd(Cmd::batch(vec![cmd]));
    // Joins without hanging
    drop(worker);
}
