//! Test: Failure Handling - a failing step aborts the build and names itself

use crate::helpers::*;
use bundlet::core::{BuildMode, WatchSession};
use bundlet::pipeline::{BuildEvent, StepKind};
use std::sync::atomic::Ordering;

/// A compile failure stops the build before anything is copied
#[tokio::test]
async fn test_compile_failure_stops_the_build() {
    let build = TestBuild::failing_at("compile");
    let mut session = WatchSession::new();

    let err = build
        .run(BuildMode::Production, &mut session)
        .await
        .unwrap_err();

    assert_eq!(err.step(), StepKind::Compile);
    assert_eq!(build.ran_operations(), vec!["compile"]);
    // copy-assets never ran, so no HTML entry was written.
    assert!(!build.fixture.output_dir().join("index.html").exists());
    assert_eq!(session.builds_completed, 0);
}

/// A resolve failure points at resolve, not at the toolchain in general
#[tokio::test]
async fn test_resolve_failure_identifies_step() {
    let build = TestBuild::failing_at("resolve");
    let mut session = WatchSession::new();

    let err = build
        .run(BuildMode::Production, &mut session)
        .await
        .unwrap_err();

    assert_eq!(err.step(), StepKind::Resolve);
    assert_eq!(build.ran_operations(), vec!["compile", "resolve"]);
    assert!(err.to_string().contains("resolve"));
}

/// A broken minifier only hurts production; development skips it
#[tokio::test]
async fn test_minify_failure_only_hits_production() {
    let build = TestBuild::failing_at("minify");

    let mut session = WatchSession::new();
    let err = build
        .run(BuildMode::Production, &mut session)
        .await
        .unwrap_err();
    assert_eq!(err.step(), StepKind::Minify);

    let mut dev_session = WatchSession::new();
    let report = build
        .run(BuildMode::Development, &mut dev_session)
        .await
        .unwrap();
    assert_step_skipped(&report, StepKind::Minify);
    assert_eq!(dev_session.builds_completed, 1);
}

/// Failures surface as a BuildFailed event and suppress BuildCompleted
#[tokio::test]
async fn test_failed_build_emits_build_failed_event() {
    let build = TestBuild::failing_at("flatten");
    let mut session = WatchSession::new();

    let _ = build.run(BuildMode::Production, &mut session).await;

    let events = build.events.lock().unwrap();
    assert!(events.iter().any(|event| matches!(
        event,
        BuildEvent::BuildFailed {
            step: StepKind::Flatten,
            ..
        }
    )));
    assert!(!events
        .iter()
        .any(|event| matches!(event, BuildEvent::BuildCompleted { .. })));
}

/// Nothing after the failing step runs
#[tokio::test]
async fn test_later_steps_do_not_run_after_failure() {
    let build = TestBuild::failing_at("flatten");
    let mut session = WatchSession::new();

    build
        .run(BuildMode::Development, &mut session)
        .await
        .unwrap_err();

    assert_eq!(
        build.ran_operations(),
        vec!["compile", "resolve", "flatten"]
    );
    assert_eq!(build.spawns.load(Ordering::SeqCst), 0);
    assert!(build.notifications.lock().unwrap().is_empty());
}
