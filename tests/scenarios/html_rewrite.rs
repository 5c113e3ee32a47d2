//! Test: HTML Rewrite - placeholder substitution and static asset copying

use crate::helpers::*;
use bundlet::core::{BuildMode, WatchSession};
use bundlet::pipeline::StepKind;

/// Both placeholders are replaced by the stamped names, exactly once
#[tokio::test]
async fn test_placeholders_replaced_with_stamped_names() {
    let build = TestBuild::new();
    let mut session = WatchSession::new();

    let report = build.run(BuildMode::Production, &mut session).await.unwrap();
    let html = build.fixture.output_html();

    assert!(!html.contains("/build/bundle.css"));
    assert!(!html.contains("/build/bundle.js"));
    assert_eq!(count_occurrences(&html, &report.stylesheet_name), 1);
    assert_eq!(count_occurrences(&html, &report.script_name), 1);
    // The rest of the markup is untouched.
    assert!(html.contains("<div id=\"editor-root\"></div>"));
    assert!(html.contains("<link rel=\"icon\" href=\"/favicon.png\" />"));
}

/// Substitution is literal text replacement, not a pattern match
#[tokio::test]
async fn test_substitution_is_literal_not_a_pattern() {
    let fixture = FixtureProject::new();
    fixture.write_html(
        "<link href=\"/build/bundleXcss\" />\n\
         <link rel=\"stylesheet\" href=\"/build/bundle.css\" />\n\
         <script src=\"/build/bundle.js\"></script>\n",
    );
    let config = fixture.config();
    let build = TestBuild::assemble(fixture, config, MockToolchain::new(), RecordingLauncher::new());
    let mut session = WatchSession::new();

    build.run(BuildMode::Production, &mut session).await.unwrap();
    let html = build.fixture.output_html();

    // The dot in the placeholder only matches a literal dot.
    assert!(html.contains("/build/bundleXcss"));
    assert!(!html.contains("/build/bundle.css"));
}

/// Static files land in the output byte for byte, nesting preserved
#[tokio::test]
async fn test_static_files_copied_verbatim() {
    let build = TestBuild::new();
    let mut session = WatchSession::new();

    build.run(BuildMode::Production, &mut session).await.unwrap();

    let output = build.fixture.output_dir();
    assert_eq!(std::fs::read(output.join("favicon.png")).unwrap(), b"\x89PNG");
    assert_eq!(
        std::fs::read_to_string(output.join("assets/logo.svg")).unwrap(),
        "<svg/>"
    );
}

/// A project without a static directory fails at copy-assets
#[tokio::test]
async fn test_missing_static_dir_fails_copy_assets() {
    let fixture = FixtureProject::new();
    std::fs::remove_dir_all(fixture.path().join("public")).unwrap();
    let config = fixture.config();
    let build = TestBuild::assemble(fixture, config, MockToolchain::new(), RecordingLauncher::new());
    let mut session = WatchSession::new();

    let err = build
        .run(BuildMode::Production, &mut session)
        .await
        .unwrap_err();

    assert_eq!(err.step(), StepKind::CopyAssets);
}

/// A static directory without the HTML entry fails at copy-assets
#[tokio::test]
async fn test_missing_html_entry_fails_copy_assets() {
    let fixture = FixtureProject::new();
    std::fs::remove_file(fixture.path().join("public/index.html")).unwrap();
    let config = fixture.config();
    let build = TestBuild::assemble(fixture, config, MockToolchain::new(), RecordingLauncher::new());
    let mut session = WatchSession::new();

    let err = build
        .run(BuildMode::Production, &mut session)
        .await
        .unwrap_err();

    assert_eq!(err.step(), StepKind::CopyAssets);
}

/// Only the HTML entry is mandatory; other static files are optional
#[tokio::test]
async fn test_static_dir_with_only_html_builds() {
    let fixture = FixtureProject::new();
    std::fs::remove_dir_all(fixture.path().join("public/assets")).unwrap();
    std::fs::remove_file(fixture.path().join("public/favicon.png")).unwrap();
    let config = fixture.config();
    let build = TestBuild::assemble(fixture, config, MockToolchain::new(), RecordingLauncher::new());
    let mut session = WatchSession::new();

    let report = build.run(BuildMode::Production, &mut session).await.unwrap();

    assert_step_executed(&report, StepKind::CopyAssets);
    assert!(build.fixture.output_dir().join("index.html").is_file());
}

/// The emitted script ends with a source map reference and the map
/// file sits next to it
#[tokio::test]
async fn test_emitted_script_references_source_map() {
    let build = TestBuild::new();
    let mut session = WatchSession::new();

    let report = build.run(BuildMode::Production, &mut session).await.unwrap();

    let output = build.fixture.output_dir();
    let script = std::fs::read_to_string(output.join(&report.script_name)).unwrap();
    assert!(script.contains("/* minified */"));
    assert!(script.contains(&format!("//# sourceMappingURL={}.map", report.script_name)));
    assert!(output.join(format!("{}.map", report.script_name)).is_file());
    assert!(output.join(&report.stylesheet_name).is_file());
}
