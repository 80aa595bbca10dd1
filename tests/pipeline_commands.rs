// tests/pipeline_commands.rs

//! Command steps against the real filesystem and `sh`.
#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use sitepipe::config::default_config;
use sitepipe::errors::PipelineError;
use sitepipe::fs::RealFileSystem;
use sitepipe::pipeline::{ExecContext, run_task};
use sitepipe::types::ErrorPolicy;
use sitepipe_test_utils::builders::TaskConfigBuilder;
use sitepipe_test_utils::init_tracing;

fn site() -> (tempfile::TempDir, ExecContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ExecContext::new(dir.path(), Arc::new(RealFileSystem));
    (dir, ctx)
}

fn write(root: &std::path::Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn command_output_replaces_the_file_with_the_new_extension() {
    init_tracing();
    let (dir, ctx) = site();
    write(dir.path(), "src/scss/a.scss", "body { color: red; }\n");
    write(dir.path(), "src/scss/b.scss", "p { margin: 0; }\n");

    let task = TaskConfigBuilder::new("src/scss/**/*.scss", "dist/css")
        .concat("style.min.scss")
        .command("tr -d ' \\n' < {input} > {output}", Some("css"))
        .build();
    let report = run_task(&ctx, "compile-styles", &task).await.unwrap();

    assert_eq!(report.written, 1);
    let css = fs::read_to_string(dir.path().join("dist/css/style.min.css")).unwrap();
    assert_eq!(css, "body{color:red;}p{margin:0;}");
    assert!(!dir.path().join("dist/css/style.min.scss").exists());
}

#[tokio::test]
async fn keep_input_emits_both_files_and_only_filters_by_name() {
    let (dir, ctx) = site();
    write(dir.path(), "src/fonts/Inter.ttf", "ttf");
    write(dir.path(), "src/fonts/LICENSE.txt", "license");

    let task = TaskConfigBuilder::new("src/fonts/*.*", "dist/fonts")
        .step(sitepipe::config::StepConfig::Command {
            cmd: "cp {input} {output}".to_string(),
            ext: Some("woff".to_string()),
            only: Some(vec!["*.ttf".to_string()]),
            keep_input: true,
        })
        .build();
    run_task(&ctx, "convert-fonts", &task).await.unwrap();

    let out = dir.path().join("dist/fonts");
    assert_eq!(fs::read_to_string(out.join("Inter.ttf")).unwrap(), "ttf");
    assert_eq!(fs::read_to_string(out.join("Inter.woff")).unwrap(), "ttf");
    assert!(out.join("LICENSE.txt").exists());
    assert!(!out.join("LICENSE.woff").exists());
}

#[tokio::test]
async fn failing_tool_with_log_policy_leaves_previous_output_alone() {
    init_tracing();
    let (dir, ctx) = site();
    write(dir.path(), "src/scss/broken.scss", "body {");
    write(dir.path(), "dist/css/style.min.css", "previous");

    let task = TaskConfigBuilder::new("src/scss/*.scss", "dist/css")
        .concat("style.min.css")
        .command("echo 'syntax error' >&2; exit 1 # {input} {output}", None)
        .on_error(ErrorPolicy::Log)
        .build();
    let report = run_task(&ctx, "compile-styles", &task).await.unwrap();

    assert_eq!(report.dropped, 1);
    assert_eq!(report.written, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/css/style.min.css")).unwrap(),
        "previous"
    );
}

#[tokio::test]
async fn failing_tool_with_fail_policy_fails_the_task() {
    let (dir, ctx) = site();
    write(dir.path(), "src/js/app.js", "let");

    let task = TaskConfigBuilder::new("src/js/*.js", "dist/js")
        .command("exit 2 # {input} {output}", None)
        .build();
    let err = run_task(&ctx, "compress-scripts", &task).await.unwrap_err();

    match err {
        PipelineError::Transform { task, file, .. } => {
            assert_eq!(task, "compress-scripts");
            assert!(file.ends_with("src/js/app.js"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn invalid_scss_is_logged_and_the_built_in_bundle_step_still_succeeds() {
    init_tracing();
    let (dir, ctx) = site();
    write(dir.path(), "src/scss/broken.scss", "body {");

    let cfg = default_config().unwrap();

    let compiled = run_task(&ctx, "compile-styles", &cfg.task["compile-styles"])
        .await
        .unwrap();
    assert_eq!(compiled.dropped, 1);
    assert_eq!(compiled.written, 0);

    let merged = run_task(&ctx, "concat-styles", &cfg.task["concat-styles"])
        .await
        .unwrap();
    assert_eq!(merged.matched, 0);
    assert!(!dir.path().join("dist/css/style.min.css").exists());
}
