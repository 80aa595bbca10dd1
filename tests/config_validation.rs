// tests/config_validation.rs

use std::io::Write;

use sitepipe::config::{StepConfig, load_and_validate};
use sitepipe::errors::PipelineError;
use sitepipe::types::ErrorPolicy;
use sitepipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

#[test]
fn loads_a_toml_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[serve]
port = 8080

[task.clean]
src = ["public"]
steps = [{{ kind = "clean" }}]

[task.scripts]
src = ["js/*.js"]
dest = "public/js"
newer = true
on_error = "log"
after = ["clean"]
steps = [
  {{ kind = "concat", file = "app.js" }},
  {{ kind = "command", cmd = "terser {{input}} -o {{output}}" }},
]

[[watch]]
patterns = ["js/*.js"]
tasks = ["scripts"]
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.serve.port, 8080);
    assert_eq!(cfg.serve.dir, "dist");

    let scripts = &cfg.tasks()["scripts"];
    assert!(scripts.newer);
    assert_eq!(scripts.on_error, ErrorPolicy::Log);
    assert_eq!(scripts.concat_target(), Some("app.js"));
    assert_eq!(
        scripts.steps[1],
        StepConfig::Command {
            cmd: "terser {input} -o {output}".to_string(),
            ext: None,
            only: None,
            keep_input: false,
        }
    );
    assert!(cfg.tasks()["clean"].is_clean());
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("src/*", "dist").after("ghost").build())
        .try_build()
        .unwrap_err();

    assert!(matches!(err, PipelineError::ConfigError(ref m) if m.contains("ghost")), "{err}");
}

#[test]
fn cycles_are_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("src/*", "out/a").after("b").build())
        .with_task("b", TaskConfigBuilder::new("src/*", "out/b").after("a").build())
        .try_build()
        .unwrap_err();

    assert!(matches!(err, PipelineError::DagCycle(_)), "{err}");
}

#[test]
fn writer_must_run_after_the_clean_of_its_destination() {
    let err = ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::clean(&["dist"]).build())
        .with_task("css", TaskConfigBuilder::new("src/*.css", "dist/css").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(ref m) if m.contains("clean")), "{err}");

    ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::clean(&["dist"]).build())
        .with_task("css", TaskConfigBuilder::new("src/*.css", "dist/css").after("clean").build())
        .build();
}

#[test]
fn command_needs_both_placeholders() {
    let err = ConfigFileBuilder::new()
        .with_task(
            "img",
            TaskConfigBuilder::new("src/*.png", "out")
                .command("optipng {input}", None)
                .build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(ref m) if m.contains("{output}")), "{err}");
}

#[test]
fn watch_rules_must_name_known_tasks() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("src/*", "dist").build())
        .with_watch(&["src/*"], &["b"])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(ref m) if m.contains("'b'")), "{err}");
}

#[test]
fn non_clean_tasks_need_a_destination() {
    let mut task = TaskConfigBuilder::new("src/*", "dist").build();
    task.dest = None;
    let err = ConfigFileBuilder::new()
        .with_task("a", task)
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(ref m) if m.contains("dest")), "{err}");
}
