// tests/watch_dispatch.rs

use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind};
use tokio::sync::mpsc;

use sitepipe::engine::{RuntimeEvent, TriggerReason};
use sitepipe::watch::WatchRuleSet;
use sitepipe::watch::event_handler::{is_content_change, process_file_change, tasks_for_paths};
use sitepipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn rules() -> WatchRuleSet {
    let cfg = ConfigFileBuilder::new()
        .with_task("styles", TaskConfigBuilder::new("src/scss/**/*.scss", "dist/css").build())
        .with_task("bundle", TaskConfigBuilder::new("dist/css/*.css", "dist/css").build())
        .with_task("pages", TaskConfigBuilder::new("src/pages/*.html", "dist").build())
        .with_watch(&["src/scss/**/*.scss"], &["styles", "bundle"])
        .with_watch(&["src/pages/*", "src/components/*"], &["pages"])
        .build();
    WatchRuleSet::from_config(&cfg).unwrap()
}

#[test]
fn reads_do_not_count_as_changes() {
    assert!(is_content_change(&EventKind::Create(CreateKind::File)));
    assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
    assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
    assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::AccessTime
    ))));
}

#[test]
fn paths_of_one_event_collapse_into_one_task_list() {
    let root = Path::new("/site");
    let paths = [
        PathBuf::from("/site/src/pages/home.html"),
        PathBuf::from("/site/src/components/header.html"),
        PathBuf::from("/site/src/scss/main.scss"),
        PathBuf::from("/elsewhere/file.scss"),
    ];

    let tasks = tasks_for_paths(root, paths.iter().map(|p| p.as_path()), &rules());
    assert_eq!(tasks, vec!["pages", "styles", "bundle"]);
}

#[tokio::test]
async fn matching_change_sends_one_file_watch_batch() {
    let (tx, mut rx) = mpsc::channel(8);
    let rules = rules();

    process_file_change(
        Path::new("/site"),
        &[PathBuf::from("/site/dist/css/style.min.css")],
        &rules,
        &tx,
    )
    .await;
    process_file_change(
        Path::new("/site"),
        &[PathBuf::from("/site/src/scss/parts/_grid.scss")],
        &rules,
        &tx,
    )
    .await;
    drop(tx);

    match rx.recv().await {
        Some(RuntimeEvent::TasksTriggered { tasks, reason }) => {
            assert_eq!(tasks, vec!["styles", "bundle"]);
            assert_eq!(reason, TriggerReason::FileWatch);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(rx.recv().await.is_none());
}
