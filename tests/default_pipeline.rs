// tests/default_pipeline.rs

use sitepipe::config::default_config;
use sitepipe::dag::DagGraph;
use sitepipe::watch::WatchRuleSet;

const STARTUP_ORDER: &[&str] = &[
    "clean-dist",
    "clean-img",
    "compile-styles",
    "concat-styles",
    "compress-scripts",
    "optimize-images",
    "convert-avif",
    "convert-webp",
    "convert-fonts",
    "assemble-pages",
    "minify-html",
];

#[test]
fn built_in_pipeline_is_valid() {
    let cfg = default_config().expect("built-in pipeline must validate");
    assert_eq!(cfg.serve.dir, "dist");
    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.watch_rules().len(), 7);
}

#[test]
fn startup_tasks_run_in_the_documented_order() {
    let cfg = default_config().unwrap();
    let graph = DagGraph::from_config(&cfg);

    let startup: Vec<String> = cfg.startup_tasks();
    let order: Vec<&str> = graph
        .tasks()
        .filter(|name| startup.iter().any(|s| s == name))
        .collect();

    assert_eq!(order, STARTUP_ORDER);
    assert!(!startup.contains(&"copy-images".to_string()));
}

#[test]
fn reload_follows_styles_scripts_and_pages() {
    let cfg = default_config().unwrap();
    let mut reloading: Vec<&str> = cfg
        .tasks()
        .iter()
        .filter(|(_, t)| t.reload)
        .map(|(name, _)| name.as_str())
        .collect();
    reloading.sort();

    assert_eq!(
        reloading,
        vec!["assemble-pages", "compile-styles", "compress-scripts", "minify-html"]
    );
}

#[test]
fn built_in_watch_rules_map_sources_to_tasks() {
    let cfg = default_config().unwrap();
    let rules = WatchRuleSet::from_config(&cfg).unwrap();

    assert_eq!(
        rules.tasks_for("src/scss/base/_vars.scss"),
        vec!["compile-styles", "concat-styles"]
    );
    assert_eq!(rules.tasks_for("src/js/app.js"), vec!["compress-scripts"]);
    assert_eq!(
        rules.tasks_for("src/img/photo.jpg"),
        vec!["optimize-images", "convert-webp", "convert-avif"]
    );
    assert_eq!(rules.tasks_for("src/img/anim.gif"), vec!["optimize-images"]);
    assert_eq!(rules.tasks_for("src/img/dist/logo.svg"), vec!["copy-images"]);
    assert_eq!(rules.tasks_for("src/fonts/Inter.ttf"), vec!["convert-fonts"]);
    assert_eq!(
        rules.tasks_for("src/components/header.html"),
        vec!["assemble-pages"]
    );

    // Build output and staging files never trigger anything.
    assert!(rules.tasks_for("dist/css/style.min.css").is_empty());
    assert!(rules.tasks_for("src/img/source/optimize/photo.jpg").is_empty());
}
