mod common;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use etlcat::config::load_dag;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn deps(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn loads_a_single_document() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "dag.toml",
        r#"
[steps]
"data://garden/a" = ["snapshot://a.csv"]
"snapshot://a.csv" = []
"#,
    );

    let dag = load_dag(dir.path().join("dag.toml")).unwrap();
    assert_eq!(dag.len(), 2);
    assert_eq!(dag.get("data://garden/a").unwrap(), &deps(&["snapshot://a.csv"]));
    assert!(dag.get("snapshot://a.csv").unwrap().is_empty());
}

#[test]
fn missing_dependency_list_means_no_dependencies() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "dag.toml",
        r#"
[steps]
"snapshot://a.csv" = []
"#,
    );

    let dag = load_dag(dir.path().join("dag.toml")).unwrap();
    assert!(dag.get("snapshot://a.csv").unwrap().is_empty());
}

#[test]
fn root_document_wins_over_includes() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "archive.toml",
        r#"
[steps]
"data://garden/a" = ["snapshot://old.csv"]
"data://garden/b" = ["snapshot://b.csv"]
"#,
    );
    write(
        dir.path(),
        "dag.toml",
        r#"
include = ["archive.toml"]

[steps]
"data://garden/a" = ["snapshot://new.csv"]
"#,
    );

    let dag = load_dag(dir.path().join("dag.toml")).unwrap();

    // The root's entry replaces (not unions) the included one.
    assert_eq!(dag.get("data://garden/a").unwrap(), &deps(&["snapshot://new.csv"]));
    // Non-colliding included entries are inherited.
    assert_eq!(dag.get("data://garden/b").unwrap(), &deps(&["snapshot://b.csv"]));
}

#[test]
fn later_sibling_include_wins() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "first.toml",
        r#"
[steps]
"data://garden/a" = ["snapshot://first.csv"]
"#,
    );
    write(
        dir.path(),
        "second.toml",
        r#"
[steps]
"data://garden/a" = ["snapshot://second.csv"]
"#,
    );
    write(
        dir.path(),
        "dag.toml",
        r#"
include = ["first.toml", "second.toml"]

[steps]
"data://garden/other" = []
"#,
    );

    let dag = load_dag(dir.path().join("dag.toml")).unwrap();
    assert_eq!(
        dag.get("data://garden/a").unwrap(),
        &deps(&["snapshot://second.csv"])
    );
}

#[test]
fn nested_includes_resolve_against_the_root_directory() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "leaf.toml",
        r#"
[steps]
"snapshot://leaf.csv" = []
"#,
    );
    write(
        dir.path(),
        "middle.toml",
        r#"
include = ["leaf.toml"]

[steps]
"data://garden/mid" = ["snapshot://leaf.csv"]
"#,
    );
    write(
        dir.path(),
        "dag.toml",
        r#"
include = ["middle.toml"]

[steps]
"data://garden/root" = ["data://garden/mid"]
"#,
    );

    let dag = load_dag(dir.path().join("dag.toml")).unwrap();
    assert_eq!(dag.len(), 3);
    assert!(dag.contains_key("snapshot://leaf.csv"));
    assert!(dag.contains_key("data://garden/mid"));
    assert!(dag.contains_key("data://garden/root"));
}
