mod common;

use etlcat::config::validate_dag;
use etlcat::errors::EtlError;
use etlcat::plan::compile_steps;
use etlcat_test_utils::builders::DagBuilder;

#[test]
fn empty_includes_select_everything_in_order() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://garden/a", &["data://garden/b"])
        .step("data://garden/b", &[])
        .build();

    let steps = compile_steps(&dag, &[], &[], false, false).unwrap();
    let names: Vec<String> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["data://garden/b", "data://garden/a"]);
}

#[test]
fn selection_pulls_in_ancestors() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://a", &["data://b", "data://c"])
        .step("data://b", &["data://c"])
        .build();

    let steps = compile_steps(&dag, &["data://b".to_string()], &[], false, false).unwrap();
    let names: Vec<String> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["data://c", "data://b"]);
}

#[test]
fn downstream_adds_dependents() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://a", &["data://b", "data://c"])
        .step("data://b", &["data://c"])
        .build();

    let steps = compile_steps(&dag, &["data://b".to_string()], &[], true, false).unwrap();
    let names: Vec<String> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["data://c", "data://b", "data://a"]);
}

#[test]
fn only_overrides_downstream() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://a", &["data://b", "data://c"])
        .step("data://b", &["data://c"])
        .build();

    let steps =
        compile_steps(&dag, &["data://b".to_string()], &[], true, true).unwrap();
    let names: Vec<String> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["data://b"]);
}

#[test]
fn excluded_steps_are_dropped_but_still_resolved_as_dependencies() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://a", &["data://b"])
        .step("data://b", &[])
        .build();

    let steps = compile_steps(
        &dag,
        &["data://a".to_string()],
        &["data://b".to_string()],
        false,
        false,
    )
    .unwrap();

    let names: Vec<String> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["data://a"]);

    // The excluded step is not scheduled, but the surviving step still owns
    // it in its dependency tree for checksum purposes.
    assert_eq!(steps[0].dependencies.len(), 1);
    assert_eq!(steps[0].dependencies[0].name(), "data://b");
}

#[test]
fn unmatched_patterns_are_reported() {
    common::init();
    let dag = DagBuilder::new().step("data://a", &[]).build();

    let err = compile_steps(&dag, &["data://nope".to_string()], &[], false, false).unwrap_err();
    assert!(matches!(err, EtlError::NoStepsMatched(_)));
}

#[test]
fn cyclic_selection_fails() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://a", &["data://b"])
        .step("data://b", &["data://a"])
        .build();

    let err = compile_steps(&dag, &[], &[], false, false).unwrap_err();
    assert!(matches!(err, EtlError::DagCycle(_)));
}

#[test]
fn validation_rejects_public_step_with_private_dependency() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://garden/a", &["data-private://garden/b"])
        .step("data-private://garden/b", &[])
        .build();

    let err = validate_dag(&dag).unwrap_err();
    match err {
        EtlError::PrivateDependency { step, dependency } => {
            assert_eq!(step, "data://garden/a");
            assert_eq!(dependency, "data-private://garden/b");
        }
        other => panic!("expected PrivateDependency, got {other:?}"),
    }
}

#[test]
fn validation_allows_private_and_grapher_consumers_of_private_data() {
    common::init();
    let dag = DagBuilder::new()
        .step("data-private://garden/a", &["snapshot-private://a.csv"])
        .step("grapher://grapher/a", &["data-private://garden/a"])
        .step("snapshot-private://a.csv", &[])
        .build();

    validate_dag(&dag).unwrap();
}

#[test]
fn validation_rejects_unknown_schemes() {
    common::init();
    let dag = DagBuilder::new().step("mystery://what/is/this", &[]).build();

    let err = validate_dag(&dag).unwrap_err();
    assert!(matches!(err, EtlError::UnknownScheme(_)));
}
