use lbgen_core::error::ResolveError;
use lbgen_core::parse;
use lbgen_core::pipeline::{self, PipelineOptions};
use lbgen_core::transform::{ControllerNaming, resolve_controller_ids};

const TODO: &str = include_str!("fixtures/loopback-todo.yaml");
const EMPTY_PATH: &str = include_str!("fixtures/empty-path.yaml");

fn ids(yaml: &str, naming: &ControllerNaming) -> Vec<String> {
    let spec = parse::from_yaml(yaml).unwrap();
    resolve_controller_ids(&spec, naming)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn single_tagged_path() {
    let yaml = r#"
openapi: 3.0.0
paths:
  /foo:
    get:
      tags: [FooController]
"#;
    assert_eq!(ids(yaml, &ControllerNaming::default()), vec!["foo"]);
}

#[test]
fn prefix_stripped_then_reapplied_as_namespace() {
    let yaml = r#"
openapi: 3.0.0
paths:
  /foo:
    get:
      tags: [ApiFooController]
"#;
    assert_eq!(ids(yaml, &ControllerNaming::with_prefix("Api")), vec!["api.foo"]);
}

#[test]
fn no_paths_is_an_error() {
    let spec = parse::from_yaml("openapi: 3.0.0\npaths: {}\n").unwrap();
    let err = resolve_controller_ids(&spec, &ControllerNaming::default()).unwrap_err();
    assert!(matches!(err, ResolveError::NoPaths));
}

#[test]
fn missing_paths_section_is_an_error() {
    let spec = parse::from_yaml("openapi: 3.0.0\ninfo: {title: t, version: '1'}\n").unwrap();
    let err = resolve_controller_ids(&spec, &ControllerNaming::default()).unwrap_err();
    assert!(matches!(err, ResolveError::NoPaths));
}

#[test]
fn path_without_operations_is_an_error() {
    let spec = parse::from_yaml(EMPTY_PATH).unwrap();
    let err = resolve_controller_ids(&spec, &ControllerNaming::default()).unwrap_err();
    match err {
        ResolveError::NoOperations { path } => assert_eq!(path, "/empty"),
        other => panic!("expected NoOperations, got {other:?}"),
    }
}

#[test]
fn untagged_paths_inherit_previous_name() {
    let names = ids(TODO, &ControllerNaming::default());
    insta::assert_snapshot!(names.join("\n"), @r"
    ping
    todo
    todo-list
    ");
}

#[test]
fn first_untagged_path_uses_default_name() {
    let yaml = r#"
openapi: 3.0.0
paths:
  /health:
    get:
      summary: no controller metadata
  /widgets:
    get:
      tags: [WidgetController]
"#;
    assert_eq!(
        ids(yaml, &ControllerNaming::default()),
        vec!["open-api", "widget"]
    );

    let naming = ControllerNaming {
        prefix: None,
        default_name: "RootController".to_string(),
    };
    assert_eq!(ids(yaml, &naming), vec!["root-controller", "widget"]);
}

#[test]
fn only_first_declared_operation_counts() {
    let yaml = r#"
openapi: 3.0.0
paths:
  /widgets:
    post:
      tags: [WidgetWriterController]
    get:
      tags: [WidgetReaderController]
"#;
    assert_eq!(ids(yaml, &ControllerNaming::default()), vec!["widget-writer"]);
}

#[test]
fn pipeline_with_namespace() {
    let spec = parse::from_yaml(TODO).unwrap();
    let options = PipelineOptions {
        namespace: Some("Api".to_string()),
        ..Default::default()
    };
    let output = pipeline::run(&spec, &options).unwrap();
    let names: Vec<String> = output.controllers.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(names.join("\n"), @r"
    api.ping
    api.todo
    api.todo-list
    ");

    let files: Vec<String> = output.controllers.iter().map(|id| id.file_name()).collect();
    assert_eq!(files[0], "openapi.api.ping.controller.ts");
}
