use lbgen_core::error::RewriteError;
use lbgen_core::parse;
use lbgen_core::parse::schema::SchemaOrRef;
use lbgen_core::transform::{NamespacePolicy, rewrite_namespace};

const TODO: &str = include_str!("fixtures/loopback-todo.yaml");
const WIDGETS: &str = include_str!("fixtures/widgets-gadgets.yaml");

fn rewrite(yaml: &str, prefix: &str) -> lbgen_core::Document {
    let spec = parse::from_yaml(yaml).unwrap();
    rewrite_namespace(&spec, prefix, &NamespacePolicy::default()).unwrap()
}

fn ref_of(schema: &SchemaOrRef) -> &str {
    match schema {
        SchemaOrRef::Ref(r) => &r.ref_path,
        other => panic!("expected $ref, got {other:?}"),
    }
}

#[test]
fn path_segment_inserted_once() {
    let doc = rewrite(WIDGETS, "Api");
    assert!(doc.paths.contains_key("/api/widgets"));
    let widgets = doc
        .paths
        .keys()
        .find(|k| k.ends_with("/widgets"))
        .unwrap();
    assert_eq!(widgets.matches("api").count(), 1);
}

#[test]
fn id_paths_unchanged() {
    let spec = parse::from_yaml(
        r#"
openapi: 3.0.0
paths:
  /widgets/{id}:
    get:
      tags: [WidgetController]
"#,
    )
    .unwrap();
    let doc = rewrite_namespace(&spec, "Api", &NamespacePolicy::default()).unwrap();
    let keys: Vec<&str> = doc.paths.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["/widgets/{id}"]);
}

#[test]
fn loopback_paths_keep_order() {
    let doc = rewrite(TODO, "Api");
    let keys: Vec<&str> = doc.paths.keys().map(String::as_str).collect();
    insta::assert_snapshot!(keys.join("\n"), @r"
    /api/ping
    /todos/count
    /todos/{id}
    /api/todos
    /api/todo-lists
    /todo-lists/{id}/todos
    ");
}

#[test]
fn loopback_schema_names() {
    let doc = rewrite(TODO, "Api");
    insta::assert_snapshot!(doc.schema_names().join("\n"), @r"
    ApiTodo
    NewTodo
    TodoApiWithRelations
    TodoListApiWithRelations
    TodoPartial
    loopback.Count
    ApiPingResponse
    ");
}

#[test]
fn refs_follow_renamed_schemas() {
    let doc = rewrite(TODO, "Api");

    let ping = &doc.paths["/api/ping"].operations[0];
    let ok = match &ping.responses["200"] {
        lbgen_core::parse::content::ResponseOrRef::Response(r) => r,
        other => panic!("expected inline response, got {other:?}"),
    };
    let schema = ok.content["application/json"].schema.as_ref().unwrap();
    assert_eq!(ref_of(schema), "#/components/schemas/ApiPingResponse");

    let json = parse::to_json(&doc).unwrap();
    assert!(json.contains(r##""#/components/schemas/TodoApiWithRelations""##));
    assert!(json.contains(r##""#/components/schemas/TodoListApiWithRelations""##));
    assert!(json.contains(r##""#/components/schemas/loopback.Count""##));
    assert!(json.contains(r##""#/components/schemas/NewTodo""##));
    assert!(!json.contains(r##""#/components/schemas/Todo""##));
    assert!(!json.contains(r##""#/components/schemas/PingResponse""##));
}

#[test]
fn titles_follow_renamed_schemas() {
    let doc = rewrite(TODO, "Api");
    let schemas = &doc.components.as_ref().unwrap().schemas;
    let title = |name: &str| match &schemas[name] {
        SchemaOrRef::Schema(s) => s.title.clone(),
        other => panic!("expected schema, got {other:?}"),
    };
    assert_eq!(title("ApiTodo").as_deref(), Some("ApiTodo"));
    assert_eq!(title("NewTodo").as_deref(), Some("NewTodo"));
    assert_eq!(
        title("TodoApiWithRelations").as_deref(),
        Some("TodoApiWithRelations")
    );
}

#[test]
fn free_text_is_not_rewritten() {
    let doc = rewrite(TODO, "Api");
    let json = parse::to_json(&doc).unwrap();
    assert!(json.contains("Omit<Todo, 'id'>"));
    assert!(json.contains(r#""description": "Ping Response""#));
}

#[test]
fn other_sections_survive() {
    let original = parse::from_yaml(WIDGETS).unwrap();
    let doc = rewrite(WIDGETS, "Api");
    assert_eq!(doc.info, original.info);
    assert_eq!(doc.servers, original.servers);
    assert_eq!(doc.tags, original.tags);
    assert_eq!(doc.extensions["x-generator"], "hand-written");
    assert_eq!(doc.operation_count(), original.operation_count());
}

#[test]
fn rewriting_twice_prefixes_again() {
    let once = rewrite(WIDGETS, "Api");
    let twice = rewrite_namespace(&once, "Api", &NamespacePolicy::default()).unwrap();
    assert!(twice.paths.contains_key("/api/api/widgets"));
    assert!(twice.schema_names().contains(&"ApiApiWidget"));
}

#[test]
fn empty_prefix_rejected() {
    let spec = parse::from_yaml(WIDGETS).unwrap();
    let err = rewrite_namespace(&spec, "  ", &NamespacePolicy::default()).unwrap_err();
    assert!(matches!(err, RewriteError::EmptyPrefix));
}

#[test]
fn colliding_schema_names_rejected() {
    let spec = parse::from_yaml(
        r#"
openapi: 3.0.0
paths: {}
components:
  schemas:
    Widget:
      type: object
    ApiWidget:
      type: object
"#,
    )
    .unwrap();
    let policy = NamespacePolicy {
        excluded_prefixes: vec!["ApiW".to_string()],
        ..Default::default()
    };
    let err = rewrite_namespace(&spec, "Api", &policy).unwrap_err();
    match err {
        RewriteError::SchemaCollision { name, first, second } => {
            assert_eq!(name, "ApiWidget");
            assert_eq!(first, "Widget");
            assert_eq!(second, "ApiWidget");
        }
        other => panic!("expected SchemaCollision, got {other:?}"),
    }
}

#[test]
fn custom_reserved_prefixes() {
    let policy = NamespacePolicy {
        reserved_prefixes: vec!["Gad".to_string()],
        ..Default::default()
    };
    let spec = parse::from_yaml(WIDGETS).unwrap();
    let doc = rewrite_namespace(&spec, "Api", &policy).unwrap();
    assert_eq!(doc.schema_names(), vec!["ApiWidget", "NewWidget", "Gadget"]);
}
