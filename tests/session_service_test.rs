//! Tests for SessionService: loading nodes, replaying scripts, saving results.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use treestore::application::services::SessionService;
use treestore::application::ApplicationError;
use treestore::domain::{DomainError, NodeId, Operation, Outcome, RemoveRedo, StoreOptions};
use treestore::infrastructure::traits::RealFileSystem;
use treestore::util::testing;

const NODES: &str = r#"[
  {"id": 1, "parent": null, "label": "root"},
  {"id": 2, "parent": 1, "label": "a", "color": "red"},
  {"id": 3, "parent": 2, "label": "b"},
  {"id": "x", "parent": 1, "label": "string id"}
]"#;

/// Helper to create temp files for testing
fn create_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write file");
    path
}

fn service() -> SessionService {
    testing::init_test_setup();
    SessionService::new(Arc::new(RealFileSystem), StoreOptions::default())
}

#[test]
fn given_nodes_file_when_loading_then_store_holds_nodes() {
    let temp = TempDir::new().unwrap();
    let path = create_file(&temp, "nodes.json", NODES);

    let store = service().load(&path).unwrap();

    assert_eq!(store.len(), 4);
    assert_eq!(store.get_children(&NodeId::from(1)).len(), 2);
    assert!(store.get_item(&NodeId::from("x")).is_some());
}

#[test]
fn given_missing_file_when_loading_then_operation_failed() {
    let temp = TempDir::new().unwrap();
    let result = service().load(&temp.path().join("absent.json"));

    assert!(matches!(
        result,
        Err(ApplicationError::OperationFailed { .. })
    ));
}

#[test]
fn given_malformed_nodes_when_loading_then_domain_error() {
    let temp = TempDir::new().unwrap();
    let path = create_file(&temp, "nodes.json", r#"[{"id": 1}]"#);

    let result = service().load(&path);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidNodes(_)))
    ));
}

#[test]
fn given_script_when_running_then_returns_outcome_per_line() {
    let temp = TempDir::new().unwrap();
    let nodes = create_file(&temp, "nodes.json", NODES);
    let script = create_file(
        &temp,
        "edit.jsonl",
        r#"# rename and prune
{"op": "update", "patch": {"id": 2, "label": "renamed"}}
{"op": "remove", "id": 2}
{"op": "descendants", "id": 1}
{"op": "undo"}
{"op": "ancestors", "id": 3}
{"op": "redo"}
{"op": "redo"}
"#,
    );
    let service = service();
    let mut store = service.load(&nodes).unwrap();

    let steps = service.run_script(&mut store, &script).unwrap();

    assert_eq!(steps.len(), 7);
    assert!(matches!(steps[0].operation, Operation::Update { .. }));
    match &steps[2].outcome {
        Outcome::Nodes(nodes) => {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, NodeId::from("x"));
        }
        other => panic!("expected nodes, got {:?}", other),
    }
    match &steps[4].outcome {
        Outcome::Nodes(nodes) => {
            let labels: Vec<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
            assert_eq!(labels, vec!["root", "renamed"]);
        }
        other => panic!("expected nodes, got {:?}", other),
    }
    assert_eq!(steps[5].outcome, Outcome::Applied(true));
    assert_eq!(steps[6].outcome, Outcome::Applied(false));
    assert_eq!(store.len(), 2);
}

#[test]
fn given_skip_policy_when_script_redoes_removal_then_nodes_stay() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let nodes = create_file(&temp, "nodes.json", NODES);
    let script = create_file(
        &temp,
        "edit.jsonl",
        "{\"op\": \"remove\", \"id\": 2}\n{\"op\": \"undo\"}\n{\"op\": \"redo\"}\n",
    );
    let options = StoreOptions {
        remove_redo: RemoveRedo::Skip,
        ..StoreOptions::default()
    };
    let service = SessionService::new(Arc::new(RealFileSystem), options);
    let mut store = service.load(&nodes).unwrap();

    service.run_script(&mut store, &script).unwrap();

    assert_eq!(store.len(), 4);
}

#[test]
fn given_bad_script_line_when_running_then_reports_line() {
    let temp = TempDir::new().unwrap();
    let nodes = create_file(&temp, "nodes.json", NODES);
    let script = create_file(&temp, "bad.jsonl", "{\"op\": \"undo\"}\n\nnot json\n");
    let service = service();
    let mut store = service.load(&nodes).unwrap();

    let result = service.run_script(&mut store, &script);

    match result {
        Err(ApplicationError::Domain(DomainError::InvalidOperation { line, .. })) => {
            assert_eq!(line, 3)
        }
        other => panic!("expected InvalidOperation, got {:?}", other),
    }
    assert_eq!(store.len(), 4, "no operation runs when parsing fails");
}

#[test]
fn given_store_when_saving_then_written_file_loads_back() {
    let temp = TempDir::new().unwrap();
    let nodes = create_file(&temp, "nodes.json", NODES);
    let service = service();
    let mut store = service.load(&nodes).unwrap();
    store.remove_item(&NodeId::from(3));

    let out = temp.path().join("out").join("nodes.json");
    service.save(&store, &out).unwrap();
    let reloaded = service.load(&out).unwrap();

    assert_eq!(reloaded.get_all(), store.get_all());
    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("\"color\": \"red\""));
}
