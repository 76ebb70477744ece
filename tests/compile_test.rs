//! End-to-end compilation tests against the scheduler contract

mod helpers;

use helpers::{test_compiler, FIXTURE};

#[tokio::test]
async fn test_fixture_compiles_cleanly() {
    let pipeline = test_compiler().compile(FIXTURE).await;

    assert!(pipeline.errors.is_empty(), "errors: {:?}", pipeline.errors);
    assert_eq!(pipeline.jobs.len(), 3);

    // Stage membership and order preserved.
    let canary = &pipeline.stages["canary"];
    assert_eq!(canary.jobs, vec!["main", "publish"]);
    assert_eq!(canary.description.as_deref(), Some("Canary deployment"));

    // main has exactly one permutation with command order intact.
    let main = &pipeline.jobs["main"];
    assert_eq!(main.len(), 1);
    let names: Vec<&str> = main[0].commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["install", "test", "publish"]);
}

#[tokio::test]
async fn test_fixture_workflow_graph() {
    let pipeline = test_compiler().compile(FIXTURE).await;
    let graph = &pipeline.workflow_graph;

    assert!(graph.has_node("~pr"));
    assert!(graph.has_node("~commit"));
    for job in ["main", "publish", "baz"] {
        assert!(graph.has_node(job), "missing node {}", job);
    }

    let has_edge = |src: &str, dest: &str| {
        graph.edges.iter().any(|e| e.src == src && e.dest == dest)
    };
    assert!(has_edge("~commit", "main"));
    assert!(has_edge("main", "publish"));
}

#[tokio::test]
async fn test_template_flattening_end_to_end() {
    let yaml = r#"
jobs:
  main:
    template: node-ci@stable
    requires: ["~commit"]
"#;
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty());
    assert!(pipeline.warn_messages.is_empty(), "stable tag is pinned");

    let main = &pipeline.jobs["main"];
    assert_eq!(main[0].image, "node:18");
    assert_eq!(main[0].commands.len(), 2);
}

#[tokio::test]
async fn test_unpinned_template_produces_warning() {
    let yaml = "jobs:\n  main:\n    template: node-ci\n";
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty());
    assert_eq!(
        pipeline.warn_messages,
        vec!["node-ci should be explicitly versioned"]
    );
}

#[tokio::test]
async fn test_external_trigger_resolves() {
    let yaml = r#"
jobs:
  main:
    image: node:18
    requires: ["~sd@123:publish"]
"#;
    let pipeline = test_compiler().compile(yaml).await;
    assert!(pipeline.errors.is_empty());
    assert!(pipeline.workflow_graph.has_node("~sd@123:publish"));
}

#[tokio::test]
async fn test_multi_document_input_selects_version_4() {
    let yaml = r#"
version: 3
jobs:
  legacy:
    image: node:12
---
version: 4
jobs:
  main:
    image: node:18
"#;
    let pipeline = test_compiler().compile(yaml).await;
    assert!(pipeline.errors.is_empty());
    assert!(pipeline.jobs.contains_key("main"));
    assert!(!pipeline.jobs.contains_key("legacy"));
}

#[tokio::test]
async fn test_serialized_contract_shape() {
    let pipeline = test_compiler().compile(FIXTURE).await;
    let json = serde_json::to_value(&pipeline).unwrap();
    let obj = json.as_object().unwrap();

    assert!(obj.contains_key("annotations"));
    assert!(obj.contains_key("jobs"));
    assert!(obj.contains_key("workflowGraph"));
    assert!(obj.contains_key("parameters"));
    assert!(obj.contains_key("subscribe"));
    assert!(obj.contains_key("stages"));
    // Empty collections are omitted.
    assert!(!obj.contains_key("childPipelines"));
    assert!(!obj.contains_key("errors"));

    let permutation = &json["jobs"]["main"][0];
    assert_eq!(permutation["image"], "node:18");
    assert_eq!(permutation["commands"][0]["name"], "install");
}
