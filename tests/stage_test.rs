//! Stage integrity over full compilations

mod helpers;

use helpers::test_compiler;

#[tokio::test]
async fn test_job_in_two_stages_fails_with_duplicate() {
    let yaml = r#"
jobs:
  main:
    image: node:18
  deploy:
    image: node:18
stages:
  canary:
    jobs: [main]
  production:
    jobs: [main, deploy]
"#;
    let pipeline = test_compiler().compile(yaml).await;

    assert_eq!(pipeline.errors.len(), 1);
    assert!(
        pipeline.errors[0].contains("duplicate job"),
        "unexpected error: {}",
        pipeline.errors[0]
    );
    assert!(pipeline.errors[0].contains("main"));
}

#[tokio::test]
async fn test_stage_with_unknown_job_fails() {
    let yaml = r#"
jobs:
  main:
    image: node:18
stages:
  canary:
    jobs: [main, ghost]
"#;
    let pipeline = test_compiler().compile(yaml).await;

    assert_eq!(pipeline.errors.len(), 1);
    assert!(pipeline.errors[0].contains("canary"));
    assert!(pipeline.errors[0].contains("ghost"));
}

#[tokio::test]
async fn test_job_level_stage_assignment_joins_stage() {
    let yaml = r#"
jobs:
  main:
    image: node:18
    stage: canary
  publish:
    image: node:18
stages:
  canary:
    description: Canary deployment
    jobs: [publish]
"#;
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty(), "errors: {:?}", pipeline.errors);
    let canary = &pipeline.stages["canary"];
    assert!(canary.jobs.contains(&"main".to_string()));
    assert!(canary.jobs.contains(&"publish".to_string()));
}

#[tokio::test]
async fn test_redundant_stage_declaration_compiles_cleanly() {
    let yaml = r#"
jobs:
  main:
    image: node:18
    stage: canary
stages:
  canary:
    jobs: [main]
"#;
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty(), "errors: {:?}", pipeline.errors);
    assert_eq!(pipeline.stages["canary"].jobs, vec!["main"]);
}

#[tokio::test]
async fn test_no_stages_field_omitted_from_output() {
    let yaml = "jobs:\n  main:\n    image: node:18\n";
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty());
    let json = serde_json::to_value(&pipeline).unwrap();
    assert!(!json.as_object().unwrap().contains_key("stages"));
}

#[tokio::test]
async fn test_empty_stages_mapping_treated_as_no_stages() {
    let yaml = "jobs:\n  main:\n    image: node:18\nstages: {}\n";
    let pipeline = test_compiler().compile(yaml).await;

    assert!(pipeline.errors.is_empty());
    let json = serde_json::to_value(&pipeline).unwrap();
    assert!(!json.as_object().unwrap().contains_key("stages"));
}
