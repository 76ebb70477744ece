//! Test utility functions for pipeline-compiler

use pipeline_compiler::{
    Compiler, CompilerOptions, StaticClusters, StaticTemplates, StaticTriggers,
};
use std::sync::Arc;

/// Fixture mirroring the canonical scheduler contract: three jobs, one
/// stage, an explicit command order on `main`.
pub const FIXTURE: &str = r#"
annotations:
  screwdriver.cd/chainPR: true
jobs:
  main:
    image: node:18
    requires: ["~commit"]
    commands:
      - name: install
        command: npm install
      - name: test
        command: npm test
      - name: publish
        command: npm publish --dry-run
  publish:
    image: node:18
    requires: [main]
    commands:
      - name: publish
        command: npm publish
  baz:
    image: node:18
    commands:
      - name: noop
        command: "true"
stages:
  canary:
    description: Canary deployment
    jobs: [main, publish]
"#;

/// Compiler wired to a known template registry, cluster set, and trigger
/// set, matching what the fixtures expect.
pub fn test_compiler() -> Compiler {
    let templates = StaticTemplates::from_yaml(
        r#"
node-ci:
  image: node:18
  commands:
    - name: install
      command: npm install
    - name: test
      command: npm test
  immutable_tags: [stable]
"#,
    )
    .expect("template registry fixture");

    Compiler::new(
        Arc::new(templates),
        Arc::new(StaticClusters::new(["gq1", "bf1"])),
        Arc::new(StaticTriggers::new(["sd@123:publish"])),
    )
    .with_options(CompilerOptions {
        pipeline_id: "42".to_string(),
        notifications_fatal: false,
    })
}
