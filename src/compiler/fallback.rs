//! Fallback pipeline synthesis
//!
//! Whenever any phase fails, all partial state is discarded and replaced by
//! a fixed single-job pipeline whose `main` job echoes the error text and
//! exits non-zero. The caller therefore always receives a structurally
//! valid, schedulable pipeline; compilation failures surface as visible,
//! deliberately failing builds.

use crate::document::{
    Command, CompiledPipeline, JobPermutation, WorkflowEdge, WorkflowGraph, WorkflowNode,
};
use crate::error::CompileError;
use std::collections::BTreeMap;

const FALLBACK_IMAGE: &str = "node:18";
const FALLBACK_JOB: &str = "main";

/// PR-pattern trigger matching any branch, so pattern-triggered pipelines
/// still reach the error job.
const WILDCARD_PR: &str = "~pr:/.*/";

/// Build the fixed fallback pipeline for a compilation error.
pub fn build(error: &CompileError) -> CompiledPipeline {
    let message = error.to_string();
    let command = Command {
        name: "config-parse-error".to_string(),
        command: format!("echo {}; exit 1", shell_quote(&message)),
    };

    let mut jobs = BTreeMap::new();
    jobs.insert(
        FALLBACK_JOB.to_string(),
        vec![JobPermutation {
            image: FALLBACK_IMAGE.to_string(),
            commands: vec![command],
            requires: Vec::new(),
            settings: Default::default(),
            environment: Default::default(),
            secrets: Vec::new(),
            annotations: Default::default(),
        }],
    );

    let node = |name: &str| WorkflowNode {
        name: name.to_string(),
    };
    let edge = |src: &str| WorkflowEdge {
        src: src.to_string(),
        dest: FALLBACK_JOB.to_string(),
    };

    CompiledPipeline {
        annotations: Default::default(),
        jobs,
        child_pipelines: Default::default(),
        workflow_graph: WorkflowGraph {
            nodes: vec![node("~pr"), node("~commit"), node(FALLBACK_JOB), node(WILDCARD_PR)],
            edges: vec![edge("~pr"), edge("~commit"), edge(WILDCARD_PR)],
        },
        parameters: Default::default(),
        subscribe: Default::default(),
        stages: BTreeMap::new(),
        warn_messages: Vec::new(),
        errors: vec![message],
    }
}

/// Single-quote shell escaping: safe to interpolate into an `echo`.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let pipeline = build(&CompileError::MissingConfiguration);

        assert_eq!(pipeline.jobs.len(), 1);
        let permutations = &pipeline.jobs[FALLBACK_JOB];
        assert_eq!(permutations.len(), 1);

        let command = &permutations[0].commands[0];
        assert!(command.command.starts_with("echo "));
        assert!(command.command.ends_with("; exit 1"));
        assert!(command.command.contains("screwdriver.yaml does not exist"));

        assert_eq!(pipeline.workflow_graph.nodes.len(), 4);
        assert_eq!(pipeline.workflow_graph.edges.len(), 3);
        for edge in &pipeline.workflow_graph.edges {
            assert_eq!(edge.dest, FALLBACK_JOB);
        }

        assert_eq!(pipeline.errors.len(), 1);
        assert!(pipeline.stages.is_empty());
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_error_text_carried_verbatim() {
        let error = CompileError::DuplicateStageJob("main".to_string());
        let pipeline = build(&error);
        assert_eq!(pipeline.errors[0], error.to_string());
    }
}
