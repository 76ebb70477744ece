//! Workflow graph derivation
//!
//! Builds the directed graph of jobs and virtual trigger nodes from each
//! job's `requires` declarations. Documents that declare a `workflowGraph`
//! themselves bypass this and pass the graph through verbatim.

use crate::document::{JobPermutation, WorkflowEdge, WorkflowGraph, WorkflowNode};
use std::collections::BTreeMap;

/// Derive the workflow graph from `requires` declarations.
///
/// The `~pr` and `~commit` virtual triggers are always present. A `~name`
/// entry naming a plain job contributes an edge from `name` (the tilde only
/// marks OR semantics, it is not part of the node name); virtual triggers
/// and external `sd@` references keep their literal spelling.
pub fn derive(jobs: &BTreeMap<String, Vec<JobPermutation>>) -> WorkflowGraph {
    let mut graph = WorkflowGraph {
        nodes: vec![
            WorkflowNode {
                name: "~pr".to_string(),
            },
            WorkflowNode {
                name: "~commit".to_string(),
            },
        ],
        edges: Vec::new(),
    };

    for name in jobs.keys() {
        graph.nodes.push(WorkflowNode { name: name.clone() });
    }

    for (name, permutations) in jobs {
        // All permutations of a job share its requires.
        let Some(first) = permutations.first() else {
            continue;
        };
        for entry in &first.requires {
            let src = edge_source(entry);
            if !graph.has_node(&src) {
                graph.nodes.push(WorkflowNode { name: src.clone() });
            }
            graph.edges.push(WorkflowEdge {
                src,
                dest: name.clone(),
            });
        }
    }

    graph
}

fn edge_source(entry: &str) -> String {
    match entry.strip_prefix('~') {
        Some(rest) if is_virtual(rest) => entry.to_string(),
        Some(rest) => rest.to_string(),
        None => entry.to_string(),
    }
}

fn is_virtual(name: &str) -> bool {
    name == "pr"
        || name == "commit"
        || name == "release"
        || name == "tag"
        || name.starts_with("pr:")
        || name.starts_with("sd@")
}
