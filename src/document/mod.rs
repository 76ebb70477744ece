//! Pipeline document model
//!
//! This module defines the document shapes that flow through the compiler:
//! the pre-flatten configuration as declared by the user, the flattened
//! intermediate form, the permutation-expanded form, and the final compiled
//! pipeline handed to the scheduler.
//!
//! Matrix axis order must match declaration order, so ordered maps use
//! `serde_yaml::Mapping` (insertion-ordered) rather than `HashMap`.

pub mod loader;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

/// A single named shell command within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name shown in build output
    pub name: String,

    /// The shell command to run
    pub command: String,
}

/// Document-level `shared` section, merged into every job during flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharedConfig {
    /// Default container image
    #[serde(default)]
    pub image: Option<String>,

    /// Template reference applied to every job without its own
    #[serde(default)]
    pub template: Option<String>,

    /// Default commands
    #[serde(default)]
    pub commands: Vec<Command>,

    /// Environment variables merged into each job
    #[serde(default)]
    pub environment: Mapping,

    /// Settings merged into each job
    #[serde(default)]
    pub settings: Mapping,

    /// Secrets merged into each job
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Annotations merged into each job
    #[serde(default)]
    pub annotations: Mapping,
}

/// A job's declared configuration, before template flattening and
/// permutation expansion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Container image (may come from a template or `shared`)
    #[serde(default)]
    pub image: Option<String>,

    /// Ordered commands
    #[serde(default)]
    pub commands: Vec<Command>,

    /// Upstream job names and trigger references
    #[serde(default)]
    pub requires: Vec<String>,

    /// Template reference (`name@version` or `name@tag`)
    #[serde(default)]
    pub template: Option<String>,

    /// Settings map; list-valued entries are matrix axes
    #[serde(default)]
    pub settings: Mapping,

    /// Environment variables
    #[serde(default)]
    pub environment: Mapping,

    /// Secret names this job may access
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Job-level annotations
    #[serde(default)]
    pub annotations: Mapping,

    /// Stage this job belongs to
    #[serde(default)]
    pub stage: Option<String>,

    /// Build cluster this job should run on
    #[serde(default)]
    pub build_cluster: Option<String>,
}

/// One concrete execution unit derived from a [`JobSpec`] by selecting one
/// value from each matrix axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPermutation {
    /// Container image
    pub image: String,

    /// Ordered commands
    pub commands: Vec<Command>,

    /// Upstream job names and trigger references
    #[serde(default)]
    pub requires: Vec<String>,

    /// Settings with matrix axes replaced by the selected value
    #[serde(default)]
    pub settings: Mapping,

    /// Environment variables
    #[serde(default)]
    pub environment: Mapping,

    /// Secret names
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Job-level annotations
    #[serde(default)]
    pub annotations: Mapping,
}

/// A named, non-overlapping grouping of jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered member job names
    #[serde(default)]
    pub jobs: Vec<String>,
}

/// A node in the workflow graph: a job or a virtual trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub name: String,
}

/// A directed edge from a trigger or upstream job to a downstream job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub src: String,
    pub dest: String,
}

/// Directed graph of jobs and virtual trigger nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,

    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    /// Whether the graph already contains a node with the given name.
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }
}

/// The structurally validated configuration document, pre-flatten.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Declared configuration version
    #[serde(default)]
    pub version: Option<u64>,

    /// Pipeline-level annotations
    #[serde(default)]
    pub annotations: Mapping,

    /// Build parameters
    #[serde(default)]
    pub parameters: Mapping,

    /// Settings shared by every job
    #[serde(default)]
    pub shared: Option<SharedConfig>,

    /// Declared jobs
    pub jobs: BTreeMap<String, JobSpec>,

    /// Declared stages
    #[serde(default)]
    pub stages: BTreeMap<String, Stage>,

    /// Child pipeline definitions
    #[serde(default)]
    pub child_pipelines: Mapping,

    /// Subscribe/notification rules
    #[serde(default)]
    pub subscribe: Mapping,

    /// Explicitly declared workflow graph, passed through verbatim
    #[serde(default)]
    pub workflow_graph: Option<WorkflowGraph>,
}

/// Document after template flattening: every job is template-free and
/// carries its merged shared settings; per-job stage assignments have been
/// folded into `stages`.
#[derive(Debug, Clone)]
pub struct FlatDocument {
    pub annotations: Mapping,
    pub parameters: Mapping,
    pub jobs: BTreeMap<String, JobSpec>,
    pub stages: BTreeMap<String, Stage>,
    pub child_pipelines: Mapping,
    pub subscribe: Mapping,
    pub workflow_graph: Option<WorkflowGraph>,
}

/// Document after permutation expansion: each job is an ordered list of
/// concrete permutations.
#[derive(Debug, Clone)]
pub struct ExpandedDocument {
    pub annotations: Mapping,
    pub parameters: Mapping,
    pub jobs: BTreeMap<String, Vec<JobPermutation>>,
    pub stages: BTreeMap<String, Stage>,
    pub child_pipelines: Mapping,
    pub subscribe: Mapping,
    pub workflow_graph: Option<WorkflowGraph>,
}

/// The fully compiled pipeline handed to the scheduler.
///
/// Field presence rules are part of the downstream contract: empty
/// `childPipelines` and `stages` are omitted entirely, and `warnMessages`
/// and `errors` appear only when non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledPipeline {
    /// Pipeline-level annotations
    #[serde(default)]
    pub annotations: Mapping,

    /// Job name to ordered permutation list
    pub jobs: BTreeMap<String, Vec<JobPermutation>>,

    /// Child pipeline definitions, omitted when empty
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub child_pipelines: Mapping,

    /// Workflow graph
    pub workflow_graph: WorkflowGraph,

    /// Build parameters
    #[serde(default)]
    pub parameters: Mapping,

    /// Subscribe/notification rules
    #[serde(default)]
    pub subscribe: Mapping,

    /// Stage groupings, omitted when empty
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stages: BTreeMap<String, Stage>,

    /// Warnings accumulated across all phases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warn_messages: Vec<String>,

    /// Stringified compilation errors (fallback pipelines only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
