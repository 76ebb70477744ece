//! Structural validation
//!
//! Checks the candidate tree against the expected document shape without
//! resolving any external references. This phase is a pure shape gate: on
//! success the tree deserializes unchanged into [`ConfigDocument`].
//!
//! The expected shape is the pre-flatten one. Already-compiled documents,
//! where each job is a list of permutations instead of a job definition,
//! are rejected here; compilation is not re-entrant.

use crate::document::ConfigDocument;
use crate::error::{CompileError, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};

const ALLOWED_ROOT_KEYS: &[&str] = &[
    "version",
    "annotations",
    "parameters",
    "shared",
    "jobs",
    "stages",
    "childPipelines",
    "subscribe",
    "workflowGraph",
];

const ALLOWED_JOB_KEYS: &[&str] = &[
    "image",
    "commands",
    "requires",
    "template",
    "settings",
    "environment",
    "secrets",
    "annotations",
    "stage",
    "buildCluster",
];

const ALLOWED_SHARED_KEYS: &[&str] = &[
    "image",
    "template",
    "commands",
    "environment",
    "settings",
    "secrets",
    "annotations",
];

/// Validate the candidate tree and deserialize it into a typed document.
pub fn validate(candidate: &Value) -> Result<ConfigDocument> {
    let root = expect_mapping(candidate, "<document>")?;

    for key in mapping_keys(root) {
        if !ALLOWED_ROOT_KEYS.contains(&key.as_str()) {
            return Err(structural(&key, "unknown field"));
        }
    }

    if let Some(version) = root.get("version") {
        if version.as_u64().is_none() {
            return Err(structural("version", "must be a number"));
        }
    }

    let jobs = root
        .get("jobs")
        .ok_or_else(|| structural("jobs", "is required"))?;
    validate_jobs(jobs)?;

    if let Some(shared) = root.get("shared") {
        validate_shared(shared)?;
    }
    if let Some(stages) = root.get("stages") {
        validate_stages(stages)?;
    }
    if let Some(graph) = root.get("workflowGraph") {
        validate_workflow_graph(graph)?;
    }
    for field in ["annotations", "parameters", "childPipelines", "subscribe"] {
        if let Some(value) = root.get(field) {
            expect_mapping(value, field)?;
        }
    }

    serde_yaml::from_value(candidate.clone()).map_err(|e| CompileError::StructuralError {
        path: "<document>".to_string(),
        message: e.to_string(),
    })
}

fn validate_jobs(jobs: &Value) -> Result<()> {
    let jobs = expect_mapping(jobs, "jobs")?;
    if jobs.is_empty() {
        return Err(structural("jobs", "must declare at least one job"));
    }

    let name_pattern = job_name_pattern();
    for (name_value, spec) in jobs {
        let name = expect_string(name_value, "jobs")?;
        if !name_pattern.is_match(name) {
            return Err(structural(&format!("jobs.{}", name), "invalid job name"));
        }

        let path = format!("jobs.{}", name);
        if spec.is_sequence() {
            // Permutation lists are compiler output, not valid input.
            return Err(structural(
                &path,
                "expected a job definition, found a list (already-compiled documents cannot be recompiled)",
            ));
        }
        let spec = expect_mapping(spec, &path)?;

        for key in mapping_keys(spec) {
            if !ALLOWED_JOB_KEYS.contains(&key.as_str()) {
                return Err(structural(&format!("{}.{}", path, key), "unknown field"));
            }
        }

        if let Some(image) = spec.get("image") {
            expect_string(image, &format!("{}.image", path))?;
        }
        if let Some(commands) = spec.get("commands") {
            validate_commands(commands, &path)?;
        }
        if let Some(requires) = spec.get("requires") {
            validate_requires(requires, &path)?;
        }
        if let Some(template) = spec.get("template") {
            expect_string(template, &format!("{}.template", path))?;
        }
        if let Some(stage) = spec.get("stage") {
            expect_string(stage, &format!("{}.stage", path))?;
        }
        if let Some(cluster) = spec.get("buildCluster") {
            expect_string(cluster, &format!("{}.buildCluster", path))?;
        }
        if let Some(secrets) = spec.get("secrets") {
            validate_string_list(secrets, &format!("{}.secrets", path))?;
        }
        for field in ["settings", "environment", "annotations"] {
            if let Some(value) = spec.get(field) {
                expect_mapping(value, &format!("{}.{}", path, field))?;
            }
        }
        if let Some(settings) = spec.get("settings").and_then(Value::as_mapping) {
            validate_matrix_axes(settings, &path)?;
        }
    }

    Ok(())
}

/// Empty matrix axes would expand to zero permutations and silently drop
/// the job, so they are rejected up front.
fn validate_matrix_axes(settings: &Mapping, job_path: &str) -> Result<()> {
    for (key, value) in settings {
        if let Some(seq) = value.as_sequence() {
            if seq.is_empty() {
                let key = key.as_str().unwrap_or("?");
                return Err(structural(
                    &format!("{}.settings.{}", job_path, key),
                    "matrix axis must list at least one value",
                ));
            }
        }
    }
    Ok(())
}

fn validate_commands(commands: &Value, job_path: &str) -> Result<()> {
    let path = format!("{}.commands", job_path);
    let commands = commands
        .as_sequence()
        .ok_or_else(|| structural(&path, "must be a list"))?;

    for (index, entry) in commands.iter().enumerate() {
        let entry_path = format!("{}[{}]", path, index);
        let entry = expect_mapping(entry, &entry_path)?;
        for field in ["name", "command"] {
            let value = entry
                .get(field)
                .ok_or_else(|| structural(&format!("{}.{}", entry_path, field), "is required"))?;
            expect_string(value, &format!("{}.{}", entry_path, field))?;
        }
    }
    Ok(())
}

fn validate_requires(requires: &Value, job_path: &str) -> Result<()> {
    let path = format!("{}.requires", job_path);
    let requires = requires
        .as_sequence()
        .ok_or_else(|| structural(&path, "must be a list"))?;

    let pattern = requires_pattern();
    for entry in requires {
        let entry = expect_string(entry, &path)?;
        if !pattern.is_match(entry) {
            return Err(structural(
                &path,
                &format!("invalid requires entry: {}", entry),
            ));
        }
    }
    Ok(())
}

fn validate_stages(stages: &Value) -> Result<()> {
    let stages = expect_mapping(stages, "stages")?;
    let name_pattern = job_name_pattern();

    for (name_value, stage) in stages {
        let name = expect_string(name_value, "stages")?;
        if !name_pattern.is_match(name) {
            return Err(structural(&format!("stages.{}", name), "invalid stage name"));
        }

        let path = format!("stages.{}", name);
        let stage = expect_mapping(stage, &path)?;
        for key in mapping_keys(stage) {
            if key != "description" && key != "jobs" {
                return Err(structural(&format!("{}.{}", path, key), "unknown field"));
            }
        }
        if let Some(description) = stage.get("description") {
            expect_string(description, &format!("{}.description", path))?;
        }
        if let Some(jobs) = stage.get("jobs") {
            validate_string_list(jobs, &format!("{}.jobs", path))?;
        }
    }
    Ok(())
}

fn validate_workflow_graph(graph: &Value) -> Result<()> {
    let graph = expect_mapping(graph, "workflowGraph")?;

    if let Some(nodes) = graph.get("nodes") {
        let nodes = nodes
            .as_sequence()
            .ok_or_else(|| structural("workflowGraph.nodes", "must be a list"))?;
        for node in nodes {
            let node = expect_mapping(node, "workflowGraph.nodes")?;
            let name = node
                .get("name")
                .ok_or_else(|| structural("workflowGraph.nodes", "node requires a name"))?;
            expect_string(name, "workflowGraph.nodes.name")?;
        }
    }
    if let Some(edges) = graph.get("edges") {
        let edges = edges
            .as_sequence()
            .ok_or_else(|| structural("workflowGraph.edges", "must be a list"))?;
        for edge in edges {
            let edge = expect_mapping(edge, "workflowGraph.edges")?;
            for field in ["src", "dest"] {
                let value = edge
                    .get(field)
                    .ok_or_else(|| structural("workflowGraph.edges", "edge requires src and dest"))?;
                expect_string(value, &format!("workflowGraph.edges.{}", field))?;
            }
        }
    }
    Ok(())
}

fn validate_shared(shared: &Value) -> Result<()> {
    let shared = expect_mapping(shared, "shared")?;
    for key in mapping_keys(shared) {
        if !ALLOWED_SHARED_KEYS.contains(&key.as_str()) {
            return Err(structural(&format!("shared.{}", key), "unknown field"));
        }
    }
    if let Some(commands) = shared.get("commands") {
        validate_commands(commands, "shared")?;
    }
    Ok(())
}

fn validate_string_list(value: &Value, path: &str) -> Result<()> {
    let list = value
        .as_sequence()
        .ok_or_else(|| structural(path, "must be a list"))?;
    for entry in list {
        expect_string(entry, path)?;
    }
    Ok(())
}

fn expect_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| structural(path, "must be a mapping"))
}

fn expect_string<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| structural(path, "must be a string"))
}

fn mapping_keys(mapping: &Mapping) -> Vec<String> {
    mapping
        .keys()
        .map(|k| k.as_str().unwrap_or_default().to_string())
        .collect()
}

fn structural(path: &str, message: &str) -> CompileError {
    CompileError::StructuralError {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn job_name_pattern() -> Regex {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("name pattern")
}

/// Requires entries: job names, `~`-prefixed OR-triggers, the `~pr` and
/// `~commit` virtual triggers, `~pr:<pattern>` branch-filtered triggers,
/// and `sd@<pipeline>:<job>` external references.
fn requires_pattern() -> Regex {
    Regex::new(r"^(~?(sd@\d+:[A-Za-z_][A-Za-z0-9_-]*|[A-Za-z_][A-Za-z0-9_-]*)|~pr(:.+)?|~commit|~release|~tag)$")
        .expect("requires pattern")
}
