//! Permutation expansion
//!
//! Expands each job's matrix into the concrete, ordered list of permutations
//! the scheduler will run. Every list-valued `settings` entry is one matrix
//! axis; the output order is the cross product in axis declaration order
//! with the last-declared axis varying fastest. This order is externally
//! observable and must not change across identical inputs.

use crate::document::{ExpandedDocument, FlatDocument, JobPermutation, JobSpec};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Image used when neither the job, its template, nor `shared` named one.
pub const DEFAULT_IMAGE: &str = "node:18";

/// Expand every job's matrix axes into permutation lists.
pub fn expand(doc: FlatDocument) -> ExpandedDocument {
    let mut jobs = BTreeMap::new();
    for (name, spec) in doc.jobs {
        let permutations = expand_job(&spec);
        debug!(job = %name, count = permutations.len(), "expanded permutations");
        jobs.insert(name, permutations);
    }

    ExpandedDocument {
        annotations: doc.annotations,
        parameters: doc.parameters,
        jobs,
        stages: doc.stages,
        child_pipelines: doc.child_pipelines,
        subscribe: doc.subscribe,
        workflow_graph: doc.workflow_graph,
    }
}

fn expand_job(spec: &JobSpec) -> Vec<JobPermutation> {
    // Axes in declaration order; scalar settings are shared verbatim.
    let axes: Vec<(&Value, &Vec<Value>)> = spec
        .settings
        .iter()
        .filter_map(|(key, value)| value.as_sequence().map(|seq| (key, seq)))
        .collect();

    let mut selections: Vec<Vec<(&Value, &Value)>> = vec![Vec::new()];
    for (key, values) in &axes {
        selections = selections
            .into_iter()
            .flat_map(|partial| {
                values.iter().map(move |value| {
                    let mut next = partial.clone();
                    next.push((*key, value));
                    next
                })
            })
            .collect();
    }

    selections
        .into_iter()
        .map(|selection| permutation_for(spec, &selection))
        .collect()
}

fn permutation_for(spec: &JobSpec, selection: &[(&Value, &Value)]) -> JobPermutation {
    let mut settings = Mapping::new();
    for (key, value) in &spec.settings {
        let chosen = selection
            .iter()
            .find(|(axis, _)| *axis == key)
            .map(|(_, v)| (*v).clone())
            .unwrap_or_else(|| value.clone());
        settings.insert(key.clone(), chosen);
    }

    JobPermutation {
        image: spec
            .image
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        commands: spec.commands.clone(),
        requires: spec.requires.clone(),
        settings,
        environment: spec.environment.clone(),
        secrets: spec.secrets.clone(),
        annotations: spec.annotations.clone(),
    }
}
