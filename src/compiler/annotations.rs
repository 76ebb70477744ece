//! Reserved-annotation governance
//!
//! Flags annotations that use the platform's reserved namespace without
//! being an officially recognized key. Warning only, never fatal: an
//! unrecognized key is most likely a typo the user wants to hear about,
//! not a reason to refuse the pipeline.

use crate::document::ExpandedDocument;
use serde_yaml::Mapping;
use std::collections::HashSet;

/// The reserved-annotation tables for one platform version, injected into
/// governance rather than hardwired into it.
#[derive(Debug, Clone)]
pub struct AnnotationRegistry {
    /// Reserved key prefix
    pub prefix: String,

    /// Recognized pipeline-level keys (fully qualified)
    pub pipeline_keys: HashSet<String>,

    /// Recognized job-level keys (fully qualified)
    pub job_keys: HashSet<String>,
}

impl AnnotationRegistry {
    pub fn new<I, J>(prefix: impl Into<String>, pipeline_keys: I, job_keys: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            prefix: prefix.into(),
            pipeline_keys: pipeline_keys.into_iter().collect(),
            job_keys: job_keys.into_iter().collect(),
        }
    }
}

impl Default for AnnotationRegistry {
    fn default() -> Self {
        let qualify = |keys: &[&str]| {
            keys.iter()
                .map(|k| format!("screwdriver.cd/{}", k))
                .collect::<Vec<_>>()
        };
        Self::new(
            "screwdriver.cd/",
            qualify(&["chainPR", "restrictPR", "buildCluster", "useDeployKey"]),
            qualify(&[
                "timeout",
                "buildPeriodically",
                "blockedBy",
                "collapseBuilds",
                "cpu",
                "ram",
                "displayName",
                "dockerEnabled",
            ]),
        )
    }
}

/// Collect warnings for unrecognized reserved-namespace annotation keys.
pub fn govern(doc: &ExpandedDocument, registry: &AnnotationRegistry) -> Vec<String> {
    let mut warnings = Vec::new();

    check_scope(
        &doc.annotations,
        &registry.prefix,
        &registry.pipeline_keys,
        "pipeline",
        &mut warnings,
    );

    for (name, permutations) in &doc.jobs {
        // Annotations are shared by all permutations of a job.
        if let Some(first) = permutations.first() {
            check_scope(
                &first.annotations,
                &registry.prefix,
                &registry.job_keys,
                &format!("job {}", name),
                &mut warnings,
            );
        }
    }

    warnings
}

fn check_scope(
    annotations: &Mapping,
    prefix: &str,
    known: &HashSet<String>,
    scope: &str,
    warnings: &mut Vec<String>,
) {
    for key in annotations.keys() {
        let Some(key) = key.as_str() else {
            continue;
        };
        if key.starts_with(prefix) && !known.contains(key) {
            warnings.push(format!(
                "annotation {} is not a recognized annotation for {}",
                key, scope
            ));
        }
    }
}
