//! Template flattening
//!
//! Resolves template references into inline job fragments and merges the
//! document's `shared` section into every job. Merging is explicit-wins:
//! a job's own fields beat its template, which beats `shared`. Map-valued
//! fields merge per key with the same precedence; scalar and list fields
//! are replaced wholesale.
//!
//! Per-job `stage` assignments are folded into the document's `stages` map
//! here, so later phases only ever see stage membership in one place.

use crate::document::{ConfigDocument, FlatDocument, JobSpec, SharedConfig, Stage};
use crate::error::{CompileError, Result};
use crate::resolvers::{ResolverError, TemplateFragment, TemplateResolver};
use serde_yaml::Mapping;
use std::collections::BTreeMap;
use tracing::debug;

/// Flatten templates and shared settings into every job.
pub async fn flatten(
    doc: ConfigDocument,
    templates: &dyn TemplateResolver,
    warnings: &mut Vec<String>,
) -> Result<FlatDocument> {
    let shared = match doc.shared {
        Some(shared) => resolve_shared(shared, templates, warnings).await?,
        None => SharedConfig::default(),
    };

    let mut jobs = BTreeMap::new();
    let mut stages = doc.stages;

    for (name, spec) in doc.jobs {
        let fragment = match &spec.template {
            Some(reference) => Some(resolve(reference, templates, warnings).await?),
            None => None,
        };

        let flat = merge_job(spec, fragment, &shared);
        if let Some(stage_name) = &flat.stage {
            let members = &mut stages
                .entry(stage_name.clone())
                .or_insert_with(Stage::default)
                .jobs;
            // Declaring `stage` on a job already listed in that stage is
            // redundant, not a conflict.
            if !members.contains(&name) {
                members.push(name.clone());
            }
        }
        debug!(job = %name, "flattened job");
        jobs.insert(name, flat);
    }

    Ok(FlatDocument {
        annotations: doc.annotations,
        parameters: doc.parameters,
        jobs,
        stages,
        child_pipelines: doc.child_pipelines,
        subscribe: doc.subscribe,
        workflow_graph: doc.workflow_graph,
    })
}

/// Apply the shared section's own template before it is merged into jobs.
async fn resolve_shared(
    mut shared: SharedConfig,
    templates: &dyn TemplateResolver,
    warnings: &mut Vec<String>,
) -> Result<SharedConfig> {
    let Some(reference) = shared.template.take() else {
        return Ok(shared);
    };
    let fragment = resolve(&reference, templates, warnings).await?;

    shared.image = shared.image.or(fragment.image);
    if shared.commands.is_empty() {
        shared.commands = fragment.commands;
    }
    if shared.secrets.is_empty() {
        shared.secrets = fragment.secrets;
    }
    shared.settings = merge_mappings(&fragment.settings, &shared.settings);
    shared.environment = merge_mappings(&fragment.environment, &shared.environment);
    shared.annotations = merge_mappings(&fragment.annotations, &shared.annotations);
    Ok(shared)
}

async fn resolve(
    reference: &str,
    templates: &dyn TemplateResolver,
    warnings: &mut Vec<String>,
) -> Result<TemplateFragment> {
    let resolved = templates.resolve(reference).await.map_err(|e| match e {
        ResolverError::NotFound(r) => {
            CompileError::TemplateResolutionError(format!("template {} not found", r))
        }
        ResolverError::Lookup(m) => CompileError::TemplateResolutionError(m),
    })?;

    if !resolved.version_pinned && !resolved.tag_pinned {
        warnings.push(format!("{} should be explicitly versioned", reference));
    }
    Ok(resolved.fragment)
}

/// Merge template fragment and shared settings into one job spec.
/// Job-declared fields take precedence; template beats shared.
fn merge_job(job: JobSpec, fragment: Option<TemplateFragment>, shared: &SharedConfig) -> JobSpec {
    let fragment = fragment.unwrap_or_default();

    let image = job
        .image
        .or(fragment.image)
        .or_else(|| shared.image.clone());

    let commands = first_nonempty(
        job.commands,
        first_nonempty(fragment.commands, shared.commands.clone()),
    );
    let secrets = first_nonempty(
        job.secrets,
        first_nonempty(fragment.secrets, shared.secrets.clone()),
    );

    let settings = merge_mappings(
        &merge_mappings(&shared.settings, &fragment.settings),
        &job.settings,
    );
    let environment = merge_mappings(
        &merge_mappings(&shared.environment, &fragment.environment),
        &job.environment,
    );
    let annotations = merge_mappings(
        &merge_mappings(&shared.annotations, &fragment.annotations),
        &job.annotations,
    );

    JobSpec {
        image,
        commands,
        requires: job.requires,
        template: None,
        settings,
        environment,
        secrets,
        annotations,
        stage: job.stage,
        build_cluster: job.build_cluster,
    }
}

fn first_nonempty<T>(preferred: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

/// Union of two mappings where `over` wins on key collisions. Base keys
/// keep their declaration order; new keys append in `over`'s order.
fn merge_mappings(base: &Mapping, over: &Mapping) -> Mapping {
    let mut merged = Mapping::new();
    for (key, value) in base {
        let value = over.get(key).unwrap_or(value);
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in over {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
