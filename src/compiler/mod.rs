//! The compilation pipeline
//!
//! Phases run strictly in sequence, each consuming the previous phase's
//! output: load, structural validation, template flattening, functional
//! validation, permutation expansion, stage verification, annotation
//! governance, assembly. [`Compiler::compile`] wraps the whole chain in a
//! single error boundary that converts any failure into the fallback
//! pipeline, so the caller always receives a schedulable result.

pub mod annotations;
pub mod fallback;
pub mod flatten;
pub mod functional;
pub mod permutations;
pub mod stages;
pub mod structural;
pub mod workflow;

pub use annotations::AnnotationRegistry;

use crate::document::{loader, CompiledPipeline, ExpandedDocument};
use crate::error::Result;
use crate::resolvers::{BuildClusterResolver, TemplateResolver, TriggerResolver};
use std::sync::Arc;
use tracing::{debug, warn};

/// Compiler options
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Identifier of the pipeline being compiled, passed to the trigger
    /// resolver as context
    pub pipeline_id: String,

    /// Whether malformed notification rules abort compilation instead of
    /// producing warnings
    pub notifications_fatal: bool,
}

/// Compiles declarative pipeline configuration into executable pipeline
/// definitions.
pub struct Compiler {
    templates: Arc<dyn TemplateResolver>,
    clusters: Arc<dyn BuildClusterResolver>,
    triggers: Arc<dyn TriggerResolver>,
    registry: AnnotationRegistry,
    options: CompilerOptions,
}

impl Compiler {
    /// Create a compiler with default options and annotation tables.
    pub fn new(
        templates: Arc<dyn TemplateResolver>,
        clusters: Arc<dyn BuildClusterResolver>,
        triggers: Arc<dyn TriggerResolver>,
    ) -> Self {
        Self {
            templates,
            clusters,
            triggers,
            registry: AnnotationRegistry::default(),
            options: CompilerOptions::default(),
        }
    }

    /// Replace the compiler options.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the reserved-annotation tables.
    pub fn with_registry(mut self, registry: AnnotationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Compile raw configuration text into a pipeline.
    ///
    /// Never fails: any internal error produces the fallback pipeline,
    /// whose `errors` field carries the stringified cause.
    pub async fn compile(&self, text: &str) -> CompiledPipeline {
        match self.try_compile(text).await {
            Ok(pipeline) => pipeline,
            Err(error) => {
                warn!(%error, "compilation failed, emitting fallback pipeline");
                fallback::build(&error)
            }
        }
    }

    /// Run the phase chain, surfacing the raw error on failure.
    pub async fn try_compile(&self, text: &str) -> Result<CompiledPipeline> {
        let mut warnings = Vec::new();

        let candidate = loader::load(text)?;
        let doc = structural::validate(&candidate)?;
        debug!(jobs = doc.jobs.len(), "structural validation passed");

        let doc = flatten::flatten(doc, &*self.templates, &mut warnings).await?;
        let doc = functional::validate(
            doc,
            &*self.clusters,
            &*self.triggers,
            &self.options.pipeline_id,
            self.options.notifications_fatal,
            &mut warnings,
        )
        .await?;

        let doc = permutations::expand(doc);
        stages::verify(&doc.stages, &doc.jobs)?;
        warnings.extend(annotations::govern(&doc, &self.registry));

        debug!(warnings = warnings.len(), "compilation succeeded");
        Ok(assemble(doc, warnings))
    }
}

fn assemble(doc: ExpandedDocument, warnings: Vec<String>) -> CompiledPipeline {
    let workflow_graph = doc
        .workflow_graph
        .unwrap_or_else(|| workflow::derive(&doc.jobs));

    CompiledPipeline {
        annotations: doc.annotations,
        jobs: doc.jobs,
        child_pipelines: doc.child_pipelines,
        workflow_graph,
        parameters: doc.parameters,
        subscribe: doc.subscribe,
        stages: doc.stages,
        warn_messages: warnings,
        errors: Vec::new(),
    }
}
