//! pipeline-compiler - compiles declarative CI pipeline configurations
//! into fully resolved, executable pipeline definitions
//!
//! The compiler turns a document of jobs, shared settings, stages, and
//! triggers into concrete job permutations, a workflow graph, and stage
//! metadata. Compilation never fails from the caller's point of view: any
//! internal error is converted into a fixed fallback pipeline whose single
//! job reports the error and exits non-zero.

pub mod cli;
pub mod compiler;
pub mod document;
pub mod error;
pub mod resolvers;

// Re-export commonly used types
pub use compiler::{AnnotationRegistry, Compiler, CompilerOptions};
pub use document::{
    Command, CompiledPipeline, ConfigDocument, JobPermutation, JobSpec, Stage, WorkflowEdge,
    WorkflowGraph, WorkflowNode,
};
pub use error::CompileError;
pub use resolvers::{
    BuildClusterResolver, ResolvedTemplate, ResolverError, StaticClusters, StaticTemplates,
    StaticTriggers, TemplateFragment, TemplateResolver, TriggerResolver,
};
