//! Compilation error taxonomy

use thiserror::Error;

/// Terminal failure raised by one of the compilation phases.
///
/// Every variant aborts the current compilation; the [`Compiler`] converts
/// any of them into the fallback pipeline, so callers of
/// [`Compiler::compile`] never see these directly.
///
/// [`Compiler`]: crate::compiler::Compiler
/// [`Compiler::compile`]: crate::compiler::Compiler::compile
#[derive(Debug, Error)]
pub enum CompileError {
    /// Input text was empty or contained no document.
    #[error("screwdriver.yaml does not exist. Please create a screwdriver.yaml and try to rerun your build.")]
    MissingConfiguration,

    /// Multi-document input without exactly one version-4 document.
    #[error("Ambiguous configuration: {0}")]
    AmbiguousConfiguration(String),

    /// Document shape violation, before any external resolution.
    #[error("Structural error at {path}: {message}")]
    StructuralError { path: String, message: String },

    /// A referenced template could not be resolved.
    #[error("Template resolution error: {0}")]
    TemplateResolutionError(String),

    /// A job names a build cluster the platform does not know.
    #[error("Job {job} uses unknown build cluster {cluster}")]
    UnknownBuildCluster { job: String, cluster: String },

    /// A cross-pipeline trigger reference did not resolve.
    #[error("Job {job} requires unresolvable trigger {trigger}")]
    UnresolvedTrigger { job: String, trigger: String },

    /// Malformed notification/subscribe rule (fatal only in strict mode).
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// A job is listed more than once across the stage declarations.
    #[error("Cannot have duplicate job in stages: {0}")]
    DuplicateStageJob(String),

    /// A stage lists a job that does not exist.
    #[error("Stage {stage} references unknown job(s): {jobs}")]
    UnknownStageJob { stage: String, jobs: String },
}

/// Result type for compilation phases.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configuration_message() {
        let err = CompileError::MissingConfiguration;
        assert_eq!(
            err.to_string(),
            "screwdriver.yaml does not exist. Please create a screwdriver.yaml and try to rerun your build."
        );
    }

    #[test]
    fn test_duplicate_stage_job_names_job() {
        let err = CompileError::DuplicateStageJob("main".to_string());
        assert!(err.to_string().contains("main"));
    }
}
