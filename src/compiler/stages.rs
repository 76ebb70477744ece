//! Stage integrity checking
//!
//! Stages are a strict subset of jobs: a job may belong to zero or one
//! stage, and every listed member must exist. Virtual trigger names are
//! never valid stage members. Graph topology is not checked here; cycles
//! are a scheduler concern.

use crate::document::{JobPermutation, Stage};
use crate::error::{CompileError, Result};
use std::collections::{BTreeMap, HashSet};

/// Verify stage membership against the expanded job set.
///
/// A job listed twice, whether across two stages or twice within one
/// stage's member list, is a duplicate.
pub fn verify(
    stages: &BTreeMap<String, Stage>,
    jobs: &BTreeMap<String, Vec<JobPermutation>>,
) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();

    for (stage_name, stage) in stages {
        let mut unknown: Vec<&str> = Vec::new();
        for member in &stage.jobs {
            let member = member.as_str();
            if !seen.insert(member) && !duplicates.contains(&member) {
                duplicates.push(member);
            }
            if !jobs.contains_key(member) {
                unknown.push(member);
            }
        }
        if !unknown.is_empty() {
            return Err(CompileError::UnknownStageJob {
                stage: stage_name.clone(),
                jobs: unknown.join(", "),
            });
        }
    }

    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        return Err(CompileError::DuplicateStageJob(duplicates.join(", ")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Command;

    fn jobs(names: &[&str]) -> BTreeMap<String, Vec<JobPermutation>> {
        names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    vec![JobPermutation {
                        image: "node:18".to_string(),
                        commands: vec![Command {
                            name: "t".to_string(),
                            command: "true".to_string(),
                        }],
                        requires: Vec::new(),
                        settings: Default::default(),
                        environment: Default::default(),
                        secrets: Vec::new(),
                        annotations: Default::default(),
                    }],
                )
            })
            .collect()
    }

    fn stage(members: &[&str]) -> Stage {
        Stage {
            description: None,
            jobs: members.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_stages_pass() {
        let mut stages = BTreeMap::new();
        stages.insert("canary".to_string(), stage(&["main", "publish"]));
        stages.insert("prod".to_string(), stage(&["deploy"]));

        verify(&stages, &jobs(&["main", "publish", "deploy", "unstaged"])).unwrap();
    }

    #[test]
    fn test_duplicate_across_stages_fails() {
        let mut stages = BTreeMap::new();
        stages.insert("canary".to_string(), stage(&["main"]));
        stages.insert("prod".to_string(), stage(&["main"]));

        match verify(&stages, &jobs(&["main"])) {
            Err(CompileError::DuplicateStageJob(names)) => assert_eq!(names, "main"),
            other => panic!("expected DuplicateStageJob, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_within_one_stage_fails() {
        let mut stages = BTreeMap::new();
        stages.insert("canary".to_string(), stage(&["main", "main"]));

        match verify(&stages, &jobs(&["main"])) {
            Err(err @ CompileError::DuplicateStageJob(_)) => {
                assert_eq!(err.to_string(), "Cannot have duplicate job in stages: main");
            }
            other => panic!("expected DuplicateStageJob, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_member_fails_naming_job() {
        let mut stages = BTreeMap::new();
        stages.insert("canary".to_string(), stage(&["main", "ghost"]));

        match verify(&stages, &jobs(&["main"])) {
            Err(CompileError::UnknownStageJob { stage, jobs }) => {
                assert_eq!(stage, "canary");
                assert_eq!(jobs, "ghost");
            }
            other => panic!("expected UnknownStageJob, got {:?}", other),
        }
    }

    #[test]
    fn test_jobs_outside_any_stage_are_fine() {
        let stages = BTreeMap::new();
        verify(&stages, &jobs(&["main"])).unwrap();
    }
}
