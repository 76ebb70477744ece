//! Functional validation
//!
//! Semantic checks that need external knowledge: build-cluster existence,
//! cross-pipeline trigger reachability, and notification rule shape. This
//! is the only phase allowed to consult resolvers other than the template
//! resolver.

use crate::document::FlatDocument;
use crate::error::{CompileError, Result};
use crate::resolvers::{BuildClusterResolver, TriggerResolver};
use regex::Regex;
use tracing::debug;

const KNOWN_STATUSES: &[&str] = &["SUCCESS", "FAILURE", "ABORTED"];

/// Validate the flattened document against the platform's resolvers.
///
/// `notifications_fatal` controls whether malformed subscribe rules abort
/// compilation or are downgraded to warnings; cluster and trigger failures
/// are always fatal.
pub async fn validate(
    doc: FlatDocument,
    clusters: &dyn BuildClusterResolver,
    triggers: &dyn TriggerResolver,
    pipeline_id: &str,
    notifications_fatal: bool,
    warnings: &mut Vec<String>,
) -> Result<FlatDocument> {
    let external = external_trigger_pattern();

    for (name, job) in &doc.jobs {
        if let Some(cluster) = &job.build_cluster {
            let exists = clusters.exists(cluster).await.unwrap_or(false);
            if !exists {
                return Err(CompileError::UnknownBuildCluster {
                    job: name.clone(),
                    cluster: cluster.clone(),
                });
            }
            debug!(job = %name, cluster = %cluster, "build cluster verified");
        }

        for entry in &job.requires {
            if !external.is_match(entry) {
                continue;
            }
            let resolved = triggers
                .resolve(pipeline_id, entry)
                .await
                .unwrap_or(false);
            if !resolved {
                return Err(CompileError::UnresolvedTrigger {
                    job: name.clone(),
                    trigger: entry.clone(),
                });
            }
            debug!(job = %name, trigger = %entry, "external trigger verified");
        }
    }

    for problem in subscribe_problems(&doc) {
        if notifications_fatal {
            return Err(CompileError::NotificationError(problem));
        }
        warnings.push(problem);
    }

    Ok(doc)
}

/// Well-formedness of `subscribe.notifications`: each channel maps to a
/// mapping whose `statuses` list only names recognized statuses.
fn subscribe_problems(doc: &FlatDocument) -> Vec<String> {
    let mut problems = Vec::new();
    let Some(notifications) = doc.subscribe.get("notifications") else {
        return problems;
    };
    let Some(notifications) = notifications.as_mapping() else {
        problems.push("subscribe.notifications must be a mapping".to_string());
        return problems;
    };

    for (channel, rule) in notifications {
        let channel = channel.as_str().unwrap_or("?");
        let Some(rule) = rule.as_mapping() else {
            problems.push(format!(
                "subscribe.notifications.{} must be a mapping",
                channel
            ));
            continue;
        };
        let Some(statuses) = rule.get("statuses") else {
            continue;
        };
        let Some(statuses) = statuses.as_sequence() else {
            problems.push(format!(
                "subscribe.notifications.{}.statuses must be a list",
                channel
            ));
            continue;
        };
        for status in statuses {
            let status = status.as_str().unwrap_or("");
            if !KNOWN_STATUSES.contains(&status) {
                problems.push(format!(
                    "subscribe.notifications.{}: unknown status {}",
                    channel, status
                ));
            }
        }
    }
    problems
}

fn external_trigger_pattern() -> Regex {
    Regex::new(r"^~?sd@\d+:").expect("trigger pattern")
}
