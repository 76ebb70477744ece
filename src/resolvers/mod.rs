//! Collaborator lookup services
//!
//! The compiler never fetches templates, clusters, or triggers itself; it
//! talks to these traits. The calls are the only suspension points in a
//! compilation, so all three are async. Static in-memory implementations
//! back the CLI and the test suite.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Mapping;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::document::Command;

/// Error types for resolver lookups
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// A reusable job fragment resolved from a template reference.
///
/// Fields absent here simply contribute nothing during flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFragment {
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub commands: Vec<Command>,

    #[serde(default)]
    pub settings: Mapping,

    #[serde(default)]
    pub environment: Mapping,

    #[serde(default)]
    pub secrets: Vec<String>,

    #[serde(default)]
    pub annotations: Mapping,
}

/// A resolved template plus how firmly the reference was pinned.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub fragment: TemplateFragment,

    /// Reference named an exact version
    pub version_pinned: bool,

    /// Reference named an immutable tag
    pub tag_pinned: bool,
}

/// Resolves named template references to concrete job fragments.
#[async_trait]
pub trait TemplateResolver: Send + Sync {
    /// Resolve a reference of the form `name`, `name@1.2.3`, or `name@tag`.
    async fn resolve(&self, reference: &str) -> Result<ResolvedTemplate, ResolverError>;
}

/// Validates that named build clusters exist.
#[async_trait]
pub trait BuildClusterResolver: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, ResolverError>;
}

/// Validates cross-pipeline trigger references.
#[async_trait]
pub trait TriggerResolver: Send + Sync {
    /// Whether `trigger` (e.g. `sd@123:main`) is reachable from the
    /// pipeline identified by `pipeline_id`.
    async fn resolve(&self, pipeline_id: &str, trigger: &str) -> Result<bool, ResolverError>;
}

/// One entry in a static template registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticTemplateEntry {
    #[serde(flatten)]
    pub fragment: TemplateFragment,

    /// Tags that count as immutable for pinning purposes
    #[serde(default)]
    pub immutable_tags: Vec<String>,
}

/// In-memory template registry keyed by template name.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, StaticTemplateEntry>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from YAML: a map of template name to fragment fields
    /// plus an optional `immutable_tags` list.
    pub fn from_yaml(yaml: &str) -> Result<Self, ResolverError> {
        let templates: HashMap<String, StaticTemplateEntry> =
            serde_yaml::from_str(yaml).map_err(|e| ResolverError::Lookup(e.to_string()))?;
        Ok(Self { templates })
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: StaticTemplateEntry) {
        self.templates.insert(name.into(), entry);
    }
}

#[async_trait]
impl TemplateResolver for StaticTemplates {
    async fn resolve(&self, reference: &str) -> Result<ResolvedTemplate, ResolverError> {
        let (name, selector) = split_reference(reference);
        let entry = self
            .templates
            .get(name)
            .ok_or_else(|| ResolverError::NotFound(reference.to_string()))?;

        let version_pinned = selector.map(is_exact_version).unwrap_or(false);
        let tag_pinned = selector
            .map(|s| entry.immutable_tags.iter().any(|t| t == s))
            .unwrap_or(false);

        Ok(ResolvedTemplate {
            fragment: entry.fragment.clone(),
            version_pinned,
            tag_pinned,
        })
    }
}

fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('@') {
        Some((name, selector)) => (name, Some(selector)),
        None => (reference, None),
    }
}

fn is_exact_version(selector: &str) -> bool {
    let pattern = Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern");
    pattern.is_match(selector)
}

/// In-memory set of known build clusters.
#[derive(Debug, Clone, Default)]
pub struct StaticClusters {
    clusters: HashSet<String>,
}

impl StaticClusters {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clusters: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl BuildClusterResolver for StaticClusters {
    async fn exists(&self, name: &str) -> Result<bool, ResolverError> {
        Ok(self.clusters.contains(name))
    }
}

/// In-memory set of resolvable external trigger references.
#[derive(Debug, Clone, Default)]
pub struct StaticTriggers {
    triggers: HashSet<String>,
}

impl StaticTriggers {
    pub fn new<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: refs
                .into_iter()
                .map(|r| r.into().trim_start_matches('~').to_string())
                .collect(),
        }
    }
}

#[async_trait]
impl TriggerResolver for StaticTriggers {
    async fn resolve(&self, _pipeline_id: &str, trigger: &str) -> Result<bool, ResolverError> {
        Ok(self.triggers.contains(trigger.trim_start_matches('~')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_templates_resolve_and_pinning() {
        let yaml = r#"
node-ci:
  image: node:18
  commands:
    - name: install
      command: npm install
  immutable_tags: [stable]
"#;
        let templates = StaticTemplates::from_yaml(yaml).unwrap();

        let unpinned = templates.resolve("node-ci").await.unwrap();
        assert!(!unpinned.version_pinned);
        assert!(!unpinned.tag_pinned);
        assert_eq!(unpinned.fragment.image.as_deref(), Some("node:18"));

        let versioned = templates.resolve("node-ci@1.2.3").await.unwrap();
        assert!(versioned.version_pinned);

        let tagged = templates.resolve("node-ci@stable").await.unwrap();
        assert!(tagged.tag_pinned);
        assert!(!tagged.version_pinned);

        let floating = templates.resolve("node-ci@latest").await.unwrap();
        assert!(!floating.version_pinned);
        assert!(!floating.tag_pinned);
    }

    #[tokio::test]
    async fn test_static_templates_unknown_reference() {
        let templates = StaticTemplates::new();
        let result = templates.resolve("ghost@1.0.0").await;
        assert!(matches!(result, Err(ResolverError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_static_clusters() {
        let clusters = StaticClusters::new(["gq1", "bf1"]);
        assert!(clusters.exists("gq1").await.unwrap());
        assert!(!clusters.exists("aws").await.unwrap());
    }

    #[tokio::test]
    async fn test_static_triggers_ignore_tilde() {
        let triggers = StaticTriggers::new(["sd@123:main"]);
        assert!(triggers.resolve("9", "~sd@123:main").await.unwrap());
        assert!(triggers.resolve("9", "sd@123:main").await.unwrap());
        assert!(!triggers.resolve("9", "sd@999:main").await.unwrap());
    }
}
