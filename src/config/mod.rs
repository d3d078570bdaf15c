use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use anyhow::{Result, Context};
use regex::Regex;
use thiserror::Error;

/// Configuration-shape violations caught before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern '{pattern}' for label '{label}' in metric '{metric}': {source}")]
    InvalidPattern {
        metric: String,
        label: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed filter pair '{0}' (expected field=value)")]
    MalformedFilterPair(String),

    #[error("unknown filter field '{0}' (expected one of: type, brand, model, serial, location)")]
    UnknownFilterField(String),
}

/// The metric map document: a top-level list of metric specifications.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub map: Vec<MetricSpec>,
}

impl Config {
    /// Load the metric map from a YAML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse metric map configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Compile every declared pattern up front so a bad expression aborts
    /// the run before any query is issued.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in &self.map {
            spec.validate()?;
        }
        Ok(())
    }
}

/// One entry in the metric map: a query, how its labels map onto inventory
/// fields, and the joins supplying correlated values.
///
/// Optional fields default at deserialization time, uniformly for nested
/// join specs as well, so a spec is read-only once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSpec {
    /// Query expression identifying the data to fetch; also the cache key.
    pub metric: String,

    /// Optional identifier, recorded as the first provenance entry.
    #[serde(default)]
    pub name: Option<String>,

    /// Category label for resulting records.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// Required: a spec that maps no labels cannot produce records.
    pub labels: LabelMap,

    /// Source label name -> extraction pattern; named captures overwrite
    /// target fields.
    #[serde(default)]
    pub regexp: BTreeMap<String, String>,

    /// Target field -> literal value, applied last (highest precedence).
    #[serde(rename = "static", default)]
    pub statics: BTreeMap<String, String>,

    #[serde(default)]
    pub ignore_regexp: Vec<IgnoreRule>,

    #[serde(default)]
    pub join: Vec<JoinSpec>,

    #[serde(default)]
    pub collisions: CollisionPolicy,
}

fn default_kind() -> String {
    "unknown".to_string()
}

impl MetricSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        for (label, pattern) in &self.regexp {
            self.check_pattern(label, pattern)?;
        }
        for rule in &self.ignore_regexp {
            for (label, pattern) in rule {
                // An empty ignore pattern means "match when absent"
                if pattern.is_empty() {
                    continue;
                }
                self.check_pattern(label, pattern)?;
            }
        }
        for join in &self.join {
            join.spec.validate()?;
        }
        Ok(())
    }

    fn check_pattern(&self, label: &str, pattern: &str) -> Result<(), ConfigError> {
        compile_anchored(pattern)
            .map(|_| ())
            .map_err(|source| ConfigError::InvalidPattern {
                metric: self.metric.clone(),
                label: label.to_string(),
                pattern: pattern.to_string(),
                source,
            })
    }
}

/// Mapping from target field name to the source label(s) feeding it. The
/// reserved `extra` key lists source labels collected verbatim instead of
/// feeding a typed field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelMap {
    #[serde(default)]
    pub extra: Vec<String>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, LabelSources>,
}

/// One or several source label names declared for a target field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LabelSources {
    One(String),
    Many(Vec<String>),
}

impl LabelSources {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelSources::One(source) => source == label,
            LabelSources::Many(sources) => sources.iter().any(|s| s == label),
        }
    }
}

/// One ignore rule: source label -> pattern. An empty pattern matches when
/// the label is absent from the row.
pub type IgnoreRule = BTreeMap<String, String>;

/// A nested metric spec used purely to supply correlated values, plus the
/// ordered source labels forming its correlation key.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinSpec {
    pub index: Vec<String>,

    #[serde(flatten)]
    pub spec: MetricSpec,
}

/// Merge policy applied when a normalized record collides with an existing
/// one. Declaring any other value in the configuration fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Fill empty brand/serial on an existing `(type, model, location)` match.
    #[default]
    Override,
}

/// Compiles a configured pattern anchored at the start and unanchored at the
/// end, the prefix-match semantics every pattern in the map uses.
pub(crate) fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}
