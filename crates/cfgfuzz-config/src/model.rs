use cfgfuzz_core::{GeneratedValue, SchemaKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Recursion bound used when the configuration leaves `maxDepth` unset.
pub const DEFAULT_MAX_DEPTH: usize = 5;
/// Iteration count used when the configuration leaves `iterations` unset.
pub const DEFAULT_ITERATIONS: u64 = 1000;

/// Contents of a `.cfgfuzz.yaml` / `.cfgfuzz.toml` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FuzzConfig {
    /// Dotted paths whose values are frozen to the example value.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Per-path overrides of the detected schema.
    #[serde(default)]
    pub constraints: Vec<PathConstraint>,
    /// Recursion bound for schema traversal and generation (0 = default).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Number of fuzz iterations (0 = default).
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Error substrings that are never treated as crashes. Added to the
    /// oracle's baseline list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_errors: Vec<String>,
    /// Error substrings marking a crash as known noise. Replaces the default
    /// list when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninteresting_patterns: Option<Vec<String>>,
    /// Seed for the primitive draw source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Override of the schema at one dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathConstraint {
    /// Dotted path, e.g. `service.port`; array items use `[]` (`hosts[]`).
    pub path: String,
    /// Value type (`integer`, `string`, `bool`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<GeneratedValue>,
    /// Marks the property as always present in generated values.
    #[serde(default)]
    pub required: bool,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            constraints: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            iterations: DEFAULT_ITERATIONS,
            ignore_errors: Vec::new(),
            uninteresting_patterns: None,
            seed: None,
        }
    }
}

impl FuzzConfig {
    /// Replace zero-valued limits with their defaults.
    pub fn normalize(&mut self) {
        if self.max_depth == 0 {
            self.max_depth = DEFAULT_MAX_DEPTH;
        }
        if self.iterations == 0 {
            self.iterations = DEFAULT_ITERATIONS;
        }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|ignored| ignored == path)
    }

    /// First constraint declared for `path`.
    pub fn constraint(&self, path: &str) -> Option<&PathConstraint> {
        self.constraints
            .iter()
            .find(|constraint| constraint.path == path)
    }
}

impl PathConstraint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: None,
            min: None,
            max: None,
            pattern: None,
            enum_values: Vec::new(),
            required: false,
        }
    }

    /// Parsed `type`; `None` when absent or unrecognised.
    pub fn schema_kind(&self) -> Option<SchemaKind> {
        self.kind.as_deref().and_then(|kind| kind.parse().ok())
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_iterations() -> u64 {
    DEFAULT_ITERATIONS
}
