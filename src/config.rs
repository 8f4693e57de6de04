//! Run configuration consumed by the cleaning pipeline.
//!
//! A [`Config`] is read once, before the pipeline starts, and is shared
//! read-only by every stage. It can come from JSON or from the forgiving
//! `key: value` text format that the lab wizard writes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CleanError, Result};

/// Key holding the column-role mapping, in both JSON and the text format.
pub const MAPPING_KEY: &str = "_mapping";

// ---------------------------------------------------------------------------
// TransformModel
// ---------------------------------------------------------------------------

/// Mathematical model applied to the dependent variable before cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransformModel {
    #[default]
    Linear,
    Log2,
    Log10,
    Ln,
}

impl TransformModel {
    pub fn as_str(self) -> &'static str {
        match self {
            TransformModel::Linear => "linear",
            TransformModel::Log2 => "log2",
            TransformModel::Log10 => "log10",
            TransformModel::Ln => "ln",
        }
    }

    pub fn is_linear(self) -> bool {
        self == TransformModel::Linear
    }

    /// Apply the model to a single value. Non-positive input has no
    /// logarithm and yields `None`.
    pub fn apply(self, v: f64) -> Option<f64> {
        match self {
            TransformModel::Linear => Some(v),
            _ if v <= 0.0 => None,
            TransformModel::Log2 => Some(v.log2()),
            TransformModel::Log10 => Some(v.log10()),
            TransformModel::Ln => Some(v.ln()),
        }
    }
}

impl FromStr for TransformModel {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "linear" => Ok(TransformModel::Linear),
            "log2" => Ok(TransformModel::Log2),
            "log10" => Ok(TransformModel::Log10),
            "ln" => Ok(TransformModel::Ln),
            _ => Err(CleanError::UnknownModel(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for TransformModel {
    type Error = CleanError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TransformModel> for String {
    fn from(m: TransformModel) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for TransformModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RoleMapping
// ---------------------------------------------------------------------------

/// Raw, user-typed column names for the semantic roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub independent_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_variable: Option<String>,
    /// Any other `{Column}` references from the config file.
    #[serde(flatten)]
    pub other: BTreeMap<String, JsonValue>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Plot type discriminator, e.g. "box", "scatter", "heatmap".
    #[serde(default)]
    pub graph: String,
    #[serde(default)]
    pub model: TransformModel,
    #[serde(default, rename = "_mapping")]
    pub mapping: RoleMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
    /// Unrecognized keys. Kept for callers, ignored by the pipeline.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// Result of [`Config::parse_forgiving`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedConfig {
    pub config: Config,
    /// `UNSAFE:` lines the user acknowledged, in file order.
    pub unsafe_flags: Vec<String>,
}

impl Config {
    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = graph.into();
        self
    }

    pub fn with_model(mut self, model: TransformModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_independent(mut self, column: impl Into<String>) -> Self {
        self.mapping.independent_variable = Some(column.into());
        self
    }

    pub fn with_dependent(mut self, column: impl Into<String>) -> Self {
        self.mapping.dependent_variable = Some(column.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_value(value: JsonValue) -> Result<Self> {
        if !value.is_object() {
            return Err(CleanError::Config(
                "configuration must be a key/value object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Load from disk: `.json` files are strict JSON, anything else is read
    /// with [`Config::parse_forgiving`].
    pub fn from_path(path: &Path) -> anyhow::Result<ParsedConfig> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            ParsedConfig {
                config: Config::from_json_str(&text).context("parsing JSON config")?,
                unsafe_flags: Vec::new(),
            }
        } else {
            Config::parse_forgiving(&text).context("parsing config")?
        };
        Ok(parsed)
    }

    /// Parse the line-oriented format written by hand or by the wizard.
    ///
    /// ```text
    /// # comment
    /// Graph: Box
    /// Model = log2
    /// Independent Variable: {Group}
    /// Dependent Variable: {Conc. (mg/ml)}
    /// UNSAFE: skip normality check
    /// ```
    pub fn parse_forgiving(text: &str) -> Result<ParsedConfig> {
        let mut root = Map::new();
        let mut mapping = Map::new();
        let mut unsafe_flags = Vec::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line
                .get(..7)
                .is_some_and(|p| p.eq_ignore_ascii_case("unsafe:"))
            {
                let flag = line[7..].trim().to_string();
                warn!("UNSAFE flag acknowledged: {flag}");
                unsafe_flags.push(flag);
                continue;
            }

            let Some(split) = line.find([':', '=']) else {
                warn!("Skipping unparseable config line: {line}");
                continue;
            };
            let key = normalize_key(&line[..split]);
            let value = line[split + 1..].trim();

            if let Some(inner) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
                let column = inner.trim().to_string();
                mapping.insert(key.clone(), JsonValue::String(column.clone()));
                root.insert(key, JsonValue::String(column));
            } else {
                root.insert(key, JsonValue::String(value.to_string()));
            }
        }

        root.insert(MAPPING_KEY.to_string(), JsonValue::Object(mapping));
        let config = Config::from_json_value(JsonValue::Object(root))?;
        Ok(ParsedConfig {
            config,
            unsafe_flags,
        })
    }

    /// Raw name the user gave for the dependent variable, as used by the
    /// log transform (no label fallback).
    pub fn transform_target(&self) -> Option<&str> {
        self.mapping.dependent_variable.as_deref()
    }

    /// Declared independent variable, falling back to `xlabel`.
    pub fn independent_target(&self) -> Option<&str> {
        self.mapping
            .independent_variable
            .as_deref()
            .or(self.xlabel.as_deref())
    }

    /// Declared dependent variable, falling back to `ylabel`.
    pub fn dependent_target(&self) -> Option<&str> {
        self.mapping
            .dependent_variable
            .as_deref()
            .or(self.ylabel.as_deref())
    }

    fn graph_contains(&self, needle: &str) -> bool {
        self.graph.to_lowercase().contains(needle)
    }

    pub fn is_scatter(&self) -> bool {
        self.graph_contains("scatter")
    }

    /// Scatter and heatmap consumers need the table left wide.
    pub fn keeps_wide_layout(&self) -> bool {
        self.is_scatter() || self.graph_contains("heatmap")
    }
}

/// " Independent Variable " -> "independent_variable"
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}
