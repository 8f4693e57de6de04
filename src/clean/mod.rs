/// Cleaning pipeline: messy lab table in, canonical tidy table out.
///
/// ```text
///   Table (from loader)
///        │
///        ▼
///   transform  ── optional log2/log10/ln of the dependent column
///   headers    ── "Conc. (mg/ml)" → "conc._(mg/ml)"
///   values     ── "1.5 mg/mL" → 1.5, "ND" → Missing
///   shape      ── wide → long (variable / value)
///   types      ── numeric coercion, default "group" column
///   roles      ── declared variables → "x" / "y"
///        │
///        ▼
///   CleanReport { table, diagnostics }
/// ```
///
/// Every stage takes the table by value and hands back a new one, sharing
/// only the read-only [`Config`].

pub mod headers;
pub mod numeric;
pub mod roles;
pub mod shape;
pub mod transform;
pub mod types;
pub mod values;

use std::fmt;

use log::{debug, info, warn};

use crate::config::Config;
use crate::data::model::Table;
use crate::error::Result;

pub use headers::HeaderNormalizer;
pub use roles::ColumnMapper;
pub use shape::ShapeResolver;
pub use transform::TransformationStage;
pub use types::TypeEnforcer;
pub use values::ValueSanitizer;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
}

/// One human-readable decision taken by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: &'static str,
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Info => "info",
            Level::Warn => "warn",
        };
        write!(f, "[{level}] {}: {}", self.stage, self.message)
    }
}

/// Collects stage decisions and forwards them to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn info(&mut self, stage: &'static str, message: impl Into<String>) {
        let message = message.into();
        info!(target: "tidy_lab::clean", "{stage}: {message}");
        self.entries.push(Diagnostic {
            stage,
            level: Level::Info,
            message,
        });
    }

    pub fn warn(&mut self, stage: &'static str, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "tidy_lab::clean", "{stage}: {message}");
        self.entries.push(Diagnostic {
            stage,
            level: Level::Warn,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level == Level::Warn)
    }

    pub fn for_stage<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| d.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Stage / Pipeline
// ---------------------------------------------------------------------------

/// One step of the pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Only structural failures; per-cell problems degrade to `Missing`
    /// or unchanged text.
    fn apply(&self, table: Table, config: &Config, diag: &mut Diagnostics) -> Result<Table>;
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub table: Table,
    pub diagnostics: Diagnostics,
    pub rows_before: usize,
    pub columns_before: usize,
    pub stages_applied: usize,
}

impl CleanReport {
    pub fn summary(&self) -> String {
        format!(
            "Cleaned {} stages: rows {} → {}, columns {} → {}, {} warning(s)",
            self.stages_applied,
            self.rows_before,
            self.table.n_rows(),
            self.columns_before,
            self.table.n_cols(),
            self.diagnostics.warnings().count()
        )
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// The six stages, in their required order.
    pub fn standard() -> Self {
        Pipeline {
            stages: vec![
                Box::new(TransformationStage),
                Box::new(HeaderNormalizer),
                Box::new(ValueSanitizer),
                Box::new(ShapeResolver),
                Box::new(TypeEnforcer),
                Box::new(ColumnMapper),
            ],
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, table: Table, config: &Config) -> Result<CleanReport> {
        let rows_before = table.n_rows();
        let columns_before = table.n_cols();
        let mut diagnostics = Diagnostics::default();
        info!(
            "Starting cleaning pipeline on {rows_before} rows × {columns_before} columns"
        );

        let mut table = table;
        for stage in &self.stages {
            debug!("Running stage {}", stage.name());
            table = stage.apply(table, config, &mut diagnostics)?;
        }

        Ok(CleanReport {
            table,
            diagnostics,
            rows_before,
            columns_before,
            stages_applied: self.stages.len(),
        })
    }
}

/// Run the standard pipeline.
pub fn clean(table: Table, config: &Config) -> Result<CleanReport> {
    Pipeline::standard().run(table, config)
}
