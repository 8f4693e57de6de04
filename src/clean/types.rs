use crate::config::Config;
use crate::data::model::{Cell, Table};
use crate::error::Result;

use super::headers::normalize_header;
use super::numeric::{looks_numeric_with_units, parse_lenient, parse_strict, NUMERIC_MAJORITY};
use super::shape::{GROUP_COLUMN, VALUE_COLUMN, VARIABLE_COLUMN};
use super::{Diagnostics, Stage};

/// Last line of defence before plotting: numeric columns are made numeric
/// and a `group` column is put in place for categorical plots.
pub struct TypeEnforcer;

impl TypeEnforcer {
    pub const NAME: &'static str = "types";
}

/// Strict coercion: text that is not entirely a number becomes `Missing`.
fn coerce_strict(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) => parse_strict(&s).map_or(Cell::Missing, Cell::Number),
        other => other,
    }
}

/// Lenient coercion: a leading number is enough ("10kg" → 10).
fn coerce_lenient(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) => parse_lenient(&s).map_or(Cell::Missing, Cell::number),
        other => other,
    }
}

fn map_column(table: &mut Table, name: &str, f: fn(Cell) -> Cell) {
    if let Some(col) = table.column_mut(name) {
        let cells = std::mem::take(&mut col.cells);
        col.cells = cells.into_iter().map(f).collect();
    }
}

impl TypeEnforcer {
    /// Make the declared dependent column numeric unless it is clearly a
    /// label column. Returns the canonical column name, if one was declared.
    fn enforce_dependent(
        table: &mut Table,
        config: &Config,
        diag: &mut Diagnostics,
    ) -> Option<String> {
        let target = normalize_header(config.dependent_target()?);
        let Some(column) = table.column(&target) else {
            return Some(target);
        };

        if looks_numeric_with_units(column, NUMERIC_MAJORITY) || !config.model.is_linear() {
            map_column(table, &target, coerce_lenient);
        } else {
            diag.warn(
                Self::NAME,
                format!("dependent column '{target}' looks categorical; not forcing it to numbers"),
            );
        }
        Some(target)
    }

    fn ensure_group(
        table: &mut Table,
        config: &Config,
        dependent: Option<&str>,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        if config.is_scatter() {
            diag.info(Self::NAME, "scatter plot: no group column assigned");
            return Ok(());
        }
        if table.has_column(GROUP_COLUMN) {
            return Ok(());
        }
        if table.has_column(VARIABLE_COLUMN) {
            diag.info(Self::NAME, "using 'variable' column as 'group'");
            return table.rename(VARIABLE_COLUMN, GROUP_COLUMN);
        }

        let candidate = table
            .columns()
            .iter()
            .find(|c| c.has_text() && Some(c.name.as_str()) != dependent)
            .map(|c| c.name.clone());
        match candidate {
            Some(name) => {
                diag.info(Self::NAME, format!("auto-assigning column '{name}' as 'group'"));
                table.rename(&name, GROUP_COLUMN)
            }
            None => {
                diag.info(Self::NAME, "no categorical column available for 'group'");
                Ok(())
            }
        }
    }
}

impl Stage for TypeEnforcer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, mut table: Table, config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        map_column(&mut table, VALUE_COLUMN, coerce_strict);
        let dependent = Self::enforce_dependent(&mut table, config, diag);
        Self::ensure_group(&mut table, config, dependent.as_deref(), diag)?;
        Ok(table)
    }
}
