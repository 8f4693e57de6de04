use crate::config::{Config, TransformModel};
use crate::data::model::{Cell, Table};
use crate::error::Result;

use super::{Diagnostics, Stage};

/// Applies the configured log model before any other cleaning.
///
/// The target is looked up by the *raw* dependent-variable name, since
/// headers are not normalized yet. When it cannot be found every cell in
/// the table is transformed instead, which is logged as a warning.
// TODO: resolve the target through HeaderNormalizer once callers no longer
// rely on the whole-table fallback for case/whitespace mismatches.
pub struct TransformationStage;

impl TransformationStage {
    pub const NAME: &'static str = "transform";
}

/// Transform one cell. Text that is not a number passes through untouched.
pub fn transform_cell(model: TransformModel, cell: Cell) -> Cell {
    let value = match &cell {
        Cell::Number(v) => *v,
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return cell,
        },
        Cell::Missing => return Cell::Missing,
    };
    model.apply(value).map_or(Cell::Missing, Cell::number)
}

impl Stage for TransformationStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, mut table: Table, config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        let model = config.model;
        if model.is_linear() {
            return Ok(table);
        }

        let target = config.transform_target();
        if let Some(column) = target.and_then(|name| table.column_mut(name)) {
            diag.info(
                Self::NAME,
                format!("applying {model} to column '{}'", column.name),
            );
            let cells = std::mem::take(&mut column.cells);
            column.cells = cells
                .into_iter()
                .map(|c| transform_cell(model, c))
                .collect();
            return Ok(table);
        }

        diag.warn(
            Self::NAME,
            format!(
                "target column {} not found; applying {model} to every cell (risky)",
                target.map_or_else(|| "<unset>".to_string(), |t| format!("'{t}'"))
            ),
        );
        Ok(table.map_cells(|c| transform_cell(model, c)))
    }
}
