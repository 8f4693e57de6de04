use crate::config::Config;
use crate::data::model::{Cell, Table};
use crate::error::Result;

use super::numeric::{is_not_detected, leading_number, parse_strict, Leading};
use super::{Diagnostics, Stage};

/// Pulls numbers out of noisy text cells and maps "not detected" markers
/// to `Missing`. Everything else is kept as trimmed text.
pub struct ValueSanitizer;

impl ValueSanitizer {
    pub const NAME: &'static str = "values";
}

/// Clean a single cell. First matching rule wins:
///
/// 1. `Missing` stays `Missing`
/// 2. "ND" / "n.d." → `Missing`
/// 3. whole string is a number → `Number`
/// 4. leading number with trailing unit text ("1.5 mg/mL") → `Number`
/// 5. otherwise the trimmed text
pub fn sanitize_cell(cell: Cell) -> Cell {
    let s = match cell {
        Cell::Missing => return Cell::Missing,
        Cell::Number(v) => return Cell::number(v),
        Cell::Text(s) => s,
    };
    let s = s.trim();

    if is_not_detected(s) {
        return Cell::Missing;
    }
    if let Ok(v) = s.parse::<f64>() {
        // "nan" parses; fold it into Missing like any other NaN
        return Cell::number(v);
    }
    match leading_number(s) {
        Leading::Found(v) => Cell::number(v),
        Leading::Unparsable => Cell::Missing,
        Leading::Absent => Cell::Text(s.to_string()),
    }
}

impl Stage for ValueSanitizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, table: Table, _config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        let mut extracted = 0usize;
        let mut not_detected = 0usize;

        let table = table.map_cells(|cell| {
            if let Cell::Text(s) = &cell {
                let t = s.trim();
                if is_not_detected(t) {
                    not_detected += 1;
                } else if parse_strict(t).is_none()
                    && matches!(leading_number(t), Leading::Found(_))
                {
                    extracted += 1;
                }
            }
            sanitize_cell(cell)
        });

        if not_detected > 0 {
            diag.info(
                Self::NAME,
                format!("{not_detected} not-detected cell(s) set to missing"),
            );
        }
        if extracted > 0 {
            diag.info(
                Self::NAME,
                format!("{extracted} cell(s) had trailing unit text stripped"),
            );
        }
        Ok(table)
    }
}
