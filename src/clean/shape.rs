use crate::config::Config;
use crate::data::model::{Cell, Column, Table};
use crate::error::Result;

use super::numeric::{is_numeric_leaning, NUMERIC_MAJORITY, WIDE_RATIO};
use super::{Diagnostics, Stage};

/// Column produced by the melt holding the former column name.
pub const VARIABLE_COLUMN: &str = "variable";
/// Column produced by the melt holding the measurement.
pub const VALUE_COLUMN: &str = "value";
/// Identifier synthesized from row position when a wide table has no
/// label columns at all.
pub const INDEX_COLUMN: &str = "index";
pub const GROUP_COLUMN: &str = "group";

/// Detects spreadsheet-style wide tables and melts them into long form.
pub struct ShapeResolver;

impl ShapeResolver {
    pub const NAME: &'static str = "shape";
}

/// Column names split by the numeric-leaning classifier, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClasses {
    pub numeric: Vec<String>,
    pub other: Vec<String>,
}

impl ColumnClasses {
    pub fn of(table: &Table) -> Self {
        let mut classes = ColumnClasses::default();
        for col in table.columns() {
            if is_numeric_leaning(col, NUMERIC_MAJORITY) {
                classes.numeric.push(col.name.clone());
            } else {
                classes.other.push(col.name.clone());
            }
        }
        classes
    }

    /// Strictly more than twice as many numeric columns as the rest.
    /// A tie stays long.
    pub fn is_wide(&self) -> bool {
        self.numeric.len() > self.other.len() * WIDE_RATIO
    }
}

/// Melt `value_columns` into `variable`/`value` pairs, repeating
/// `id_columns` on every output row. Output is ordered by value column,
/// then by original row.
pub fn melt(table: Table, id_columns: &[String], value_columns: &[String]) -> Result<Table> {
    let n_rows = table.n_rows();
    let out_rows = n_rows * value_columns.len();

    let mut ids: Vec<Column> = Vec::with_capacity(id_columns.len());
    let mut values: Vec<Column> = Vec::with_capacity(value_columns.len());
    for col in table.into_columns() {
        if id_columns.contains(&col.name) {
            ids.push(col);
        } else if value_columns.contains(&col.name) {
            values.push(col);
        }
    }
    // keep the caller's id order rather than table order
    ids.sort_by_key(|c| id_columns.iter().position(|n| *n == c.name));

    let mut out: Vec<Column> = ids
        .iter()
        .map(|c| Column::new(c.name.clone(), Vec::with_capacity(out_rows)))
        .collect();
    let mut variable = Column::new(VARIABLE_COLUMN, Vec::with_capacity(out_rows));
    let mut value = Column::new(VALUE_COLUMN, Vec::with_capacity(out_rows));

    for source in values {
        let label = Cell::Text(source.name.trim().to_string());
        for (id_out, id_in) in out.iter_mut().zip(&ids) {
            id_out.cells.extend(id_in.cells.iter().cloned());
        }
        variable.cells.extend(std::iter::repeat(label).take(n_rows));
        value.cells.extend(source.cells);
    }

    out.push(variable);
    out.push(value);
    Table::new(out)
}

impl Stage for ShapeResolver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, table: Table, config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        if config.keeps_wide_layout() {
            diag.info(
                Self::NAME,
                format!("skipping reshape for '{}' graph (needs wide data)", config.graph),
            );
            return Ok(table);
        }

        let classes = ColumnClasses::of(&table);
        if !classes.is_wide() {
            return Ok(table);
        }
        if table.has_column(GROUP_COLUMN) {
            diag.info(
                Self::NAME,
                "table looks wide but already has a 'group' column; leaving it as is",
            );
            return Ok(table);
        }

        diag.info(
            Self::NAME,
            format!(
                "wide format detected: {} numeric vs {} categorical",
                classes.numeric.len(),
                classes.other.len()
            ),
        );

        let ColumnClasses {
            numeric: mut value_columns,
            other: mut id_columns,
        } = classes;

        let mut table = table;
        if id_columns.is_empty() {
            let positions: Vec<Cell> =
                (0..table.n_rows()).map(|i| Cell::Number(i as f64)).collect();
            let mut columns = table.into_columns();
            // an existing "index" column is replaced, and then serves as the id
            match columns.iter_mut().find(|c| c.name == INDEX_COLUMN) {
                Some(existing) => existing.cells = positions,
                None => columns.push(Column::new(INDEX_COLUMN, positions)),
            }
            table = Table::new(columns)?;
            value_columns.retain(|c| c != INDEX_COLUMN);
            id_columns.push(INDEX_COLUMN.to_string());
        }

        let melted = melt(table, &id_columns, &value_columns)?;
        diag.info(
            Self::NAME,
            format!("melted to {} rows × {} columns", melted.n_rows(), melted.n_cols()),
        );
        Ok(melted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn wide() -> Table {
        Table::from_rows(
            &["Group", "S1", "S2", "S3", "S4", "S5"],
            vec![
                vec![Cell::from("Control"), num(1.0), num(2.0), num(3.0), num(4.0), num(5.0)],
                vec![Cell::from("Treated"), num(6.0), num(7.0), num(8.0), num(9.0), Cell::Missing],
            ],
        )
        .unwrap()
    }

    fn run(table: Table, config: &Config) -> (Table, Diagnostics) {
        let mut diag = Diagnostics::default();
        let out = ShapeResolver.apply(table, config, &mut diag).unwrap();
        (out, diag)
    }

    #[test]
    fn melts_wide_tables() {
        let (out, diag) = run(wide(), &Config::default());
        assert_eq!(out.column_names(), vec!["Group", "variable", "value"]);
        assert_eq!(out.n_rows(), 2 * 5);

        let group = &out.column("Group").unwrap().cells;
        let variable = &out.column("variable").unwrap().cells;
        let value = &out.column("value").unwrap().cells;
        assert_eq!(group[0], Cell::from("Control"));
        assert_eq!(group[1], Cell::from("Treated"));
        assert_eq!(variable[0], Cell::from("S1"));
        assert_eq!(variable[9], Cell::from("S5"));
        assert_eq!(value[2], num(2.0));
        assert_eq!(value[9], Cell::Missing);
        assert!(diag
            .entries()
            .iter()
            .any(|d| d.message == "wide format detected: 5 numeric vs 1 categorical"));
    }

    #[test]
    fn two_labels_one_value_stays_long() {
        let table = Table::from_rows(
            &["Group1", "Group2", "Value"],
            vec![vec![Cell::from("a"), Cell::from("b"), num(1.0)]],
        )
        .unwrap();
        let (out, diag) = run(table.clone(), &Config::default());
        assert_eq!(out, table);
        assert!(diag.is_empty());
    }

    #[test]
    fn exact_ratio_is_not_wide() {
        let table = Table::from_rows(
            &["label", "a", "b"],
            vec![vec![Cell::from("x"), num(1.0), num(2.0)]],
        )
        .unwrap();
        assert!(!ColumnClasses::of(&table).is_wide());
    }

    #[test]
    fn existing_group_column_blocks_melt() {
        let table = Table::from_rows(
            &["group", "a", "b", "c"],
            vec![vec![num(1.0), num(1.0), num(2.0), num(3.0)]],
        )
        .unwrap();
        let (out, _) = run(table.clone(), &Config::default());
        assert_eq!(out, table);
    }

    #[test]
    fn scatter_and_heatmap_keep_wide() {
        for graph in ["scatter", "Heatmap"] {
            let cfg = Config::default().with_graph(graph);
            let (out, diag) = run(wide(), &cfg);
            assert_eq!(out, wide());
            assert_eq!(diag.len(), 1);
        }
    }

    #[test]
    fn all_numeric_gets_position_index() {
        let table = Table::from_rows(
            &["a", "b"],
            vec![vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]],
        )
        .unwrap();
        let (out, _) = run(table, &Config::default());
        assert_eq!(out.column_names(), vec!["index", "variable", "value"]);
        assert_eq!(
            out.column("index").unwrap().cells,
            vec![num(0.0), num(1.0), num(0.0), num(1.0)]
        );
        assert_eq!(
            out.column("value").unwrap().cells,
            vec![num(1.0), num(3.0), num(2.0), num(4.0)]
        );
    }

    #[test]
    fn text_numbers_count_as_numeric() {
        let table = Table::from_rows(
            &["id", "r1", "r2", "r3"],
            vec![
                vec![Cell::from("s1"), Cell::from("1"), Cell::from("2"), Cell::from("oops")],
                vec![Cell::from("s2"), Cell::from("3"), Cell::Missing, Cell::from("4")],
                vec![Cell::from("s3"), Cell::from("5"), Cell::from("6"), Cell::from("7")],
            ],
        )
        .unwrap();
        let classes = ColumnClasses::of(&table);
        assert_eq!(classes.numeric, vec!["r1", "r2", "r3"]);
        assert_eq!(classes.other, vec!["id"]);
    }

    #[test]
    fn variable_names_are_trimmed() {
        let table = Table::from_rows(&[" a ", "b", "c"], vec![vec![num(1.0), num(2.0), num(3.0)]])
            .unwrap();
        let (out, _) = run(table, &Config::default());
        assert_eq!(out.column("variable").unwrap().cells[0], Cell::from("a"));
    }
}
