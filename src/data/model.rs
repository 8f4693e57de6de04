use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CleanError, Result};

// ---------------------------------------------------------------------------
// Cell – a single value in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, as found in a hand-edited lab spreadsheet.
///
/// `Missing` covers both empty cells and explicit "not detected" markers.
/// It is never the same thing as `Number(0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

// -- Manual Eq/Ord so we can put Cell in BTreeSet --

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(v: &Cell) -> u8 {
            match v {
                Cell::Missing => 0,
                Cell::Number(_) => 1,
                Cell::Text(_) => 2,
            }
        }
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Number(v) => v.to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Missing => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Missing, Into::into)
    }
}

impl Cell {
    /// Wrap a float, folding NaN into `Missing`.
    pub fn number(v: f64) -> Self {
        if v.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(v)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }
}

// ---------------------------------------------------------------------------
// Column – a named vector of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells that are not `Missing`.
    pub fn present(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_missing())
    }

    /// True when no cell holds text (an all-missing column qualifies).
    pub fn is_native_numeric(&self) -> bool {
        !self.cells.iter().any(Cell::is_text)
    }

    pub fn has_text(&self) -> bool {
        self.cells.iter().any(Cell::is_text)
    }

    /// Sorted set of distinct present values: numbers first, then labels.
    pub fn unique_values(&self) -> BTreeSet<Cell> {
        self.present().cloned().collect()
    }

    /// Comma-separated distinct values, cut off after `limit`.
    pub fn label_preview(&self, limit: usize) -> String {
        let uniq = self.unique_values();
        let mut shown: Vec<String> = uniq.iter().take(limit).map(Cell::to_string).collect();
        if uniq.len() > limit {
            shown.push(format!("... (+{} more)", uniq.len() - limit));
        }
        shown.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Table – ordered, uniquely named, equal-length columns
// ---------------------------------------------------------------------------

/// The table flowing through the cleaning pipeline.
///
/// Invariants (checked on construction and on every structural edit):
/// every column has the same number of rows and column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(CleanError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(CleanError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Table { columns })
    }

    /// Build a table from a header row plus data rows. Short rows are
    /// padded with `Missing`; long rows are an error.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column::new(*h, Vec::with_capacity(rows.len())))
            .collect();
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() > columns.len() {
                return Err(CleanError::RaggedRow {
                    row: row_no,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            let mut cells = row.into_iter();
            for col in &mut columns {
                col.cells.push(cells.next().unwrap_or(Cell::Missing));
            }
        }
        Table::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Rename `from` to `to`. Renaming a column onto itself is a no-op;
    /// renaming onto a name held by another column is an error.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return if self.has_column(from) {
                Ok(())
            } else {
                Err(CleanError::UnknownColumn(from.to_string()))
            };
        }
        if self.has_column(to) {
            return Err(CleanError::RenameCollision {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let col = self
            .column_mut(from)
            .ok_or_else(|| CleanError::UnknownColumn(from.to_string()))?;
        col.name = to.to_string();
        Ok(())
    }

    /// Apply `f` to every cell of every column.
    pub fn map_cells(mut self, mut f: impl FnMut(Cell) -> Cell) -> Self {
        for col in &mut self.columns {
            let cells = std::mem::take(&mut col.cells);
            col.cells = cells.into_iter().map(&mut f).collect();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_becomes_missing() {
        assert_eq!(Cell::number(f64::NAN), Cell::Missing);
        assert_eq!(Cell::from(2.5), Cell::Number(2.5));
        assert_eq!(Cell::from(None::<f64>), Cell::Missing);
    }

    #[test]
    fn display_stringifies_like_a_spreadsheet() {
        assert_eq!(Cell::Number(4.0).to_string(), "4");
        assert_eq!(Cell::Number(0.5).to_string(), "0.5");
        assert_eq!(Cell::from("Control").to_string(), "Control");
        assert_eq!(Cell::Missing.to_string(), "");
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = Table::new(vec![
            Column::new("a", vec![Cell::Number(1.0)]),
            Column::new("b", vec![]),
        ]);
        assert!(matches!(ragged, Err(CleanError::RaggedColumn { .. })));

        let dup = Table::new(vec![
            Column::new("a", vec![]),
            Column::new("a", vec![]),
        ]);
        assert!(matches!(dup, Err(CleanError::DuplicateColumn(_))));
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let t = Table::from_rows(
            &["a", "b"],
            vec![vec![Cell::Number(1.0)], vec![Cell::from("x"), Cell::from("y")]],
        )
        .unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("b").unwrap().cells[0], Cell::Missing);
        assert!(Table::from_rows(&["a"], vec![vec![Cell::Missing, Cell::Missing]]).is_err());
    }

    #[test]
    fn rename_refuses_collisions() {
        let mut t = Table::from_rows(&["a", "b"], vec![]).unwrap();
        assert!(t.rename("a", "b").is_err());
        t.rename("a", "x").unwrap();
        assert_eq!(t.column_names(), vec!["x", "b"]);
        assert!(t.rename("missing", "z").is_err());
    }

    #[test]
    fn unique_values_are_sorted_by_kind() {
        let col = Column::new(
            "v",
            vec![
                Cell::from("b"),
                Cell::Number(2.0),
                Cell::Missing,
                Cell::from("a"),
                Cell::Number(2.0),
            ],
        );
        let uniq: Vec<Cell> = col.unique_values().into_iter().collect();
        assert_eq!(uniq, vec![Cell::Number(2.0), Cell::from("a"), Cell::from("b")]);
    }

    #[test]
    fn label_preview_truncates() {
        let col = Column::new(
            "group",
            vec![Cell::from("b"), Cell::from("a"), Cell::from("c"), Cell::from("a")],
        );
        assert_eq!(col.label_preview(5), "a, b, c");
        assert_eq!(col.label_preview(2), "a, b, ... (+1 more)");
    }
}
