use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use log::warn;
use serde_json::Value as JsonValue;

use super::model::{Cell, Column, Table};

/// Spellings of "no value" that spreadsheet exports leave behind.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by data rows
/// * `.json`    – `[{ "Group": "Control", "S1": 1.5, ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats or bools
/// * `.xlsx`    – first worksheet, first row as header
///
/// Cells come out as loaded: no cleaning happens here.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        "xlsx" | "xlsm" | "xls" | "ods" => load_excel(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Read CSV from any reader. Rows shorter than the header are padded
/// with `Missing`.
pub fn read_csv<R: std::io::Read>(input: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let headers = dedupe_headers(headers);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell).collect());
    }

    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    Table::from_rows(&header_refs, rows).context("building table from CSV")
}

/// Make repeated header names unique the way spreadsheet readers do:
/// `Rep, Rep, Rep` becomes `Rep, Rep.1, Rep.2`.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        let mut unique = name.clone();
        let mut n = 0;
        while seen.contains(&unique) {
            n += 1;
            unique = format!("{name}.{n}");
        }
        if unique != name {
            warn!("duplicate column header '{name}' renamed to '{unique}'");
        }
        seen.insert(unique.clone());
        out.push(unique);
    }
    out
}

/// Numbers that parse cleanly become `Number`; everything else stays text
/// for the cleaning pipeline to judge.
fn guess_cell(s: &str) -> Cell {
    if NULL_TOKENS.contains(&s.trim()) {
        return Cell::Missing;
    }
    match s.trim().parse::<f64>() {
        Ok(v) => Cell::number(v),
        Err(_) => Cell::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (the default `df.to_json(orient='records')`).
/// Column order follows first appearance; absent keys are `Missing`.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    table_from_records(&root)
}

pub fn table_from_records(root: &JsonValue) -> Result<Table> {
    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<Column> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !columns.iter().any(|c| c.name == *key) {
                columns.push(Column::new(key.clone(), vec![Cell::Missing; i]));
            }
        }
        for col in &mut columns {
            col.cells.push(obj.get(&col.name).map_or(Cell::Missing, json_to_cell));
        }
    }

    Table::new(columns).context("building table from JSON")
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map_or_else(|| Cell::Text(n.to_string()), Cell::number),
        JsonValue::Bool(b) => Cell::Text(b.to_string()),
        JsonValue::Null => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Read the first worksheet. The first row is the header; blank header
/// cells are named `Unnamed: N` like Pandas does.
fn load_excel(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, d)| match d {
            Data::Empty => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();
    let headers = dedupe_headers(headers);

    let rows: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(excel_to_cell).collect()).collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    Table::from_rows(&header_refs, rows).context("building table from workbook")
}

fn excel_to_cell(d: &Data) -> Cell {
    match d {
        Data::Empty => Cell::Missing,
        Data::Float(v) => Cell::number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::String(s) => guess_cell(s),
        Data::Error(_) => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
/// Nested columns are rendered to text.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let names = builder.schema().fields().iter().map(|f| f.name().clone()).collect();
    let mut columns: Vec<Column> = dedupe_headers(names)
        .into_iter()
        .map(|name| Column::new(name, Vec::new()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            column
                .cells
                .extend((0..batch.num_rows()).map(|row| extract_cell(array, row)));
        }
    }

    Table::new(columns).context("building table from parquet")
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => Cell::number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Cell::Text(col.as_boolean().value(row).to_string()),
        _ => array_value_to_string(col, row).map_or(Cell::Missing, Cell::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_guesses_numbers_and_nulls() {
        let data = "Group,Conc. (mg/ml),Note\nControl,1.5,\nTreated,1.5 mg/mL,NA\nShort\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.column_names(), vec!["Group", "Conc. (mg/ml)", "Note"]);
        assert_eq!(table.n_rows(), 3);
        let conc = &table.column("Conc. (mg/ml)").unwrap().cells;
        assert_eq!(conc[0], Cell::Number(1.5));
        assert_eq!(conc[1], Cell::from("1.5 mg/mL"));
        assert_eq!(conc[2], Cell::Missing);
        assert_eq!(table.column("Note").unwrap().cells, vec![Cell::Missing; 3]);
    }

    #[test]
    fn repeated_headers_get_numbered() {
        let table = read_csv("Group,Rep,Rep,Rep.1,Rep\nA,1,2,3,4\n".as_bytes()).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["Group", "Rep", "Rep.1", "Rep.1.1", "Rep.2"]
        );
        assert_eq!(table.column("Rep.2").unwrap().cells, vec![Cell::Number(4.0)]);
    }

    #[test]
    fn excel_cells_map_to_table_cells() {
        assert_eq!(excel_to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(excel_to_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(excel_to_cell(&Data::String("NA".into())), Cell::Missing);
        assert_eq!(excel_to_cell(&Data::String("2 mg".into())), Cell::from("2 mg"));
        assert_eq!(excel_to_cell(&Data::Bool(true)), Cell::from("true"));
        assert_eq!(excel_to_cell(&Data::Empty), Cell::Missing);
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("plate.xlsx")).is_err());
    }

    #[test]
    fn json_records_union_columns() {
        let root = serde_json::json!([
            {"Group": "Control", "S1": 1.0},
            {"Group": "Treated", "S2": "ND", "flag": true}
        ]);
        let table = table_from_records(&root).unwrap();
        assert_eq!(table.column_names(), vec!["Group", "S1", "S2", "flag"]);
        assert_eq!(table.column("S1").unwrap().cells, vec![Cell::Number(1.0), Cell::Missing]);
        assert_eq!(table.column("S2").unwrap().cells, vec![Cell::Missing, Cell::from("ND")]);
        assert_eq!(table.column("flag").unwrap().cells[1], Cell::from("true"));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(table_from_records(&serde_json::json!({"a": 1})).is_err());
        assert!(table_from_records(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("data.sav")).is_err());
    }
}
