use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Number, Value as JsonValue};

use super::model::{Cell, Table};

/// Write the table as CSV with a header row. `Missing` is an empty field.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(table, file)
}

pub fn write_csv_to<W: Write>(table: &Table, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;
    for i in 0..table.n_rows() {
        let row: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.cells.get(i).map(ToString::to_string).unwrap_or_default())
            .collect();
        writer
            .write_record(&row)
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn cell_to_json(cell: &Cell) -> JsonValue {
    match cell {
        Cell::Number(v) => Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
        Cell::Text(s) => JsonValue::String(s.clone()),
        Cell::Missing => JsonValue::Null,
    }
}

/// One JSON object per row, keys in column order.
pub fn to_json_records(table: &Table) -> JsonValue {
    let records = (0..table.n_rows())
        .map(|i| {
            let obj: Map<String, JsonValue> = table
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.cells.get(i).map_or(JsonValue::Null, cell_to_json)))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(records)
}
