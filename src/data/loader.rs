use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Record, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one record per line
/// * `.json`    – `[{ "col": value, ... }, ...]` (records orientation)
/// * `.parquet` – flat columnar file (string/int/float/bool/date columns)
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Cell type guessing
// ---------------------------------------------------------------------------

/// Interpret a raw text cell: empty → null, then integer, float, bool,
/// ISO-8601 date, falling back to a plain string.
pub fn guess_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    if is_iso_date(s) {
        return Value::Date(s.to_string());
    }
    Value::Str(s.to_string())
}

fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; every cell is type-guessed.
fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(col, cell)| (col.clone(), guess_value(cell)))
            .collect();
        records.push(Record::new(fields));
    }

    Ok(Dataset::with_columns(records, headers))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "nombre": "Ana", "edad": 25, "promedio": 4.1 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let fields = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_value(val)))
            .collect();
        records.push(Record::new(fields));
    }

    Ok(Dataset::from_records(records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) if is_iso_date(s) => Value::Date(s.clone()),
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Str(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Str(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.  Every column becomes a dataset column;
/// string, integer, float, boolean and date32 columns map onto [`Value`]
/// directly, anything else degrades to its textual form.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if column_names.is_empty() {
            column_names = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        for row in 0..batch.num_rows() {
            let mut fields = std::collections::BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = cell_value(batch.column(col_idx), row);
                fields.insert(field.name().clone(), value);
            }
            records.push(Record::new(fields));
        }
    }

    Ok(Dataset::with_columns(records, column_names))
}

/// Extract a single cell from an Arrow column at a given row.
fn cell_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                Value::Str(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                Value::Str(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Value::Int(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Value::Bool(arr.value(row))
        }
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>().unwrap();
            // Date32 counts days since the Unix epoch (day 719163 from CE).
            match NaiveDate::from_num_days_from_ce_opt(arr.value(row) + 719_163) {
                Some(d) => Value::Date(d.format("%Y-%m-%d").to_string()),
                None => Value::Null,
            }
        }
        _ => Value::Str(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_cell_types_from_text() {
        assert_eq!(guess_value(""), Value::Null);
        assert_eq!(guess_value("42"), Value::Int(42));
        assert_eq!(guess_value("4.25"), Value::Float(4.25));
        assert_eq!(guess_value("true"), Value::Bool(true));
        assert_eq!(guess_value("1987-11-03"), Value::Date("1987-11-03".into()));
        assert_eq!(guess_value("Andina"), Value::Str("Andina".into()));
    }

    #[test]
    fn rejects_malformed_dates() {
        // Wrong width or impossible dates stay plain strings.
        assert_eq!(guess_value("1987-13-03"), Value::Str("1987-13-03".into()));
        assert_eq!(guess_value("1987-1-3"), Value::Str("1987-1-3".into()));
    }

    #[test]
    fn reads_csv_with_typed_cells() {
        let csv_text = "nombre,edad,promedio,fecha\nAna,25,4.1,1999-02-01\nLuis,,3.0,\n";
        let ds = read_csv(csv::Reader::from_reader(csv_text.as_bytes())).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, vec!["nombre", "edad", "promedio", "fecha"]);
        assert_eq!(ds.records[0].get("edad"), Some(&Value::Int(25)));
        assert_eq!(ds.records[0].get("fecha"), Some(&Value::Date("1999-02-01".into())));
        assert_eq!(ds.records[1].get("edad"), Some(&Value::Null));
        assert_eq!(ds.records[1].get("promedio"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn reads_records_oriented_json() {
        let text = r#"[
            {"titulo": "Delirio", "ano": 2004, "disponible": true},
            {"titulo": "La vorágine", "ano": 1924, "disponible": null}
        ]"#;
        let ds = parse_json(text).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].get("ano"), Some(&Value::Int(2004)));
        assert_eq!(ds.records[0].get("disponible"), Some(&Value::Bool(true)));
        assert_eq!(ds.records[1].get("disponible"), Some(&Value::Null));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"a": 1}"#).is_err());
        assert!(parse_json(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("datos.xlsx")).unwrap_err();
        assert!(err.to_string().contains("xlsx"));
    }
}
