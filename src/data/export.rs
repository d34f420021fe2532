use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// CSV export (the download side of the dashboard)
// ---------------------------------------------------------------------------

/// Serialise a dataset as delimited text with a header row. Columns follow
/// the dataset schema order; null and missing cells become empty fields,
/// dates stay in ISO form.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&dataset.column_names)
        .context("writing CSV header")?;

    for (row_no, rec) in dataset.records.iter().enumerate() {
        let row: Vec<String> = dataset
            .column_names
            .iter()
            .map(|col| match rec.get(col) {
                None | Some(Value::Null) => String::new(),
                Some(v) => v.to_string(),
            })
            .collect();
        wtr.write_record(&row)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write a dataset to a CSV file at `path`.
pub fn export_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn rec(pairs: &[(&str, Value)]) -> Record {
        Record::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
    }

    #[test]
    fn writes_header_and_rows_in_schema_order() {
        let ds = Dataset::with_columns(
            vec![
                rec(&[("nombre", Value::Str("Ana".into())), ("edad", Value::Int(25))]),
                rec(&[("nombre", Value::Str("Luis".into())), ("edad", Value::Int(40))]),
            ],
            vec!["nombre".into(), "edad".into()],
        );

        let mut buf = Vec::new();
        write_csv(&ds, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "nombre,edad\nAna,25\nLuis,40\n");
    }

    #[test]
    fn nulls_and_missing_cells_become_empty_fields() {
        let ds = Dataset::with_columns(
            vec![
                rec(&[("a", Value::Null), ("b", Value::Int(1))]),
                rec(&[("b", Value::Int(2))]), // "a" missing entirely
            ],
            vec!["a".into(), "b".into()],
        );

        let mut buf = Vec::new();
        write_csv(&ds, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "a,b\n,1\n,2\n");
    }

    #[test]
    fn dates_round_trip_as_iso_text() {
        let ds = Dataset::with_columns(
            vec![rec(&[("fecha", Value::Date("1987-11-03".into()))])],
            vec!["fecha".into()],
        );

        let mut buf = Vec::new();
        write_csv(&ds, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "fecha\n1987-11-03\n");
    }
}
