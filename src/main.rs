use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use tablita::data::export;
use tablita::data::filter::{filtered_indices, Criterion, FilterSet};
use tablita::data::loader;
use tablita::data::model::{Dataset, Value};
use tablita::data::summary::{self, ColumnSummary};

/// Explore a small tabular dataset: apply toggleable filters, print the
/// matching rows and their count, show summary statistics, export CSV.
#[derive(Parser)]
#[command(name = "tablita", version, about)]
struct Args {
    /// Input file (.csv, .json, .parquet)
    file: PathBuf,

    /// Show only the first N rows of the filtered table
    #[arg(long, value_name = "N")]
    head: Option<usize>,

    /// Show only the last N rows of the filtered table
    #[arg(long, value_name = "N")]
    tail: Option<usize>,

    /// Print per-column summary statistics instead of rows
    #[arg(long)]
    describe: bool,

    /// With --describe, print the summary as JSON
    #[arg(long, requires = "describe")]
    json: bool,

    /// Numeric range filter (inclusive), repeatable
    #[arg(long = "between", value_name = "FIELD:MIN:MAX")]
    between: Vec<String>,

    /// ISO date range filter (inclusive), repeatable
    #[arg(long = "dates", value_name = "FIELD:START:END")]
    dates: Vec<String>,

    /// Membership filter, repeatable; an empty value list is a no-op
    #[arg(long = "one-of", value_name = "FIELD:V1,V2,...")]
    one_of: Vec<String>,

    /// Strictly-above threshold filter, repeatable
    #[arg(long = "above", value_name = "FIELD:MIN")]
    above: Vec<String>,

    /// Case-insensitive substring filter, repeatable
    #[arg(long = "contains", value_name = "FIELD:TEXT")]
    contains: Vec<String>,

    /// Exact equality filter, repeatable
    #[arg(long = "equals", value_name = "FIELD:VALUE")]
    equals: Vec<String>,

    /// Keep only rows where FIELD is null or missing, repeatable
    #[arg(long = "is-null", value_name = "FIELD")]
    is_null: Vec<String>,

    /// Write the filtered rows to a CSV file
    #[arg(long, value_name = "OUT.csv")]
    export: Option<PathBuf>,

    /// Print only the match count
    #[arg(long)]
    count_only: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = loader::load_file(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    log::info!(
        "Loaded {} records with columns {:?}",
        dataset.len(),
        dataset.column_names
    );

    if args.describe {
        let summaries = summary::describe(&dataset);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        } else {
            print_summaries(&summaries);
        }
        return Ok(());
    }

    let filters = build_filters(&args)?;
    let report = filtered_indices(&dataset, &filters);
    let filtered = dataset.select(&report.indices);

    println!("{} of {} records match", report.count(), dataset.len());

    if let Some(out) = &args.export {
        export::export_csv(&filtered, out)?;
        log::info!("Exported {} records to {}", filtered.len(), out.display());
    }

    if !args.count_only {
        match (args.head, args.tail) {
            (None, None) => print_table(&filtered),
            (head, tail) => {
                if let Some(n) = head {
                    print_table(&filtered.head(n));
                }
                if let Some(n) = tail {
                    print_table(&filtered.tail(n));
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Flag → criterion parsing
// ---------------------------------------------------------------------------

/// Build the filter set from the repeatable criterion flags. Every flag
/// contributes one enabled criterion; order only affects evaluation cost.
fn build_filters(args: &Args) -> Result<FilterSet> {
    let mut filters = FilterSet::new();
    for spec in &args.between {
        filters.push(true, parse_between(spec)?);
    }
    for spec in &args.dates {
        filters.push(true, parse_dates(spec)?);
    }
    for spec in &args.one_of {
        filters.push(true, parse_one_of(spec)?);
    }
    for spec in &args.above {
        filters.push(true, parse_above(spec)?);
    }
    for spec in &args.contains {
        filters.push(true, parse_contains(spec)?);
    }
    for spec in &args.equals {
        filters.push(true, parse_equals(spec)?);
    }
    for field in &args.is_null {
        filters.push(
            true,
            Criterion::Equals {
                field: field.clone(),
                value: Value::Null,
            },
        );
    }
    Ok(filters)
}

fn parse_between(spec: &str) -> Result<Criterion> {
    let [field, min, max] = split_spec(spec, "FIELD:MIN:MAX")?;
    Ok(Criterion::NumericRange {
        field: field.to_string(),
        min: parse_number(min)?,
        max: parse_number(max)?,
    })
}

fn parse_dates(spec: &str) -> Result<Criterion> {
    let [field, start, end] = split_spec(spec, "FIELD:START:END")?;
    Ok(Criterion::DateRange {
        field: field.to_string(),
        start: parse_iso_date(start)?,
        end: parse_iso_date(end)?,
    })
}

fn parse_one_of(spec: &str) -> Result<Criterion> {
    let [field, values] = split_spec(spec, "FIELD:V1,V2,...")?;
    let allowed: BTreeSet<Value> = if values.is_empty() {
        BTreeSet::new()
    } else {
        values.split(',').map(loader::guess_value).collect()
    };
    Ok(Criterion::OneOf {
        field: field.to_string(),
        allowed,
    })
}

fn parse_above(spec: &str) -> Result<Criterion> {
    let [field, min] = split_spec(spec, "FIELD:MIN")?;
    Ok(Criterion::Above {
        field: field.to_string(),
        min: parse_number(min)?,
    })
}

fn parse_contains(spec: &str) -> Result<Criterion> {
    let [field, pattern] = split_spec(spec, "FIELD:TEXT")?;
    Ok(Criterion::Contains {
        field: field.to_string(),
        pattern: pattern.to_string(),
    })
}

fn parse_equals(spec: &str) -> Result<Criterion> {
    let [field, value] = split_spec(spec, "FIELD:VALUE")?;
    Ok(Criterion::Equals {
        field: field.to_string(),
        // An empty value means the explicit null test, same as --is-null.
        value: loader::guess_value(value),
    })
}

/// Split a `FIELD:...` flag value into exactly N colon-separated pieces;
/// the last piece keeps any further colons.
fn split_spec<const N: usize>(spec: &str, usage: &str) -> Result<[&str; N]> {
    let pieces: Vec<&str> = spec.splitn(N, ':').collect();
    pieces
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected {usage}, got '{spec}'"))
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("'{s}' is not a number"))
}

fn parse_iso_date(s: &str) -> Result<String> {
    match loader::guess_value(s) {
        Value::Date(d) => Ok(d),
        _ => bail!("'{s}' is not an ISO date (YYYY-MM-DD)"),
    }
}

// ---------------------------------------------------------------------------
// Plain-text table rendering
// ---------------------------------------------------------------------------

fn print_table(dataset: &Dataset) {
    let rows: Vec<Vec<String>> = dataset
        .records
        .iter()
        .map(|rec| {
            dataset
                .column_names
                .iter()
                .map(|col| rec.get(col).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    render_table(&dataset.column_names, &rows);
}

fn print_summaries(summaries: &[ColumnSummary]) {
    let headers: Vec<String> = [
        "column", "dtype", "non-null", "nulls", "distinct", "mean", "std", "min", "q1", "median",
        "q3", "max",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            let mut row = vec![
                s.name.clone(),
                s.dtype.clone(),
                s.non_null.to_string(),
                s.nulls.to_string(),
                s.distinct.to_string(),
            ];
            match &s.numeric {
                Some(n) => row.extend(
                    [n.mean, n.std, n.min, n.q1, n.median, n.q3, n.max]
                        .iter()
                        .map(|v| format!("{v:.2}")),
                ),
                None => row.extend(std::iter::repeat(String::new()).take(7)),
            }
            row
        })
        .collect();

    render_table(&headers, &rows);
}

fn render_table(headers: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<width$}", width = w))
        .collect();
    println!("{}", header_line.join("  "));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<width$}", width = w))
            .collect();
        println!("{}", line.join("  "));
    }
}
