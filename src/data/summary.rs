use serde::Serialize;

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Per-column descriptive statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Inferred dtype label: `str`, `int`, `float`, `bool`, `date`,
    /// `empty` (no non-null cells) or `mixed`.
    pub dtype: String,
    pub non_null: usize,
    pub nulls: usize,
    pub distinct: usize,
    /// Present only for fully numeric columns with at least one value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
}

/// The numeric block of a column summary: mean, sample standard deviation
/// and the five-number spread with linearly interpolated quartiles.
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summarise every column of the dataset, in schema order. Missing cells
/// count as nulls.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .column_names
        .iter()
        .map(|col| summarize_column(dataset, col))
        .collect()
}

fn summarize_column(dataset: &Dataset, col: &str) -> ColumnSummary {
    let cells: Vec<&Value> = dataset
        .records
        .iter()
        .map(|rec| rec.get(col).unwrap_or(&Value::Null))
        .collect();

    let non_null: Vec<&Value> = cells.iter().copied().filter(|v| !v.is_null()).collect();
    let nulls = cells.len() - non_null.len();

    let distinct = dataset
        .unique_values
        .get(col)
        .map(|set| set.iter().filter(|v| !v.is_null()).count())
        .unwrap_or(0);

    let numbers: Vec<f64> = non_null.iter().filter_map(|v| v.as_f64()).collect();
    // Mixed columns (numbers alongside strings) get no numeric block.
    let numeric = if !numbers.is_empty() && numbers.len() == non_null.len() {
        Some(numeric_summary(numbers))
    } else {
        None
    };

    ColumnSummary {
        name: col.to_string(),
        dtype: dtype_label(&non_null),
        non_null: non_null.len(),
        nulls,
        distinct,
        numeric,
    }
}

fn dtype_label(non_null: &[&Value]) -> String {
    let types: std::collections::BTreeSet<&str> =
        non_null.iter().map(|v| v.type_name()).collect();
    match types.len() {
        0 => "empty".to_string(),
        1 => types.into_iter().next().unwrap().to_string(),
        // An int/float mixture is still one numeric column.
        2 if types.contains("int") && types.contains("float") => "float".to_string(),
        _ => "mixed".to_string(),
    }
}

fn numeric_summary(mut values: Vec<f64>) -> NumericSummary {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    NumericSummary {
        mean,
        std,
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[n - 1],
    }
}

/// Quantile over a sorted, non-empty slice with linear interpolation
/// between the two nearest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}
