use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of a tabular dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date (`YYYY-MM-DD`) kept as text; the fixed-width format
    /// makes lexicographic order equal to chronological order.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 3,
                Str(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) | Value::Date(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, ""),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64` for range and threshold filters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short dtype label used in column summaries.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
            Value::Null => "null",
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

/// A single row: column name → cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Record { fields }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Record {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records (rows), in insertion order.
    pub records: Vec<Record>,
    /// Ordered list of column names.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Dataset {
    /// Build column indices from the loaded records. Column order is the
    /// sorted union of the field names seen across all records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let column_names: Vec<String> = records
            .iter()
            .flat_map(|rec| rec.fields.keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        Self::with_columns(records, column_names)
    }

    /// Build a dataset with an explicit column order (e.g. the header order
    /// of a CSV file).
    pub fn with_columns(records: Vec<Record>, column_names: Vec<String>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = BTreeMap::new();
        for rec in &records {
            for (col, val) in &rec.fields {
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        Dataset {
            records,
            column_names,
            unique_values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Materialise the sub-dataset at the given row indices, preserving
    /// their relative order and the column schema. Out-of-range indices are
    /// skipped.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        let records: Vec<Record> = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        Dataset::with_columns(records, self.column_names.clone())
    }

    /// The first `n` records.
    pub fn head(&self, n: usize) -> Dataset {
        let indices: Vec<usize> = (0..self.len().min(n)).collect();
        self.select(&indices)
    }

    /// The last `n` records.
    pub fn tail(&self, n: usize) -> Dataset {
        let start = self.len().saturating_sub(n);
        let indices: Vec<usize> = (start..self.len()).collect();
        self.select(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, Value)]) -> Record {
        Record::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
    }

    #[test]
    fn from_records_builds_column_index() {
        let ds = Dataset::from_records(vec![
            rec(&[("edad", Value::Int(25)), ("region", Value::Str("Andina".into()))]),
            rec(&[("edad", Value::Int(70)), ("region", Value::Str("Caribe".into()))]),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, vec!["edad", "region"]);
        assert_eq!(ds.unique_values["edad"].len(), 2);
        assert!(ds.unique_values["region"].contains(&Value::Str("Caribe".into())));
    }

    #[test]
    fn select_preserves_order_and_schema() {
        let ds = Dataset::from_records(vec![
            rec(&[("id", Value::Int(0))]),
            rec(&[("id", Value::Int(1))]),
            rec(&[("id", Value::Int(2))]),
        ]);
        let sub = ds.select(&[2, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.records[0].get("id"), Some(&Value::Int(2)));
        assert_eq!(sub.records[1].get("id"), Some(&Value::Int(0)));
        assert_eq!(sub.column_names, ds.column_names);
    }

    #[test]
    fn head_and_tail_clamp_to_len() {
        let ds = Dataset::from_records(vec![
            rec(&[("id", Value::Int(0))]),
            rec(&[("id", Value::Int(1))]),
            rec(&[("id", Value::Int(2))]),
        ]);
        assert_eq!(ds.head(2).records[1].get("id"), Some(&Value::Int(1)));
        assert_eq!(ds.tail(2).records[0].get("id"), Some(&Value::Int(1)));
        assert_eq!(ds.head(10).len(), 3);
        assert_eq!(ds.tail(10).len(), 3);
    }

    #[test]
    fn value_ordering_groups_by_type_then_payload() {
        let mut set = BTreeSet::new();
        set.insert(Value::Str("b".into()));
        set.insert(Value::Null);
        set.insert(Value::Int(7));
        set.insert(Value::Str("a".into()));
        let ordered: Vec<Value> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Value::Null,
                Value::Int(7),
                Value::Str("a".into()),
                Value::Str("b".into()),
            ]
        );
    }

    #[test]
    fn iso_dates_order_chronologically() {
        assert!(Value::Date("1999-12-31".into()) < Value::Date("2000-01-01".into()));
    }

    #[test]
    fn display_renders_null_as_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
