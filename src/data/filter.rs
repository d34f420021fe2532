use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{Dataset, Record, Value};

// ---------------------------------------------------------------------------
// Criterion: one predicate over a named column
// ---------------------------------------------------------------------------

/// A single filter predicate over one column.
///
/// Range bounds are inclusive on both ends; an inverted range (`min > max`)
/// matches nothing rather than being an error. For every variant except the
/// explicit null test (`Equals` against [`Value::Null`]), a missing or null
/// cell never matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Numeric cell within `[min, max]`.
    NumericRange { field: String, min: f64, max: f64 },
    /// ISO-8601 date cell within `[start, end]`.
    DateRange {
        field: String,
        start: String,
        end: String,
    },
    /// Cell is one of the allowed values. An empty set means "no constraint",
    /// matching the behaviour of an untouched multi-select control.
    OneOf {
        field: String,
        allowed: BTreeSet<Value>,
    },
    /// Numeric cell strictly greater than `min`.
    Above { field: String, min: f64 },
    /// Case-insensitive substring match on string cells. An empty pattern
    /// matches every non-null string value.
    Contains { field: String, pattern: String },
    /// Exact equality. `Equals` against [`Value::Null`] selects exactly the
    /// rows whose cell is missing or null.
    Equals { field: String, value: Value },
}

impl Criterion {
    /// The column this criterion constrains.
    pub fn field(&self) -> &str {
        match self {
            Criterion::NumericRange { field, .. }
            | Criterion::DateRange { field, .. }
            | Criterion::OneOf { field, .. }
            | Criterion::Above { field, .. }
            | Criterion::Contains { field, .. }
            | Criterion::Equals { field, .. } => field,
        }
    }

    /// An empty `OneOf` constrains nothing; treating it like a disabled
    /// criterion keeps it from tripping the unknown-column diagnostic.
    fn is_noop(&self) -> bool {
        matches!(self, Criterion::OneOf { allowed, .. } if allowed.is_empty())
    }

    /// Evaluate this criterion against one record.
    fn matches(&self, record: &Record) -> bool {
        let cell = match record.get(self.field()) {
            None | Some(Value::Null) => {
                // Absent and explicit-null cells only satisfy the null test.
                return matches!(
                    self,
                    Criterion::Equals {
                        value: Value::Null,
                        ..
                    }
                );
            }
            Some(v) => v,
        };

        match self {
            Criterion::NumericRange { min, max, .. } => {
                cell.as_f64().is_some_and(|v| v >= *min && v <= *max)
            }
            Criterion::DateRange { start, end, .. } => match cell {
                // ISO dates compare correctly as text.
                Value::Date(d) => d.as_str() >= start.as_str() && d.as_str() <= end.as_str(),
                _ => false,
            },
            Criterion::OneOf { allowed, .. } => allowed.is_empty() || allowed.contains(cell),
            Criterion::Above { min, .. } => cell.as_f64().is_some_and(|v| v > *min),
            Criterion::Contains { pattern, .. } => match cell {
                Value::Str(s) => s.to_lowercase().contains(&pattern.to_lowercase()),
                _ => false,
            },
            // Numeric cells compare by value so an integer literal matches
            // a float column.
            Criterion::Equals { value, .. } => match (cell.as_f64(), value.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => cell == value,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSet: ordered, independently toggleable criteria (AND-combined)
// ---------------------------------------------------------------------------

/// One toggleable entry of a [`FilterSet`].
#[derive(Debug, Clone)]
pub struct FilterEntry {
    pub enabled: bool,
    pub criterion: Criterion,
}

/// An ordered collection of criteria, conjunctively combined. Order affects
/// only evaluation cost, never the result. Disabled entries contribute no
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: Vec<FilterEntry>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, enabled: bool, criterion: Criterion) {
        self.entries.push(FilterEntry { enabled, criterion });
    }

    /// Append an enabled criterion (builder style).
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.push(true, criterion);
        self
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Non-fatal configuration problem discovered during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterWarning {
    #[error("filter references unknown column '{0}'")]
    UnknownField(String),
}

/// Result of one pipeline evaluation: the matching row indices in their
/// original order, plus any configuration diagnostics collected on the way.
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    pub indices: Vec<usize>,
    pub warnings: Vec<FilterWarning>,
}

impl FilterReport {
    /// Number of matching records.
    pub fn count(&self) -> usize {
        self.indices.len()
    }
}

/// Return indices of records that pass all enabled criteria.
///
/// A record passes when every enabled criterion matches it (logical AND,
/// short-circuited per record). An enabled criterion referencing a column
/// absent from the dataset schema matches nothing: the result is empty and
/// an [`FilterWarning::UnknownField`] is recorded, but evaluation itself
/// never fails. The dataset is not mutated.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterSet) -> FilterReport {
    let mut warnings = Vec::new();
    let mut active: Vec<&Criterion> = Vec::new();
    let mut never_matches = false;

    for entry in filters.entries() {
        if !entry.enabled || entry.criterion.is_noop() {
            continue;
        }
        let field = entry.criterion.field();
        if !dataset.has_column(field) {
            log::warn!("filter references unknown column '{field}'");
            warnings.push(FilterWarning::UnknownField(field.to_string()));
            never_matches = true;
            continue;
        }
        active.push(&entry.criterion);
    }

    if never_matches {
        return FilterReport {
            indices: Vec::new(),
            warnings,
        };
    }

    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| active.iter().all(|c| c.matches(rec)))
        .map(|(i, _)| i)
        .collect();

    FilterReport { indices, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn rec(pairs: &[(&str, Value)]) -> Record {
        Record::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
    }

    fn regions_dataset() -> Dataset {
        Dataset::from_records(vec![
            rec(&[
                ("edad", Value::Int(25)),
                ("region", Value::Str("Andina".into())),
            ]),
            rec(&[
                ("edad", Value::Int(70)),
                ("region", Value::Str("Caribe".into())),
            ]),
            rec(&[
                ("edad", Value::Int(40)),
                ("region", Value::Str("Andina".into())),
            ]),
        ])
    }

    fn one_of(field: &str, values: &[&str]) -> Criterion {
        Criterion::OneOf {
            field: field.to_string(),
            allowed: values.iter().map(|v| Value::Str(v.to_string())).collect(),
        }
    }

    #[test]
    fn empty_filter_set_is_identity() {
        let ds = regions_dataset();
        let report = filtered_indices(&ds, &FilterSet::new());
        assert_eq!(report.indices, vec![0, 1, 2]);
        assert_eq!(report.count(), ds.len());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn disabled_criteria_contribute_no_constraint() {
        let ds = regions_dataset();
        let mut filters = FilterSet::new();
        filters.push(
            false,
            Criterion::NumericRange {
                field: "edad".into(),
                min: 0.0,
                max: 1.0,
            },
        );
        let report = filtered_indices(&ds, &filters);
        assert_eq!(report.indices, vec![0, 1, 2]);
    }

    #[test]
    fn range_and_membership_combine_conjunctively() {
        // edad in [20, 60] AND region in {Andina}
        let ds = regions_dataset();
        let filters = FilterSet::new()
            .with(Criterion::NumericRange {
                field: "edad".into(),
                min: 20.0,
                max: 60.0,
            })
            .with(one_of("region", &["Andina"]));
        let report = filtered_indices(&ds, &filters);
        assert_eq!(report.indices, vec![0, 2]);
        assert_eq!(report.count(), 2);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let ds = regions_dataset();
        let filters = FilterSet::new().with(Criterion::Contains {
            field: "region".into(),
            pattern: "carib".into(),
        });
        let report = filtered_indices(&ds, &filters);
        assert_eq!(report.indices, vec![1]);
        assert_eq!(report.count(), 1);
    }

    #[test]
    fn empty_pattern_matches_every_non_null_string() {
        let ds = Dataset::from_records(vec![
            rec(&[("nombre", Value::Str("Ana".into()))]),
            rec(&[("nombre", Value::Null)]),
        ]);
        let filters = FilterSet::new().with(Criterion::Contains {
            field: "nombre".into(),
            pattern: String::new(),
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![0]);
    }

    #[test]
    fn null_cells_never_match_a_numeric_range() {
        let ds = Dataset::from_records(vec![
            rec(&[("ingreso_mensual", Value::Int(900_000))]),
            rec(&[("ingreso_mensual", Value::Null)]),
        ]);
        let filters = FilterSet::new().with(Criterion::NumericRange {
            field: "ingreso_mensual".into(),
            min: f64::MIN,
            max: f64::MAX,
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![0]);
    }

    #[test]
    fn equals_null_selects_missing_and_null_cells() {
        let ds = Dataset::from_records(vec![
            rec(&[("ingreso_mensual", Value::Int(900_000))]),
            rec(&[("ingreso_mensual", Value::Null)]),
            rec(&[("otro", Value::Int(1))]), // column absent entirely
        ]);
        let filters = FilterSet::new().with(Criterion::Equals {
            field: "ingreso_mensual".into(),
            value: Value::Null,
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![1, 2]);
    }

    #[test]
    fn equals_compares_numbers_across_int_and_float() {
        let ds = Dataset::from_records(vec![
            rec(&[("promedio", Value::Float(4.0))]),
            rec(&[("promedio", Value::Float(3.5))]),
        ]);
        let filters = FilterSet::new().with(Criterion::Equals {
            field: "promedio".into(),
            value: Value::Int(4),
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![0]);
    }

    #[test]
    fn empty_one_of_behaves_like_disabled() {
        let ds = regions_dataset();
        let report = filtered_indices(&ds, &FilterSet::new().with(one_of("region", &[])));
        assert_eq!(report.indices, vec![0, 1, 2]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let ds = regions_dataset();
        let filters = FilterSet::new().with(Criterion::NumericRange {
            field: "edad".into(),
            min: 50.0,
            max: 10.0,
        });
        let report = filtered_indices(&ds, &filters);
        assert!(report.indices.is_empty());
        assert_eq!(report.count(), 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn above_is_strictly_greater() {
        let ds = Dataset::from_records(vec![
            rec(&[("promedio", Value::Float(3.0))]),
            rec(&[("promedio", Value::Float(3.5))]),
        ]);
        let filters = FilterSet::new().with(Criterion::Above {
            field: "promedio".into(),
            min: 3.0,
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![1]);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let ds = Dataset::from_records(vec![
            rec(&[("fecha_nacimiento", Value::Date("1980-06-15".into()))]),
            rec(&[("fecha_nacimiento", Value::Date("1990-01-01".into()))]),
            rec(&[("fecha_nacimiento", Value::Date("2001-03-02".into()))]),
            rec(&[("fecha_nacimiento", Value::Null)]),
        ]);
        let filters = FilterSet::new().with(Criterion::DateRange {
            field: "fecha_nacimiento".into(),
            start: "1980-06-15".into(),
            end: "1990-01-01".into(),
        });
        assert_eq!(filtered_indices(&ds, &filters).indices, vec![0, 1]);
    }

    #[test]
    fn unknown_column_yields_empty_result_and_warning() {
        let ds = regions_dataset();
        let filters = FilterSet::new().with(Criterion::Contains {
            field: "municipio".into(),
            pattern: "bog".into(),
        });
        let report = filtered_indices(&ds, &filters);
        assert!(report.indices.is_empty());
        assert_eq!(
            report.warnings,
            vec![FilterWarning::UnknownField("municipio".into())]
        );
    }

    #[test]
    fn adding_a_criterion_never_grows_the_result() {
        let ds = regions_dataset();
        let base = FilterSet::new().with(one_of("region", &["Andina", "Caribe"]));
        let narrowed = base.clone().with(Criterion::NumericRange {
            field: "edad".into(),
            min: 20.0,
            max: 30.0,
        });
        let before = filtered_indices(&ds, &base);
        let after = filtered_indices(&ds, &narrowed);
        assert!(after.count() <= before.count());
        assert!(after.indices.iter().all(|i| before.indices.contains(i)));
    }

    #[test]
    fn criterion_order_does_not_change_the_result() {
        let ds = regions_dataset();
        let a = Criterion::NumericRange {
            field: "edad".into(),
            min: 20.0,
            max: 60.0,
        };
        let b = one_of("region", &["Andina"]);
        let ab = filtered_indices(&ds, &FilterSet::new().with(a.clone()).with(b.clone()));
        let ba = filtered_indices(&ds, &FilterSet::new().with(b).with(a));
        assert_eq!(ab.indices, ba.indices);
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let ds = regions_dataset();
        let filters = FilterSet::new().with(one_of("region", &["Andina"]));
        let first = filtered_indices(&ds, &filters);
        let second = filtered_indices(&ds, &filters);
        assert_eq!(first.indices, second.indices);
        assert_eq!(ds.len(), 3); // input untouched
    }
}
