use crate::data::filter::{filtered_indices, Criterion, FilterEntry, FilterSet, FilterWarning};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One exploration session, independent of how controls are rendered.
///
/// The dataset is loaded once and treated as read-only; the filter controls
/// mirror user-adjustable toggles and are turned into a fresh [`FilterSet`]
/// on every re-evaluation.
pub struct SessionState {
    /// Loaded dataset (None until a file is loaded or generated).
    pub dataset: Option<Dataset>,

    /// Toggleable filter controls, in presentation order.
    pub controls: Vec<FilterEntry>,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Configuration diagnostics from the last evaluation.
    pub warnings: Vec<FilterWarning>,

    /// Status / error message for the surrounding surface.
    pub status_message: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            dataset: None,
            controls: Vec::new(),
            visible_indices: Vec::new(),
            warnings: Vec::new(),
            status_message: None,
        }
    }
}

impl SessionState {
    /// Ingest a newly loaded dataset and reset controls and caches.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.controls.clear();
        self.visible_indices = (0..dataset.len()).collect();
        self.warnings.clear();
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Register a filter control, initially disabled (checkboxes start
    /// unchecked). Returns its index.
    pub fn add_control(&mut self, criterion: Criterion) -> usize {
        self.controls.push(FilterEntry {
            enabled: false,
            criterion,
        });
        self.controls.len() - 1
    }

    /// Flip one control's checkbox and re-evaluate.
    pub fn toggle(&mut self, index: usize) {
        if let Some(entry) = self.controls.get_mut(index) {
            entry.enabled = !entry.enabled;
            self.refilter();
        }
    }

    /// Replace one control's parameters (slider moved, text edited) and
    /// re-evaluate.
    pub fn set_criterion(&mut self, index: usize, criterion: Criterion) {
        if let Some(entry) = self.controls.get_mut(index) {
            entry.criterion = criterion;
            self.refilter();
        }
    }

    /// Recompute `visible_indices` from the current control state.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            let mut filters = FilterSet::new();
            for entry in &self.controls {
                filters.push(entry.enabled, entry.criterion.clone());
            }
            let report = filtered_indices(ds, &filters);
            self.visible_indices = report.indices;
            self.warnings = report.warnings;
        }
    }

    /// Materialise the currently visible records.
    pub fn visible_dataset(&self) -> Option<Dataset> {
        self.dataset
            .as_ref()
            .map(|ds| ds.select(&self.visible_indices))
    }
}
