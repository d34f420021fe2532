//! tablita – a small tabular data explorer.
//!
//! Loads or generates small datasets, applies an ordered set of
//! independently toggleable filter criteria, computes per-column summary
//! statistics, and exports the filtered rows as CSV. The filter pipeline
//! itself is a pure function over in-memory data; see [`data::filter`].

pub mod data;
pub mod state;
