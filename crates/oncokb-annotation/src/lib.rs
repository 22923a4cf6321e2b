//! oncokb-annotation: Aggregation and filtering over one gene/variant query.
//!
//! [`AnnotationStore`] owns a query context: it wires the remote records into
//! an [`oncokb_store::DataStore`], derives the bar chart, oncogenicity histogram
//! and mutation mapper views from them, and keeps the filtered tables in sync
//! with the current [`FilterState`].

pub mod aggregate;
pub mod filter;
pub mod memo;
pub mod store;
pub mod table;

pub use aggregate::{BarChartDatum, MutationMapperDatum, OncogenicityCount};
pub use filter::FilterState;
pub use memo::Memo;
pub use store::{AnnotationSnapshot, AnnotationStore, View};
pub use table::SortColumn;
