//! oncokb-ordering: Fixed priority tables and comparators for the annotation taxonomy.
//!
//! Every sort and grouping in the engine goes through this crate. Tables are
//! ordered most actionable first; values that are not in a table rank as
//! [`UNRANKED`] and always sort after every recognised value, whichever
//! direction is requested.
//!
//! | table | order |
//! |-------|-------|
//! | level of evidence | 1, 2A, 2B, 3A, 3B, 4, R1, R2 |
//! | oncogenicity | Oncogenic, Likely Oncogenic, Predicted Oncogenic, Resistance, Neutral, Likely Neutral, Inconclusive, Unknown |
//! | mutation effect | Gain-of-function … Unknown |

pub mod comparator;
pub mod level;
pub mod markup;
pub mod mutation_effect;
pub mod oncogenicity;

pub use comparator::{compare_by_priority, compare_ranks, rank_in, Direction, UNRANKED};
pub use level::{compare_levels, highest_level, level_priority, LevelOfEvidence};
pub use markup::{compare_markup_numbers, extract_numeric_from_markup};
pub use mutation_effect::{compare_mutation_effects, mutation_effect_priority};
pub use oncogenicity::{compare_oncogenicity, oncogenicity_priority, Oncogenicity};
