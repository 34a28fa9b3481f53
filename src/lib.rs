//! Species Hypothesis (SH) status assignment of query sequences.
//!
//! Queries and reference sequences of a compound cluster are clustered (single linkage) at six
//! dissimilarity thresholds, 3.0% down to 0.5%. The crate consumes this clustering in two stages:
//!
//! 1. [resolver] decides for each query of one compound cluster and each threshold whether the query
//!    is *present* in an existing SH, forms a *new cluster* with other queries, is a *singleton*,
//!    or is *missing* from the clustering. One status file is produced per compound cluster.
//! 2. [aggregator] merges the status files of all compound clusters with best hits and the SH /
//!    compound taxonomy tables into one 24 columns report, one row per query.
//!
//! Tables are loaded once and passed by reference, nothing is global.

pub mod aggregator;
pub mod besthits;
pub mod centroid;
pub mod clusters;
pub mod errors;
pub mod membership;
pub mod resolver;
pub mod status;
pub mod taxonomy;
pub mod threshold;
pub mod utils;

pub use errors::ShMatchError;
pub use status::{Status, StatusRecord};
pub use threshold::Threshold;
