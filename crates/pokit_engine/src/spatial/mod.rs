//! Spatial partitioning data structures
//!
//! Provides the broad-phase index used by the collision pipeline.

mod spatial_hash;
pub mod spatial_query;

pub use spatial_hash::{CellKey, SpatialHashMap};
pub use spatial_query::SpatialQuery;
