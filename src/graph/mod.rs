//! Network model and graph analytics.
//!
//! A [`Graph`] is built once (from an edge list or a generator), cleaned
//! up (self-loops, largest component) and then only read.

pub mod types;
pub mod analytics;
pub mod kcore;
pub mod generators;
pub mod loader;

pub use types::{Graph, IndexedGraph, VertexId};
pub use analytics::{DistanceStatistics, NetworkSummary};
pub use kcore::CoreDecomposition;
pub use loader::{load_edge_list, parse_edge_list};
