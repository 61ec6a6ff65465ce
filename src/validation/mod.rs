//! Statistical validation of honeypot solutions on held-out scenarios.

pub mod sampling;
pub mod replications;
pub mod mcnemar;
pub mod compare;

pub use compare::{compare_solutions, semi_hamming_distance, SolutionComparison};
pub use mcnemar::{compare_paired, ContingencyTable, PairedComparison};
pub use replications::{estimate_optimality_gap, estimate_overfitting_gap, GapEstimate, ReplicationPlan};
pub use sampling::{estimate_sampling_error, SamplingError};
