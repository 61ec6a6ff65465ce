//! Honeypot selection over a shared scenario coverage matrix.
//!
//! Every strategy implements [`HoneypotOptimizer`] and returns a
//! [`HoneypotSolution`] holding exactly `k` vertices, the weighted fraction
//! of scenarios they detect, and whatever bounds the strategy can certify.

pub mod coverage;
pub mod solution;
pub mod degree;
pub mod greedy;
pub mod exact;

pub use coverage::CoverageMatrix;
pub use degree::{DegreeCentrality, DegreeDiscount};
pub use exact::{ExactOptimizer, ExactOptions, ReducedProblem};
pub use greedy::{max_rows_greedy, MaxRowsGreedy};
pub use solution::{HoneypotOptimizer, HoneypotSolution, SolutionStatus, SolverReport, Strategy};

use crate::solver::BranchAndBound;

/// Optimizer for a strategy. Degree discount uses the spread's
/// transmissibility as its propagation probability; the exact strategy is
/// backed by the bundled branch-and-bound solver.
pub fn optimizer_for(strategy: Strategy, transmissibility: f64, exact: &ExactOptions) -> Box<dyn HoneypotOptimizer> {
    match strategy {
        Strategy::DegreeCentrality => Box::new(DegreeCentrality),
        Strategy::DegreeDiscount => Box::new(DegreeDiscount::new(transmissibility)),
        Strategy::MaxRowsGreedy => Box::new(MaxRowsGreedy),
        Strategy::Exact => Box::new(ExactOptimizer::new(BranchAndBound::new(), exact.clone())),
    }
}
