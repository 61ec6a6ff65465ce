//! Integer-programming solver boundary.
//!
//! The optimization layer hands a [`MipModel`] and a [`SolveBudget`] to
//! any [`MipSolver`] and gets back the best objective, the best proven
//! bound and a termination status. Running out of budget is a status, not
//! an error.

pub mod model;
pub mod simplex;
pub mod branch_bound;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use branch_bound::BranchAndBound;
pub use model::{Constraint, MipModel, Sense, VarKind, Variable};

/// Limits and tolerances for one solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveBudget {
    #[serde(with = "humantime_serde")]
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
    /// Stop once `(bound - incumbent) / |incumbent|` falls to this value
    pub relative_gap: f64,
    pub integrality_tolerance: f64,
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            relative_gap: 1e-4,
            integrality_tolerance: 1e-6,
        }
    }
}

impl SolveBudget {
    /// Options echoed into solution records
    pub fn options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        options.insert("MIPGap".to_string(), self.relative_gap.to_string());
        options.insert("IntFeasTol".to_string(), self.integrality_tolerance.to_string());
        if let Some(limit) = self.time_limit {
            options.insert(
                "TimeLimit".to_string(),
                humantime_serde::re::humantime::format_duration(limit).to_string(),
            );
        }
        if let Some(limit) = self.node_limit {
            options.insert("NodeLimit".to_string(), limit.to_string());
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    TimeLimit,
    NodeLimit,
    /// A relaxation exhausted its simplex iteration limit
    IterationLimit,
    /// A relaxation could not be solved reliably in floating point
    Numerical,
    Infeasible,
    Unbounded,
}

impl SolveStatus {
    /// Whether the reported objective is certified within the gap tolerance
    pub fn is_proven(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }

    pub fn message(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal solution found within the gap tolerance",
            SolveStatus::TimeLimit => "Time limit reached before optimality was proven",
            SolveStatus::NodeLimit => "Node limit reached before optimality was proven",
            SolveStatus::IterationLimit => "Simplex iteration limit reached before optimality was proven",
            SolveStatus::Numerical => "Numerical trouble before optimality was proven",
            SolveStatus::Infeasible => "Model is infeasible",
            SolveStatus::Unbounded => "Model is unbounded",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Best feasible objective found, if any
    pub objective: Option<f64>,
    /// Best proven upper bound on the optimum
    pub best_bound: f64,
    /// Variable values of the best feasible point
    pub values: Option<Vec<f64>>,
    pub nodes: u64,
    pub wall_time: Duration,
}

/// Any integer-programming backend
pub trait MipSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, model: &MipModel, budget: &SolveBudget) -> Result<SolveOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_yaml_with_human_durations() {
        let budget: SolveBudget = serde_yaml::from_str("time_limit: 2m\nrelative_gap: 0.01\n").unwrap();
        assert_eq!(budget.time_limit, Some(Duration::from_secs(120)));
        assert_eq!(budget.relative_gap, 0.01);
        assert_eq!(budget.node_limit, None);

        let options = budget.options();
        assert_eq!(options["TimeLimit"], "2m");
        assert_eq!(options["MIPGap"], "0.01");
    }

    #[test]
    fn test_status_proof() {
        assert!(SolveStatus::Optimal.is_proven());
        assert!(!SolveStatus::TimeLimit.is_proven());
        assert!(!SolveStatus::Numerical.is_proven());
    }
}
