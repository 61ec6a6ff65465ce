//! Honeypot solutions and the optimizer trait.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::coverage::CoverageMatrix;
use crate::error::{HoneypotError, Result};
use crate::graph::{Graph, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DegreeCentrality,
    DegreeDiscount,
    MaxRowsGreedy,
    Exact,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::DegreeCentrality,
        Strategy::DegreeDiscount,
        Strategy::MaxRowsGreedy,
        Strategy::Exact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DegreeCentrality => "degree_centrality",
            Strategy::DegreeDiscount => "degree_discount",
            Strategy::MaxRowsGreedy => "max_rows_greedy",
            Strategy::Exact => "exact",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = HoneypotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "degree_centrality" | "degree" => Ok(Strategy::DegreeCentrality),
            "degree_discount" => Ok(Strategy::DegreeDiscount),
            "max_rows_greedy" | "greedy" => Ok(Strategy::MaxRowsGreedy),
            "exact" | "mip" => Ok(Strategy::Exact),
            other => Err(HoneypotError::Configuration(format!(
                "unknown strategy '{}'",
                other
            ))),
        }
    }
}

/// How far the objective is certified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    /// Heuristic selection with no optimality claim
    Heuristic,
    /// Proven optimal within the solver's gap tolerance
    Optimal,
    /// Solver budget exhausted; only the bound is trustworthy
    Unproven,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionStatus::Heuristic => "heuristic",
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Unproven => "unproven",
        };
        f.write_str(s)
    }
}

/// What the integer-programming backend reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    pub backend: String,
    pub status: String,
    pub message: String,
    pub options: BTreeMap<String, String>,
    pub nodes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoneypotSolution {
    pub strategy: Strategy,
    /// Selected vertices in selection order
    pub honeypots: Vec<VertexId>,
    /// Weighted fraction of in-sample scenarios detected
    pub objective: f64,
    pub a_priori_bound: Option<f64>,
    pub posterior_bound: Option<f64>,
    pub status: SolutionStatus,
    #[serde(with = "humantime_serde")]
    pub wall_time: Duration,
    pub solver: Option<SolverReport>,
}

impl HoneypotSolution {
    pub fn k(&self) -> usize {
        self.honeypots.len()
    }

    /// Selected vertices in ascending order
    pub fn sorted_honeypots(&self) -> Vec<VertexId> {
        let mut sorted = self.honeypots.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn is_proven_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Best available upper bound on the in-sample optimum
    pub fn upper_bound(&self) -> Option<f64> {
        match (self.a_priori_bound, self.posterior_bound) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// A honeypot selection strategy over the shared coverage matrix
pub trait HoneypotOptimizer: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn optimize(&self, graph: &Graph, coverage: &CoverageMatrix, k: usize) -> Result<HoneypotSolution>;
}

/// Reject cardinalities that cannot be met
pub(crate) fn check_cardinality(coverage: &CoverageMatrix, k: usize) -> Result<()> {
    if k == 0 {
        return Err(HoneypotError::Configuration(
            "honeypot count must be positive".to_string(),
        ));
    }
    if k > coverage.vertex_count() {
        return Err(HoneypotError::Configuration(format!(
            "{} honeypots requested but only {} vertices exist",
            k,
            coverage.vertex_count()
        )));
    }
    Ok(())
}

/// Graph-based strategies must see the vertices the scenarios were drawn on
pub(crate) fn check_alignment(graph: &Graph, coverage: &CoverageMatrix) -> Result<()> {
    let aligned = graph.vertex_count() == coverage.vertex_count()
        && graph.vertices().zip(coverage.vertex_ids()).all(|(a, &b)| a == b);
    if !aligned {
        return Err(HoneypotError::Configuration(format!(
            "graph {} does not match the scenario vertex set",
            graph.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names_round_trip() {
        for s in Strategy::ALL {
            assert_eq!(s.as_str().parse::<Strategy>().unwrap(), s);
        }
        assert_eq!("max-rows-greedy".parse::<Strategy>().unwrap(), Strategy::MaxRowsGreedy);
        assert!("random".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_upper_bound_prefers_tighter() {
        let solution = HoneypotSolution {
            strategy: Strategy::MaxRowsGreedy,
            honeypots: vec![3, 1],
            objective: 0.5,
            a_priori_bound: Some(0.79),
            posterior_bound: Some(0.6),
            status: SolutionStatus::Heuristic,
            wall_time: Duration::from_millis(3),
            solver: None,
        };
        assert_eq!(solution.upper_bound(), Some(0.6));
        assert_eq!(solution.sorted_honeypots(), vec![1, 3]);
        assert_eq!(solution.k(), 2);
    }
}
