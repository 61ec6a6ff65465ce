//! Greedy maximum coverage.

use std::f64::consts::E;
use std::time::Instant;

use super::coverage::CoverageMatrix;
use super::solution::{check_cardinality, HoneypotOptimizer, HoneypotSolution, SolutionStatus, Strategy};
use crate::error::Result;
use crate::graph::Graph;

const GAIN_TOLERANCE: f64 = 1e-12;

/// Pick `k` vertex indices, each time the one covering the most weight of
/// still-uncovered scenarios. Ties go to the smaller index. Once nothing
/// adds coverage the remaining slots take the smallest unselected indices.
pub fn max_rows_greedy(coverage: &CoverageMatrix, k: usize) -> Vec<usize> {
    let n = coverage.vertex_count();
    let weights = coverage.weights();
    let mut covered = vec![false; coverage.scenario_count()];
    let mut selected = vec![false; n];
    let mut selection = Vec::with_capacity(k);

    while selection.len() < k.min(n) {
        let mut best: Option<(usize, f64)> = None;
        for (v, column) in coverage.columns().iter().enumerate() {
            if selected[v] {
                continue;
            }
            let gain: f64 = column.iter().filter(|&&i| !covered[i]).map(|&i| weights[i]).sum();
            if best.map_or(true, |(_, g)| gain > g + GAIN_TOLERANCE) {
                best = Some((v, gain));
            }
        }
        let Some((pick, gain)) = best else { break };
        if gain <= GAIN_TOLERANCE {
            break;
        }
        selected[pick] = true;
        selection.push(pick);
        for &i in &coverage.columns()[pick] {
            covered[i] = true;
        }
    }

    for v in 0..n {
        if selection.len() >= k {
            break;
        }
        if !selected[v] {
            selected[v] = true;
            selection.push(v);
        }
    }
    selection
}

/// `objective * e / (e - 1)`, the guarantee read backwards
pub fn a_priori_bound(objective: f64, total_weight: f64) -> f64 {
    (objective * E / (E - 1.0)).min(total_weight)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxRowsGreedy;

impl HoneypotOptimizer for MaxRowsGreedy {
    fn strategy(&self) -> Strategy {
        Strategy::MaxRowsGreedy
    }

    fn optimize(&self, _graph: &Graph, coverage: &CoverageMatrix, k: usize) -> Result<HoneypotSolution> {
        let started = Instant::now();
        check_cardinality(coverage, k)?;

        let selection = max_rows_greedy(coverage, k);
        let objective = coverage.coverage_of_indices(&selection);
        let ids = coverage.vertex_ids();
        Ok(HoneypotSolution {
            strategy: Strategy::MaxRowsGreedy,
            honeypots: selection.iter().map(|&v| ids[v]).collect(),
            objective,
            a_priori_bound: Some(a_priori_bound(objective, coverage.total_weight())),
            posterior_bound: Some(coverage.posterior_bound(&selection, k)),
            status: SolutionStatus::Heuristic,
            wall_time: started.elapsed(),
            solver: None,
        })
    }
}
