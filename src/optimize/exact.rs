//! Exact maximum coverage as a mixed-integer program.
//!
//! One binary `x_v` per candidate vertex and one binary `u_i` per scenario:
//!
//! ```text
//! max  sum_i w_i u_i
//! s.t. sum_v x_v = k
//!      sum_{v detects i} x_v - u_i >= 0   for every scenario i
//! ```
//!
//! Before formulating, scenarios nobody detects are dropped, vertices whose
//! detections are a subset of another vertex's are dropped, and identical
//! scenarios are merged with their weights summed. None of these changes
//! the optimum.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::coverage::CoverageMatrix;
use super::greedy::max_rows_greedy;
use super::solution::{check_cardinality, HoneypotOptimizer, HoneypotSolution, SolutionStatus, SolverReport, Strategy};
use crate::error::{HoneypotError, Result};
use crate::graph::Graph;
use crate::solver::{MipModel, MipSolver, Sense, SolveBudget, SolveStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactOptions {
    pub budget: SolveBudget,
    pub reduce: bool,
    pub warm_start: bool,
    /// Also solve the LP relaxation and report it as the a-priori bound
    pub relaxation_bound: bool,
}

impl Default for ExactOptions {
    fn default() -> Self {
        Self {
            budget: SolveBudget::default(),
            reduce: true,
            warm_start: true,
            relaxation_bound: true,
        }
    }
}

/// Coverage problem after pruning, indexed by candidate position
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedProblem {
    /// Original column index of each candidate
    pub candidates: Vec<usize>,
    /// Detecting candidate positions per merged scenario
    pub rows: Vec<Vec<usize>>,
    pub weights: Vec<f64>,
}

impl ReducedProblem {
    /// No pruning: every column and every row, original weights
    pub fn full(coverage: &CoverageMatrix) -> Self {
        Self {
            candidates: (0..coverage.vertex_count()).collect(),
            rows: coverage.rows().to_vec(),
            weights: coverage.weights().to_vec(),
        }
    }

    pub fn reduce(coverage: &CoverageMatrix) -> Self {
        let n = coverage.vertex_count();
        let active: Vec<usize> = (0..coverage.scenario_count())
            .filter(|&i| !coverage.rows()[i].is_empty())
            .collect();

        let words = active.len().div_ceil(64).max(1);
        let bitsets: Vec<Vec<u64>> = (0..n)
            .map(|v| {
                let mut bits = vec![0u64; words];
                for (pos, &i) in active.iter().enumerate() {
                    if coverage.rows()[i].contains(&v) {
                        bits[pos / 64] |= 1u64 << (pos % 64);
                    }
                }
                bits
            })
            .collect();
        let subset = |a: &[u64], b: &[u64]| a.iter().zip(b).all(|(x, y)| x & !y == 0);

        let candidates: Vec<usize> = (0..n)
            .filter(|&a| {
                !(0..n).any(|b| {
                    b != a && subset(&bitsets[a], &bitsets[b]) && (bitsets[a] != bitsets[b] || b < a)
                })
            })
            .collect();
        let position: HashMap<usize, usize> = candidates.iter().enumerate().map(|(p, &v)| (v, p)).collect();

        let mut merged: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut rows = Vec::new();
        let mut weights = Vec::new();
        for &i in &active {
            let mut row: Vec<usize> = coverage.rows()[i]
                .iter()
                .filter_map(|v| position.get(v).copied())
                .collect();
            row.sort_unstable();
            row.dedup();
            if row.is_empty() {
                continue;
            }
            match merged.get(&row).copied() {
                Some(r) => weights[r] += coverage.weights()[i],
                None => {
                    merged.insert(row.clone(), rows.len());
                    rows.push(row);
                    weights.push(coverage.weights()[i]);
                }
            }
        }

        log::debug!(
            "Reduced coverage problem from {}x{} to {}x{}",
            coverage.scenario_count(),
            n,
            rows.len(),
            candidates.len()
        );
        Self {
            candidates,
            rows,
            weights,
        }
    }

    /// Cardinality actually imposed on the reduced model
    pub fn cardinality(&self, k: usize) -> usize {
        k.min(self.candidates.len())
    }

    fn as_coverage(&self, coverage: &CoverageMatrix) -> Result<CoverageMatrix> {
        let ids = self.candidates.iter().map(|&v| coverage.vertex_ids()[v]).collect();
        CoverageMatrix::from_rows(ids, self.rows.clone())?.with_weights(self.weights.clone())
    }

    /// MIP over this problem; `x` variables come first, then `u`
    pub fn formulate(&self, k: usize) -> MipModel {
        let mut model = MipModel::new();
        let x: Vec<usize> = self
            .candidates
            .iter()
            .map(|v| model.add_binary(format!("x_{}", v)))
            .collect();
        let u: Vec<usize> = (0..self.rows.len())
            .map(|i| model.add_binary(format!("u_{}", i)))
            .collect();

        model.add_constraint(
            "cardinality",
            x.iter().map(|&j| (j, 1.0)).collect(),
            Sense::Equal,
            self.cardinality(k) as f64,
        );
        for (i, row) in self.rows.iter().enumerate() {
            let mut terms: Vec<(usize, f64)> = row.iter().map(|&p| (x[p], 1.0)).collect();
            terms.push((u[i], -1.0));
            model.add_constraint(format!("cover_{}", i), terms, Sense::GreaterEqual, 0.0);
        }
        model.set_objective(u.iter().zip(&self.weights).map(|(&j, &w)| (j, w)).collect());
        model
    }

    fn start_values(&self, picks: &[usize]) -> Vec<f64> {
        let mut values = vec![0.0; self.candidates.len() + self.rows.len()];
        for &p in picks {
            values[p] = 1.0;
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.iter().any(|p| picks.contains(p)) {
                values[self.candidates.len() + i] = 1.0;
            }
        }
        values
    }
}

/// What is left of `budget`'s time limit since `started`
fn remaining(budget: &SolveBudget, started: Instant) -> SolveBudget {
    SolveBudget {
        time_limit: budget.time_limit.map(|limit| limit.saturating_sub(started.elapsed())),
        ..budget.clone()
    }
}

/// Fill `selection` up to `k` with the smallest unused column indices
fn pad(mut selection: Vec<usize>, k: usize, n: usize) -> Vec<usize> {
    let mut v = 0;
    while selection.len() < k && v < n {
        if !selection.contains(&v) {
            selection.push(v);
        }
        v += 1;
    }
    selection
}

pub struct ExactOptimizer<S: MipSolver> {
    solver: S,
    options: ExactOptions,
}

impl<S: MipSolver> ExactOptimizer<S> {
    pub fn new(solver: S, options: ExactOptions) -> Self {
        Self { solver, options }
    }

    pub fn options(&self) -> &ExactOptions {
        &self.options
    }

    fn problem(&self, coverage: &CoverageMatrix) -> ReducedProblem {
        if self.options.reduce {
            ReducedProblem::reduce(coverage)
        } else {
            ReducedProblem::full(coverage)
        }
    }

    /// Optimum of the LP relaxation, an upper bound on any `k`-subset.
    /// A relaxation cut short by the budget reports the total weight.
    pub fn relaxation_bound(&self, coverage: &CoverageMatrix, k: usize) -> Result<f64> {
        check_cardinality(coverage, k)?;
        self.bound_of(&self.problem(coverage), coverage, k, &self.options.budget)
    }

    fn bound_of(&self, problem: &ReducedProblem, coverage: &CoverageMatrix, k: usize, budget: &SolveBudget) -> Result<f64> {
        if problem.rows.is_empty() {
            return Ok(0.0);
        }
        let outcome = self.solver.solve(&problem.formulate(k).relaxed(), budget)?;
        match outcome.status {
            SolveStatus::Infeasible | SolveStatus::Unbounded => {
                Err(HoneypotError::Solver(outcome.status.message().to_string()))
            }
            _ => Ok(outcome.best_bound.min(coverage.total_weight())),
        }
    }

    fn report(&self, status: SolveStatus, nodes: u64) -> SolverReport {
        let mut options = self.options.budget.options();
        options.insert("Reduce".to_string(), self.options.reduce.to_string());
        options.insert("WarmStart".to_string(), self.options.warm_start.to_string());
        SolverReport {
            backend: self.solver.name().to_string(),
            status: format!("{:?}", status),
            message: status.message().to_string(),
            options,
            nodes,
        }
    }
}

impl<S: MipSolver> HoneypotOptimizer for ExactOptimizer<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Exact
    }

    fn optimize(&self, _graph: &Graph, coverage: &CoverageMatrix, k: usize) -> Result<HoneypotSolution> {
        let started = Instant::now();
        check_cardinality(coverage, k)?;
        let n = coverage.vertex_count();
        let ids = coverage.vertex_ids();
        let problem = self.problem(coverage);

        let a_priori_bound = if self.options.relaxation_bound {
            match self.bound_of(&problem, coverage, k, &self.options.budget) {
                Ok(bound) => Some(bound),
                Err(e) => {
                    log::warn!("No a-priori bound: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if problem.rows.is_empty() {
            // nothing is detectable; every selection scores zero
            let selection = pad(Vec::new(), k, n);
            return Ok(HoneypotSolution {
                strategy: Strategy::Exact,
                honeypots: selection.iter().map(|&v| ids[v]).collect(),
                objective: 0.0,
                a_priori_bound,
                posterior_bound: Some(0.0),
                status: SolutionStatus::Optimal,
                wall_time: started.elapsed(),
                solver: None,
            });
        }

        let card = problem.cardinality(k);
        let reduced = problem.as_coverage(coverage)?;
        let greedy = max_rows_greedy(&reduced, card);
        let mut model = problem.formulate(k);
        if self.options.warm_start {
            model.set_start(problem.start_values(&greedy));
        }

        log::info!(
            "Solving coverage MIP with {} variables and {} constraints using {}",
            model.variables().len(),
            model.constraints().len(),
            self.solver.name()
        );
        let outcome = self.solver.solve(&model, &remaining(&self.options.budget, started))?;

        let total = coverage.total_weight();
        let (status, values, bound) = match outcome.status {
            SolveStatus::Optimal => (SolutionStatus::Optimal, outcome.values, outcome.best_bound),
            SolveStatus::Infeasible | SolveStatus::Unbounded => {
                // the coverage model is feasible and bounded whatever the data
                log::warn!(
                    "{} for the k={} coverage model; falling back to greedy selection",
                    outcome.status.message(),
                    k
                );
                (SolutionStatus::Unproven, None, total)
            }
            _ => {
                log::warn!("{}; returning an unproven solution", outcome.status.message());
                (SolutionStatus::Unproven, outcome.values, outcome.best_bound)
            }
        };

        let expand = |picks: &[usize]| pad(picks.iter().map(|&p| problem.candidates[p]).collect(), k, n);
        let mut selection = match &values {
            Some(values) => expand(&(0..problem.candidates.len()).filter(|&p| values[p] > 0.5).collect::<Vec<_>>()),
            None => {
                log::warn!("Solver returned no incumbent; falling back to greedy selection");
                expand(&greedy)
            }
        };
        let mut objective = coverage.coverage_of_indices(&selection);
        if status == SolutionStatus::Unproven {
            let fallback = expand(&greedy);
            let greedy_objective = coverage.coverage_of_indices(&fallback);
            if greedy_objective > objective {
                selection = fallback;
                objective = greedy_objective;
            }
        }

        Ok(HoneypotSolution {
            strategy: Strategy::Exact,
            honeypots: selection.iter().map(|&v| ids[v]).collect(),
            objective,
            a_priori_bound,
            posterior_bound: Some(bound.max(objective).min(total)),
            status,
            wall_time: started.elapsed(),
            solver: Some(self.report(outcome.status, outcome.nodes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generators;
    use crate::optimize::greedy::MaxRowsGreedy;
    use crate::params::Parameters;
    use crate::simulation::{ScenarioGenerator, SpreadModel, StreamSeed};
    use crate::solver::BranchAndBound;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    /// Scenarios of a repeated-attempt contagion on a chorded ring
    fn generated(vertices: u32, repetitions: usize, false_negative: f64) -> (Graph, CoverageMatrix) {
        let graph = generators::circulant(vertices, &[1, 2, 7]).unwrap();
        let params = Parameters {
            network: graph.name().to_string(),
            model: SpreadModel::RepeatedAttempt,
            honeypots: 4,
            repetitions,
            target_fraction: 1.0,
            false_negative,
            time_steps: 3,
            transmissibility: 0.3,
        };
        let set = ScenarioGenerator::new(&graph)
            .generate(&params, StreamSeed::new(0))
            .unwrap();
        let coverage = CoverageMatrix::from_scenarios(&set).unwrap();
        (graph, coverage)
    }

    fn time_limited(limit: Duration) -> ExactOptimizer<BranchAndBound> {
        let options = ExactOptions {
            budget: SolveBudget {
                time_limit: Some(limit),
                ..SolveBudget::default()
            },
            ..ExactOptions::default()
        };
        ExactOptimizer::new(BranchAndBound::new(), options)
    }

    fn exact() -> ExactOptimizer<BranchAndBound> {
        ExactOptimizer::new(BranchAndBound::new(), ExactOptions::default())
    }

    /// Four detectable scenarios and one nobody detects; vertices 0 and 2
    /// together cover all four.
    fn four_rows() -> CoverageMatrix {
        CoverageMatrix::from_rows(
            vec![0, 1, 2, 3],
            vec![vec![0, 1], vec![0, 1], vec![0, 2], vec![2], vec![]],
        )
        .unwrap()
    }

    #[test]
    fn test_reduction_prunes_and_merges() {
        let problem = ReducedProblem::reduce(&four_rows());
        // vertex 3 detects nothing and vertex 1 is a subset of vertex 0
        assert_eq!(problem.candidates, vec![0, 2]);
        // rows 0 and 1 collapse onto {0}
        assert_eq!(problem.rows, vec![vec![0], vec![0, 1], vec![1]]);
        assert_abs_diff_eq!(problem.weights[0], 0.4);
        assert_abs_diff_eq!(problem.weights.iter().sum::<f64>(), 0.8);
    }

    #[test]
    fn test_identical_columns_keep_smaller_index() {
        let coverage = CoverageMatrix::from_rows(vec![4, 9], vec![vec![0, 1]]).unwrap();
        assert_eq!(ReducedProblem::reduce(&coverage).candidates, vec![0]);
    }

    #[test]
    fn test_exact_covers_every_detectable_row() {
        let coverage = four_rows();
        let graph = Graph::new("unused");
        let greedy = MaxRowsGreedy.optimize(&graph, &coverage, 2).unwrap();
        let solution = exact().optimize(&graph, &coverage, 2).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective, 0.8, epsilon = 1e-9);
        assert!(solution.objective >= greedy.objective);
        assert_eq!(solution.k(), 2);
        assert!(solution.posterior_bound.unwrap() >= solution.objective - 1e-9);
        assert!(solution.a_priori_bound.unwrap() >= solution.objective - 1e-9);
        let report = solution.solver.unwrap();
        assert_eq!(report.backend, "branch-and-bound");
        assert_eq!(report.options["Reduce"], "true");
    }

    #[test]
    fn test_unreduced_model_agrees() {
        let coverage = four_rows();
        let options = ExactOptions {
            reduce: false,
            warm_start: false,
            ..ExactOptions::default()
        };
        let plain = ExactOptimizer::new(BranchAndBound::new(), options)
            .optimize(&Graph::new("unused"), &coverage, 2)
            .unwrap();
        assert_abs_diff_eq!(plain.objective, 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_node_limit_yields_unproven_solution() {
        let options = ExactOptions {
            budget: SolveBudget {
                node_limit: Some(0),
                ..SolveBudget::default()
            },
            warm_start: false,
            relaxation_bound: false,
            ..ExactOptions::default()
        };
        let solution = ExactOptimizer::new(BranchAndBound::new(), options)
            .optimize(&Graph::new("unused"), &four_rows(), 2)
            .unwrap();
        // no incumbent yet; the selection comes from greedy and the bound from the root LP
        assert_eq!(solution.status, SolutionStatus::Unproven);
        assert_eq!(solution.k(), 2);
        assert!(solution.posterior_bound.unwrap() >= 0.8 - 1e-9);
    }

    #[test]
    fn test_time_limit_without_incumbent_falls_back_to_greedy() {
        let options = ExactOptions {
            budget: SolveBudget {
                time_limit: Some(Duration::ZERO),
                ..SolveBudget::default()
            },
            warm_start: false,
            relaxation_bound: false,
            ..ExactOptions::default()
        };
        let solution = ExactOptimizer::new(BranchAndBound::new(), options)
            .optimize(&Graph::new("unused"), &four_rows(), 2)
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Unproven);
        assert_eq!(solution.k(), 2);
        assert!(solution.objective > 0.0);
    }

    #[test]
    fn test_nothing_detectable() {
        let coverage = CoverageMatrix::from_rows(vec![3, 4, 5], vec![vec![], vec![]]).unwrap();
        let solution = exact().optimize(&Graph::new("unused"), &coverage, 2).unwrap();
        assert_eq!(solution.honeypots, vec![3, 4]);
        assert_eq!(solution.objective, 0.0);
        assert_eq!(solution.status, SolutionStatus::Optimal);
    }

    #[test]
    fn test_relaxation_bound_is_an_upper_bound() {
        let coverage = four_rows();
        let bound = exact().relaxation_bound(&coverage, 1).unwrap();
        assert!(bound >= 0.6 - 1e-9);
        assert!(bound <= coverage.total_weight() + 1e-9);
    }

    #[test]
    fn test_generated_scenarios_respect_the_time_limit() {
        let (graph, coverage) = generated(40, 200, 0.0);
        let limit = Duration::from_secs(2);
        let greedy = MaxRowsGreedy.optimize(&graph, &coverage, 4).unwrap();

        let started = Instant::now();
        let solution = time_limited(limit).optimize(&graph, &coverage, 4).unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed < limit + Duration::from_secs(8), "took {:?}", elapsed);
        assert_eq!(solution.k(), 4);
        assert!(solution.objective >= greedy.objective - 1e-12);
        assert!(solution.posterior_bound.unwrap() >= solution.objective - 1e-9);
        if solution.status == SolutionStatus::Optimal {
            assert!(solution.a_priori_bound.unwrap() >= solution.objective - 1e-9);
        } else {
            assert_eq!(solution.status, SolutionStatus::Unproven);
        }
    }

    #[test]
    fn test_large_noisy_instance_degrades_to_unproven_not_error() {
        let (graph, coverage) = generated(120, 1000, 0.3);
        let limit = Duration::from_secs(2);
        let greedy = MaxRowsGreedy.optimize(&graph, &coverage, 6).unwrap();

        let started = Instant::now();
        let solution = time_limited(limit).optimize(&graph, &coverage, 6).unwrap();

        assert!(started.elapsed() < limit + Duration::from_secs(10));
        assert_eq!(solution.k(), 6);
        assert!(solution.objective >= greedy.objective - 1e-12);
        let bound = solution.posterior_bound.unwrap();
        assert!(bound >= solution.objective - 1e-9);
        assert!(bound <= coverage.total_weight() + 1e-9);
    }
}
