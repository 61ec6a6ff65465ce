//! Reference branch-and-bound backend.
//!
//! Best-first search over LP relaxations solved by the dense simplex.
//! Branches on the most fractional binary variable, up-branch first. The
//! time limit reaches into every relaxation, and a relaxation that gives up
//! ends the search with the matching status and the best bound so far.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use super::model::{MipModel, VarKind};
use super::simplex::{solve_relaxation, LpOutcome, LpStop};
use super::{MipSolver, SolveBudget, SolveOutcome, SolveStatus};
use crate::error::Result;

const START_TOLERANCE: f64 = 1e-6;

struct OpenNode {
    bound: f64,
    sequence: u64,
    lower: Vec<f64>,
    upper: Vec<f64>,
    values: Vec<f64>,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // highest bound first, then the most recently created node
    fn cmp(&self, other: &Self) -> Ordering {
        self.bound
            .total_cmp(&other.bound)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

fn gap_closed(incumbent: f64, bound: f64, relative_gap: f64) -> bool {
    bound - incumbent <= relative_gap * incumbent.abs().max(1e-9) + 1e-9
}

fn most_fractional(model: &MipModel, values: &[f64], tolerance: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, v) in model.variables().iter().enumerate() {
        if v.kind != VarKind::Binary {
            continue;
        }
        let frac = (values[j] - values[j].round()).abs();
        if frac > tolerance && best.map_or(true, |(_, f)| frac > f) {
            best = Some((j, frac));
        }
    }
    best.map(|(j, _)| j)
}

fn stop_status(stop: LpStop) -> SolveStatus {
    match stop {
        LpStop::TimeLimit => SolveStatus::TimeLimit,
        LpStop::IterationLimit => SolveStatus::IterationLimit,
        LpStop::Numerical => SolveStatus::Numerical,
    }
}

/// Every variable has a finite range, so no relaxation can be unbounded
fn finitely_bounded(model: &MipModel) -> bool {
    model.variables().iter().all(|v| v.upper.is_finite())
}

fn snapped(model: &MipModel, values: &[f64]) -> Vec<f64> {
    model
        .variables()
        .iter()
        .zip(values)
        .map(|(v, &x)| if v.kind == VarKind::Binary { x.round() } else { x })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

impl BranchAndBound {
    pub fn new() -> Self {
        BranchAndBound
    }
}

impl MipSolver for BranchAndBound {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, model: &MipModel, budget: &SolveBudget) -> Result<SolveOutcome> {
        let started = Instant::now();
        let deadline = budget.time_limit.map(|limit| started + limit);
        let tolerance = budget.integrality_tolerance;

        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        if let Some(start) = model.start() {
            if model.is_feasible(start, START_TOLERANCE) {
                incumbent = Some((model.objective_value(start), start.to_vec()));
            } else {
                log::warn!("Ignoring infeasible warm start");
            }
        }

        let lower: Vec<f64> = model.variables().iter().map(|v| v.lower).collect();
        let upper: Vec<f64> = model.variables().iter().map(|v| v.upper).collect();
        let finish = |status, bound, incumbent: Option<(f64, Vec<f64>)>, nodes| {
            let (objective, values) = match incumbent {
                Some((obj, x)) => (Some(obj), Some(x)),
                None => (None, None),
            };
            SolveOutcome {
                status,
                objective,
                best_bound: bound,
                values,
                nodes,
                wall_time: started.elapsed(),
            }
        };

        let mut heap = BinaryHeap::new();
        match solve_relaxation(model, &lower, &upper, deadline)? {
            LpOutcome::Optimal { objective, values } => heap.push(OpenNode {
                bound: objective,
                sequence: 0,
                lower,
                upper,
                values,
            }),
            LpOutcome::Infeasible => {
                return Ok(finish(SolveStatus::Infeasible, f64::NEG_INFINITY, None, 0));
            }
            LpOutcome::Unbounded if finitely_bounded(model) => {
                log::warn!("Relaxation of a bounded model reported unbounded");
                return Ok(finish(SolveStatus::Numerical, f64::INFINITY, incumbent, 0));
            }
            LpOutcome::Unbounded => {
                return Ok(finish(SolveStatus::Unbounded, f64::INFINITY, incumbent, 0));
            }
            LpOutcome::Stopped(stop) => {
                log::warn!("Root relaxation stopped: {:?}", stop);
                return Ok(finish(stop_status(stop), f64::INFINITY, incumbent, 0));
            }
        }

        let mut nodes = 0u64;
        let mut sequence = 1u64;
        while let Some(node) = heap.pop() {
            if let Some(best) = incumbent.as_ref().map(|(obj, _)| *obj) {
                if gap_closed(best, node.bound, budget.relative_gap) {
                    return Ok(finish(SolveStatus::Optimal, node.bound.max(best), incumbent, nodes));
                }
            }
            if budget.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                log::warn!("Branch-and-bound stopped by its time limit after {} nodes", nodes);
                return Ok(finish(SolveStatus::TimeLimit, node.bound, incumbent, nodes));
            }
            if budget.node_limit.is_some_and(|limit| nodes >= limit) {
                log::warn!("Branch-and-bound stopped by its node limit");
                return Ok(finish(SolveStatus::NodeLimit, node.bound, incumbent, nodes));
            }
            nodes += 1;

            let Some(j) = most_fractional(model, &node.values, tolerance) else {
                let improves = incumbent.as_ref().map_or(true, |(best, _)| node.bound > *best);
                if improves {
                    log::debug!("New incumbent {:.6} at node {}", node.bound, nodes);
                    incumbent = Some((node.bound, snapped(model, &node.values)));
                }
                continue;
            };

            for fixed in [1.0, 0.0] {
                let mut lower = node.lower.clone();
                let mut upper = node.upper.clone();
                lower[j] = fixed;
                upper[j] = fixed;
                match solve_relaxation(model, &lower, &upper, deadline)? {
                    LpOutcome::Optimal { objective, values } => {
                        let promising = incumbent
                            .as_ref()
                            .map_or(true, |(best, _)| !gap_closed(*best, objective, 0.0));
                        if promising {
                            heap.push(OpenNode {
                                bound: objective,
                                sequence,
                                lower,
                                upper,
                                values,
                            });
                            sequence += 1;
                        }
                    }
                    LpOutcome::Infeasible => {}
                    LpOutcome::Unbounded => {
                        log::warn!("Child relaxation reported unbounded after {} nodes", nodes);
                        return Ok(finish(SolveStatus::Numerical, node.bound, incumbent, nodes));
                    }
                    LpOutcome::Stopped(stop) => {
                        log::warn!("Branch-and-bound stopped after {} nodes: {:?}", nodes, stop);
                        // the popped node carried the highest open bound
                        return Ok(finish(stop_status(stop), node.bound, incumbent, nodes));
                    }
                }
            }
        }

        match incumbent.as_ref().map(|(obj, _)| *obj) {
            Some(best) => Ok(finish(SolveStatus::Optimal, best, incumbent, nodes)),
            None => Ok(finish(SolveStatus::Infeasible, f64::NEG_INFINITY, None, nodes)),
        }
    }
}
