//! Degree-based heuristics. Both ignore the scenarios when choosing and
//! only use them to score the choice.

use std::time::Instant;

use super::coverage::CoverageMatrix;
use super::solution::{check_alignment, check_cardinality, HoneypotOptimizer, HoneypotSolution, SolutionStatus, Strategy};
use crate::error::Result;
use crate::graph::Graph;

fn heuristic_solution(
    strategy: Strategy,
    graph: &Graph,
    coverage: &CoverageMatrix,
    selection: Vec<usize>,
    started: Instant,
) -> HoneypotSolution {
    let k = selection.len();
    let objective = coverage.coverage_of_indices(&selection);
    let posterior_bound = coverage.posterior_bound(&selection, k);
    let ids = coverage.vertex_ids();
    let honeypots: Vec<_> = selection.iter().map(|&v| ids[v]).collect();
    log::debug!("{} on {} selected {:?} (coverage {:.4})", strategy, graph.name(), honeypots, objective);
    HoneypotSolution {
        strategy,
        honeypots,
        objective,
        a_priori_bound: None,
        posterior_bound: Some(posterior_bound),
        status: SolutionStatus::Heuristic,
        wall_time: started.elapsed(),
        solver: None,
    }
}

/// The `k` vertices of highest degree, ties to the smaller id
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeCentrality;

impl HoneypotOptimizer for DegreeCentrality {
    fn strategy(&self) -> Strategy {
        Strategy::DegreeCentrality
    }

    fn optimize(&self, graph: &Graph, coverage: &CoverageMatrix, k: usize) -> Result<HoneypotSolution> {
        let started = Instant::now();
        check_cardinality(coverage, k)?;
        check_alignment(graph, coverage)?;

        let indexed = graph.indexed();
        let mut order: Vec<usize> = (0..indexed.len()).collect();
        // indices ascend with ids, so a stable sort keeps the id tie-break
        order.sort_by_key(|&v| std::cmp::Reverse(indexed.degree(v)));
        order.truncate(k);
        Ok(heuristic_solution(self.strategy(), graph, coverage, order, started))
    }
}

/// Degree discount for independent-cascade influence (Chen, Wang and Yang,
/// 2009). After each pick, every unselected neighbour `v` with degree
/// `d_v` and `t_v` selected neighbours is rescored as
/// `d_v - 2 t_v - (d_v - t_v) t_v p`.
#[derive(Debug, Clone, Copy)]
pub struct DegreeDiscount {
    pub propagation: f64,
}

impl Default for DegreeDiscount {
    fn default() -> Self {
        Self { propagation: 0.01 }
    }
}

impl DegreeDiscount {
    pub fn new(propagation: f64) -> Self {
        Self { propagation }
    }
}

impl HoneypotOptimizer for DegreeDiscount {
    fn strategy(&self) -> Strategy {
        Strategy::DegreeDiscount
    }

    fn optimize(&self, graph: &Graph, coverage: &CoverageMatrix, k: usize) -> Result<HoneypotSolution> {
        let started = Instant::now();
        check_cardinality(coverage, k)?;
        check_alignment(graph, coverage)?;

        let indexed = graph.indexed();
        let n = indexed.len();
        let p = self.propagation;
        let mut score: Vec<f64> = (0..n).map(|v| indexed.degree(v) as f64).collect();
        let mut claimed = vec![0usize; n];
        let mut selected = vec![false; n];
        let mut selection = Vec::with_capacity(k);

        for _ in 0..k {
            let mut best: Option<usize> = None;
            for v in (0..n).filter(|&v| !selected[v]) {
                if best.map_or(true, |b| score[v] > score[b]) {
                    best = Some(v);
                }
            }
            let Some(pick) = best else { break };
            selected[pick] = true;
            selection.push(pick);

            for &u in indexed.neighbors(pick) {
                if selected[u] {
                    continue;
                }
                claimed[u] += 1;
                let d = indexed.degree(u) as f64;
                let t = claimed[u] as f64;
                score[u] = d - 2.0 * t - (d - t) * t * p;
            }
        }
        Ok(heuristic_solution(self.strategy(), graph, coverage, selection, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generators;

    /// Star centred on 0 with leaves 1..=4, plus a triangle 5-6-7 hanging off 4
    fn star_and_triangle() -> Graph {
        let mut g = Graph::new("star");
        for leaf in 1..=4 {
            g.add_edge(0, leaf);
        }
        g.add_edge(4, 5);
        g.add_edge(5, 6);
        g.add_edge(6, 7);
        g.add_edge(5, 7);
        g
    }

    fn empty_coverage(g: &Graph) -> CoverageMatrix {
        CoverageMatrix::from_rows(g.vertex_ids(), vec![vec![]]).unwrap()
    }

    #[test]
    fn test_degree_centrality_ties_to_smaller_id() {
        let g = star_and_triangle();
        let solution = DegreeCentrality.optimize(&g, &empty_coverage(&g), 3).unwrap();
        // degrees: 0 -> 4, 5 -> 3, then 4/6/7 tie at 2
        assert_eq!(solution.honeypots, vec![0, 5, 4]);
        assert_eq!(solution.status, SolutionStatus::Heuristic);
        assert!(solution.a_priori_bound.is_none());
    }

    #[test]
    fn test_degree_discount_avoids_neighbours() {
        let g = star_and_triangle();
        let solution = DegreeDiscount::new(0.5).optimize(&g, &empty_coverage(&g), 2).unwrap();
        // after 0, vertex 4 is discounted to 2 - 2 - 1*1*0.5 < 3
        assert_eq!(solution.honeypots, vec![0, 5]);

        let solution = DegreeDiscount::new(0.5).optimize(&g, &empty_coverage(&g), 3).unwrap();
        // leaves 1..=3 sit at 1 - 2 = -1, 4 has two claims (2 - 4 = -2),
        // 6 and 7 tie at 2 - 2 - 0.5 = -0.5
        assert_eq!(solution.honeypots, vec![0, 5, 6]);
    }

    #[test]
    fn test_cardinality_and_alignment_errors() {
        let g = generators::complete(3);
        let cov = empty_coverage(&g);
        assert!(DegreeCentrality.optimize(&g, &cov, 0).is_err());
        assert!(DegreeCentrality.optimize(&g, &cov, 4).is_err());

        let other = generators::complete(4);
        assert!(DegreeDiscount::default().optimize(&other, &cov, 1).is_err());
    }
}
