//! Side-by-side summary of two solutions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::mcnemar::compare_paired;
use crate::error::Result;
use crate::graph::VertexId;
use crate::optimize::{CoverageMatrix, HoneypotSolution, Strategy};
use crate::stats::Alpha;

/// Half the size of the symmetric difference of two vertex sets; for two
/// sets of equal size, the number of swaps turning one into the other
pub fn semi_hamming_distance(a: &[VertexId], b: &[VertexId]) -> usize {
    let a: BTreeSet<_> = a.iter().collect();
    let b: BTreeSet<_> = b.iter().collect();
    a.symmetric_difference(&b).count() / 2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionComparison {
    pub first: Strategy,
    pub second: Strategy,
    pub first_objective: f64,
    pub second_objective: f64,
    /// Half-width of the paired interval for the difference
    pub difference_half_width: f64,
    pub semi_hamming: usize,
}

pub fn compare_solutions(
    first: &HoneypotSolution,
    second: &HoneypotSolution,
    held_out: &CoverageMatrix,
    alpha: Alpha,
) -> Result<SolutionComparison> {
    let paired = compare_paired(first, second, held_out, alpha)?;
    Ok(SolutionComparison {
        first: first.strategy,
        second: second.strategy,
        first_objective: held_out.coverage(&first.honeypots)?,
        second_objective: held_out.coverage(&second.honeypots)?,
        difference_half_width: paired.difference.half_width,
        semi_hamming: semi_hamming_distance(&first.honeypots, &second.honeypots),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::SolutionStatus;
    use std::time::Duration;

    #[test]
    fn test_semi_hamming() {
        assert_eq!(semi_hamming_distance(&[1, 2, 3], &[3, 2, 1]), 0);
        assert_eq!(semi_hamming_distance(&[1, 2, 3], &[1, 2, 4]), 1);
        assert_eq!(semi_hamming_distance(&[1, 2], &[3, 4]), 2);
    }

    #[test]
    fn test_compare_solutions() {
        let held_out = CoverageMatrix::from_rows(vec![0, 1], vec![vec![0], vec![0], vec![1], vec![]]).unwrap();
        let make = |strategy, honeypots| HoneypotSolution {
            strategy,
            honeypots,
            objective: 0.0,
            a_priori_bound: None,
            posterior_bound: None,
            status: SolutionStatus::Heuristic,
            wall_time: Duration::ZERO,
            solver: None,
        };
        let cmp = compare_solutions(
            &make(Strategy::Exact, vec![0]),
            &make(Strategy::DegreeDiscount, vec![1]),
            &held_out,
            Alpha::default(),
        )
        .unwrap();
        assert_eq!(cmp.first_objective, 0.5);
        assert_eq!(cmp.second_objective, 0.25);
        assert_eq!(cmp.semi_hamming, 1);
        assert!(cmp.difference_half_width > 0.0);
    }
}
