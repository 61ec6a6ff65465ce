//! Paired comparison of two solutions on the same held-out scenarios.
//!
//! Scenarios both solutions detect, or both miss, carry no information
//! about their difference; only the discordant cells of the 2x2 table
//! enter the estimate.

use serde::{Deserialize, Serialize};

use crate::error::{HoneypotError, Result};
use crate::optimize::{CoverageMatrix, HoneypotSolution, Strategy};
use crate::stats::{Alpha, Estimate};

/// Scenario counts by (first detects, second detects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub both: usize,
    pub only_first: usize,
    pub only_second: usize,
    pub neither: usize,
}

impl ContingencyTable {
    pub fn from_rows(first: &[bool], second: &[bool]) -> Self {
        let mut table = ContingencyTable::default();
        for (&a, &b) in first.iter().zip(second) {
            match (a, b) {
                (true, true) => table.both += 1,
                (true, false) => table.only_first += 1,
                (false, true) => table.only_second += 1,
                (false, false) => table.neither += 1,
            }
        }
        table
    }

    pub fn total(&self) -> usize {
        self.both + self.only_first + self.only_second + self.neither
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedComparison {
    pub first: Strategy,
    pub second: Strategy,
    pub table: ContingencyTable,
    /// First detection rate minus second
    pub difference: Estimate,
    /// Zero lies outside the confidence interval
    pub significant: bool,
}

/// McNemar-style paired difference of detection rates
pub fn compare_paired(
    first: &HoneypotSolution,
    second: &HoneypotSolution,
    held_out: &CoverageMatrix,
    alpha: Alpha,
) -> Result<PairedComparison> {
    let n = held_out.scenario_count();
    if n == 0 {
        return Err(HoneypotError::InsufficientData(
            "paired comparison needs at least one held-out scenario".to_string(),
        ));
    }
    let first_rows = held_out.covered_rows(&held_out.indices_of(&first.honeypots)?);
    let second_rows = held_out.covered_rows(&held_out.indices_of(&second.honeypots)?);
    let table = ContingencyTable::from_rows(&first_rows, &second_rows);

    let nf = n as f64;
    let p12 = table.only_first as f64 / nf;
    let p21 = table.only_second as f64 / nf;
    let variance = (p12 * (1.0 - p12) + p21 * (1.0 - p21) + 2.0 * p12 * p21) / nf;
    let difference = Estimate::symmetric(p12 - p21, variance.sqrt(), alpha.two_sided_z()?, alpha, n);
    let significant = !difference.contains(0.0);

    log::debug!(
        "{} vs {}: {:?}, difference {:.4} ± {:.4}",
        first.strategy,
        second.strategy,
        table,
        difference.point,
        difference.half_width
    );
    Ok(PairedComparison {
        first: first.strategy,
        second: second.strategy,
        table,
        difference,
        significant,
    })
}
