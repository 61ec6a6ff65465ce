//! Out-of-sample evaluation of a single solution.

use serde::{Deserialize, Serialize};

use crate::error::{HoneypotError, Result};
use crate::graph::VertexId;
use crate::optimize::{CoverageMatrix, HoneypotSolution, Strategy};
use crate::stats::{proportion_estimate, weighted_proportion_estimate, Alpha, Estimate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingError {
    pub strategy: Strategy,
    pub honeypots: Vec<VertexId>,
    /// In-sample objective the optimizer reported
    pub in_sample: f64,
    /// Detection rate on the held-out scenarios
    pub estimate: Estimate,
}

impl SamplingError {
    /// In-sample minus held-out detection rate
    pub fn optimism(&self) -> f64 {
        self.in_sample - self.estimate.point
    }
}

/// Detection rate of `solution` on independent scenarios, with a two-sided
/// normal-approximation interval. Scenario weights, when not uniform, weight
/// the rate.
pub fn estimate_sampling_error(
    solution: &HoneypotSolution,
    held_out: &CoverageMatrix,
    alpha: Alpha,
) -> Result<SamplingError> {
    let n = held_out.scenario_count();
    if n == 0 {
        return Err(HoneypotError::InsufficientData(
            "sampling error needs at least one held-out scenario".to_string(),
        ));
    }
    let selection = held_out.indices_of(&solution.honeypots)?;
    let covered = held_out.covered_rows(&selection);
    let detected = covered.iter().filter(|&&c| c).count();
    let weights = held_out.weights();
    let uniform = weights.windows(2).all(|w| w[0] == w[1]);
    let estimate = if uniform {
        proportion_estimate(detected, n, alpha)?
    } else {
        weighted_proportion_estimate(&covered, weights, alpha)?
    };
    log::debug!(
        "{} detects {}/{} held-out scenarios (in-sample {:.4})",
        solution.strategy,
        detected,
        n,
        solution.objective
    );
    Ok(SamplingError {
        strategy: solution.strategy,
        honeypots: solution.honeypots.clone(),
        in_sample: solution.objective,
        estimate,
    })
}
