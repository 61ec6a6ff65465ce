//! Multiple-replication gap estimators.
//!
//! Both estimators repeat an optimize/evaluate cycle on fresh, independent
//! scenario samples and report the mean gap with a one-sided Student-t
//! interval width `t_{R-1, 1-alpha} * sd / sqrt(R)`.

use serde::{Deserialize, Serialize};

use crate::error::{HoneypotError, Result};
use crate::optimize::{CoverageMatrix, HoneypotOptimizer, HoneypotSolution, Strategy};
use crate::params::Parameters;
use crate::simulation::{ScenarioGenerator, StreamSeed};
use crate::stats::{mean, sample_std_dev, Alpha};

/// Offset separating optimality-gap streams from overfitting-gap streams
const OPTIMALITY_STREAMS: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicationPlan {
    pub replications: usize,
    /// Scenarios per held-out sample
    pub held_out_repetitions: usize,
    pub alpha: Alpha,
    pub seed: StreamSeed,
}

impl ReplicationPlan {
    fn check(&self) -> Result<()> {
        if self.replications < 2 {
            return Err(HoneypotError::InsufficientData(format!(
                "gap estimation needs at least two replications, got {}",
                self.replications
            )));
        }
        if self.held_out_repetitions == 0 {
            return Err(HoneypotError::InsufficientData(
                "held-out samples need at least one scenario".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEstimate {
    pub strategy: Strategy,
    pub mean: f64,
    pub std_dev: f64,
    /// One-sided confidence interval width
    pub ci_width: f64,
    pub alpha: f64,
    pub replications: usize,
    pub gaps: Vec<f64>,
}

impl GapEstimate {
    fn from_gaps(strategy: Strategy, gaps: Vec<f64>, alpha: Alpha) -> Result<Self> {
        let r = gaps.len();
        if r < 2 {
            return Err(HoneypotError::InsufficientData(format!(
                "gap estimation needs at least two replications, got {}",
                r
            )));
        }
        let std_dev = sample_std_dev(&gaps);
        let ci_width = alpha.one_sided_t(r - 1)? * std_dev / (r as f64).sqrt();
        Ok(Self {
            strategy,
            mean: mean(&gaps),
            std_dev,
            ci_width,
            alpha: alpha.value(),
            replications: r,
            gaps,
        })
    }

    /// Upper confidence limit on the expected gap
    pub fn upper_limit(&self) -> f64 {
        self.mean + self.ci_width
    }
}

fn sample(generator: &ScenarioGenerator<'_>, params: &Parameters, seed: StreamSeed) -> Result<CoverageMatrix> {
    CoverageMatrix::from_scenarios(&generator.generate(params, seed)?)
}

/// SAA overfitting: in-sample objective minus held-out detection rate of
/// the solution chosen on that sample
pub fn estimate_overfitting_gap(
    generator: &ScenarioGenerator<'_>,
    params: &Parameters,
    optimizer: &dyn HoneypotOptimizer,
    plan: &ReplicationPlan,
) -> Result<GapEstimate> {
    plan.check()?;
    let held_out_params = Parameters {
        repetitions: plan.held_out_repetitions,
        ..params.clone()
    };

    let mut gaps = Vec::with_capacity(plan.replications);
    for i in 0..plan.replications as u64 {
        let in_sample = sample(generator, params, plan.seed.split(2 * i))?;
        let solution = optimizer.optimize(generator.graph(), &in_sample, params.honeypots)?;
        let held_out = sample(generator, &held_out_params, plan.seed.split(2 * i + 1))?;
        let realised = held_out.coverage(&solution.honeypots)?;
        log::debug!(
            "Replication {}: in-sample {:.4}, held-out {:.4}",
            i,
            solution.objective,
            realised
        );
        gaps.push(solution.objective - realised);
    }

    let estimate = GapEstimate::from_gaps(optimizer.strategy(), gaps, plan.alpha)?;
    log::info!(
        "Overfitting gap for {} on {}: {:.4} ± {:.4} over {} replications",
        optimizer.strategy(),
        params,
        estimate.mean,
        estimate.ci_width,
        estimate.replications
    );
    Ok(estimate)
}

/// Optimality gap of a fixed candidate: on each fresh sample, the
/// optimizer's in-sample objective minus the candidate's coverage
pub fn estimate_optimality_gap(
    generator: &ScenarioGenerator<'_>,
    params: &Parameters,
    candidate: &HoneypotSolution,
    optimizer: &dyn HoneypotOptimizer,
    plan: &ReplicationPlan,
) -> Result<GapEstimate> {
    plan.check()?;
    let sample_params = Parameters {
        repetitions: plan.held_out_repetitions,
        ..params.clone()
    };

    let mut gaps = Vec::with_capacity(plan.replications);
    for i in 0..plan.replications as u64 {
        let coverage = sample(generator, &sample_params, plan.seed.split(OPTIMALITY_STREAMS + i))?;
        let best = optimizer.optimize(generator.graph(), &coverage, candidate.k())?;
        gaps.push(best.objective - coverage.coverage(&candidate.honeypots)?);
    }

    let estimate = GapEstimate::from_gaps(candidate.strategy, gaps, plan.alpha)?;
    log::info!(
        "Optimality gap of {} against {}: {:.4} ± {:.4}",
        candidate.strategy,
        optimizer.strategy(),
        estimate.mean,
        estimate.ci_width
    );
    Ok(estimate)
}
