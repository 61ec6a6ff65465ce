//! Time-step budget calibration.
//!
//! Rollouts are simulated once with the largest candidate budget. Since a
//! rollout stops as soon as it reaches the target, its time to target
//! tells how it would have fared under every smaller budget.

use serde::{Deserialize, Serialize};

use super::generator::ScenarioGenerator;
use super::model::SpreadModel;
use super::rng::StreamSeed;
use crate::error::{HoneypotError, Result};
use crate::stats::{mean, Alpha};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub model: SpreadModel,
    pub transmissibility: f64,
    pub target_fraction: f64,
    /// Candidate time-step budgets
    pub candidates: Vec<usize>,
    pub repetitions: usize,
    /// Required probability of reaching the target within the budget
    pub reliability: f64,
    pub alpha: Alpha,
    pub seed: StreamSeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub time_steps: usize,
    pub success_rate: f64,
    /// One-sided lower confidence bound of the success rate
    pub success_lower_bound: f64,
    /// Mean steps to target among runs that reached it
    pub mean_time_to_target: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub network: String,
    pub model: SpreadModel,
    pub transmissibility: f64,
    pub target_fraction: f64,
    pub repetitions: usize,
    pub reliability: f64,
    pub points: Vec<CalibrationPoint>,
    /// Smallest budget whose lower bound meets the reliability
    pub selected: Option<usize>,
}

impl CalibrationRequest {
    fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(HoneypotError::Configuration(
                "calibration needs at least one candidate time-step budget".to_string(),
            ));
        }
        if self.repetitions == 0 {
            return Err(HoneypotError::InsufficientData(
                "calibration needs at least one repetition".to_string(),
            ));
        }
        if !(self.reliability > 0.0 && self.reliability <= 1.0) {
            return Err(HoneypotError::Configuration(format!(
                "reliability must lie in (0, 1], got {}",
                self.reliability
            )));
        }
        if !(0.0..=1.0).contains(&self.transmissibility)
            || !(self.target_fraction > 0.0 && self.target_fraction <= 1.0)
        {
            return Err(HoneypotError::Configuration(format!(
                "invalid calibration probabilities: transmissibility {}, target {}",
                self.transmissibility, self.target_fraction
            )));
        }
        Ok(())
    }
}

pub fn calibrate_time_step(generator: &ScenarioGenerator<'_>, request: &CalibrationRequest) -> Result<CalibrationReport> {
    request.validate()?;
    let mut candidates = request.candidates.clone();
    candidates.sort_unstable();
    candidates.dedup();
    let horizon = candidates.last().copied().unwrap_or(0);

    log::info!(
        "Calibrating time steps for {} on {} ({} runs, budgets {:?})",
        request.model,
        generator.graph().name(),
        request.repetitions,
        candidates
    );

    let rollouts = generator.rollouts(
        request.model,
        request.transmissibility,
        request.target_fraction,
        horizon,
        0..request.repetitions,
        request.seed,
    )?;
    let times: Vec<Option<usize>> = rollouts.iter().map(|r| r.time_to_target()).collect();

    let z = request.alpha.one_sided_z()?;
    let n = request.repetitions as f64;
    let points: Vec<CalibrationPoint> = candidates
        .iter()
        .map(|&budget| {
            let hits: Vec<f64> = times
                .iter()
                .flatten()
                .filter(|&&t| t <= budget)
                .map(|&t| t as f64)
                .collect();
            let rate = hits.len() as f64 / n;
            CalibrationPoint {
                time_steps: budget,
                success_rate: rate,
                success_lower_bound: rate - z * (rate * (1.0 - rate) / n).sqrt(),
                mean_time_to_target: (!hits.is_empty()).then(|| mean(&hits)),
            }
        })
        .collect();

    let selected = points
        .iter()
        .find(|p| p.success_lower_bound >= request.reliability)
        .map(|p| p.time_steps);
    match selected {
        Some(t) => log::info!("Selected time-step budget {}", t),
        None => log::warn!(
            "No candidate budget reaches the target with reliability {}",
            request.reliability
        ),
    }

    Ok(CalibrationReport {
        network: generator.graph().name().to_string(),
        model: request.model,
        transmissibility: request.transmissibility,
        target_fraction: request.target_fraction,
        repetitions: request.repetitions,
        reliability: request.reliability,
        points,
        selected,
    })
}
